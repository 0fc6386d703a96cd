//! # App Registry
//!
//! The registry maps app ids to their descriptors and, in the other
//! direction, every derived filename to the app and resource kind that
//! produced it. The change detector classifies working-tree changes purely
//! through this reverse map.
//!
//! A registry is immutable once built. Reinitialization builds a fresh one
//! and swaps it in whole through [`SharedRegistry`], so readers never observe
//! a partially populated map.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use crate::app::{EconApp, ResourceKind};
use crate::error::{Error, Result};

/// Immutable lookup tables for the tracked apps
#[derive(Debug, Clone, Default)]
pub struct Registry {
    apps: Vec<EconApp>,
    by_id: BTreeMap<u32, usize>,
    reverse: HashMap<String, (u32, ResourceKind)>,
}

impl Registry {
    /// Build a registry from `apps`, preserving their order.
    ///
    /// Fails if two apps share an id or any derived filename.
    pub fn build(apps: &[EconApp]) -> Result<Self> {
        let mut registry = Self::default();
        for app in apps {
            if registry.by_id.contains_key(&app.id) {
                return Err(Error::Registry {
                    app: app.name.clone(),
                    message: format!("duplicate app id {}", app.id),
                });
            }
            for kind in ResourceKind::ALL {
                let file_name = app.file_name(kind);
                if let Some((other, _)) = registry.reverse.get(&file_name) {
                    return Err(Error::Registry {
                        app: app.name.clone(),
                        message: format!("{} is already claimed by app {}", file_name, other),
                    });
                }
                registry.reverse.insert(file_name, (app.id, kind));
            }
            registry.by_id.insert(app.id, registry.apps.len());
            registry.apps.push(app.clone());
        }
        Ok(registry)
    }

    /// Apps in registration order
    pub fn apps(&self) -> &[EconApp] {
        &self.apps
    }

    pub fn get(&self, id: u32) -> Option<&EconApp> {
        self.by_id.get(&id).map(|&index| &self.apps[index])
    }

    /// Look up a bare filename in the reverse map
    pub fn classify(&self, file_name: &str) -> Option<(&EconApp, ResourceKind)> {
        let (id, kind) = self.reverse.get(file_name)?;
        self.get(*id).map(|app| (app, *kind))
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    /// Number of entries in the reverse map
    pub fn file_count(&self) -> usize {
        self.reverse.len()
    }
}

/// A registry that can be replaced atomically while being read
#[derive(Debug, Clone, Default)]
pub struct SharedRegistry {
    inner: Arc<RwLock<Arc<Registry>>>,
}

impl SharedRegistry {
    pub fn new(registry: Registry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(registry))),
        }
    }

    /// Current registry snapshot
    pub fn load(&self) -> Result<Arc<Registry>> {
        let guard = self.inner.read().map_err(|_| Error::LockPoisoned {
            context: "registry".to_string(),
        })?;
        Ok(Arc::clone(&guard))
    }

    /// Publish a fully built registry
    pub fn publish(&self, registry: Registry) -> Result<()> {
        let mut guard = self.inner.write().map_err(|_| Error::LockPoisoned {
            context: "registry".to_string(),
        })?;
        *guard = Arc::new(registry);
        Ok(())
    }
}

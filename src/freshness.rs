//! Per-app freshness: last-modified timestamps and client schema URLs
//!
//! Timestamps come from the cached schema file's modification time, never
//! from the wall clock, so the `If-Modified-Since` precondition matches what
//! is actually on disk.

use std::collections::HashMap;
use std::time::SystemTime;

use log::debug;

use crate::app::EconApp;
use crate::cache::CacheStore;
use crate::error::{Error, Result};

/// Field of the cached `result` object that points at the client schema.
pub const CLIENT_SCHEMA_URL_FIELD: &str = "items_game_url";

/// What is known about one app's upstream documents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Freshness {
    /// Modification time of the cached schema, `None` if never fetched
    pub last_modified: Option<SystemTime>,
    /// Last observed `items_game_url`
    pub client_schema_url: Option<String>,
}

/// Freshness for every registered app, keyed by app id
#[derive(Debug, Clone, Default)]
pub struct FreshnessTracker {
    entries: HashMap<u32, Freshness>,
}

impl FreshnessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recover freshness for `apps` from the cache directory.
    ///
    /// Fails on the first unreadable or unparsable cached schema; the caller
    /// treats that as cache corruption.
    pub fn load(apps: &[EconApp], cache: &CacheStore) -> Result<Self> {
        let mut tracker = Self::new();
        for app in apps {
            let last_modified = cache.schema_modified(app).map_err(|e| Error::Registry {
                app: app.name.clone(),
                message: e.to_string(),
            })?;
            let cached = cache.read_schema(app).map_err(|e| Error::Registry {
                app: app.name.clone(),
                message: e.to_string(),
            })?;
            let client_schema_url = cached.as_ref().and_then(|json| {
                json.get(CLIENT_SCHEMA_URL_FIELD)
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            });
            debug!(
                "Loaded freshness for {}: cached={}, client schema url={:?}",
                app,
                last_modified.is_some(),
                client_schema_url
            );
            tracker.entries.insert(
                app.id,
                Freshness {
                    last_modified,
                    client_schema_url,
                },
            );
        }
        Ok(tracker)
    }

    pub fn get(&self, id: u32) -> Option<&Freshness> {
        self.entries.get(&id)
    }

    /// Last-modified timestamp, or `None` if the app was never fetched
    pub fn last_modified_of(&self, id: u32) -> Option<SystemTime> {
        self.entries.get(&id).and_then(|f| f.last_modified)
    }

    pub fn client_schema_url_of(&self, id: u32) -> Option<&str> {
        self.entries
            .get(&id)
            .and_then(|f| f.client_schema_url.as_deref())
    }

    /// Record a new write. A `None` URL keeps the previously recorded one.
    pub fn record_update(&mut self, id: u32, timestamp: SystemTime, client_schema_url: Option<String>) {
        let entry = self.entries.entry(id).or_default();
        entry.last_modified = Some(timestamp);
        if client_schema_url.is_some() {
            entry.client_schema_url = client_schema_url;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

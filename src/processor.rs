//! Interprets fetched documents and persists them to the cache
//!
//! Every failure here is contained to the app being processed: errors are
//! logged with the app's name and turned into a "no change" result so the
//! rest of the cycle carries on.

use std::path::PathBuf;
use std::sync::Arc;

use log::{error, info, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::app::EconApp;
use crate::cache::CacheStore;
use crate::error::{Error, Result};
use crate::freshness::FreshnessTracker;
use crate::generator::ArtifactGenerator;

/// `result.status` value of a successful GetSchema call.
pub const STATUS_OK: i64 = 1;

/// Outer shape of a GetSchema response
#[derive(Debug, Deserialize)]
struct SchemaEnvelope {
    #[serde(default)]
    result: Option<Value>,
}

/// The only fields of `result` the tracker relies on
#[derive(Debug, Deserialize)]
struct SchemaStatus {
    #[serde(default)]
    status: Option<i64>,
    #[serde(default)]
    items_game_url: Option<String>,
}

/// Writes successful responses to the cache and drives artifact generation
pub struct ResponseProcessor {
    cache: CacheStore,
    artifact_dir: PathBuf,
    generator: Arc<dyn ArtifactGenerator>,
}

impl ResponseProcessor {
    pub fn new(
        cache: CacheStore,
        artifact_dir: impl Into<PathBuf>,
        generator: Arc<dyn ArtifactGenerator>,
    ) -> Self {
        Self {
            cache,
            artifact_dir: artifact_dir.into(),
            generator,
        }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Process a GetSchema body.
    ///
    /// Returns `true` when the response carried an `items_game_url` that
    /// differs from the recorded one, meaning the client schema must be
    /// fetched this cycle.
    pub fn process_primary(&self, app: &EconApp, body: &[u8], freshness: &mut FreshnessTracker) -> bool {
        match self.try_process_primary(app, body, freshness) {
            Ok(changed) => changed,
            Err(e) => {
                warn!("Error processing response from {}", app);
                error!("{}", e);
                false
            }
        }
    }

    fn try_process_primary(
        &self,
        app: &EconApp,
        body: &[u8],
        freshness: &mut FreshnessTracker,
    ) -> Result<bool> {
        let envelope: SchemaEnvelope = serde_json::from_slice(body)?;
        let Some(result) = envelope.result.filter(|r| !r.is_null()) else {
            info!("Discarding response for {}: no result", app);
            return Ok(false);
        };
        let status = SchemaStatus::deserialize(&result)?;
        if status.status != Some(STATUS_OK) {
            info!(
                "Discarding response for {}: status {:?}",
                app, status.status
            );
            return Ok(false);
        }

        let new_url = status
            .items_game_url
            .filter(|url| freshness.client_schema_url_of(app.id) != Some(url.as_str()));

        let text = self.cache.write_schema(app, &result)?;
        let modified = self.cache.schema_modified(app)?.ok_or_else(|| Error::Cache {
            message: format!("{} vanished after write", app.schema_file_name()),
        })?;
        let changed = new_url.is_some();
        freshness.record_update(app.id, modified, new_url);

        if let Err(e) = self.generator.generate(
            &app.namespace(),
            &app.type_name(),
            &text,
            &self.artifact_dir,
        ) {
            warn!("Artifact generation failed for {}: {}", app, e);
        }

        Ok(changed)
    }

    /// Store a client schema body. Empty bodies are ignored.
    pub fn process_secondary(&self, app: &EconApp, body: &[u8]) -> bool {
        if body.is_empty() {
            return false;
        }
        match self.cache.write_client_schema(app, body) {
            Ok(()) => true,
            Err(e) => {
                warn!("Error storing client schema for {}", app);
                error!("{}", e);
                false
            }
        }
    }
}

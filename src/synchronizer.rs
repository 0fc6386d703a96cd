//! # Version Control Synchronizer
//!
//! Turns the working copy's changes into commits on the remote:
//!
//! 1.  **Clone**: make sure a working copy exists (`ensure_cloned`).
//! 2.  **Detect**: classify untracked files as "Added" and modified files as
//!     "Updated", staging every recognized file (`sync_dirty`).
//! 3.  **Commit and push**: commit with the configured identity, fetch,
//!     rebase onto the fetched head and push (`commit_and_push`).
//!
//! A failure at any step is logged and ends the step sequence for this
//! cycle. Nothing is rolled back: a commit that could not be pushed stays
//! local and goes out with the next cycle that has changes to push.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{error, info};

use crate::detector::{self, ADDED, UPDATED};
use crate::error::Result;
use crate::git::{Identity, Remote, VersionControl};
use crate::registry::Registry;

/// Result of inspecting the working copy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirtyState {
    /// At least one recognized file changed
    pub is_dirty: bool,
    /// One classification message per line
    pub message: String,
}

/// Commits cache and artifact changes to the tracking repository
pub struct VcsSynchronizer {
    vcs: Arc<dyn VersionControl>,
    repo_dir: PathBuf,
    remote: Remote,
    identity: Identity,
}

impl VcsSynchronizer {
    pub fn new(
        vcs: Arc<dyn VersionControl>,
        repo_dir: impl Into<PathBuf>,
        remote: Remote,
        identity: Identity,
    ) -> Self {
        Self {
            vcs,
            repo_dir: repo_dir.into(),
            remote,
            identity,
        }
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    /// Clone the remote if there is no working copy yet.
    ///
    /// Returns whether a working copy exists afterwards.
    pub fn ensure_cloned(&self) -> bool {
        if self.vcs.is_cloned(&self.repo_dir) {
            return true;
        }
        info!("Cloning repo from {}", self.remote.url);
        match self.vcs.clone_repo(&self.remote, &self.repo_dir) {
            Ok(()) => true,
            Err(e) => {
                error!("{}", e);
                false
            }
        }
    }

    /// Classify and stage the working copy's changes.
    pub fn sync_dirty(&self, registry: &Registry) -> Result<DirtyState> {
        let status = self.vcs.status(&self.repo_dir)?;
        let stage = |path: &str| self.vcs.stage(&self.repo_dir, path);

        let mut messages = Vec::new();
        if !status.untracked.is_empty() {
            messages.extend(detector::classify(registry, &status.untracked, ADDED, stage)?);
        }
        if !status.modified.is_empty() {
            messages.extend(detector::classify(registry, &status.modified, UPDATED, stage)?);
        }

        Ok(DirtyState {
            is_dirty: !messages.is_empty(),
            message: messages.join("\n"),
        })
    }

    /// Commit the staged files, then fetch, rebase and push.
    pub fn commit_and_push(&self, message: &str) -> Result<()> {
        info!("Committing");
        self.vcs.commit(&self.repo_dir, message, &self.identity)?;

        info!("Fetch, Rebase, Push");
        self.vcs.fetch(&self.repo_dir, &self.remote)?;
        self.vcs.rebase_onto_fetched(&self.repo_dir, &self.identity)?;
        self.vcs.push(&self.repo_dir, &self.remote)?;
        Ok(())
    }

    /// Detect changes and commit them if there are any.
    ///
    /// Errors are logged, never returned. Returns whether a commit was
    /// pushed.
    pub fn commit_any_changes(&self, registry: &Registry) -> bool {
        let result = self.sync_dirty(registry).and_then(|state| {
            if state.is_dirty {
                self.commit_and_push(&state.message).map(|_| true)
            } else {
                Ok(false)
            }
        });
        match result {
            Ok(pushed) => pushed,
            Err(e) => {
                error!("{}", e);
                false
            }
        }
    }

    /// Bootstrap a new tracking repository from `template_url`.
    ///
    /// Clones the template into the working copy, points `origin` at the
    /// configured remote and pushes.
    pub fn new_repo(&self, template_url: &str) -> Result<()> {
        info!("Creating new repo from {}", template_url);
        let template = Remote::new(template_url, None);
        self.vcs.clone_repo(&template, &self.repo_dir)?;
        self.vcs.set_remote_url(&self.repo_dir, &self.remote.url)?;
        self.vcs.push(&self.repo_dir, &self.remote)?;
        info!("Done creating new repo");
        Ok(())
    }
}

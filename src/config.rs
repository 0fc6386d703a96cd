//! # Configuration
//!
//! This module defines the `.schema-tracker.yaml` configuration file and
//! the paths derived from it.
//!
//! ## Example
//!
//! ```yaml
//! api_key: 0123456789ABCDEF
//! language: en_US
//! check_interval_ms: 900000
//! git:
//!   username: schema-bot
//!   password: ghp_xxx
//!   email: schema-bot@example.com
//!   remote_url: https://github.com/SchemaTracker/SteamEcon.git
//!   local_repo: SteamEcon
//! apps:
//!   - id: 440
//!     name: Team Fortress 2
//!     short_code: TF2
//! ```
//!
//! `apps` may be omitted, in which case the built-in list from
//! [`crate::app::default_apps`] is tracked. The API key and git password can
//! also come from the environment through the CLI.
//!
//! ## Layout
//!
//! The working copy lives at `<work_root>/<git.local_repo>`. Inside it, the
//! cache store is `cache/` and generated artifacts go to
//! `SteamEcon/Schema/`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::{default_apps, EconApp};
use crate::defaults;
use crate::error::{Error, Result};
use crate::git::{Credentials, Identity, Remote};

/// Repository used by `new-repo` to bootstrap a tracking repository.
pub const DEFAULT_TEMPLATE_URL: &str = "https://github.com/SchemaTracker/SteamEconTemplate.git";

/// Fifteen minutes.
pub const DEFAULT_CHECK_INTERVAL_MS: u64 = 900_000;

pub const DEFAULT_LANGUAGE: &str = "en_US";

/// Git remote, credentials and identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitInfo {
    pub username: String,
    /// Password or access token; may be supplied through the environment
    #[serde(default)]
    pub password: String,
    pub email: String,
    /// The repository changes are pushed to
    pub remote_url: String,
    /// Directory name of the working copy under the work root
    pub local_repo: String,
}

/// Parsed `.schema-tracker.yaml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Steam Web API key
    #[serde(default)]
    pub api_key: String,
    /// Language tag appended to GetSchema requests
    #[serde(default = "default_language")]
    pub language: String,
    /// Sleep between cycles
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,
    /// Tracked apps; empty means the built-in list
    #[serde(default)]
    pub apps: Vec<EconApp>,
    pub git: GitInfo,
    #[serde(default = "default_template_url")]
    pub template_url: String,
    /// Parent directory of the working copy
    #[serde(default)]
    pub work_root: Option<PathBuf>,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_check_interval_ms() -> u64 {
    DEFAULT_CHECK_INTERVAL_MS
}

fn default_template_url() -> String {
    DEFAULT_TEMPLATE_URL.to_string()
}

/// Parse a configuration from YAML text
pub fn parse(yaml: &str) -> Result<Config> {
    serde_yaml::from_str(yaml).map_err(|e| Error::Config {
        message: e.to_string(),
        hint: None,
    })
}

/// Read and parse a configuration file
pub fn from_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

fn require(value: &str, field: &str, hint: Option<&str>) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Config {
            message: format!("Missing {}", field),
            hint: hint.map(str::to_string),
        });
    }
    Ok(())
}

/// Remotes that authenticate with the configured username and password
fn is_http_remote(remote_url: &str) -> bool {
    url::Url::parse(remote_url).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

impl Config {
    /// Check that everything needed to run is present.
    pub fn validate(&self) -> Result<()> {
        require(
            &self.api_key,
            "api_key",
            Some("set api_key in the config file or SCHEMA_TRACKER_API_KEY"),
        )?;
        require(&self.git.username, "git.username", None)?;
        require(&self.git.email, "git.email", None)?;
        require(&self.git.remote_url, "git.remote_url", None)?;
        require(&self.git.local_repo, "git.local_repo", None)?;
        if is_http_remote(&self.git.remote_url) {
            require(
                &self.git.password,
                "git.password",
                Some("HTTP remotes need a password or token; set git.password or SCHEMA_TRACKER_GIT_PASSWORD"),
            )?;
        }
        if self.check_interval_ms == 0 {
            return Err(Error::Config {
                message: "check_interval_ms must be greater than zero".to_string(),
                hint: None,
            });
        }
        Ok(())
    }

    /// Apps to track, falling back to the built-in list
    pub fn tracked_apps(&self) -> Vec<EconApp> {
        if self.apps.is_empty() {
            default_apps()
        } else {
            self.apps.clone()
        }
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    pub fn work_root(&self) -> PathBuf {
        self.work_root
            .clone()
            .unwrap_or_else(defaults::default_work_root)
    }

    /// Working copy of the tracking repository
    pub fn repo_dir(&self) -> PathBuf {
        self.work_root().join(&self.git.local_repo)
    }

    /// Cache store directory
    pub fn cache_dir(&self) -> PathBuf {
        self.repo_dir().join("cache")
    }

    /// Generated artifact directory
    pub fn artifact_dir(&self) -> PathBuf {
        self.repo_dir().join("SteamEcon").join("Schema")
    }

    pub fn remote(&self) -> Remote {
        let credentials = if self.git.password.is_empty() {
            None
        } else {
            Some(Credentials {
                username: self.git.username.clone(),
                password: self.git.password.clone(),
            })
        };
        Remote::new(&self.git.remote_url, credentials)
    }

    pub fn identity(&self) -> Identity {
        Identity {
            name: self.git.username.clone(),
            email: self.git.email.clone(),
        }
    }
}

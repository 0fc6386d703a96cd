//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `schema-tracker` command-line tool. Each subcommand is defined in its own
//! file.
//!
//! ## Structure
//!
//! Each command module contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`. Commands that read the configuration flatten
//!   [`ConfigArgs`] into it.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic by calling into the `schema_tracker` library.

pub mod apps;
pub mod new_repo;
pub mod run;
pub mod validate;

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use schema_tracker::config::{self, Config};
use schema_tracker::defaults;

/// Where the configuration comes from, and values that override it
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Path to the .schema-tracker.yaml configuration file.
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = defaults::CONFIG_FILE_NAME,
        env = "SCHEMA_TRACKER_CONFIG"
    )]
    pub config: PathBuf,

    /// Steam Web API key, overriding `api_key` from the file.
    #[arg(long, value_name = "KEY", env = "SCHEMA_TRACKER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Git password or token, overriding `git.password` from the file.
    #[arg(
        long,
        value_name = "PASSWORD",
        env = "SCHEMA_TRACKER_GIT_PASSWORD",
        hide_env_values = true
    )]
    pub git_password: Option<String>,

    /// Parent directory of the working copy.
    ///
    /// Defaults to `work_root` from the file, then the system cache
    /// directory (`~/.cache/schema-tracker` on Linux).
    #[arg(long, value_name = "DIR", env = "SCHEMA_TRACKER_WORK_ROOT")]
    pub work_root: Option<PathBuf>,
}

impl ConfigArgs {
    /// Read the configuration file and apply the overrides.
    pub fn load(&self) -> Result<Config> {
        let mut config = config::from_file(&self.config).with_context(|| {
            format!("Failed to load config from {}", self.config.display())
        })?;

        if let Some(api_key) = &self.api_key {
            config.api_key = api_key.clone();
        }
        if let Some(password) = &self.git_password {
            config.git.password = password.clone();
        }
        if let Some(work_root) = &self.work_root {
            config.work_root = Some(work_root.clone());
        }
        Ok(config)
    }
}

//! # Validate Command Implementation
//!
//! This module implements the `validate` subcommand, which checks the
//! `.schema-tracker.yaml` configuration file without contacting Steam or the
//! git remote.
//!
//! ## Functionality
//!
//! - **Parsing**: The file must parse and contain no unknown fields.
//! - **Required values**: API key, git identity and remote must be present
//!   (after environment overrides).
//! - **Registry**: App ids and every derived filename must be unique.
//!
//! This command is a safe, read-only operation that does not modify any files.

use anyhow::{bail, Result};
use clap::Args;

use schema_tracker::registry::Registry;

use super::ConfigArgs;

/// Validate a .schema-tracker.yaml configuration file
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Execute the `validate` command.
pub fn execute(args: ValidateArgs) -> Result<()> {
    println!("🔍 Validating configuration: {}", args.config.config.display());

    let config = match args.config.load() {
        Ok(config) => {
            println!("✅ Configuration file parsed successfully");
            config
        }
        Err(e) => {
            println!("❌ Configuration parsing failed: {:#}", e);
            return Err(e);
        }
    };

    let mut has_errors = false;

    if let Err(e) = config.validate() {
        println!("❌ {}", e);
        has_errors = true;
    }

    let apps = config.tracked_apps();
    match Registry::build(&apps) {
        Ok(registry) => {
            println!("\n📊 Configuration Summary:");
            println!("   Tracked apps: {}", registry.len());
            println!("   Tracked files: {}", registry.file_count());
            println!("   Check interval: {}s", config.check_interval().as_secs());
            println!("   Working copy: {}", config.repo_dir().display());
        }
        Err(e) => {
            println!("❌ {}", e);
            has_errors = true;
        }
    }

    if has_errors {
        println!("\n❌ Configuration has errors that must be fixed");
        bail!("Configuration validation failed");
    }

    println!("\n✅ Configuration is valid");
    Ok(())
}

//! # New Repo Command Implementation
//!
//! This module implements the `new-repo` subcommand, which bootstraps the
//! tracking repository: clone the template, point `origin` at the configured
//! remote and push.

use anyhow::{bail, Result};
use clap::Args;

use schema_tracker::service::SchemaService;

use super::ConfigArgs;

/// Create the tracking repository from the template and push it
#[derive(Args, Debug)]
pub struct NewRepoArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Template repository to clone, overriding `template_url`.
    #[arg(long, value_name = "URL")]
    pub template: Option<String>,
}

/// Execute the `new-repo` command.
pub fn execute(args: NewRepoArgs) -> Result<()> {
    let mut config = args.config.load()?;
    if let Some(template) = args.template {
        config.template_url = template;
    }

    let repo_dir = config.repo_dir();
    if repo_dir.exists() {
        bail!(
            "{} already exists; remove it or choose another git.local_repo",
            repo_dir.display()
        );
    }

    let service = SchemaService::new(config)?;
    service.new_repo()?;
    println!("Created {}", repo_dir.display());
    Ok(())
}

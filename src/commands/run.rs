//! # Run Command Implementation
//!
//! This module implements the `run` subcommand, which starts the schema
//! service and keeps it running until the worker exits. With `--once` a
//! single cycle runs on the current thread instead.

use anyhow::{bail, Result};
use clap::Args;
use log::info;

use schema_tracker::service::SchemaService;

use super::ConfigArgs;

/// Poll the Steam Web API and commit schema changes
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Run a single cycle and exit.
    #[arg(long)]
    pub once: bool,
}

/// Execute the `run` command.
pub fn execute(args: RunArgs) -> Result<()> {
    let config = args.config.load()?;
    let service = SchemaService::new(config)?;

    if service.is_fatal() {
        bail!("The cache could not be loaded; fix or remove the broken files and retry");
    }

    if args.once {
        let report = service.run_cycle()?;
        if !report.cloned {
            bail!("No working copy available");
        }
        println!(
            "Updated {} schema(s) and {} client schema(s)",
            report.schemas_updated.len(),
            report.client_schemas_updated.len()
        );
        if report.committed {
            println!("Changes committed and pushed");
        } else {
            println!("Nothing committed");
        }
        return Ok(());
    }

    info!(
        "Checking every {}s",
        service.config().check_interval().as_secs()
    );
    service.start()?;
    let exit = service.wait()?;

    if exit.is_some_and(|exit| exit.panicked) {
        bail!("The worker faulted");
    }
    if service.is_fatal() {
        bail!("The worker stopped: the cache could not be reloaded");
    }
    Ok(())
}

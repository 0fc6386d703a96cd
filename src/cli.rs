//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Schema Tracker - Mirror Steam item schemas into a git repository
#[derive(Parser, Debug)]
#[command(name = "schema-tracker")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Set log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Poll the Steam Web API and commit schema changes
    Run(commands::run::RunArgs),

    /// Create the tracking repository from the template and push it
    NewRepo(commands::new_repo::NewRepoArgs),

    /// List tracked apps, their files and cached state
    Apps(commands::apps::AppsArgs),

    /// Validate a .schema-tracker.yaml configuration file
    Validate(commands::validate::ValidateArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        match self.command {
            Commands::Run(args) => commands::run::execute(args),
            Commands::NewRepo(args) => commands::new_repo::execute(args),
            Commands::Apps(args) => commands::apps::execute(args),
            Commands::Validate(args) => commands::validate::execute(args),
        }
    }
}

fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    // A logger may already be installed when embedded
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_secs()
        .format_target(false)
        .try_init();
}

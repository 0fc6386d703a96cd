//! # Apps Command Implementation
//!
//! This module implements the `apps` subcommand, which lists the tracked apps
//! with the files derived from them and what the cache currently holds.
//!
//! This command is a read-only operation; it never touches the network.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;

use schema_tracker::app::ResourceKind;
use schema_tracker::cache::CacheStore;
use schema_tracker::freshness::FreshnessTracker;

use super::ConfigArgs;

/// List tracked apps, their files and cached state
#[derive(Args, Debug)]
pub struct AppsArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Print JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct AppRow {
    id: u32,
    name: String,
    short_code: String,
    files: Vec<String>,
    last_modified: Option<String>,
    client_schema_url: Option<String>,
}

/// Execute the `apps` command.
pub fn execute(args: AppsArgs) -> Result<()> {
    let config = args.config.load()?;
    let apps = config.tracked_apps();
    let cache = CacheStore::new(config.cache_dir());
    let freshness = FreshnessTracker::load(&apps, &cache)?;

    let rows: Vec<AppRow> = apps
        .iter()
        .map(|app| AppRow {
            id: app.id,
            name: app.name.clone(),
            short_code: app.short_code.clone(),
            files: ResourceKind::ALL.iter().map(|kind| app.file_name(*kind)).collect(),
            last_modified: freshness
                .last_modified_of(app.id)
                .map(|time| DateTime::<Utc>::from(time).to_rfc3339()),
            client_schema_url: freshness.client_schema_url_of(app.id).map(str::to_string),
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("📋 Cache: {}", cache.root().display());
    for row in &rows {
        println!("\n{} ({}) [{}]", row.name, row.id, row.short_code);
        println!("   Files: {}", row.files.join(", "));
        match &row.last_modified {
            Some(time) => println!("   Last modified: {}", time),
            None => println!("   Last modified: never fetched"),
        }
        if let Some(url) = &row.client_schema_url {
            println!("   Client schema: {}", url);
        }
    }
    Ok(())
}

//! # Schema Tracker Library
//!
//! This library keeps a git repository in step with the item schemas Steam
//! publishes for its games. It is designed to be used by the
//! `schema-tracker` command-line tool but the service and its seams can be
//! embedded elsewhere.
//!
//! ## Quick Example
//!
//! ```
//! use schema_tracker::app::{default_apps, ResourceKind};
//! use schema_tracker::registry::Registry;
//!
//! let registry = Registry::build(&default_apps()).unwrap();
//!
//! let (app, kind) = registry.classify("schema_440.json").unwrap();
//! assert_eq!(app.name, "Team Fortress 2");
//! assert_eq!(kind, ResourceKind::PrimarySchema);
//!
//! assert!(registry.classify("README.md").is_none());
//! ```
//!
//! ## Core Concepts
//!
//! - **Apps (`app`, `registry`)**: Tracked games and the cache and artifact
//!   filenames derived from them, with the reverse lookup used to recognize
//!   changed files.
//! - **Freshness (`freshness`)**: When each app's schema last changed and
//!   where its client schema lives.
//! - **Fetching (`fetch`)**: Conditional GETs against the Steam Web API.
//! - **Processing (`processor`, `cache`, `generator`)**: Validating
//!   responses, writing the cache and generating Rust types.
//! - **Committing (`detector`, `synchronizer`, `git`)**: Classifying working
//!   copy changes into commit messages, then commit, rebase and push.
//!
//! ## Execution Flow
//!
//! [`service::SchemaService`] runs the cycle on a background thread:
//!
//! 1.  **Reinitialize**: Rebuild the registry and freshness from the cache.
//! 2.  **Clone**: Clone the tracking repository if needed.
//! 3.  **Fetch**: Download changed schemas and client schemas.
//! 4.  **Commit**: Commit recognized changes and push them.
//! 5.  **Sleep**: Wait for the check interval or a stop request.

pub mod app;
pub mod cache;
pub mod config;
pub mod defaults;
pub mod detector;
pub mod error;
pub mod fetch;
pub mod freshness;
pub mod generator;
pub mod git;
pub mod processor;
pub mod registry;
pub mod service;
pub mod synchronizer;

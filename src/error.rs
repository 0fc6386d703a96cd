//! # Error Handling
//!
//! This module defines the centralized error type for `schema-tracker`. It
//! uses the `thiserror` library to create an `Error` enum that covers every
//! failure mode of the synchronization engine, each variant carrying enough
//! context (app name, URL, git command) to diagnose the problem from a log
//! line alone.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum. Variants map onto the failure taxonomy of
//!   the service:
//!   - configuration errors (`Config`) refuse construction,
//!   - cache corruption found while building the registry (`Registry`) sets
//!     the fatal flag and refuses `start`,
//!   - network, git and generation errors are recoverable and only ever
//!     logged by the sync loop.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.

use thiserror::Error;

/// Main error type for schema-tracker operations
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration is missing a required value or is inconsistent.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Config {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// The service hit an unrecoverable error during initialization and
    /// refuses to start until the process is restarted.
    #[error("Service is in a fatal state: {message}")]
    Fatal { message: String },

    /// The registry could not be built for an app.
    ///
    /// Raised for duplicate ids, colliding filenames, and cached schema files
    /// that cannot be read or parsed.
    #[error("Registry error for {app}: {message}")]
    Registry { app: String, message: String },

    /// An error occurred while cloning a Git repository.
    #[error("Git clone error for {url}: {message}")]
    GitClone { url: String, message: String },

    /// An error occurred while executing a Git command.
    #[error("Git command failed in {repo}: {command} - {stderr}")]
    GitCommand {
        command: String,
        repo: String,
        stderr: String,
    },

    /// An error occurred with a cache store operation.
    #[error("Cache operation error: {message}")]
    Cache { message: String },

    /// The artifact generator rejected its input.
    #[error("Artifact generation error for {type_name}: {message}")]
    Generation { type_name: String, message: String },

    /// An error occurred during a network operation.
    #[error("Network operation error: {url} - {message}")]
    Network { url: String, message: String },

    /// An error indicating that a mutex or other lock has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// An HTTP transport error, wrapped from `reqwest::Error`.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

//! Default values for schema-tracker configuration.
//!
//! This module provides centralized default values used by the config
//! layer and the CLI.

use std::path::PathBuf;

/// Config file looked up in the current directory when `--config` is absent.
pub const CONFIG_FILE_NAME: &str = ".schema-tracker.yaml";

/// Returns the default parent directory of the tracking repository.
///
/// Uses the platform-appropriate cache directory:
/// - Linux: `~/.cache/schema-tracker` (XDG Base Directory)
/// - macOS: `~/Library/Caches/schema-tracker`
/// - Windows: `{FOLDERID_LocalAppData}\schema-tracker`
///
/// Falls back to the system temp directory if the platform cache directory
/// cannot be determined.
pub fn default_work_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("schema-tracker")
}

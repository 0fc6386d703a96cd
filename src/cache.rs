//! On-disk cache of the last known schema documents
//!
//! The cache directory lives inside the git working copy, so every write
//! here shows up as an untracked or modified file for the change detector.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde_json::Value;

use crate::app::EconApp;
use crate::error::{Error, Result};

/// Filesystem-backed store for primary and client schema files
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// Create a store rooted at `root`. The directory is not created.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the cache directory if it doesn't exist
    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn schema_path(&self, app: &EconApp) -> PathBuf {
        self.root.join(app.schema_file_name())
    }

    pub fn client_schema_path(&self, app: &EconApp) -> PathBuf {
        self.root.join(app.client_schema_file_name())
    }

    pub fn has_schema(&self, app: &EconApp) -> bool {
        self.schema_path(app).is_file()
    }

    /// Read and parse the cached primary schema, if present
    pub fn read_schema(&self, app: &EconApp) -> Result<Option<Value>> {
        let path = self.schema_path(app);
        if !path.is_file() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Pretty-print `result` into the primary schema file.
    ///
    /// Returns the serialized text, which is what the artifact generator
    /// consumes.
    pub fn write_schema(&self, app: &EconApp, result: &Value) -> Result<String> {
        let text = serde_json::to_string_pretty(result)?;
        fs::write(self.schema_path(app), &text)?;
        Ok(text)
    }

    /// Store the client schema body verbatim
    pub fn write_client_schema(&self, app: &EconApp, body: &[u8]) -> Result<()> {
        fs::write(self.client_schema_path(app), body)?;
        Ok(())
    }

    /// Modification time of the primary schema file
    pub fn schema_modified(&self, app: &EconApp) -> Result<Option<SystemTime>> {
        let path = self.schema_path(app);
        match fs::metadata(&path) {
            Ok(metadata) => Ok(Some(metadata.modified().map_err(|e| Error::Cache {
                message: format!("no modification time for {}: {}", path.display(), e),
            })?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn tf2() -> EconApp {
        EconApp::new(440, "Team Fortress 2", "TF2")
    }

    #[test]
    fn test_paths_are_under_root() {
        let store = CacheStore::new("/tmp/cache");
        assert_eq!(
            store.schema_path(&tf2()),
            PathBuf::from("/tmp/cache/schema_440.json")
        );
        assert_eq!(
            store.client_schema_path(&tf2()),
            PathBuf::from("/tmp/cache/clientschema_440.vdf")
        );
    }

    #[test]
    fn test_missing_schema_reads_as_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = CacheStore::new(temp_dir.path());

        assert!(!store.has_schema(&tf2()));
        assert!(store.read_schema(&tf2()).unwrap().is_none());
        assert!(store.schema_modified(&tf2()).unwrap().is_none());
    }

    #[test]
    fn test_write_schema_is_pretty_and_ordered() {
        let temp_dir = TempDir::new().unwrap();
        let store = CacheStore::new(temp_dir.path());

        let result = json!({"status": 1, "items_game_url": "http://x/items.txt", "a": 2});
        let text = store.write_schema(&tf2(), &result).unwrap();

        assert!(text.contains('\n'));
        let status = text.find("status").unwrap();
        let url = text.find("items_game_url").unwrap();
        let a = text.find("\"a\"").unwrap();
        assert!(status < url && url < a);

        let on_disk = fs::read_to_string(store.schema_path(&tf2())).unwrap();
        assert_eq!(on_disk, text);
        assert_eq!(store.read_schema(&tf2()).unwrap().unwrap(), result);
        assert!(store.schema_modified(&tf2()).unwrap().is_some());
    }

    #[test]
    fn test_write_client_schema_verbatim() {
        let temp_dir = TempDir::new().unwrap();
        let store = CacheStore::new(temp_dir.path());

        store
            .write_client_schema(&tf2(), b"\"items_game\"\n{\n}\n")
            .unwrap();
        let content = fs::read(store.client_schema_path(&tf2())).unwrap();
        assert_eq!(content, b"\"items_game\"\n{\n}\n");
    }

    #[test]
    fn test_corrupt_schema_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = CacheStore::new(temp_dir.path());
        fs::write(store.schema_path(&tf2()), "{ not json").unwrap();

        assert!(store.read_schema(&tf2()).is_err());
    }

    #[test]
    fn test_ensure_dir_creates_nested() {
        let temp_dir = TempDir::new().unwrap();
        let store = CacheStore::new(temp_dir.path().join("repo").join("cache"));
        store.ensure_dir().unwrap();
        assert!(store.root().is_dir());
    }
}

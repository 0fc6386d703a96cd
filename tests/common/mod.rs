//! Shared test utilities for integration and E2E tests.
//!
//! This module provides fixtures and in-memory stand-ins for the Steam Web
//! API and the git remote, so a full sync cycle can run without a network.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = ServiceFixture::new(configs::TF2_ONLY);
//!     fixture.upstream.respond("IEconItems_440", 200, bodies::TF2);
//!     let report = fixture.service().run_cycle().unwrap();
//! }
//! ```

#![allow(dead_code)]

use assert_fs::prelude::*;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use schema_tracker::config::{self, Config};
use schema_tracker::error::{Error, Result};
use schema_tracker::fetch::{FetchResponse, SchemaSource};
use schema_tracker::generator::RustTypeGenerator;
use schema_tracker::git::{Identity, Remote, VersionControl, WorkingTreeStatus};
use schema_tracker::service::{Collaborators, SchemaService};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::{bodies, configs};
    #[allow(unused_imports)]
    pub use super::{FakeRepo, FakeUpstream, ServiceFixture, TestFixture};
}

/// Configuration YAML snippets. `{root}` is replaced with the work root.
pub mod configs {
    /// Tracks Team Fortress 2 only.
    pub const TF2_ONLY: &str = r#"
api_key: TESTKEY
check_interval_ms: 50
work_root: "{root}"
git:
  username: schema-bot
  password: token
  email: schema-bot@example.com
  remote_url: https://example.com/SteamEcon.git
  local_repo: SteamEcon
apps:
  - id: 440
    name: Team Fortress 2
    short_code: TF2
"#;

    /// Tracks Team Fortress 2 and Dota 2.
    pub const TF2_AND_DOTA: &str = r#"
api_key: TESTKEY
check_interval_ms: 50
work_root: "{root}"
git:
  username: schema-bot
  password: token
  email: schema-bot@example.com
  remote_url: https://example.com/SteamEcon.git
  local_repo: SteamEcon
apps:
  - id: 440
    name: Team Fortress 2
    short_code: TF2
  - id: 570
    name: Dota 2
    short_code: Dota2
"#;

    /// Uses the built-in app list.
    pub const BUILTIN_APPS: &str = r#"
api_key: TESTKEY
work_root: "{root}"
git:
  username: schema-bot
  password: token
  email: schema-bot@example.com
  remote_url: https://example.com/SteamEcon.git
  local_repo: SteamEcon
"#;

    /// Parses but has no API key.
    pub const NO_API_KEY: &str = r#"
work_root: "{root}"
git:
  username: schema-bot
  password: token
  email: schema-bot@example.com
  remote_url: https://example.com/SteamEcon.git
  local_repo: SteamEcon
"#;

    /// Two apps share a short code, so their artifacts collide.
    pub const DUPLICATE_SHORT_CODE: &str = r#"
api_key: TESTKEY
work_root: "{root}"
git:
  username: schema-bot
  password: token
  email: schema-bot@example.com
  remote_url: https://example.com/SteamEcon.git
  local_repo: SteamEcon
apps:
  - id: 440
    name: Team Fortress 2
    short_code: TF2
  - id: 441
    name: Team Fortress 2 Beta
    short_code: TF2
"#;

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "api_key: [unclosed";

    pub fn render(template: &str, root: &std::path::Path) -> String {
        template.replace("{root}", &root.display().to_string())
    }
}

/// GetSchema response bodies.
pub mod bodies {
    pub const TF2_ITEMS_URL: &str = "http://x/items.txt";
    pub const TF2_ITEMS_URL_V2: &str = "http://x/items_v2.txt";

    /// Minimal successful TF2 response.
    pub const TF2: &str = r#"{"result":{"status":1,"items_game_url":"http://x/items.txt"}}"#;

    /// Same schema, client schema moved.
    pub const TF2_MOVED: &str =
        r#"{"result":{"status":1,"items_game_url":"http://x/items_v2.txt"}}"#;

    /// Richer TF2 response with items.
    pub const TF2_WITH_ITEMS: &str = r#"{"result":{"status":1,"items_game_url":"http://x/items.txt","items":[{"defindex":5021,"name":"Mann Co. Supply Crate Key"}]}}"#;

    pub const DOTA: &str =
        r#"{"result":{"status":1,"items_game_url":"http://x/dota_items.txt"}}"#;

    /// Well-formed but not successful.
    pub const FAILED_STATUS: &str = r#"{"result":{"status":15,"statusDetail":"denied"}}"#;

    pub const CLIENT_SCHEMA: &str = "\"items_game\"\n{\n\t\"game_info\"\n\t{\n\t}\n}\n";
}

/// One request seen by [`FakeUpstream`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: String,
    pub if_modified_since: Option<SystemTime>,
}

/// Scripted [`SchemaSource`]: responses are queued per URL fragment and
/// anything unscripted answers 304.
#[derive(Default)]
pub struct FakeUpstream {
    routes: Mutex<Vec<(String, VecDeque<FetchResponse>)>>,
    requests: Mutex<Vec<Request>>,
}

impl FakeUpstream {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a response for the first URL containing `fragment`.
    pub fn respond(&self, fragment: &str, status: u16, body: &str) {
        let mut routes = self.routes.lock().unwrap();
        let response = FetchResponse::new(status, body);
        match routes.iter_mut().find(|(f, _)| f == fragment) {
            Some((_, queue)) => queue.push_back(response),
            None => routes.push((fragment.to_string(), VecDeque::from([response]))),
        }
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, fragment: &str) -> Vec<Request> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.contains(fragment))
            .collect()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }
}

impl SchemaSource for FakeUpstream {
    fn fetch(&self, url: &str, if_modified_since: Option<SystemTime>) -> Result<FetchResponse> {
        self.requests.lock().unwrap().push(Request {
            url: url.to_string(),
            if_modified_since,
        });
        let mut routes = self.routes.lock().unwrap();
        let response = routes
            .iter_mut()
            .find(|(fragment, _)| url.contains(fragment.as_str()))
            .and_then(|(_, queue)| queue.pop_front());
        Ok(response.unwrap_or_else(|| FetchResponse::new(304, "")))
    }
}

/// A [`VersionControl`] over the real filesystem with an in-memory history.
///
/// `status` compares the working tree against the last committed content,
/// the way `git status` compares it against `HEAD`.
#[derive(Default)]
pub struct FakeRepo {
    committed: Mutex<HashMap<String, Vec<u8>>>,
    staged: Mutex<HashSet<String>>,
    commits: Mutex<Vec<String>>,
    pushes: Mutex<usize>,
    /// Operation name to fail, e.g. `"push"`
    fail_on: Mutex<Option<&'static str>>,
}

impl FakeRepo {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn commits(&self) -> Vec<String> {
        self.commits.lock().unwrap().clone()
    }

    pub fn pushes(&self) -> usize {
        *self.pushes.lock().unwrap()
    }

    pub fn fail_on(&self, op: Option<&'static str>) {
        *self.fail_on.lock().unwrap() = op;
    }

    fn check(&self, op: &str) -> Result<()> {
        if *self.fail_on.lock().unwrap() == Some(op) {
            return Err(Error::GitCommand {
                command: op.to_string(),
                repo: "fake".to_string(),
                stderr: "simulated failure".to_string(),
            });
        }
        Ok(())
    }

    fn walk(root: &Path, dir: &Path, out: &mut Vec<(String, PathBuf)>) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.file_name().is_some_and(|n| n == ".git") {
                continue;
            }
            if path.is_dir() {
                Self::walk(root, &path, out);
            } else {
                let relative = path
                    .strip_prefix(root)
                    .unwrap()
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/");
                out.push((relative, path));
            }
        }
    }
}

impl VersionControl for FakeRepo {
    fn clone_repo(&self, _remote: &Remote, dir: &Path) -> Result<()> {
        self.check("clone")?;
        std::fs::create_dir_all(dir.join(".git"))?;
        Ok(())
    }

    fn status(&self, dir: &Path) -> Result<WorkingTreeStatus> {
        self.check("status")?;
        let mut files = Vec::new();
        Self::walk(dir, dir, &mut files);
        files.sort();

        let committed = self.committed.lock().unwrap();
        let mut status = WorkingTreeStatus::default();
        for (relative, path) in files {
            let content = std::fs::read(&path)?;
            match committed.get(&relative) {
                None => status.untracked.push(relative),
                Some(old) if *old != content => status.modified.push(relative),
                Some(_) => {}
            }
        }
        Ok(status)
    }

    fn stage(&self, _dir: &Path, path: &str) -> Result<()> {
        self.check("add")?;
        self.staged.lock().unwrap().insert(path.to_string());
        Ok(())
    }

    fn commit(&self, dir: &Path, message: &str, _identity: &Identity) -> Result<()> {
        self.check("commit")?;
        let mut staged = self.staged.lock().unwrap();
        if staged.is_empty() {
            return Err(Error::GitCommand {
                command: "commit".to_string(),
                repo: dir.display().to_string(),
                stderr: "nothing to commit".to_string(),
            });
        }
        let mut committed = self.committed.lock().unwrap();
        for path in staged.drain() {
            committed.insert(path.clone(), std::fs::read(dir.join(&path))?);
        }
        self.commits.lock().unwrap().push(message.to_string());
        Ok(())
    }

    fn fetch(&self, _dir: &Path, _remote: &Remote) -> Result<()> {
        self.check("fetch")
    }

    fn rebase_onto_fetched(&self, _dir: &Path, _identity: &Identity) -> Result<()> {
        self.check("rebase")
    }

    fn push(&self, _dir: &Path, _remote: &Remote) -> Result<()> {
        self.check("push")?;
        *self.pushes.lock().unwrap() += 1;
        Ok(())
    }

    fn set_remote_url(&self, _dir: &Path, _url: &str) -> Result<()> {
        self.check("set-url")
    }
}

/// A work root with a fake upstream and fake remote wired into a service.
pub struct ServiceFixture {
    temp_dir: assert_fs::TempDir,
    config_yaml: String,
    pub upstream: Arc<FakeUpstream>,
    pub repo: Arc<FakeRepo>,
}

impl ServiceFixture {
    pub fn new(config_template: &str) -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        let config_yaml = configs::render(config_template, temp_dir.path());
        Self {
            temp_dir,
            config_yaml,
            upstream: FakeUpstream::new(),
            repo: FakeRepo::new(),
        }
    }

    pub fn config(&self) -> Config {
        config::parse(&self.config_yaml).expect("Failed to parse config")
    }

    pub fn service(&self) -> SchemaService {
        SchemaService::with_collaborators(
            self.config(),
            Collaborators {
                source: self.upstream.clone(),
                vcs: self.repo.clone(),
                generator: Arc::new(RustTypeGenerator),
            },
        )
        .expect("Failed to create service")
    }

    pub fn repo_dir(&self) -> PathBuf {
        self.config().repo_dir()
    }

    pub fn cache_file(&self, name: &str) -> PathBuf {
        self.config().cache_dir().join(name)
    }

    pub fn artifact_file(&self, name: &str) -> PathBuf {
        self.config().artifact_dir().join(name)
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }
}

/// A temporary directory with an optional `.schema-tracker.yaml`, for CLI
/// tests.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a `.schema-tracker.yaml` rendered from `template`.
    pub fn with_config(self, template: &str) -> Self {
        let content = configs::render(template, self.temp_dir.path());
        self.temp_dir
            .child(".schema-tracker.yaml")
            .write_str(&content)
            .expect("Failed to write config file");
        self
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join(".schema-tracker.yaml")
    }

    /// Create a command configured to run in this fixture's directory, with
    /// the tracker's environment cleared.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("schema-tracker");
        cmd.current_dir(self.path())
            .env_remove("SCHEMA_TRACKER_CONFIG")
            .env_remove("SCHEMA_TRACKER_API_KEY")
            .env_remove("SCHEMA_TRACKER_GIT_PASSWORD")
            .env_remove("SCHEMA_TRACKER_WORK_ROOT")
            .env_remove("RUST_LOG");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

//! # Git Operations
//!
//! The [`VersionControl`] trait is the seam between the synchronizer and
//! git, so tests can substitute an in-memory implementation. [`GitCli`] is
//! the real implementation and shells out to the system `git` binary, which
//! keeps transport, TLS and credential handling in git's hands.
//!
//! Credentials are never written to `.git/config`: clones are repointed at
//! the plain remote URL right after cloning, and fetch and push pass the
//! authenticated URL on the command line only. Every error message has the
//! password masked.

use std::path::Path;
use std::process::Command;

use log::{debug, warn};
use url::Url;

use crate::error::{Error, Result};

/// Username and password (or token) for an https remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Author and committer identity for commits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

/// A remote repository plus the credentials used to reach it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remote {
    pub url: String,
    pub credentials: Option<Credentials>,
}

impl Remote {
    pub fn new(url: &str, credentials: Option<Credentials>) -> Self {
        Self {
            url: url.to_string(),
            credentials,
        }
    }

    /// The URL with credentials embedded as userinfo.
    ///
    /// Non-http(s) URLs (ssh, local paths) are returned unchanged.
    pub fn authenticated_url(&self) -> Result<String> {
        let Some(credentials) = &self.credentials else {
            return Ok(self.url.clone());
        };
        let mut url = match Url::parse(&self.url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => url,
            _ => return Ok(self.url.clone()),
        };
        url.set_username(&credentials.username)
            .and_then(|_| url.set_password(Some(&credentials.password)))
            .map_err(|_| Error::Config {
                message: format!("cannot embed credentials into {}", self.url),
                hint: None,
            })?;
        Ok(url.to_string())
    }

    /// Value to mask in command lines and stderr
    fn secret(&self) -> Option<&str> {
        self.credentials
            .as_ref()
            .map(|c| c.password.as_str())
            .filter(|p| !p.is_empty())
    }
}

/// Paths reported by `git status`, relative to the repository root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingTreeStatus {
    /// New files, including files staged as added but never committed
    pub untracked: Vec<String>,
    /// Tracked files whose content changed
    pub modified: Vec<String>,
}

impl WorkingTreeStatus {
    pub fn is_clean(&self) -> bool {
        self.untracked.is_empty() && self.modified.is_empty()
    }
}

/// Trait for git operations - allows mocking in tests
pub trait VersionControl: Send + Sync {
    /// Whether `dir` holds a working copy
    fn is_cloned(&self, dir: &Path) -> bool {
        dir.join(".git").is_dir()
    }

    /// Clone `remote` into `dir`
    fn clone_repo(&self, remote: &Remote, dir: &Path) -> Result<()>;

    /// Untracked and modified files of the working copy
    fn status(&self, dir: &Path) -> Result<WorkingTreeStatus>;

    /// Stage one path for the next commit
    fn stage(&self, dir: &Path, path: &str) -> Result<()>;

    /// Commit the staged files with `identity` as author and committer
    fn commit(&self, dir: &Path, message: &str, identity: &Identity) -> Result<()>;

    /// Fetch the current branch from `remote` into `FETCH_HEAD`
    fn fetch(&self, dir: &Path, remote: &Remote) -> Result<()>;

    /// Rebase local commits onto `FETCH_HEAD`, committing as `identity`
    fn rebase_onto_fetched(&self, dir: &Path, identity: &Identity) -> Result<()>;

    /// Push the current branch to `remote`
    fn push(&self, dir: &Path, remote: &Remote) -> Result<()>;

    /// Point `origin` at `url`
    fn set_remote_url(&self, dir: &Path, url: &str) -> Result<()>;
}

/// The default implementation of `VersionControl`, which runs the system
/// `git` command.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitCli;

impl GitCli {
    fn current_branch(&self, dir: &Path) -> Result<String> {
        let branch = run_git(dir, &["rev-parse", "--abbrev-ref", "HEAD"], None)?;
        Ok(branch.trim().to_string())
    }
}

impl VersionControl for GitCli {
    fn clone_repo(&self, remote: &Remote, dir: &Path) -> Result<()> {
        if let Some(parent) = dir.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let authed = remote.authenticated_url()?;
        let output = Command::new("git")
            .arg("clone")
            .arg(&authed)
            .arg(dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .map_err(|e| Error::GitClone {
                url: remote.url.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = mask(&String::from_utf8_lossy(&output.stderr), remote.secret());
            let message = if stderr.contains("Authentication failed")
                || stderr.contains("Permission denied")
                || stderr.contains("Could not read from remote repository")
            {
                format!(
                    "Authentication failed. Check the configured git username and password.\n\
                    Error: {}",
                    stderr
                )
            } else {
                stderr
            };
            return Err(Error::GitClone {
                url: remote.url.clone(),
                message,
            });
        }

        // Keep the credentials out of .git/config
        self.set_remote_url(dir, &remote.url)
    }

    fn status(&self, dir: &Path) -> Result<WorkingTreeStatus> {
        let output = run_git(
            dir,
            &["status", "--porcelain=v1", "-z", "--untracked-files=all"],
            None,
        )?;
        Ok(parse_porcelain(&output))
    }

    fn stage(&self, dir: &Path, path: &str) -> Result<()> {
        run_git(dir, &["add", "--", path], None).map(|_| ())
    }

    fn commit(&self, dir: &Path, message: &str, identity: &Identity) -> Result<()> {
        let name = format!("user.name={}", identity.name);
        let email = format!("user.email={}", identity.email);
        let author = format!("{} <{}>", identity.name, identity.email);
        run_git(
            dir,
            &["-c", &name, "-c", &email, "commit", "--author", &author, "-m", message],
            None,
        )
        .map(|_| ())
    }

    fn fetch(&self, dir: &Path, remote: &Remote) -> Result<()> {
        let branch = self.current_branch(dir)?;
        let authed = remote.authenticated_url()?;
        run_git(dir, &["fetch", &authed, &branch], remote.secret()).map(|_| ())
    }

    fn rebase_onto_fetched(&self, dir: &Path, identity: &Identity) -> Result<()> {
        let name = format!("user.name={}", identity.name);
        let email = format!("user.email={}", identity.email);
        let result = run_git(dir, &["-c", &name, "-c", &email, "rebase", "FETCH_HEAD"], None);
        if result.is_err() {
            // Leave the working copy usable for the next cycle
            if let Err(e) = run_git(dir, &["rebase", "--abort"], None) {
                warn!("Could not abort failed rebase: {}", e);
            }
        }
        result.map(|_| ())
    }

    fn push(&self, dir: &Path, remote: &Remote) -> Result<()> {
        let branch = self.current_branch(dir)?;
        let authed = remote.authenticated_url()?;
        let refspec = format!("HEAD:{}", branch);
        run_git(dir, &["push", &authed, &refspec], remote.secret()).map(|_| ())
    }

    fn set_remote_url(&self, dir: &Path, url: &str) -> Result<()> {
        run_git(dir, &["remote", "set-url", "origin", url], None).map(|_| ())
    }
}

/// Run `git` in `dir`, returning stdout. `secret` is masked in errors.
fn run_git(dir: &Path, args: &[&str], secret: Option<&str>) -> Result<String> {
    let command = mask(&args.join(" "), secret);
    debug!("git {} (in {})", command, dir.display());

    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .map_err(|e| Error::GitCommand {
            command: command.clone(),
            repo: dir.display().to_string(),
            stderr: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let detail = if stderr.trim().is_empty() { stdout } else { stderr };
        return Err(Error::GitCommand {
            command,
            repo: dir.display().to_string(),
            stderr: mask(detail.trim(), secret),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn mask(text: &str, secret: Option<&str>) -> String {
    match secret {
        Some(secret) => text.replace(secret, "***"),
        None => text.to_string(),
    }
}

/// Parse `git status --porcelain=v1 -z` output.
pub fn parse_porcelain(output: &str) -> WorkingTreeStatus {
    let mut status = WorkingTreeStatus::default();
    let mut entries = output.split('\0').filter(|e| !e.is_empty());

    while let Some(entry) = entries.next() {
        if entry.len() < 4 {
            continue;
        }
        let (code, path) = entry.split_at(3);
        let mut flags = code.chars();
        let index = flags.next().unwrap_or(' ');
        let worktree = flags.next().unwrap_or(' ');

        // Renames and copies carry the original path as a separate entry
        if index == 'R' || index == 'C' {
            entries.next();
        }

        match (index, worktree) {
            ('?', '?') | ('A', _) => status.untracked.push(path.to_string()),
            ('M', _) | (_, 'M') | ('R', _) => status.modified.push(path.to_string()),
            _ => {}
        }
    }
    status
}

//! Remote targets
//!
//! A resource entry naming a repository instead of a local path is fetched
//! into a staging directory before it is built. Fetching sits behind the
//! [`Fetcher`] trait; [`GitFetcher`] shells out to `git`.

use std::fmt::{self, Display, Formatter};
use std::path::Path;
use std::process::Command;

use crate::error::LoaderError;

/// Hosts written without a scheme
const SHORTHAND_HOSTS: &[&str] = &["github.com/", "gitlab.com/", "bitbucket.org/"];

/// Prefixes marking a remote target
const REMOTE_PREFIXES: &[&str] = &["git::", "git@", "https://", "http://"];

/// Check if a resource entry names a remote target
#[must_use]
pub fn is_remote_target(target: &str) -> bool {
    SHORTHAND_HOSTS
        .iter()
        .chain(REMOTE_PREFIXES)
        .any(|prefix| target.starts_with(prefix))
}

/// Parsed remote target
///
/// `github.com/org/repo//deploy/base?ref=v1` clones
/// `https://github.com/org/repo.git` at `v1` and builds `deploy/base`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    /// Target as written
    pub raw: String,
    /// Clone URL
    pub repo: String,
    /// Directory inside the repository
    pub subdir: Option<String>,
    /// Branch or tag
    pub git_ref: Option<String>,
}

impl RemoteTarget {
    /// Parse a remote target
    ///
    /// # Errors
    /// Returns [`LoaderError::InvalidRemote`] if no repository can be read
    pub fn parse(raw: &str) -> Result<Self, LoaderError> {
        let invalid = || LoaderError::InvalidRemote(raw.to_string());

        let (location, git_ref) = match raw.split_once("?ref=") {
            Some((location, r)) if !r.is_empty() => (location, Some(r.to_string())),
            Some(_) => return Err(invalid()),
            None => (raw, None),
        };
        let location = location.strip_prefix("git::").unwrap_or(location);

        let (scheme, rest) = match location.find("://") {
            Some(i) => location.split_at(i + 3),
            None => ("", location),
        };

        let (repo_part, subdir) = match rest.split_once("//") {
            Some((repo, sub)) => (repo.to_string(), non_empty(sub)),
            None if scheme.is_empty() && SHORTHAND_HOSTS.iter().any(|h| rest.starts_with(h)) => {
                // host/org/repo[/subdir]
                let mut parts = rest.splitn(4, '/');
                let host = parts.next().ok_or_else(invalid)?;
                let org = parts.next().ok_or_else(invalid)?;
                let repo = parts.next().ok_or_else(invalid)?;
                (format!("{host}/{org}/{repo}"), parts.next().and_then(non_empty))
            }
            None => (rest.to_string(), None),
        };

        let repo_part = repo_part.trim_end_matches('/');
        if repo_part.is_empty() || repo_part.split('/').any(str::is_empty) && !repo_part.contains(':') {
            return Err(invalid());
        }

        let repo = if scheme.is_empty() && SHORTHAND_HOSTS.iter().any(|h| repo_part.starts_with(h)) {
            let with_suffix = if repo_part.ends_with(".git") {
                repo_part.to_string()
            } else {
                format!("{repo_part}.git")
            };
            format!("https://{with_suffix}")
        } else {
            format!("{scheme}{repo_part}")
        };

        Ok(Self {
            raw: raw.to_string(),
            repo,
            subdir,
            git_ref,
        })
    }
}

impl Display for RemoteTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim_matches('/');
    (!s.is_empty()).then(|| s.to_string())
}

/// Materializes a remote repository on disk
pub trait Fetcher: std::fmt::Debug + Send + Sync {
    /// Fetch `target` into `dest`, which does not exist yet
    ///
    /// # Errors
    /// Returns [`LoaderError::Fetch`] on failure
    fn fetch(&self, target: &RemoteTarget, dest: &Path) -> Result<(), LoaderError>;
}

/// Fetches with `git clone --depth 1`
#[derive(Debug, Clone, Default)]
pub struct GitFetcher;

impl Fetcher for GitFetcher {
    fn fetch(&self, target: &RemoteTarget, dest: &Path) -> Result<(), LoaderError> {
        let mut cmd = Command::new("git");
        cmd.arg("clone").arg("--depth").arg("1").arg("--quiet");
        if let Some(r) = &target.git_ref {
            cmd.arg("--branch").arg(r);
        }
        cmd.arg("--").arg(&target.repo).arg(dest);
        cmd.env("GIT_TERMINAL_PROMPT", "0");

        tracing::debug!(repo = %target.repo, git_ref = ?target.git_ref, "cloning remote target");
        let output = cmd.output().map_err(|e| LoaderError::Fetch {
            target: target.raw.clone(),
            reason: format!("failed to spawn git: {e}"),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(LoaderError::Fetch {
                target: target.raw.clone(),
                reason: if stderr.is_empty() {
                    format!("git clone exited with {}", output.status)
                } else {
                    stderr
                },
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_remote_targets() {
        for remote in [
            "github.com/org/repo",
            "gitlab.com/org/repo//base",
            "bitbucket.org/org/repo",
            "git::https://example.com/repo.git",
            "git@github.com:org/repo.git",
            "https://example.com/repo.git",
            "http://example.com/repo.git",
        ] {
            assert!(is_remote_target(remote), "{remote}");
        }
        for local in ["../base", "deployment.yaml", "/abs/path", "github.company.yaml"] {
            assert!(!is_remote_target(local), "{local}");
        }
    }

    #[test]
    fn parses_shorthand_with_subdir_and_ref() {
        let t = RemoteTarget::parse("github.com/org/repo//deploy/base?ref=v1").unwrap();
        assert_eq!(t.repo, "https://github.com/org/repo.git");
        assert_eq!(t.subdir.as_deref(), Some("deploy/base"));
        assert_eq!(t.git_ref.as_deref(), Some("v1"));
    }

    #[test]
    fn parses_shorthand_path_as_subdir() {
        let t = RemoteTarget::parse("github.com/org/repo/examples/hello").unwrap();
        assert_eq!(t.repo, "https://github.com/org/repo.git");
        assert_eq!(t.subdir.as_deref(), Some("examples/hello"));
        assert_eq!(t.git_ref, None);
    }

    #[test]
    fn parses_scheme_urls() {
        let t = RemoteTarget::parse("git::https://example.com/team/repo.git//base").unwrap();
        assert_eq!(t.repo, "https://example.com/team/repo.git");
        assert_eq!(t.subdir.as_deref(), Some("base"));

        let t = RemoteTarget::parse("git@github.com:org/repo.git?ref=main").unwrap();
        assert_eq!(t.repo, "git@github.com:org/repo.git");
        assert_eq!(t.subdir, None);
        assert_eq!(t.git_ref.as_deref(), Some("main"));
    }

    #[test]
    fn rejects_malformed_targets() {
        assert!(RemoteTarget::parse("github.com/org").is_err());
        assert!(RemoteTarget::parse("https://example.com/repo?ref=").is_err());
    }
}

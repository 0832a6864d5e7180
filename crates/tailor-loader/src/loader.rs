//! Root-restricted file loader
//!
//! A [`FileLoader`] reads files relative to its root. Under
//! [`LoadRestriction::RootOnly`] no target may resolve outside the root,
//! symlinks included. A base directory is its own root, so an overlay
//! may name `../base` while the files of each stay confined. Bases reached
//! from a remote checkout must stay inside that checkout.
//!
//! Remote bases are fetched into a staging directory that lives as long as
//! the loaders reading from it, and is removed when the last one is dropped,
//! whether the build succeeded or not. A remote base is always root-only,
//! whatever the restriction of the loader that reached it.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use crate::error::LoaderError;
use crate::remote::{is_remote_target, Fetcher, GitFetcher, RemoteTarget};

/// How far a loader may reach
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadRestriction {
    /// Only the root and below
    #[default]
    RootOnly,
    /// Anywhere
    None,
}

/// Reads sources relative to a root directory
#[derive(Debug, Clone)]
pub struct FileLoader {
    root: PathBuf,
    restriction: LoadRestriction,
    fetcher: Arc<dyn Fetcher>,
    /// Keeps the remote staging directory alive
    staging: Option<Arc<TempDir>>,
    /// Remote target this loader was created for
    remote: Option<String>,
    /// Checkout no base below a remote target may leave
    checkout: Option<PathBuf>,
}

impl FileLoader {
    /// Create loader rooted at a local directory
    ///
    /// # Errors
    /// Returns [`LoaderError::Io`] if the root cannot be resolved and
    /// [`LoaderError::NotADirectory`] if it is not a directory.
    pub fn new(root: impl AsRef<Path>, restriction: LoadRestriction) -> Result<Self, LoaderError> {
        let root = canonical(root.as_ref())?;
        if !root.is_dir() {
            return Err(LoaderError::NotADirectory(root));
        }
        Ok(Self {
            root,
            restriction,
            fetcher: Arc::new(GitFetcher),
            staging: None,
            remote: None,
            checkout: None,
        })
    }

    /// Use another fetcher for remote targets
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Canonical root
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Restriction in force
    #[inline]
    #[must_use]
    pub fn restriction(&self) -> LoadRestriction {
        self.restriction
    }

    /// Remote target this loader reads, if any
    #[inline]
    #[must_use]
    pub fn remote(&self) -> Option<&str> {
        self.remote.as_deref()
    }

    /// Resolve a target relative to the root, enforcing the restriction
    ///
    /// # Errors
    /// - [`LoaderError::Io`] if the target does not exist
    /// - [`LoaderError::RestrictionViolation`] if it escapes a root-only root
    pub fn resolve(&self, target: impl AsRef<Path>) -> Result<PathBuf, LoaderError> {
        let path = canonical(&self.root.join(target))?;
        if self.restriction == LoadRestriction::RootOnly && !path.starts_with(&self.root) {
            return Err(LoaderError::RestrictionViolation {
                path,
                root: self.root.clone(),
            });
        }
        Ok(path)
    }

    /// Read a file relative to the root
    ///
    /// # Errors
    /// Same as [`FileLoader::resolve`], plus [`LoaderError::Io`] on read failure
    pub fn load(&self, target: impl AsRef<Path>) -> Result<String, LoaderError> {
        let path = self.resolve(target)?;
        tracing::trace!(path = %path.display(), "loading file");
        fs::read_to_string(&path).map_err(|source| LoaderError::Io { path, source })
    }

    /// Check if a target names a base (directory or remote) rather than a file
    ///
    /// # Errors
    /// Returns [`LoaderError::Io`] if a local target does not exist
    pub fn is_base(&self, target: &str) -> Result<bool, LoaderError> {
        if is_remote_target(target) {
            return Ok(true);
        }
        Ok(canonical(&self.root.join(target))?.is_dir())
    }

    /// Loader for a base directory or remote target
    ///
    /// # Errors
    /// - [`LoaderError::Io`] if a local base does not exist
    /// - [`LoaderError::RestrictionViolation`] if a base leaves a remote checkout
    /// - [`LoaderError::Fetch`] / [`LoaderError::InvalidRemote`] for remote bases
    /// - [`LoaderError::NotADirectory`] if the base is not a directory
    pub fn child(&self, target: &str) -> Result<FileLoader, LoaderError> {
        if is_remote_target(target) {
            return self.remote_child(target);
        }

        let root = canonical(&self.root.join(target))?;
        if let Some(checkout) = &self.checkout {
            if !root.starts_with(checkout) {
                return Err(LoaderError::RestrictionViolation {
                    path: root,
                    root: checkout.clone(),
                });
            }
        }
        if !root.is_dir() {
            return Err(LoaderError::NotADirectory(root));
        }
        Ok(Self {
            root,
            restriction: self.restriction,
            fetcher: Arc::clone(&self.fetcher),
            staging: self.staging.clone(),
            remote: self.remote.clone(),
            checkout: self.checkout.clone(),
        })
    }

    fn remote_child(&self, target: &str) -> Result<FileLoader, LoaderError> {
        let remote = RemoteTarget::parse(target)?;
        let staging = TempDir::new().map_err(|source| LoaderError::Io {
            path: std::env::temp_dir(),
            source,
        })?;

        // Dropping `staging` on any error below removes the directory
        let checkout = staging.path().join("repo");
        self.fetcher.fetch(&remote, &checkout)?;

        let repo_root = canonical(&checkout)?;
        let root = match &remote.subdir {
            Some(sub) => {
                let root = canonical(&repo_root.join(sub))?;
                if !root.starts_with(&repo_root) {
                    return Err(LoaderError::RestrictionViolation { path: root, root: repo_root });
                }
                root
            }
            None => repo_root.clone(),
        };
        if !root.is_dir() {
            return Err(LoaderError::NotADirectory(root));
        }

        tracing::debug!(remote = target, root = %root.display(), "fetched remote base");
        Ok(Self {
            root,
            restriction: LoadRestriction::RootOnly,
            fetcher: Arc::clone(&self.fetcher),
            staging: Some(Arc::new(staging)),
            remote: Some(target.to_string()),
            checkout: Some(repo_root),
        })
    }
}

fn canonical(path: &Path) -> Result<PathBuf, LoaderError> {
    path.canonicalize().map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

//! Build driver
//!
//! Builds a directory: reads its build file, loads every resource entry
//! (files are decoded, bases are built recursively and merged), then runs
//! the directory's own pipeline over the result.
//!
//! A finished base is merged with its current names taken as original
//! ones, so the overlay's renames are resolved against what the base
//! produced.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tailor_resource::{codec, ResourceCollection};
use tailor_transform::Warning;

use crate::config::{BuildConfig, BUILD_FILE};
use crate::error::BuildError;
use crate::loader::{FileLoader, LoadRestriction};
use crate::remote::{Fetcher, GitFetcher};

/// Result of a successful build
#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    /// Final resources in output order
    pub collection: ResourceCollection,
    /// Recoverable conditions from every pipeline that ran
    pub warnings: Vec<Warning>,
}

impl BuildOutput {
    /// Render as a multi-document YAML stream
    ///
    /// # Errors
    /// Returns [`BuildError::Codec`] if encoding fails
    pub fn render(&self) -> Result<String, BuildError> {
        Ok(codec::encode_collection(&self.collection)?)
    }
}

/// Builds directories holding a build file
#[derive(Debug, Clone)]
pub struct Builder {
    restriction: LoadRestriction,
    fetcher: Arc<dyn Fetcher>,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    /// Create root-only builder fetching remote bases with git
    #[must_use]
    pub fn new() -> Self {
        Self {
            restriction: LoadRestriction::RootOnly,
            fetcher: Arc::new(GitFetcher),
        }
    }

    /// Set the load restriction of the top-level directory
    #[must_use]
    pub fn with_restriction(mut self, restriction: LoadRestriction) -> Self {
        self.restriction = restriction;
        self
    }

    /// Use another fetcher for remote bases
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Build a directory
    ///
    /// # Errors
    /// Any [`BuildError`]; nothing is returned for a partial build.
    pub fn build(&self, dir: impl AsRef<Path>) -> Result<BuildOutput, BuildError> {
        let loader = FileLoader::new(dir, self.restriction)?.with_fetcher(Arc::clone(&self.fetcher));
        let mut stack = Vec::new();
        self.build_with(&loader, &mut stack)
    }

    fn build_with(&self, loader: &FileLoader, stack: &mut Vec<PathBuf>) -> Result<BuildOutput, BuildError> {
        let root = loader.root().to_path_buf();
        if stack.contains(&root) {
            return Err(BuildError::Cycle(root));
        }
        stack.push(root.clone());

        let text = loader.load(BUILD_FILE)?;
        let config = BuildConfig::from_yaml(&text).map_err(|source| BuildError::Config {
            path: root.join(BUILD_FILE),
            source,
        })?;
        tracing::debug!(dir = %root.display(), resources = config.resources.len(), "building");

        let mut output = BuildOutput::default();
        for entry in &config.resources {
            if loader.is_base(entry)? {
                let child = loader.child(entry)?;
                let base = self.build_with(&child, stack)?;
                output.collection.absorb(base.collection.rebased())?;
                output.warnings.extend(base.warnings);
            } else {
                let source = loader.resolve(entry)?;
                let text = loader.load(entry)?;
                let origin = match loader.remote() {
                    Some(remote) => format!("{remote}:{entry}"),
                    None => source.display().to_string(),
                };
                for resource in codec::decode_resources(&text, &origin)? {
                    output.collection.add(resource)?;
                }
            }
        }

        let report = config.pipeline()?.run(&mut output.collection)?;
        output.warnings.extend(report.warnings);

        stack.pop();
        tracing::info!(
            dir = %root.display(),
            resources = output.collection.len(),
            warnings = output.warnings.len(),
            "build complete"
        );
        Ok(output)
    }
}

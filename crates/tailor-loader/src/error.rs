//! Error types for loading and building

use std::path::PathBuf;

use tailor_resource::{CodecError, ResourceError};
use tailor_transform::{PipelineError, TransformError};

/// Errors raised while reading sources
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    /// Target resolves outside the permitted root
    #[error("'{}' is not within root '{}'", .path.display(), .root.display())]
    RestrictionViolation {
        /// Resolved target
        path: PathBuf,
        /// Permitted root
        root: PathBuf,
    },

    /// Filesystem access failed
    #[error("cannot read '{}': {source}", .path.display())]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Loader root is not a directory
    #[error("'{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// Remote target could not be fetched
    #[error("failed to fetch '{target}': {reason}")]
    Fetch {
        /// Remote target as written
        target: String,
        /// What went wrong
        reason: String,
    },

    /// Remote target could not be parsed
    #[error("invalid remote target '{0}'")]
    InvalidRemote(String),
}

impl LoaderError {
    /// Check if the error is a root-containment violation
    #[inline]
    #[must_use]
    pub fn is_restriction_violation(&self) -> bool {
        matches!(self, Self::RestrictionViolation { .. })
    }
}

/// Errors raised while building a directory
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Loading failed
    #[error(transparent)]
    Loader(#[from] LoaderError),

    /// Build file is malformed
    #[error("invalid build file '{}': {source}", .path.display())]
    Config {
        /// Build file
        path: PathBuf,
        /// Parse error
        #[source]
        source: serde_yaml::Error,
    },

    /// Manifest is malformed
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Resources could not be merged
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Configured transformer is invalid
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// Pipeline halted
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Build directories include each other
    #[error("build cycle: '{}' includes itself", .0.display())]
    Cycle(PathBuf),
}

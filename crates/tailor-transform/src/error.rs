//! Error and warning types for transformers
//!
//! Provides error handling for:
//! - Shape conflicts met while matching
//! - Identity collisions and failed writes at commit time
//! - Terminals a rewrite cannot handle
//! - Invalid transformer configuration
//!
//! Recoverable conditions are [`Warning`] values, never errors.

use std::fmt::{self, Display, Formatter};

use tailor_fieldspec::MatchError;
use tailor_resource::{ResId, ResourceError, Shape};

/// Errors raised by a single transformer
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// Matching failed
    #[error(transparent)]
    Match(#[from] MatchError),

    /// Commit rejected by the collection
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Rewrite needs a scalar terminal
    #[error("{resource}: field '{path}' is a {found}, expected a scalar")]
    NotAScalar {
        /// Resource holding the field
        resource: ResId,
        /// Location of the field
        path: String,
        /// Shape actually present
        found: Shape,
    },

    /// Rewrite needs a mapping terminal
    #[error("{resource}: field '{path}' is a {found}, expected a mapping")]
    NotAMapping {
        /// Resource holding the field
        resource: ResId,
        /// Location of the field
        path: String,
        /// Shape actually present
        found: Shape,
    },

    /// Transformer configuration could not be parsed
    #[error("failed to parse transformer configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Transformer configuration is semantically invalid
    #[error("invalid transformer configuration: {0}")]
    InvalidConfig(String),
}

impl TransformError {
    /// Check if the error is an identity collision or duplicate
    #[inline]
    #[must_use]
    pub fn is_identity_error(&self) -> bool {
        matches!(self, Self::Resource(e) if e.is_identity_error())
    }

    /// Check if the error comes from a shape conflict
    #[inline]
    #[must_use]
    pub fn is_shape_conflict(&self) -> bool {
        matches!(self, Self::Match(MatchError::ShapeConflict { .. }))
    }
}

/// Pipeline halted at a failing step
///
/// The collection holds the state left by every step before `step`.
#[derive(Debug, thiserror::Error)]
#[error("step {step} ({transformer}) failed: {source}")]
pub struct PipelineError {
    /// Zero-based index of the failing step
    pub step: usize,
    /// Name of the failing transformer
    pub transformer: String,
    /// Underlying failure
    #[source]
    pub source: TransformError,
    /// Warnings collected by the steps that succeeded
    pub warnings: Vec<Warning>,
}

/// Recoverable condition reported alongside a result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Several renamed resources could be the referent; the field was left as is
    AmbiguousReference {
        /// Resource holding the reference
        referrer: ResId,
        /// Location of the reference field
        path: String,
        /// Value of the reference field
        value: String,
        /// Current identities of every candidate referent
        candidates: Vec<ResId>,
    },

    /// The field holds a name the referent carried between two renames
    StaleIntermediateReference {
        /// Resource holding the reference
        referrer: ResId,
        /// Location of the reference field
        path: String,
        /// Value of the reference field
        value: String,
        /// Current identity of the referent
        referent: ResId,
    },
}

impl Warning {
    /// Resource holding the reference
    #[must_use]
    pub fn referrer(&self) -> &ResId {
        match self {
            Self::AmbiguousReference { referrer, .. }
            | Self::StaleIntermediateReference { referrer, .. } => referrer,
        }
    }
}

impl Display for Warning {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::AmbiguousReference {
                referrer,
                path,
                value,
                candidates,
            } => {
                write!(f, "ambiguous reference '{value}' at {referrer} '{path}'; candidates: ")?;
                for (i, candidate) in candidates.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{candidate}")?;
                }
                Ok(())
            }
            Self::StaleIntermediateReference {
                referrer,
                path,
                value,
                referent,
            } => write!(
                f,
                "reference '{value}' at {referrer} '{path}' names a superseded name of {referent}"
            ),
        }
    }
}

//! Error types for resources and collections

use crate::gvk::ResId;
use crate::node::Shape;

/// Errors raised by resources and the resource collection
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// A resource with the same identity is already in the collection
    #[error("duplicate identity: {0}")]
    DuplicateIdentity(ResId),

    /// A rename would make two resources share one identity
    #[error("identity collision: renaming {renamed} to {target} collides with {existing}")]
    IdentityCollision {
        /// Identity the renamed resource would take
        target: ResId,
        /// Current identity of the resource being renamed
        renamed: ResId,
        /// Current identity of the resource already holding (or also taking) `target`
        existing: ResId,
    },

    /// No resource with this identity
    #[error("no such resource: {0}")]
    NotFound(ResId),

    /// Collection position out of range
    #[error("no resource at position {0}")]
    PositionOutOfRange(usize),

    /// Required field absent from a document
    #[error("missing required field '{field}'{}", fmt_origin(.origin.as_deref()))]
    MissingField {
        /// Field path
        field: &'static str,
        /// Where the document came from
        origin: Option<String>,
    },

    /// Field present but unusable
    #[error("invalid field '{field}': {reason}{}", fmt_origin(.origin.as_deref()))]
    InvalidField {
        /// Field path
        field: &'static str,
        /// What is wrong with it
        reason: String,
        /// Where the document came from
        origin: Option<String>,
    },

    /// Write met a node of the wrong shape
    #[error("expected {expected} at '{path}', found {found}")]
    Shape {
        /// Location of the offending node
        path: String,
        /// Shape the write needed
        expected: Shape,
        /// Shape actually present
        found: Shape,
    },

    /// Write addressed a sequence element that does not exist
    #[error("index {index} out of range at '{path}' (length {len})")]
    IndexOutOfRange {
        /// Location of the sequence element
        path: String,
        /// Requested index
        index: usize,
        /// Sequence length
        len: usize,
    },

    /// A field write failed for a specific resource
    #[error("cannot write '{path}' in {resource}: {source}")]
    Write {
        /// Resource being written
        resource: ResId,
        /// Target location
        path: String,
        /// Underlying failure
        #[source]
        source: Box<ResourceError>,
    },
}

impl ResourceError {
    /// Check if the error is about resource identity
    #[inline]
    #[must_use]
    pub fn is_identity_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateIdentity(_) | Self::IdentityCollision { .. }
        )
    }
}

fn fmt_origin(origin: Option<&str>) -> String {
    origin.map(|o| format!(" in {o}")).unwrap_or_default()
}

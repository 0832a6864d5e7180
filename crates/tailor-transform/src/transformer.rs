//! Transformer trait and outcome
//!
//! Provides the [`Transformer`] trait every pipeline step implements.

use tailor_resource::{CommitSummary, ResourceCollection};

use crate::error::TransformError;

/// One step of a pipeline
///
/// # Contract
/// `transform` is all-or-nothing: on error the collection must be exactly
/// as it was before the call.
pub trait Transformer: std::fmt::Debug {
    /// Transformer name (for diagnostics)
    fn name(&self) -> &str;

    /// Apply to the collection
    ///
    /// # Errors
    /// Any [`TransformError`]; the collection is untouched in that case.
    fn transform(&self, collection: &mut ResourceCollection) -> Result<TransformOutcome, TransformError>;
}

impl<T: Transformer + ?Sized> Transformer for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn transform(&self, collection: &mut ResourceCollection) -> Result<TransformOutcome, TransformError> {
        (**self).transform(collection)
    }
}

/// What a transformer did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformOutcome {
    /// Number of field writes applied
    pub fields_written: usize,
    /// Number of resources whose identity changed
    pub identities_changed: usize,
}

impl TransformOutcome {
    /// Check if references may need repair
    #[inline]
    #[must_use]
    pub fn is_identity_changing(&self) -> bool {
        self.identities_changed > 0
    }
}

impl From<CommitSummary> for TransformOutcome {
    fn from(summary: CommitSummary) -> Self {
        Self {
            fields_written: summary.fields_written,
            identities_changed: summary.identities_changed,
        }
    }
}

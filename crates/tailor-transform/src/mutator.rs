//! Generic two-phase field mutator
//!
//! A [`FieldMutator`] resolves its field specs, asks a [`ValueRewrite`] for
//! the new value at every location and commits the result as one
//! [`ChangeBatch`]. Nothing is written until every location is planned and
//! the batch's final identities are known to be unique.

use std::collections::HashSet;

use tailor_fieldspec::{FieldSpec, PathMatch, PathMatcher};
use tailor_resource::{ChangeBatch, ConcretePath, Node, ResourceCollection};

use crate::error::TransformError;
use crate::transformer::TransformOutcome;

/// Value rewrite applied at every matched location
pub trait ValueRewrite: std::fmt::Debug {
    /// New value for a location
    ///
    /// `found.value` is `None` when the field is absent and may be created.
    /// Returning `Ok(None)` leaves the location untouched.
    ///
    /// # Errors
    /// Returns [`TransformError`] when the value cannot be rewritten
    fn rewrite(&self, found: &PathMatch) -> Result<Option<Node>, TransformError>;

    /// Check if the rewrite never changes anything
    fn is_identity(&self) -> bool {
        false
    }
}

/// Field specs plus a rewrite
#[derive(Debug, Clone)]
pub struct FieldMutator<R> {
    field_specs: Vec<FieldSpec>,
    rewrite: R,
}

impl<R: ValueRewrite> FieldMutator<R> {
    /// Create mutator
    #[inline]
    #[must_use]
    pub fn new(field_specs: Vec<FieldSpec>, rewrite: R) -> Self {
        Self { field_specs, rewrite }
    }

    /// Field specs in order
    #[inline]
    #[must_use]
    pub fn field_specs(&self) -> &[FieldSpec] {
        &self.field_specs
    }

    /// The rewrite
    #[inline]
    #[must_use]
    pub fn rewrite(&self) -> &R {
        &self.rewrite
    }

    /// Plan every write without touching the collection
    ///
    /// Locations reached by more than one spec are rewritten once.
    ///
    /// # Errors
    /// Returns [`TransformError::Match`] on a shape conflict, or whatever the
    /// rewrite raises.
    pub fn plan(&self, collection: &ResourceCollection) -> Result<ChangeBatch, TransformError> {
        let mut batch = ChangeBatch::new();
        if self.rewrite.is_identity() {
            return Ok(batch);
        }

        let matcher = PathMatcher::new(collection);
        let mut seen: HashSet<(usize, ConcretePath)> = HashSet::new();

        for spec in &self.field_specs {
            for found in matcher.find(spec)? {
                if !seen.insert((found.position, found.path.clone())) {
                    continue;
                }
                let Some(value) = self.rewrite.rewrite(&found)? else {
                    continue;
                };
                if found.value.as_ref() == Some(&value) {
                    continue;
                }
                tracing::debug!(resource = %found.resource, path = %found.path, "planned write");
                batch.push(found.position, found.path, value);
            }
        }
        Ok(batch)
    }

    /// Plan and commit atomically
    ///
    /// # Errors
    /// Same as [`FieldMutator::plan`], plus [`TransformError::Resource`] when
    /// the commit is rejected. The collection is unchanged on any error.
    pub fn apply(&self, collection: &mut ResourceCollection) -> Result<TransformOutcome, TransformError> {
        let batch = self.plan(collection)?;
        let summary = collection.commit(batch)?;
        Ok(summary.into())
    }
}

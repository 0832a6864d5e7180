//! Name-reference engine
//!
//! Repairs references after resources were renamed. For every catalog row,
//! the referrer fields are located with the path matcher; a field whose
//! value still equals the name a renamed referent had when references were
//! last repaired is rewritten to that referent's current name.
//!
//! # Resolution rules
//! - Only resources renamed since the last repair, of a kind the row
//!   accepts, are candidates. A field matches a candidate holding its value
//!   as original name or as last repaired name.
//! - The namespace a field points into is the referrer's own, unless the
//!   row names a sibling field carrying it (binding subjects do).
//! - A field naming a resource that still carries that name (no pending
//!   rename, same kind, same namespace) is left alone.
//! - Several candidates: the one in the field's namespace wins; if that
//!   does not single one out, the field is left alone and a
//!   [`Warning::AmbiguousReference`] is reported.
//! - A field holding a name the referent carried between two renames with
//!   no repair in between is left alone and reported as
//!   [`Warning::StaleIntermediateReference`].
//!
//! A successful run takes every current name as the last repaired one, so
//! a second run with no rename in between writes nothing.

use std::sync::Arc;

use indexmap::IndexMap;
use tailor_fieldspec::{PathMatch, PathMatcher};
use tailor_resource::{
    same_namespace, ChangeBatch, ConcretePath, Node, ResId, Resource, ResourceCollection, Step,
};

use crate::catalog::{ReferenceCatalog, ReferenceSpec};
use crate::error::{TransformError, Warning};

/// Planned reference repairs
#[derive(Debug, Clone, Default)]
pub struct NameRefPlan {
    /// Field rewrites
    pub batch: ChangeBatch,
    /// Fields left alone, with the reason
    pub warnings: Vec<Warning>,
}

/// Result of an engine run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameRefReport {
    /// Number of reference fields rewritten
    pub rewrites: usize,
    /// Recoverable conditions met along the way
    pub warnings: Vec<Warning>,
}

/// Rewrites reference fields to follow renamed resources
#[derive(Debug, Clone)]
pub struct NameReferenceEngine {
    catalog: Arc<ReferenceCatalog>,
}

impl Default for NameReferenceEngine {
    fn default() -> Self {
        Self::builtin()
    }
}

impl NameReferenceEngine {
    /// Create engine over a catalog
    #[inline]
    #[must_use]
    pub fn new(catalog: Arc<ReferenceCatalog>) -> Self {
        Self { catalog }
    }

    /// Create engine over the built-in catalog
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(ReferenceCatalog::builtin())
    }

    /// Catalog in use
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &ReferenceCatalog {
        &self.catalog
    }

    /// Plan reference repairs without touching the collection
    ///
    /// # Errors
    /// Returns [`TransformError::Match`] if a referrer field path meets a
    /// shape conflict.
    pub fn plan(&self, collection: &ResourceCollection) -> Result<NameRefPlan, TransformError> {
        let mut plan = NameRefPlan::default();
        if !collection.iter().any(Resource::has_pending_rename) {
            return Ok(plan);
        }

        let matcher = PathMatcher::new(collection);
        let mut sites: IndexMap<(usize, ConcretePath), Site> = IndexMap::new();

        for spec in self.catalog.specs() {
            let relevant = collection
                .iter()
                .any(|r| r.has_pending_rename() && spec.accepts(r.gvk()));
            if !relevant {
                continue;
            }

            for found in matcher.find(&spec.referrer)? {
                let Some(value) = found.as_str() else {
                    continue;
                };
                let site = sites
                    .entry((found.position, found.path.clone()))
                    .or_insert_with(|| Site::new(collection, spec, &found, value));
                site.consider(collection, spec);
            }
        }

        for ((position, path), site) in sites {
            site.resolve(collection, position, path, &mut plan);
        }
        Ok(plan)
    }

    /// Plan and commit reference repairs
    ///
    /// On success every current name becomes the last repaired one.
    ///
    /// # Errors
    /// Same as [`NameReferenceEngine::plan`], plus
    /// [`TransformError::Resource`] if the commit is rejected. The collection
    /// is unchanged on any error.
    pub fn run(&self, collection: &mut ResourceCollection) -> Result<NameRefReport, TransformError> {
        let NameRefPlan { batch, warnings } = self.plan(collection)?;
        let summary = collection.commit(batch)?;
        collection.mark_resolved();

        for warning in &warnings {
            tracing::warn!(%warning, "reference left unresolved");
        }
        tracing::debug!(rewrites = summary.fields_written, "repaired name references");

        Ok(NameRefReport {
            rewrites: summary.fields_written,
            warnings,
        })
    }
}

/// Everything known about one reference field
#[derive(Debug)]
struct Site {
    referrer: ResId,
    value: String,
    /// Namespace the field points into
    namespace: String,
    held: bool,
    candidates: Vec<usize>,
    stale: Option<usize>,
}

impl Site {
    fn new(collection: &ResourceCollection, spec: &ReferenceSpec, found: &PathMatch, value: &str) -> Self {
        Self {
            referrer: found.resource.clone(),
            value: value.to_string(),
            namespace: target_namespace(collection, spec, found),
            held: false,
            candidates: Vec::new(),
            stale: None,
        }
    }

    /// Fold in what one catalog row says about this field
    fn consider(&mut self, collection: &ResourceCollection, spec: &ReferenceSpec) {
        let accepted = |r: &Resource| spec.accepts(r.gvk());

        self.held |= collection.iter().any(|r| {
            accepted(r)
                && !r.has_pending_rename()
                && r.name() == self.value
                && same_namespace(r.namespace(), &self.namespace)
        });

        let repaired = collection
            .iter()
            .enumerate()
            .filter(|(_, r)| r.resolved_name() == self.value)
            .map(|(position, _)| position);
        let named = collection
            .positions_with_original_name(&self.value)
            .iter()
            .copied()
            .chain(repaired);
        for position in named {
            let Some(r) = collection.resource(position) else {
                continue;
            };
            if r.has_pending_rename() && accepted(r) && !self.candidates.contains(&position) {
                self.candidates.push(position);
            }
        }

        if self.stale.is_none() {
            self.stale = collection
                .iter()
                .position(|r| accepted(r) && r.pending_intermediate_names().iter().any(|n| *n == self.value));
        }
    }

    fn resolve(self, collection: &ResourceCollection, position: usize, path: ConcretePath, plan: &mut NameRefPlan) {
        if self.held {
            tracing::trace!(referrer = %self.referrer, %path, value = %self.value, "reference names an unrenamed resource");
            return;
        }

        let current = |p: usize| collection.resource(p);

        let chosen = match self.candidates.as_slice() {
            [] => {
                if let Some(referent) = self.stale.and_then(current) {
                    plan.warnings.push(Warning::StaleIntermediateReference {
                        referrer: self.referrer,
                        path: path.to_string(),
                        value: self.value,
                        referent: referent.id(),
                    });
                }
                return;
            }
            [only] => *only,
            several => {
                let local: Vec<usize> = several
                    .iter()
                    .copied()
                    .filter(|&p| {
                        current(p).is_some_and(|r| same_namespace(r.namespace(), &self.namespace))
                    })
                    .collect();
                if let [only] = local.as_slice() {
                    *only
                } else {
                    plan.warnings.push(Warning::AmbiguousReference {
                        candidates: several.iter().filter_map(|&p| current(p)).map(Resource::id).collect(),
                        referrer: self.referrer,
                        path: path.to_string(),
                        value: self.value,
                    });
                    return;
                }
            }
        };

        let Some(referent) = current(chosen) else {
            return;
        };
        tracing::debug!(
            referrer = %self.referrer,
            %path,
            from = %self.value,
            to = referent.name(),
            "rewriting reference"
        );
        plan.batch.push(position, path, Node::string(referent.name()));
    }
}

/// Namespace a reference field points into
///
/// A sibling namespace field wins when the row names one and it holds a
/// non-empty string; otherwise the referrer's own namespace applies.
fn target_namespace(collection: &ResourceCollection, spec: &ReferenceSpec, found: &PathMatch) -> String {
    let sibling = spec.namespace_field.as_ref().and_then(|field| {
        let mut path = found.path.clone();
        path.pop()?;
        path.push(Step::Key(field.clone()));
        collection
            .resource(found.position)?
            .content()
            .get_path(&path)
            .and_then(Node::as_str)
            .filter(|ns| !ns.is_empty())
            .map(str::to_string)
    });
    sibling.unwrap_or_else(|| found.resource.namespace.clone())
}

//! Path matcher
//!
//! Resolves [`FieldSpec`]s against a [`ResourceCollection`], producing one
//! [`PathMatch`] per concrete field location.
//!
//! # Traversal order
//! Resources are visited in collection order; inside a resource, mapping
//! keys and sequence elements are visited in source order. Nothing is
//! re-sorted, so the same input always yields the same match list.
//!
//! # Shapes
//! - A key segment descends into a mapping. Applied to a sequence it is
//!   applied to every element instead.
//! - A list segment requires a sequence and visits every element.
//! - Absent (or null) fields end the walk without a match, unless the spec
//!   has `create` set and only keys remain: the match is then reported with
//!   no current value, and writing it materializes the missing mappings.
//! - Any other shape conflict is a [`MatchError`], except on bypass kinds
//!   where the branch is skipped silently.

use tailor_resource::{ConcretePath, Node, ResId, Resource, ResourceCollection, Shape, Step};

use crate::path::PathSegment;
use crate::spec::{is_bypass_kind, FieldSpec};

/// One resolved field location
#[derive(Debug, Clone, PartialEq)]
pub struct PathMatch {
    /// Collection position of the resource
    pub position: usize,
    /// Identity of the resource when matched
    pub resource: ResId,
    /// Concrete location inside the resource
    pub path: ConcretePath,
    /// Current value, `None` when the field is absent and will be created
    pub value: Option<Node>,
}

impl PathMatch {
    /// Current value as a string, if it is one
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.value.as_ref().and_then(Node::as_str)
    }

    /// Check if the field is absent
    #[inline]
    #[must_use]
    pub fn is_absent(&self) -> bool {
        self.value.is_none()
    }
}

/// Errors raised while matching
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// The tree's shape contradicts the path
    #[error("shape conflict in {resource}{origin} at '{path}': expected {expected}, found {found}")]
    ShapeConflict {
        /// Resource being walked
        resource: ResId,
        /// Source of the resource, prefixed with " from " when known
        origin: String,
        /// Location of the offending node
        path: String,
        /// Shape the path needed
        expected: Shape,
        /// Shape actually present
        found: Shape,
    },
}

/// Locates field spec matches inside a collection
#[derive(Debug, Clone, Copy)]
pub struct PathMatcher<'a> {
    collection: &'a ResourceCollection,
}

impl<'a> PathMatcher<'a> {
    /// Create matcher over a collection
    #[inline]
    #[must_use]
    pub fn new(collection: &'a ResourceCollection) -> Self {
        Self { collection }
    }

    /// All matches for one spec, in collection order
    ///
    /// # Errors
    /// Returns [`MatchError::ShapeConflict`] on the first shape conflict
    /// outside the bypass list.
    pub fn find(&self, spec: &FieldSpec) -> Result<Vec<PathMatch>, MatchError> {
        let mut out = Vec::new();
        for (position, resource) in self.collection.iter().enumerate() {
            self.find_in_resource(position, resource, spec, &mut out)?;
        }
        tracing::trace!(spec = %spec, matches = out.len(), "resolved field spec");
        Ok(out)
    }

    /// All matches for several specs, spec by spec
    ///
    /// # Errors
    /// Same as [`PathMatcher::find`]
    pub fn find_all(&self, specs: &[FieldSpec]) -> Result<Vec<PathMatch>, MatchError> {
        let mut out = Vec::new();
        for spec in specs {
            out.extend(self.find(spec)?);
        }
        Ok(out)
    }

    /// Matches for one spec inside the resource at `position`
    ///
    /// # Errors
    /// Same as [`PathMatcher::find`]
    pub fn find_at(&self, position: usize, spec: &FieldSpec) -> Result<Vec<PathMatch>, MatchError> {
        let mut out = Vec::new();
        if let Some(resource) = self.collection.resource(position) {
            self.find_in_resource(position, resource, spec, &mut out)?;
        }
        Ok(out)
    }

    fn find_in_resource(
        &self,
        position: usize,
        resource: &Resource,
        spec: &FieldSpec,
        out: &mut Vec<PathMatch>,
    ) -> Result<(), MatchError> {
        if !spec.selects(resource.gvk()) {
            return Ok(());
        }

        let walk = Walk {
            position,
            resource,
            create: spec.create_if_missing,
            bypass: is_bypass_kind(resource.gvk()),
        };
        let mut path = ConcretePath::root();
        walk.visit(resource.content(), spec.path.segments(), &mut path, out)
    }
}

/// Traversal state for one resource
struct Walk<'r> {
    position: usize,
    resource: &'r Resource,
    create: bool,
    bypass: bool,
}

impl Walk<'_> {
    fn visit(
        &self,
        node: &Node,
        segments: &[PathSegment],
        path: &mut ConcretePath,
        out: &mut Vec<PathMatch>,
    ) -> Result<(), MatchError> {
        let Some((segment, rest)) = segments.split_first() else {
            out.push(self.matched(path.clone(), Some(node.clone())));
            return Ok(());
        };

        match (segment, node) {
            (PathSegment::Key(key), Node::Mapping(map)) => match map.get(key) {
                Some(child) if !child.is_null() => {
                    path.push(Step::Key(key.clone()));
                    let result = self.visit(child, rest, path, out);
                    path.pop();
                    result
                }
                _ => {
                    self.absent(path, segments, out);
                    Ok(())
                }
            },
            (PathSegment::Key(_), Node::Sequence(items)) => {
                self.each(items, segments, path, out)
            }
            (PathSegment::Each, Node::Sequence(items)) => self.each(items, rest, path, out),
            (_, node) if node.is_null() => {
                self.absent(path, segments, out);
                Ok(())
            }
            (PathSegment::Key(_), other) => self.conflict(path, Shape::Mapping, other.shape()),
            (PathSegment::Each, other) => self.conflict(path, Shape::Sequence, other.shape()),
        }
    }

    fn each(
        &self,
        items: &[Node],
        segments: &[PathSegment],
        path: &mut ConcretePath,
        out: &mut Vec<PathMatch>,
    ) -> Result<(), MatchError> {
        for (index, item) in items.iter().enumerate() {
            path.push(Step::Index(index));
            let result = self.visit(item, segments, path, out);
            path.pop();
            result?;
        }
        Ok(())
    }

    /// Report a field that does not exist yet, when it may be created
    fn absent(&self, path: &ConcretePath, missing: &[PathSegment], out: &mut Vec<PathMatch>) {
        if !self.create {
            return;
        }
        // A missing sequence has no elements to match
        let mut full = path.clone();
        for segment in missing {
            match segment {
                PathSegment::Key(key) => full.push(Step::Key(key.clone())),
                PathSegment::Each => return,
            }
        }
        out.push(self.matched(full, None));
    }

    fn conflict(&self, path: &ConcretePath, expected: Shape, found: Shape) -> Result<(), MatchError> {
        if self.bypass {
            tracing::trace!(resource = %self.resource.id(), %path, "skipping shape conflict on bypass kind");
            return Ok(());
        }
        Err(MatchError::ShapeConflict {
            resource: self.resource.id(),
            origin: self
                .resource
                .provenance()
                .map(|p| format!(" from {p}"))
                .unwrap_or_default(),
            path: path.to_string(),
            expected,
            found,
        })
    }

    fn matched(&self, path: ConcretePath, value: Option<Node>) -> PathMatch {
        PathMatch {
            position: self.position,
            resource: self.resource.id(),
            path,
            value,
        }
    }
}

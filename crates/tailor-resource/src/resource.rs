//! Manifest resources
//!
//! A [`Resource`] wraps one decoded document. Its identity is read from the
//! document itself; the name and namespace it was created with are kept
//! aside and never change afterwards.

use std::fmt::{self, Display, Formatter};

use crate::error::ResourceError;
use crate::gvk::{Gvk, ResId};
use crate::node::{ConcretePath, Node};

/// Location of the name field
pub const NAME_FIELD: [&str; 2] = ["metadata", "name"];

/// Location of the namespace field
pub const NAMESPACE_FIELD: [&str; 2] = ["metadata", "namespace"];

/// Where a document came from, for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Provenance {
    /// Source path or URL
    pub source: String,
    /// Position of the document within the source
    pub index: usize,
}

impl Provenance {
    /// Create provenance
    #[inline]
    #[must_use]
    pub fn new(source: impl Into<String>, index: usize) -> Self {
        Self {
            source: source.into(),
            index,
        }
    }
}

impl Display for Provenance {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.source, self.index)
    }
}

/// One manifest document tracked by a collection
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    gvk: Gvk,
    content: Node,
    original_name: String,
    original_namespace: String,
    name_history: Vec<String>,
    resolved_at: usize,
    provenance: Option<Provenance>,
}

impl Resource {
    /// Create from a decoded document
    ///
    /// # Errors
    /// Returns [`ResourceError::MissingField`] if `kind` or `metadata.name`
    /// is absent, and [`ResourceError::InvalidField`] if the document is not
    /// a mapping or an identity field is not a string.
    pub fn from_document(content: Node, provenance: Option<Provenance>) -> Result<Self, ResourceError> {
        let origin = provenance.as_ref().map(ToString::to_string);

        if content.as_mapping().is_none() {
            return Err(ResourceError::InvalidField {
                field: "<document>",
                reason: format!("expected mapping, found {}", content.shape()),
                origin,
            });
        }

        let kind = required_string(&content, "kind", &["kind"], origin.as_deref())?;
        let api_version =
            optional_string(&content, "apiVersion", &["apiVersion"], origin.as_deref())?;
        let name = required_string(&content, "metadata.name", &NAME_FIELD, origin.as_deref())?;
        let namespace =
            optional_string(&content, "metadata.namespace", &NAMESPACE_FIELD, origin.as_deref())?;

        Ok(Self {
            gvk: Gvk::from_api_version(&api_version, kind),
            original_name: name.clone(),
            original_namespace: namespace,
            name_history: vec![name],
            resolved_at: 0,
            content,
            provenance,
        })
    }

    /// Schema category
    #[inline]
    #[must_use]
    pub fn gvk(&self) -> &Gvk {
        &self.gvk
    }

    /// Current name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        self.content
            .get_path(&ConcretePath::from_keys(NAME_FIELD))
            .and_then(Node::as_str)
            .unwrap_or_default()
    }

    /// Current namespace (empty when unset)
    #[inline]
    #[must_use]
    pub fn namespace(&self) -> &str {
        self.content
            .get_path(&ConcretePath::from_keys(NAMESPACE_FIELD))
            .and_then(Node::as_str)
            .unwrap_or_default()
    }

    /// Current identity
    #[must_use]
    pub fn id(&self) -> ResId {
        ResId::new(self.gvk.clone(), self.namespace(), self.name())
    }

    /// Identity the resource was created with
    #[must_use]
    pub fn original_id(&self) -> ResId {
        ResId::new(
            self.gvk.clone(),
            self.original_namespace.clone(),
            self.original_name.clone(),
        )
    }

    /// Name at creation; the key used for reference resolution
    #[inline]
    #[must_use]
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// Namespace at creation
    #[inline]
    #[must_use]
    pub fn original_namespace(&self) -> &str {
        &self.original_namespace
    }

    /// Check if the current name differs from the original name
    #[inline]
    #[must_use]
    pub fn is_renamed(&self) -> bool {
        self.name() != self.original_name
    }

    /// Every name the resource has held, oldest first
    #[inline]
    #[must_use]
    pub fn name_history(&self) -> &[String] {
        &self.name_history
    }

    /// Names held strictly between the original and the current one
    #[must_use]
    pub fn intermediate_names(&self) -> &[String] {
        match self.name_history.len() {
            0..=2 => &[],
            n => &self.name_history[1..n - 1],
        }
    }

    /// Name references were last repaired against
    ///
    /// Equals the original name until the first repair pass.
    #[inline]
    #[must_use]
    pub fn resolved_name(&self) -> &str {
        self.name_history
            .get(self.resolved_at)
            .map_or(self.original_name.as_str(), String::as_str)
    }

    /// Check if the resource was renamed since references were last repaired
    #[inline]
    #[must_use]
    pub fn has_pending_rename(&self) -> bool {
        self.name() != self.resolved_name()
    }

    /// Names held strictly between the resolved name and the current one
    #[must_use]
    pub fn pending_intermediate_names(&self) -> &[String] {
        let end = self.name_history.len().saturating_sub(1);
        let start = (self.resolved_at + 1).min(end);
        &self.name_history[start..end]
    }

    /// Document content
    #[inline]
    #[must_use]
    pub fn content(&self) -> &Node {
        &self.content
    }

    /// Source of the document
    #[inline]
    #[must_use]
    pub fn provenance(&self) -> Option<&Provenance> {
        self.provenance.as_ref()
    }

    /// Take the current name and namespace as the original ones
    pub(crate) fn rebase(&mut self) {
        self.original_name = self.name().to_string();
        self.original_namespace = self.namespace().to_string();
        self.name_history = vec![self.original_name.clone()];
        self.resolved_at = 0;
    }

    /// Take the current name as the one references point at
    pub(crate) fn mark_resolved(&mut self) {
        self.resolved_at = self.name_history.len().saturating_sub(1);
    }

    /// Swap in new content, recording a name change in the history
    pub(crate) fn replace_content(&mut self, content: Node) {
        let previous = self.name().to_string();
        self.content = content;
        if self.name() != previous {
            self.name_history.push(self.name().to_string());
        }
    }
}

impl Display for Resource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())?;
        if let Some(p) = &self.provenance {
            write!(f, " ({p})")?;
        }
        Ok(())
    }
}

fn required_string(
    content: &Node,
    field: &'static str,
    keys: &[&str],
    origin: Option<&str>,
) -> Result<String, ResourceError> {
    let value = optional_string(content, field, keys, origin)?;
    if value.is_empty() {
        return Err(ResourceError::MissingField {
            field,
            origin: origin.map(str::to_string),
        });
    }
    Ok(value)
}

fn optional_string(
    content: &Node,
    field: &'static str,
    keys: &[&str],
    origin: Option<&str>,
) -> Result<String, ResourceError> {
    match content.get_path(&ConcretePath::from_keys(keys.iter().copied())) {
        None => Ok(String::new()),
        Some(node) if node.is_null() => Ok(String::new()),
        Some(node) => node.as_str().map(str::to_string).ok_or_else(|| {
            ResourceError::InvalidField {
                field,
                reason: format!("expected string, found {}", node.shape()),
                origin: origin.map(str::to_string),
            }
        }),
    }
}

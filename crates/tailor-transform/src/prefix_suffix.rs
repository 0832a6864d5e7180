//! Prefix/suffix transformer
//!
//! Rewrites every matched value `v` into `prefix + v + suffix`. Applied to
//! name fields this renames resources; the commit validates the new
//! identities as one batch, and the outcome marks the step identity-changing.

use tailor_fieldspec::{FieldSpec, PathMatch};
use tailor_resource::{Node, ResourceCollection};

use crate::error::TransformError;
use crate::mutator::{FieldMutator, ValueRewrite};
use crate::transformer::{TransformOutcome, Transformer};

/// Default field spec for name prefixes and suffixes: every resource's name
#[must_use]
pub fn default_name_field_specs() -> Vec<FieldSpec> {
    vec![FieldSpec::new(tailor_fieldspec::FieldPath::keys(["metadata", "name"]))]
}

/// The `prefix + v + suffix` rewrite
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixSuffix {
    /// Text put in front
    pub prefix: String,
    /// Text appended
    pub suffix: String,
}

impl PrefixSuffix {
    /// Create rewrite
    #[inline]
    #[must_use]
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Apply to one string
    #[must_use]
    pub fn apply_to(&self, value: &str) -> String {
        let mut out = String::with_capacity(self.prefix.len() + value.len() + self.suffix.len());
        out.push_str(&self.prefix);
        out.push_str(value);
        out.push_str(&self.suffix);
        out
    }
}

impl ValueRewrite for PrefixSuffix {
    fn rewrite(&self, found: &PathMatch) -> Result<Option<Node>, TransformError> {
        match &found.value {
            None => Ok(Some(Node::string(self.apply_to("")))),
            Some(Node::Scalar(scalar)) => Ok(Some(Node::string(self.apply_to(&scalar.to_text())))),
            Some(other) => Err(TransformError::NotAScalar {
                resource: found.resource.clone(),
                path: found.path.to_string(),
                found: other.shape(),
            }),
        }
    }

    fn is_identity(&self) -> bool {
        self.prefix.is_empty() && self.suffix.is_empty()
    }
}

/// Adds a prefix and/or suffix to every matched field
#[derive(Debug, Clone)]
pub struct PrefixSuffixTransformer {
    mutator: FieldMutator<PrefixSuffix>,
}

impl PrefixSuffixTransformer {
    /// Create transformer over field specs
    #[must_use]
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>, field_specs: Vec<FieldSpec>) -> Self {
        Self {
            mutator: FieldMutator::new(field_specs, PrefixSuffix::new(prefix, suffix)),
        }
    }

    /// Create transformer over the default name field spec
    #[must_use]
    pub fn for_names(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self::new(prefix, suffix, default_name_field_specs())
    }

    /// Prefix
    #[inline]
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.mutator.rewrite().prefix
    }

    /// Suffix
    #[inline]
    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.mutator.rewrite().suffix
    }

    /// Field specs
    #[inline]
    #[must_use]
    pub fn field_specs(&self) -> &[FieldSpec] {
        self.mutator.field_specs()
    }
}

impl Transformer for PrefixSuffixTransformer {
    fn name(&self) -> &str {
        "PrefixSuffixTransformer"
    }

    fn transform(&self, collection: &mut ResourceCollection) -> Result<TransformOutcome, TransformError> {
        let outcome = self.mutator.apply(collection)?;
        tracing::debug!(
            prefix = self.prefix(),
            suffix = self.suffix(),
            fields = outcome.fields_written,
            renamed = outcome.identities_changed,
            "applied prefix/suffix"
        );
        Ok(outcome)
    }
}

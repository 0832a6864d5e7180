//! Field specs
//!
//! A [`FieldSpec`] pairs a group/version/kind selector with a
//! [`FieldPath`]: it names where a transformer may act.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use tailor_resource::Gvk;

use crate::path::FieldPath;

/// Kinds that generic field specs never touch unless they name the kind
///
/// Aggregate and registration kinds: renaming them breaks the API
/// machinery that keys on their names.
pub const BYPASS_KINDS: &[(&str, &str)] = &[
    ("apiextensions.k8s.io", "CustomResourceDefinition"),
    ("apiregistration.k8s.io", "APIService"),
    ("", "Namespace"),
];

/// Check if a resource's category is on the bypass list
#[must_use]
pub fn is_bypass_kind(gvk: &Gvk) -> bool {
    BYPASS_KINDS
        .iter()
        .any(|(group, kind)| gvk.kind == *kind && gvk.group == *group)
}

/// Selector plus path describing where a transformer may act
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawFieldSpec", into = "RawFieldSpec")]
pub struct FieldSpec {
    /// Category selector; empty components match any value
    pub gvk: Gvk,

    /// Location of the field
    pub path: FieldPath,

    /// Materialize the field when absent
    pub create_if_missing: bool,
}

/// Configuration shape of a field spec
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFieldSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    group: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    kind: String,
    path: FieldPath,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    create: bool,
}

impl From<RawFieldSpec> for FieldSpec {
    fn from(raw: RawFieldSpec) -> Self {
        Self {
            gvk: Gvk::new(raw.group, raw.version, raw.kind),
            path: raw.path,
            create_if_missing: raw.create,
        }
    }
}

impl From<FieldSpec> for RawFieldSpec {
    fn from(spec: FieldSpec) -> Self {
        Self {
            group: spec.gvk.group,
            version: spec.gvk.version,
            kind: spec.gvk.kind,
            path: spec.path,
            create: spec.create_if_missing,
        }
    }
}

impl FieldSpec {
    /// Spec applying to every kind
    #[inline]
    #[must_use]
    pub fn new(path: FieldPath) -> Self {
        Self {
            gvk: Gvk::default(),
            path,
            create_if_missing: false,
        }
    }

    /// Spec scoped to a selector
    #[inline]
    #[must_use]
    pub fn for_gvk(gvk: Gvk, path: FieldPath) -> Self {
        Self {
            gvk,
            path,
            create_if_missing: false,
        }
    }

    /// Spec scoped to one kind
    #[inline]
    #[must_use]
    pub fn for_kind(kind: impl Into<String>, path: FieldPath) -> Self {
        Self::for_gvk(Gvk::kind(kind), path)
    }

    /// Enable materialization of absent fields
    #[inline]
    #[must_use]
    pub fn creating(mut self) -> Self {
        self.create_if_missing = true;
        self
    }

    /// Check if the spec selects a resource of this category
    ///
    /// Bypass kinds are only selected by a spec naming their kind.
    #[must_use]
    pub fn selects(&self, gvk: &Gvk) -> bool {
        if !gvk.is_selected_by(&self.gvk) {
            return false;
        }
        self.names_kind(gvk) || !is_bypass_kind(gvk)
    }

    /// Check if the spec names this kind explicitly
    #[inline]
    #[must_use]
    pub fn names_kind(&self, gvk: &Gvk) -> bool {
        !self.gvk.kind.is_empty() && self.gvk.kind == gvk.kind
    }
}

impl Display for FieldSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.gvk.is_wildcard() {
            write!(f, "{}", self.path)?;
        } else {
            write!(f, "{}:{}", self.gvk, self.path)?;
        }
        if self.create_if_missing {
            f.write_str(" (create)")?;
        }
        Ok(())
    }
}

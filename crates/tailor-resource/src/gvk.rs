//! Group/version/kind and resource identities

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Group/version/kind triple identifying a resource's schema category
///
/// When used as a selector, an empty component matches any value.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Gvk {
    /// API group (empty for the core group)
    #[serde(default)]
    pub group: String,
    /// API version
    #[serde(default)]
    pub version: String,
    /// Kind
    #[serde(default)]
    pub kind: String,
}

impl Gvk {
    /// Create from components
    #[inline]
    #[must_use]
    pub fn new(group: impl Into<String>, version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// Selector for a kind in any group and version
    #[inline]
    #[must_use]
    pub fn kind(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// Build from an `apiVersion` value (`group/version` or bare `version`)
    #[must_use]
    pub fn from_api_version(api_version: &str, kind: impl Into<String>) -> Self {
        let (group, version) = api_version.split_once('/').unwrap_or(("", api_version));
        Self::new(group, version, kind)
    }

    /// Render as an `apiVersion` value
    #[must_use]
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// Check if `self` is selected by `selector` (empty components match anything)
    #[inline]
    #[must_use]
    pub fn is_selected_by(&self, selector: &Gvk) -> bool {
        (selector.group.is_empty() || selector.group == self.group)
            && (selector.version.is_empty() || selector.version == self.version)
            && (selector.kind.is_empty() || selector.kind == self.kind)
    }

    /// Check if every component is empty
    #[inline]
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.group.is_empty() && self.version.is_empty() && self.kind.is_empty()
    }
}

impl Display for Gvk {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let kind = if self.kind.is_empty() { "~K" } else { &self.kind };
        let version = if self.version.is_empty() { "~V" } else { &self.version };
        if self.group.is_empty() {
            write!(f, "{kind}.{version}")
        } else {
            write!(f, "{kind}.{version}.{}", self.group)
        }
    }
}

/// Identity of a resource within a collection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResId {
    /// Schema category
    pub gvk: Gvk,
    /// Namespace (empty when unset)
    pub namespace: String,
    /// Name
    pub name: String,
}

impl ResId {
    /// Create identity
    #[inline]
    #[must_use]
    pub fn new(gvk: Gvk, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            gvk,
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Same identity with another name
    #[inline]
    #[must_use]
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
}

impl Display for ResId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{} {}", self.gvk, self.name)
        } else {
            write!(f, "{} {}/{}", self.gvk, self.namespace, self.name)
        }
    }
}

/// Check if two namespaces denote the same namespace (`""` means `default`)
#[inline]
#[must_use]
pub fn same_namespace(a: &str, b: &str) -> bool {
    fn normalize(ns: &str) -> &str {
        if ns.is_empty() {
            "default"
        } else {
            ns
        }
    }
    normalize(a) == normalize(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_version_with_group() {
        let gvk = Gvk::from_api_version("apps/v1", "Deployment");
        assert_eq!(gvk.group, "apps");
        assert_eq!(gvk.version, "v1");
        assert_eq!(gvk.api_version(), "apps/v1");
    }

    #[test]
    fn api_version_core_group() {
        let gvk = Gvk::from_api_version("v1", "Secret");
        assert!(gvk.group.is_empty());
        assert_eq!(gvk.api_version(), "v1");
    }

    #[test]
    fn empty_selector_matches_everything() {
        let gvk = Gvk::new("apps", "v1", "Deployment");
        assert!(gvk.is_selected_by(&Gvk::default()));
        assert!(Gvk::default().is_wildcard());
    }

    #[test]
    fn kind_selector_is_exact() {
        let gvk = Gvk::new("apps", "v1", "Deployment");
        assert!(gvk.is_selected_by(&Gvk::kind("Deployment")));
        assert!(!gvk.is_selected_by(&Gvk::kind("deployment")));
        assert!(!gvk.is_selected_by(&Gvk::new("batch", "", "Deployment")));
    }

    #[test]
    fn display_forms() {
        assert_eq!(Gvk::new("apps", "v1", "Deployment").to_string(), "Deployment.v1.apps");
        assert_eq!(Gvk::new("", "v1", "Secret").to_string(), "Secret.v1");

        let id = ResId::new(Gvk::new("", "v1", "Secret"), "prod", "sec");
        assert_eq!(id.to_string(), "Secret.v1 prod/sec");
        assert_eq!(id.with_name("x").name, "x");
    }

    #[test]
    fn default_namespace_equivalence() {
        assert!(same_namespace("", "default"));
        assert!(same_namespace("prod", "prod"));
        assert!(!same_namespace("", "prod"));
    }
}

//! Label transformer
//!
//! Merges a fixed label map into the mapping found at every matched
//! location. Existing keys are overwritten; other keys are kept in place.

use indexmap::IndexMap;
use tailor_fieldspec::{FieldPath, FieldSpec, PathMatch};
use tailor_resource::{Gvk, Mapping, Node, ResourceCollection};

use crate::error::TransformError;
use crate::mutator::{FieldMutator, ValueRewrite};
use crate::transformer::{TransformOutcome, Transformer};

/// Workloads whose pod template carries labels
const TEMPLATED_WORKLOADS: &[(&str, &str)] = &[
    ("apps", "Deployment"),
    ("apps", "ReplicaSet"),
    ("apps", "DaemonSet"),
    ("apps", "StatefulSet"),
    ("batch", "Job"),
    ("", "ReplicationController"),
];

/// Workloads with a `matchLabels` selector
const SELECTING_WORKLOADS: &[(&str, &str)] = &[
    ("apps", "Deployment"),
    ("apps", "ReplicaSet"),
    ("apps", "DaemonSet"),
    ("apps", "StatefulSet"),
];

/// Default label field specs: metadata labels everywhere, plus selector and
/// pod template labels of workloads and services
#[must_use]
pub fn default_label_field_specs() -> Vec<FieldSpec> {
    let scoped = |group: &str, kind: &str, path: &[&str]| {
        FieldSpec::for_gvk(Gvk::new(group, "", kind), FieldPath::keys(path.iter().copied())).creating()
    };

    let mut specs = vec![FieldSpec::new(FieldPath::keys(["metadata", "labels"])).creating()];
    specs.push(scoped("", "Service", &["spec", "selector"]));
    specs.push(scoped("", "ReplicationController", &["spec", "selector"]));
    for (group, kind) in SELECTING_WORKLOADS {
        specs.push(scoped(group, kind, &["spec", "selector", "matchLabels"]));
    }
    for (group, kind) in TEMPLATED_WORKLOADS {
        specs.push(scoped(group, kind, &["spec", "template", "metadata", "labels"]));
    }
    specs.push(scoped(
        "batch",
        "CronJob",
        &["spec", "jobTemplate", "spec", "template", "metadata", "labels"],
    ));
    specs
}

/// The label merge rewrite
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelMerge {
    /// Labels to set
    pub labels: IndexMap<String, String>,
}

impl ValueRewrite for LabelMerge {
    fn rewrite(&self, found: &PathMatch) -> Result<Option<Node>, TransformError> {
        let mut merged = match &found.value {
            None => Mapping::new(),
            Some(Node::Mapping(existing)) => existing.clone(),
            Some(other) => {
                return Err(TransformError::NotAMapping {
                    resource: found.resource.clone(),
                    path: found.path.to_string(),
                    found: other.shape(),
                })
            }
        };
        for (key, value) in &self.labels {
            merged.insert(key.clone(), Node::string(value.as_str()));
        }
        Ok(Some(Node::Mapping(merged)))
    }

    fn is_identity(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Sets labels at every matched mapping
#[derive(Debug, Clone)]
pub struct LabelTransformer {
    mutator: FieldMutator<LabelMerge>,
}

impl LabelTransformer {
    /// Create transformer over field specs
    #[must_use]
    pub fn new(labels: IndexMap<String, String>, field_specs: Vec<FieldSpec>) -> Self {
        Self {
            mutator: FieldMutator::new(field_specs, LabelMerge { labels }),
        }
    }

    /// Create transformer over the default label field specs
    #[must_use]
    pub fn common(labels: IndexMap<String, String>) -> Self {
        Self::new(labels, default_label_field_specs())
    }

    /// Labels set by this transformer
    #[inline]
    #[must_use]
    pub fn labels(&self) -> &IndexMap<String, String> {
        &self.mutator.rewrite().labels
    }
}

impl Transformer for LabelTransformer {
    fn name(&self) -> &str {
        "LabelTransformer"
    }

    fn transform(&self, collection: &mut ResourceCollection) -> Result<TransformOutcome, TransformError> {
        let outcome = self.mutator.apply(collection)?;
        tracing::debug!(labels = self.labels().len(), fields = outcome.fields_written, "applied labels");
        Ok(outcome)
    }
}

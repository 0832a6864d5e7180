//! Reference catalog
//!
//! Static table of known cross-resource name references. Each row says
//! "field `path` of a `referrer` resource holds the name of a `referent`".
//! Adding a relation means adding a row; the engine is generic over rows.
//!
//! The built-in catalog is initialized once per process and shared
//! read-only.

use std::sync::Arc;

use once_cell::sync::Lazy;
use tailor_fieldspec::{FieldPath, FieldSpec};
use tailor_resource::Gvk;

/// One reference relation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferenceSpec {
    /// Category of the resource being referred to
    pub referent: Gvk,
    /// Referrer selector plus the field holding the name
    pub referrer: FieldSpec,
    /// Sibling of the name field holding the referent's namespace, if any
    pub namespace_field: Option<String>,
}

impl ReferenceSpec {
    /// Create relation
    #[inline]
    #[must_use]
    pub fn new(referent: Gvk, referrer: FieldSpec) -> Self {
        Self {
            referent,
            referrer,
            namespace_field: None,
        }
    }

    /// Read the referent's namespace from a sibling of the name field
    #[must_use]
    pub fn with_namespace_field(mut self, field: impl Into<String>) -> Self {
        self.namespace_field = Some(field.into());
        self
    }

    /// Check if a resource of this category may be the referent
    #[inline]
    #[must_use]
    pub fn accepts(&self, gvk: &Gvk) -> bool {
        gvk.is_selected_by(&self.referent)
    }
}

/// Read-only table of reference relations
#[derive(Debug, Clone, Default)]
pub struct ReferenceCatalog {
    specs: Vec<ReferenceSpec>,
}

static BUILTIN: Lazy<Arc<ReferenceCatalog>> = Lazy::new(|| Arc::new(ReferenceCatalog::from_tables()));

impl ReferenceCatalog {
    /// Create catalog from rows
    #[inline]
    #[must_use]
    pub fn new(specs: Vec<ReferenceSpec>) -> Self {
        Self { specs }
    }

    /// Shared built-in catalog
    #[must_use]
    pub fn builtin() -> Arc<ReferenceCatalog> {
        Arc::clone(&BUILTIN)
    }

    /// All rows in table order
    #[inline]
    #[must_use]
    pub fn specs(&self) -> &[ReferenceSpec] {
        &self.specs
    }

    /// Rows whose referent accepts this category
    pub fn referring_to<'a>(&'a self, gvk: &'a Gvk) -> impl Iterator<Item = &'a ReferenceSpec> + 'a {
        self.specs.iter().filter(move |spec| spec.accepts(gvk))
    }

    /// Number of rows
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    fn from_tables() -> Self {
        let mut specs = Vec::new();

        for (workload_group, workload_kind, pod_spec) in POD_SPEC_HOLDERS {
            for (referent_group, referent_kind, field) in POD_SPEC_REFERENCES {
                specs.push(row(
                    referent_group,
                    referent_kind,
                    workload_group,
                    workload_kind,
                    &format!("{pod_spec}/{field}"),
                ));
            }
        }
        for (referent_group, referent_kind, referrer_group, referrer_kind, path) in DIRECT_REFERENCES {
            specs.push(row(referent_group, referent_kind, referrer_group, referrer_kind, path));
        }
        for (referent_group, referent_kind, referrer_group, referrer_kind, path, namespace) in NAMESPACED_REFERENCES {
            specs.push(
                row(referent_group, referent_kind, referrer_group, referrer_kind, path).with_namespace_field(*namespace),
            );
        }

        tracing::trace!(rows = specs.len(), "built reference catalog");
        Self { specs }
    }
}

fn row(referent_group: &str, referent_kind: &str, referrer_group: &str, referrer_kind: &str, path: &str) -> ReferenceSpec {
    ReferenceSpec::new(
        Gvk::new(referent_group, "", referent_kind),
        FieldSpec::for_gvk(Gvk::new(referrer_group, "", referrer_kind), literal_path(path)),
    )
}

/// Catalog paths are plain `/`-separated keys
fn literal_path(path: &str) -> FieldPath {
    FieldPath::keys(path.split('/'))
}

/// Kinds embedding a pod spec, and where
const POD_SPEC_HOLDERS: &[(&str, &str, &str)] = &[
    ("", "Pod", "spec"),
    ("", "ReplicationController", "spec/template/spec"),
    ("apps", "Deployment", "spec/template/spec"),
    ("apps", "StatefulSet", "spec/template/spec"),
    ("apps", "DaemonSet", "spec/template/spec"),
    ("apps", "ReplicaSet", "spec/template/spec"),
    ("batch", "Job", "spec/template/spec"),
    ("batch", "CronJob", "spec/jobTemplate/spec/template/spec"),
];

/// References inside a pod spec: (referent group, referent kind, field)
const POD_SPEC_REFERENCES: &[(&str, &str, &str)] = &[
    ("", "ConfigMap", "containers/env/valueFrom/configMapKeyRef/name"),
    ("", "ConfigMap", "containers/envFrom/configMapRef/name"),
    ("", "ConfigMap", "initContainers/env/valueFrom/configMapKeyRef/name"),
    ("", "ConfigMap", "initContainers/envFrom/configMapRef/name"),
    ("", "ConfigMap", "volumes/configMap/name"),
    ("", "ConfigMap", "volumes/projected/sources/configMap/name"),
    ("", "Secret", "containers/env/valueFrom/secretKeyRef/name"),
    ("", "Secret", "containers/envFrom/secretRef/name"),
    ("", "Secret", "initContainers/env/valueFrom/secretKeyRef/name"),
    ("", "Secret", "initContainers/envFrom/secretRef/name"),
    ("", "Secret", "imagePullSecrets/name"),
    ("", "Secret", "volumes/secret/secretName"),
    ("", "Secret", "volumes/projected/sources/secret/name"),
    ("", "ServiceAccount", "serviceAccountName"),
    ("", "ServiceAccount", "serviceAccount"),
    ("", "PersistentVolumeClaim", "volumes/persistentVolumeClaim/claimName"),
    ("scheduling.k8s.io", "PriorityClass", "priorityClassName"),
];

/// Other references: (referent group, referent kind, referrer group, referrer kind, path)
const DIRECT_REFERENCES: &[(&str, &str, &str, &str, &str)] = &[
    ("", "Service", "networking.k8s.io", "Ingress", "spec/rules/http/paths/backend/service/name"),
    ("", "Service", "networking.k8s.io", "Ingress", "spec/defaultBackend/service/name"),
    ("", "Service", "extensions", "Ingress", "spec/rules/http/paths/backend/serviceName"),
    ("", "Service", "extensions", "Ingress", "spec/backend/serviceName"),
    ("", "Service", "apps", "StatefulSet", "spec/serviceName"),
    ("", "Service", "apiregistration.k8s.io", "APIService", "spec/service/name"),
    ("", "Secret", "networking.k8s.io", "Ingress", "spec/tls/secretName"),
    ("", "Secret", "extensions", "Ingress", "spec/tls/secretName"),
    ("", "Secret", "", "ServiceAccount", "secrets/name"),
    ("", "Secret", "", "ServiceAccount", "imagePullSecrets/name"),
    ("rbac.authorization.k8s.io", "Role", "rbac.authorization.k8s.io", "RoleBinding", "roleRef/name"),
    ("rbac.authorization.k8s.io", "ClusterRole", "rbac.authorization.k8s.io", "RoleBinding", "roleRef/name"),
    ("rbac.authorization.k8s.io", "ClusterRole", "rbac.authorization.k8s.io", "ClusterRoleBinding", "roleRef/name"),
    ("", "PersistentVolume", "", "PersistentVolumeClaim", "spec/volumeName"),
    ("storage.k8s.io", "StorageClass", "", "PersistentVolumeClaim", "spec/storageClassName"),
    ("storage.k8s.io", "StorageClass", "", "PersistentVolume", "spec/storageClassName"),
    ("apps", "Deployment", "autoscaling", "HorizontalPodAutoscaler", "spec/scaleTargetRef/name"),
    ("apps", "ReplicaSet", "autoscaling", "HorizontalPodAutoscaler", "spec/scaleTargetRef/name"),
    ("apps", "StatefulSet", "autoscaling", "HorizontalPodAutoscaler", "spec/scaleTargetRef/name"),
];

/// References that name the referent's namespace next to its name:
/// (referent group, referent kind, referrer group, referrer kind, path, namespace field)
const NAMESPACED_REFERENCES: &[(&str, &str, &str, &str, &str, &str)] = &[
    ("", "ServiceAccount", "rbac.authorization.k8s.io", "RoleBinding", "subjects/name", "namespace"),
    ("", "ServiceAccount", "rbac.authorization.k8s.io", "ClusterRoleBinding", "subjects/name", "namespace"),
];

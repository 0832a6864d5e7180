//! Testing utilities for the tailor workspace
//!
//! Shared test helpers, fixtures, and assertions.

#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]

use tailor_fieldspec::{FieldPath, FieldSpec};
use tailor_resource::{codec, Gvk, Resource, ResourceCollection};

pub fn collection_from_yaml(text: &str) -> ResourceCollection {
    let resources = codec::decode_resources(text, "fixture.yaml").unwrap();
    ResourceCollection::from_resources(resources).unwrap()
}

pub fn render(collection: &ResourceCollection) -> String {
    codec::encode_collection(collection).unwrap()
}

pub fn path(raw: &str) -> FieldPath {
    raw.parse().unwrap()
}

pub fn field_spec(path_str: &str) -> FieldSpec {
    FieldSpec::new(path(path_str))
}

pub fn field_spec_for(kind: &str, path_str: &str) -> FieldSpec {
    FieldSpec::for_kind(kind, path(path_str))
}

pub fn name_of(collection: &ResourceCollection, kind: &str, original: &str) -> String {
    find_original(collection, kind, original).name().to_string()
}

pub fn find_original<'a>(collection: &'a ResourceCollection, kind: &str, original: &str) -> &'a Resource {
    collection
        .iter()
        .find(|r| r.gvk().kind == kind && r.original_name() == original)
        .unwrap_or_else(|| panic!("no {kind} originally named {original}"))
}

pub fn gvk(api_version: &str, kind: &str) -> Gvk {
    Gvk::from_api_version(api_version, kind)
}

pub fn simple_resource(api_version: &str, kind: &str, name: &str) -> String {
    format!("apiVersion: {api_version}\nkind: {kind}\nmetadata:\n  name: {name}\n")
}

pub fn join_documents<I, S>(docs: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    docs.into_iter()
        .map(|d| d.as_ref().to_string())
        .collect::<Vec<_>>()
        .join("---\n")
}

pub const CRD: &str = "\
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: crd
";

pub const API_SERVICE: &str = "\
apiVersion: apiregistration.k8s.io/v1
kind: APIService
metadata:
  name: apiservice
";

pub const CONFIG_MAP: &str = "\
apiVersion: v1
kind: ConfigMap
metadata:
  name: cm
data:
  key: value
";

pub const SERVICE: &str = "\
apiVersion: v1
kind: Service
metadata:
  name: apple
spec:
  ports:
  - port: 7002
";

pub const DEPLOYMENT: &str = "\
apiVersion: apps/v1
kind: Deployment
metadata:
  name: deployment
spec:
  template:
    spec:
      containers:
      - name: main
        image: main-image
";

pub const SECRET: &str = "\
apiVersion: v1
kind: Secret
metadata:
  name: sec
type: Opaque
";

pub const DEPLOYMENT_USING_SECRET: &str = "\
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
spec:
  template:
    spec:
      containers:
      - name: app
        image: app:1
        env:
        - name: PASSWORD
          valueFrom:
            secretKeyRef:
              name: sec
              key: password
";

pub const DEPLOYMENT_WITH_ENV_FROM: &str = "\
apiVersion: apps/v1
kind: Deployment
metadata:
  name: deployment
spec:
  template:
    spec:
      containers:
      - image: myapp
        name: main
        envFrom:
        - secretRef:
            name: sec
";

pub const SECRET_WITH_DATA: &str = "\
apiVersion: v1
kind: Secret
metadata:
  name: sec
data:
  secretKey: c2VjcmV0VmFsdWUK
type: Opaque
";

/// Service, schema definition, registration and config resources
pub fn mixed_collection() -> ResourceCollection {
    collection_from_yaml(&join_documents([SERVICE, CRD, API_SERVICE, CONFIG_MAP]))
}

/// One deployment next to unrelated schema, registration and config resources
pub fn deployment_collection() -> ResourceCollection {
    collection_from_yaml(&join_documents([DEPLOYMENT, CRD, API_SERVICE, CONFIG_MAP]))
}

/// Secret plus a deployment referencing it
pub fn secret_reference_collection() -> ResourceCollection {
    collection_from_yaml(&join_documents([SECRET, DEPLOYMENT_USING_SECRET]))
}

/// Deployment importing a whole secret as environment, then the secret
pub fn env_from_collection() -> ResourceCollection {
    collection_from_yaml(&join_documents([DEPLOYMENT_WITH_ENV_FROM, SECRET_WITH_DATA]))
}

//! Property tests for field spec matching

use proptest::prelude::*;
use tailor_fieldspec::{is_bypass_kind, FieldSpec, PathMatcher};
use tailor_test_utils::{collection_from_yaml, field_spec, join_documents, simple_resource, API_SERVICE, CRD};

const KINDS: &[(&str, &str)] = &[
    ("v1", "Service"),
    ("v1", "ConfigMap"),
    ("v1", "Secret"),
    ("apps/v1", "Deployment"),
    ("batch/v1", "Job"),
    ("example.com/v1alpha1", "Widget"),
    ("v1", "Namespace"),
    ("apiextensions.k8s.io/v1", "CustomResourceDefinition"),
    ("apiregistration.k8s.io/v1", "APIService"),
];

fn documents() -> impl Strategy<Value = Vec<(usize, String)>> {
    prop::collection::vec((0..KINDS.len(), "[a-z]{1,8}"), 1..12)
}

proptest! {
    #[test]
    fn empty_kind_selector_matches_everything_but_bypass_kinds(docs in documents()) {
        // Make names unique so the collection accepts them
        let text = join_documents(docs.iter().enumerate().map(|(i, (k, name))| {
            let (api_version, kind) = KINDS[*k];
            simple_resource(api_version, kind, &format!("{name}-{i}"))
        }));
        let collection = collection_from_yaml(&text);

        let matches = PathMatcher::new(&collection).find(&field_spec("metadata/name")).unwrap();

        let expected: Vec<usize> = collection
            .iter()
            .enumerate()
            .filter(|(_, r)| !is_bypass_kind(r.gvk()))
            .map(|(i, _)| i)
            .collect();
        let found: Vec<usize> = matches.iter().map(|m| m.position).collect();
        prop_assert_eq!(found, expected);
    }

    #[test]
    fn matching_is_deterministic(docs in documents()) {
        let text = join_documents(docs.iter().enumerate().map(|(i, (k, name))| {
            let (api_version, kind) = KINDS[*k];
            simple_resource(api_version, kind, &format!("{name}-{i}"))
        }));
        let collection = collection_from_yaml(&text);
        let matcher = PathMatcher::new(&collection);
        let spec = field_spec("metadata/name");
        prop_assert_eq!(matcher.find(&spec).unwrap(), matcher.find(&spec).unwrap());
    }
}

#[test]
fn explicit_kind_reaches_bypass_kinds() {
    let collection = collection_from_yaml(&join_documents([CRD, API_SERVICE]));
    let matcher = PathMatcher::new(&collection);

    let crd = FieldSpec::for_kind("CustomResourceDefinition", "metadata/name".parse().unwrap());
    let found = matcher.find(&crd).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].as_str(), Some("crd"));

    assert!(matcher.find(&field_spec("metadata/name")).unwrap().is_empty());
}

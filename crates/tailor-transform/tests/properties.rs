//! Property tests for transformers and the name-reference engine

use proptest::prelude::*;
use tailor_test_utils::{collection_from_yaml, field_spec, join_documents, render};
use tailor_transform::{NameReferenceEngine, PrefixSuffixTransformer, Transformer};

fn secret(name: &str) -> String {
    format!("apiVersion: v1\nkind: Secret\nmetadata:\n  name: {name}\n")
}

fn pod(name: &str, secrets: &[String]) -> String {
    let mut out = format!("apiVersion: v1\nkind: Pod\nmetadata:\n  name: {name}\nspec:\n  volumes:\n");
    for (i, s) in secrets.iter().enumerate() {
        out.push_str(&format!("  - name: v{i}\n    secret:\n      secretName: {s}\n"));
    }
    if secrets.is_empty() {
        out.push_str("  []\n");
    }
    out
}

/// Secrets named s0..sN plus pods referencing a random subset
fn workload() -> impl Strategy<Value = (usize, Vec<Vec<usize>>)> {
    (1usize..6).prop_flat_map(|secrets| {
        let refs = prop::collection::vec(prop::collection::vec(0..secrets, 0..4), 1..4);
        (Just(secrets), refs)
    })
}

fn build(secrets: usize, pods: &[Vec<usize>]) -> String {
    let mut docs: Vec<String> = (0..secrets).map(|i| secret(&format!("s{i}"))).collect();
    for (p, refs) in pods.iter().enumerate() {
        let names: Vec<String> = refs.iter().map(|i| format!("s{i}")).collect();
        docs.push(pod(&format!("pod{p}"), &names));
    }
    join_documents(docs)
}

proptest! {
    #[test]
    fn empty_affixes_change_nothing((secrets, pods) in workload(), path_idx in 0usize..3) {
        let paths = ["metadata/name", "spec/volumes/secret/secretName", "spec/volumes/name"];
        let mut collection = collection_from_yaml(&build(secrets, &pods));
        let before = render(&collection);

        let outcome = PrefixSuffixTransformer::new("", "", vec![field_spec(paths[path_idx])])
            .transform(&mut collection)
            .unwrap();

        prop_assert_eq!(outcome.fields_written, 0);
        prop_assert_eq!(render(&collection), before);
    }

    #[test]
    fn engine_is_idempotent((secrets, pods) in workload(), prefix in "[a-z]{1,4}-") {
        let mut collection = collection_from_yaml(&build(secrets, &pods));
        PrefixSuffixTransformer::new(prefix.clone(), "", vec![tailor_test_utils::field_spec_for("Secret", "metadata/name")])
            .transform(&mut collection)
            .unwrap();

        let engine = NameReferenceEngine::builtin();
        let first = engine.run(&mut collection).unwrap();
        let after_first = render(&collection);
        let second = engine.run(&mut collection).unwrap();

        let expected: usize = pods.iter().map(Vec::len).sum();
        prop_assert_eq!(first.rewrites, expected);
        prop_assert_eq!(second.rewrites, 0);
        prop_assert_eq!(render(&collection), after_first);
    }

    #[test]
    fn every_reference_follows_its_secret((secrets, pods) in workload()) {
        let mut collection = collection_from_yaml(&build(secrets, &pods));
        let pipeline = tailor_transform::Pipeline::new()
            .with(PrefixSuffixTransformer::new("x-", "-y", vec![tailor_test_utils::field_spec_for("Secret", "metadata/name")]));
        pipeline.run(&mut collection).unwrap();

        let out = render(&collection);
        for refs in &pods {
            for i in refs {
                let needle = format!("secretName: x-s{i}-y\n");
                prop_assert!(out.contains(&needle));
            }
        }
        prop_assert!(!out.contains("secretName: s"));
    }
}

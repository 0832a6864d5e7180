//! Property tests for atomic batch commits

use proptest::prelude::*;
use tailor_resource::{codec, ChangeBatch, ConcretePath, Node, ResourceCollection, ResourceError, NAME_FIELD};

fn config_maps(count: usize) -> ResourceCollection {
    let text = (0..count)
        .map(|i| format!("apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: cm{i}\n"))
        .collect::<Vec<_>>()
        .join("---\n");
    ResourceCollection::from_resources(codec::decode_resources(&text, "generated.yaml").unwrap()).unwrap()
}

fn names(collection: &ResourceCollection) -> Vec<String> {
    collection.iter().map(|r| r.name().to_string()).collect()
}

proptest! {
    #[test]
    fn permuting_names_commits_and_keeps_originals(
        order in (1usize..8).prop_flat_map(|n| Just((0..n).collect::<Vec<_>>()).prop_shuffle())
    ) {
        let mut collection = config_maps(order.len());
        let mut batch = ChangeBatch::new();
        for (position, target) in order.iter().enumerate() {
            batch.push(position, ConcretePath::from_keys(NAME_FIELD), Node::string(format!("cm{target}")));
        }

        collection.commit(batch).unwrap();

        for (position, resource) in collection.iter().enumerate() {
            let expected = format!("cm{}", order[position]);
            prop_assert_eq!(resource.name(), expected.as_str());
            let original = format!("cm{position}");
            prop_assert_eq!(resource.original_name(), original.as_str());
            prop_assert_eq!(collection.position_of(&resource.id()), Some(position));
        }
    }

    #[test]
    fn colliding_batch_leaves_collection_unchanged(
        (count, a, b) in (2usize..8).prop_flat_map(|n| (Just(n), 0..n, 0..n)).prop_filter("distinct", |(_, a, b)| a != b)
    ) {
        let mut collection = config_maps(count);
        let before = names(&collection);
        let mut batch = ChangeBatch::new();
        batch.push(a, ConcretePath::from_keys(NAME_FIELD), Node::string("shared"));
        batch.push(b, ConcretePath::from_keys(NAME_FIELD), Node::string("shared"));

        let err = collection.commit(batch).unwrap_err();

        prop_assert!(matches!(err, ResourceError::IdentityCollision { .. }), "{}", err);
        prop_assert_eq!(names(&collection), before);
        prop_assert!(collection.iter().all(|r| !r.is_renamed()));
    }
}

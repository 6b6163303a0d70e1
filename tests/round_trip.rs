//! Property tests: every leaf applied is readable back at its flattened key.

use hotswap_store::prelude::*;
use proptest::prelude::*;

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        "[a-z0-9 ]{0,8}".prop_map(Value::from),
    ]
}

fn node() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(3, 32, 4, |inner| {
        prop::collection::btree_map("[a-z]{1,5}", inner, 1..4)
            .prop_map(|map| Value::Object(map.into_iter().collect()))
    })
}

fn table() -> impl Strategy<Value = Table> {
    prop::collection::btree_map("[a-z]{1,5}", node(), 0..5)
        .prop_map(|map| map.into_iter().collect())
}

/// Leaves of `table` found by walking it directly.
fn walk(table: &Table, prefix: &str, out: &mut Vec<(String, Value)>) {
    for (key, value) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Object(nested) => walk(nested, &path, out),
            leaf => out.push((path, leaf.clone())),
        }
    }
}

proptest! {
    #[test]
    fn get_returns_every_applied_leaf(tree in table()) {
        let store = Store::new();
        store.apply(tree.clone());

        let mut leaves = Vec::new();
        walk(&tree, "", &mut leaves);
        for (key, value) in &leaves {
            let found = store.get(key);
            prop_assert_eq!(found.as_ref(), Some(value));
        }
        prop_assert_eq!(store.traverse(".").len(), leaves.len());
    }

    #[test]
    fn reapplying_changes_nothing(tree in table()) {
        let store = Store::new();
        store.apply(tree.clone());
        let version = store.version();

        prop_assert!(store.apply(tree).is_empty());
        prop_assert_eq!(store.version(), version);
    }

    #[test]
    fn later_apply_wins(first in table(), second in table()) {
        let store = Store::new();
        store.apply(first);
        store.apply(second.clone());

        let mut leaves = Vec::new();
        walk(&second, "", &mut leaves);
        for (key, value) in &leaves {
            let found = store.get(key);
            prop_assert_eq!(found.as_ref(), Some(value));
        }
    }
}

//! Immutable point-in-time view of the configuration tree.

use crate::core::tree::{self, Table, Value};
use parking_lot::RwLock;
use std::collections::HashMap;

/// One published state of the store.
///
/// A snapshot is never mutated after it is published, apart from `memo`, which
/// only caches lookups derived from `tree` and is dropped together with it.
pub(crate) struct Snapshot {
    pub(crate) tree: Table,
    /// Every leaf of `tree`, keyed by flattened key.
    pub(crate) leaves: HashMap<String, Value>,
    /// Tables resolved against this snapshot's `tree`. Misses are never
    /// stored, so it holds at most one entry per interior node.
    memo: RwLock<HashMap<String, Value>>,
    pub(crate) version: u64,
}

impl Snapshot {
    pub(crate) fn new(tree: Table, leaves: HashMap<String, Value>, version: u64) -> Self {
        Self {
            tree,
            leaves,
            memo: RwLock::new(HashMap::new()),
            version,
        }
    }

    pub(crate) fn from_tree(tree: Table, delimiter: &str) -> Self {
        let leaves = tree::flatten(&tree, delimiter);
        Self::new(tree, leaves, 0)
    }

    /// Resolve `key`: leaves first, then the memo, then a tree walk.
    pub(crate) fn get(&self, key: &str, delimiter: &str) -> Option<Value> {
        if key.is_empty() {
            return Some(Value::Object(self.tree.clone()));
        }
        if let Some(value) = self.leaves.get(key) {
            return Some(value.clone());
        }
        if let Some(cached) = self.memo.read().get(key) {
            return Some(cached.clone());
        }

        let path = tree::segments(key, delimiter);
        let resolved = tree::lookup(&self.tree, &path)?.clone();
        if resolved.is_object() {
            self.memo.write().insert(key.to_string(), resolved.clone());
        }
        Some(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(value: Value) -> Snapshot {
        match value {
            Value::Object(table) => Snapshot::from_tree(table, "."),
            _ => panic!("not a table"),
        }
    }

    #[test]
    fn test_get_leaf_and_subtree() {
        let snap = snapshot(json!({"dbs": {"default": {"dsn": "A"}}}));
        assert_eq!(snap.get("dbs.default.dsn", "."), Some(json!("A")));
        assert_eq!(snap.get("dbs.default", "."), Some(json!({"dsn": "A"})));
        assert_eq!(snap.get("dbs.missing", "."), None);
    }

    #[test]
    fn test_get_memoises_subtrees_only() {
        let snap = snapshot(json!({"a": {"b": 1}}));
        assert_eq!(snap.get("a", "."), Some(json!({"b": 1})));
        assert_eq!(snap.get("nope", "."), None);
        let memo = snap.memo.read();
        assert_eq!(memo.get("a"), Some(&json!({"b": 1})));
        assert!(!memo.contains_key("nope"));
    }

    #[test]
    fn test_missing_keys_do_not_grow_memo() {
        let snap = snapshot(json!({"a": {"b": {"c": 1}}}));
        for i in 0..1000 {
            assert_eq!(snap.get(&format!("a.missing{}", i), "."), None);
            assert_eq!(snap.get(&format!("a.b.c.deeper{}", i), "."), None);
        }
        assert!(snap.memo.read().is_empty());

        snap.get("a", ".");
        snap.get("a.b", ".");
        snap.get("a.b", ".");
        assert_eq!(snap.memo.read().len(), 2);
    }

    #[test]
    fn test_empty_key_is_whole_tree() {
        let snap = snapshot(json!({"a": 1}));
        assert_eq!(snap.get("", "."), Some(json!({"a": 1})));
        assert_eq!(Snapshot::from_tree(Table::new(), ".").get("", "."), Some(json!({})));
    }
}

//! Nested table operations: deep merge, flattening, path lookup and diffing.

use std::collections::{BTreeSet, HashMap};

/// A configuration value: either a leaf (string, number, bool, list, null) or a nested table.
pub type Value = serde_json::Value;

/// A nested configuration table keyed by path segment.
pub type Table = serde_json::Map<String, Value>;

/// Deep-merge `incoming` into `base`.
///
/// Nested tables are merged key by key. Anything else, including a type conflict
/// between a leaf and a table, is overwritten by the incoming value.
pub(crate) fn merge(base: &mut Table, incoming: Table) {
    for (key, value) in incoming {
        match (base.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(nested)) => merge(existing, nested),
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Flatten every leaf of `table` into `prefix<delimiter>segment` keys.
///
/// Empty tables produce no keys.
pub(crate) fn flatten(table: &Table, delimiter: &str) -> HashMap<String, Value> {
    let mut out = HashMap::new();
    flatten_into(table, "", delimiter, &mut out);
    out
}

fn flatten_into(table: &Table, prefix: &str, delimiter: &str, out: &mut HashMap<String, Value>) {
    for (segment, value) in table {
        let key = if prefix.is_empty() {
            segment.clone()
        } else {
            format!("{prefix}{delimiter}{segment}")
        };
        match value {
            Value::Object(nested) => flatten_into(nested, &key, delimiter, out),
            leaf => {
                out.insert(key, leaf.clone());
            }
        }
    }
}

/// Split a flattened key into path segments. The empty key has no segments.
pub(crate) fn segments<'a>(key: &'a str, delimiter: &str) -> Vec<&'a str> {
    if key.is_empty() {
        Vec::new()
    } else {
        key.split(delimiter).collect()
    }
}

/// Resolve a path of segments inside `table`.
pub(crate) fn lookup<'a>(table: &'a Table, path: &[&str]) -> Option<&'a Value> {
    let (last, parents) = path.split_last()?;
    let mut current = table;
    for segment in parents {
        match current.get(*segment) {
            Some(Value::Object(nested)) => current = nested,
            _ => return None,
        }
    }
    current.get(*last)
}

/// Build a table holding `value` at `path`, creating intermediate tables.
pub(crate) fn nest(path: &[&str], value: Value) -> Table {
    let mut value = value;
    for segment in path.iter().skip(1).rev() {
        let mut table = Table::new();
        table.insert((*segment).to_string(), value);
        value = Value::Object(table);
    }
    let mut root = Table::new();
    if let Some(first) = path.first() {
        root.insert((*first).to_string(), value);
    }
    root
}

/// Keys that were added, modified or removed between two flattened views.
pub(crate) fn diff(old: &HashMap<String, Value>, new: &HashMap<String, Value>) -> BTreeSet<String> {
    let mut changed: BTreeSet<String> = new
        .iter()
        .filter(|(key, value)| old.get(*key) != Some(*value))
        .map(|(key, _)| key.clone())
        .collect();
    changed.extend(old.keys().filter(|key| !new.contains_key(*key)).cloned());
    changed
}

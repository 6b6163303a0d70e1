//! Watcher registrations keyed by path-segment prefix.

use crate::core::Store;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// A watcher callback. It receives the store the change was applied to.
pub type Callback = Arc<dyn Fn(&Store) + Send + Sync>;

/// Registry mapping a prefix (as path segments) to its callbacks.
///
/// Registrations are write-once: callbacks stay registered for the lifetime of
/// the store. The empty prefix matches every change.
#[derive(Default)]
pub(crate) struct WatcherRegistry {
    watchers: RwLock<BTreeMap<Vec<String>, Vec<Callback>>>,
}

impl WatcherRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&self, prefix: Vec<String>, callback: Callback) {
        self.watchers.write().entry(prefix).or_default().push(callback);
    }

    /// Callbacks whose prefix covers at least one changed key.
    ///
    /// A prefix is collected once no matter how many of its keys changed, so each
    /// callback is returned at most once per registration.
    pub(crate) fn matching(&self, changed: &BTreeSet<String>, delimiter: &str) -> Vec<Callback> {
        let changed: Vec<Vec<&str>> = changed
            .iter()
            .map(|key| key.split(delimiter).collect())
            .collect();

        self.watchers
            .read()
            .iter()
            .filter(|(prefix, _)| changed.iter().any(|key| covers(prefix, key)))
            .flat_map(|(_, callbacks)| callbacks.iter().cloned())
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.watchers.read().values().map(Vec::len).sum()
    }
}

/// Whether `prefix` is a segment-wise prefix of `key`.
fn covers(prefix: &[String], key: &[&str]) -> bool {
    prefix.len() <= key.len() && prefix.iter().zip(key).all(|(p, k)| p == k)
}

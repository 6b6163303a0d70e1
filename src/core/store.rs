//! The configuration store: lock-free reads of an immutable snapshot, serialized
//! copy-on-write applies, and prefix-scoped change notification.

use crate::core::builder::{StoreBuilder, StoreSettings};
use crate::core::cast;
use crate::core::options::UnmarshalOptions;
use crate::core::snapshot::Snapshot;
use crate::core::tree::{self, Table, Value};
use crate::error::{ConfigError, Result};
use crate::formats::Decoder;
use crate::notify::{Batch, Callback, Dispatcher, WatcherRegistry};
use crate::sources::DataSource;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[cfg(feature = "metrics")]
use crate::metrics::StoreMetrics;

/// A process-wide, hot-reloadable configuration store.
///
/// The store owns one nested table (the override tree). Every update is merged
/// into a private copy of the tree, diffed against the previous state, and
/// published with a single atomic pointer swap, so readers always see a complete
/// point-in-time snapshot and never take a lock.
///
/// `Store` is a cheap handle: clones share the same state. Construct one at
/// startup and pass it to every component that needs configuration.
///
/// # Examples
///
/// ```rust
/// use hotswap_store::prelude::*;
/// use hotswap_store::formats::Json;
///
/// let store = Store::new();
/// store.load(br#"{"dbs": {"default": {"dsn": "mysql://a"}}}"#, &Json)?;
///
/// assert_eq!(store.get_string("dbs.default.dsn").as_deref(), Some("mysql://a"));
/// # Ok::<(), hotswap_store::error::ConfigError>(())
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

struct Inner {
    current: ArcSwap<Snapshot>,
    /// Serializes applies; readers never touch it.
    write_lock: Mutex<()>,
    delimiter: String,
    watchers: WatcherRegistry,
    dispatcher: Dispatcher,
    #[cfg(feature = "metrics")]
    metrics: Option<StoreMetrics>,
}

impl Store {
    /// Create an empty store with default settings.
    pub fn new() -> Self {
        StoreBuilder::new().build()
    }

    /// Create a new builder for constructing a store.
    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }

    pub(crate) fn from_settings(tree: Table, settings: StoreSettings) -> Self {
        let snapshot = Snapshot::from_tree(tree, &settings.delimiter);
        let dispatcher = Dispatcher::new(settings.callback_timeout);
        #[cfg(feature = "metrics")]
        let dispatcher = dispatcher.with_metrics(settings.metrics.clone());

        Self {
            inner: Arc::new(Inner {
                current: ArcSwap::from_pointee(snapshot),
                write_lock: Mutex::new(()),
                delimiter: settings.delimiter,
                watchers: WatcherRegistry::new(),
                dispatcher,
                #[cfg(feature = "metrics")]
                metrics: settings.metrics,
            }),
        }
    }

    /// The delimiter joining path segments in flattened keys.
    pub fn delimiter(&self) -> &str {
        &self.inner.delimiter
    }

    /// Number of applies so far that changed at least one key.
    pub fn version(&self) -> u64 {
        self.inner.current.load().version
    }

    /// Decode `bytes` and apply the result.
    ///
    /// Returns the flattened keys that changed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DecodeError`] if the decoder fails. The store is left
    /// untouched in that case.
    pub fn load(&self, bytes: &[u8], decoder: &dyn Decoder) -> Result<Vec<String>> {
        let table = decoder.decode(bytes)?;
        Ok(self.apply(table))
    }

    /// Load once from `source`, then keep reloading on every change signal.
    ///
    /// The initial read and decode are performed before this returns and their
    /// errors are returned. Afterwards a background task re-reads the source each
    /// time it signals a change; failures there are logged and the previous
    /// state is kept. The task ends when the source is closed.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial read or decode fails.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use hotswap_store::prelude::*;
    /// use hotswap_store::formats;
    ///
    /// # async fn example() -> hotswap_store::error::Result<()> {
    /// let store = Store::new();
    /// let source = SourceRegistry::with_defaults().resolve("file:///etc/app.yaml")?;
    /// let _reload = store
    ///     .load_from_source(source, formats::for_path("/etc/app.yaml")?)
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn load_from_source(
        &self,
        source: Arc<dyn DataSource>,
        decoder: Arc<dyn Decoder>,
    ) -> Result<JoinHandle<()>> {
        // Subscribe before the first read so no change can slip in between.
        let mut changes = source.is_config_changed();

        let bytes = source.read_config().await?;
        let changed = self.load(&bytes, decoder.as_ref())?;
        info!(source = %source.name(), keys = changed.len(), "configuration loaded");

        let store = self.clone();
        Ok(tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                if let Err(err) = store.reload_from(source.as_ref(), decoder.as_ref()).await {
                    warn!(
                        source = %source.name(),
                        error = %err,
                        "reload failed, keeping the last good configuration"
                    );
                    #[cfg(feature = "metrics")]
                    if let Some(metrics) = &store.inner.metrics {
                        metrics.record_reload_failure();
                    }
                }
            }
            debug!(source = %source.name(), "data source closed, reload loop finished");
        }))
    }

    async fn reload_from(&self, source: &dyn DataSource, decoder: &dyn Decoder) -> Result<()> {
        let bytes = source.read_config().await?;
        let changed = self.load(&bytes, decoder)?;
        if !changed.is_empty() {
            info!(source = %source.name(), keys = changed.len(), "configuration reloaded");
        }
        Ok(())
    }

    /// Deep-merge `table` into the tree and notify matching watchers.
    ///
    /// Existing leaves are overwritten, nested tables are merged key by key and
    /// new keys are added; on a leaf/table conflict the incoming value wins. The
    /// merge happens on a copy and becomes visible in one atomic swap together
    /// with its key cache. Returns the flattened keys that were added, modified
    /// or removed, in sorted order.
    pub fn apply(&self, table: Table) -> Vec<String> {
        #[cfg(feature = "metrics")]
        let timer = self.inner.metrics.as_ref().map(StoreMetrics::start_apply);

        let guard = self.inner.write_lock.lock();
        let previous = self.inner.current.load_full();

        let mut tree = previous.tree.clone();
        tree::merge(&mut tree, table);
        let leaves = tree::flatten(&tree, &self.inner.delimiter);
        let changed = tree::diff(&previous.leaves, &leaves);

        let version = if changed.is_empty() {
            previous.version
        } else {
            previous.version + 1
        };
        self.inner
            .current
            .store(Arc::new(Snapshot::new(tree, leaves, version)));

        let callbacks = if changed.is_empty() {
            Vec::new()
        } else {
            self.inner.watchers.matching(&changed, &self.inner.delimiter)
        };

        // Queue under the lock so batches reach the worker in apply order.
        let pending = if callbacks.is_empty() {
            None
        } else {
            let batch = Batch {
                store: self.clone(),
                callbacks,
            };
            self.inner.dispatcher.submit(batch).err()
        };
        drop(guard);

        debug!(version, changed = changed.len(), "configuration applied");

        #[cfg(feature = "metrics")]
        if let (Some(metrics), Some(timer)) = (&self.inner.metrics, timer) {
            metrics.record_apply(timer, changed.len());
        }

        if let Some(batch) = pending {
            self.inner.dispatcher.run_inline(batch);
        }

        changed.into_iter().collect()
    }

    /// Look up a flattened key. The empty key returns the whole tree.
    ///
    /// Returns `None` for unknown keys.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.current.load().get(key, &self.inner.delimiter)
    }

    /// Whether `key` resolves to a value.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Set `value` at `key`, creating intermediate tables as needed.
    ///
    /// Goes through [`Store::apply`], so watchers fire exactly as for
    /// source-driven changes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidKey`] for an empty key, or
    /// [`ConfigError::Other`] if `value` cannot be represented as a config value.
    pub fn set<V: Serialize>(&self, key: &str, value: V) -> Result<Vec<String>> {
        if key.is_empty() {
            return Err(ConfigError::InvalidKey(String::new()));
        }
        let value = serde_json::to_value(value)
            .map_err(|e| ConfigError::Other(format!("Failed to serialize value: {}", e)))?;
        let path = tree::segments(key, &self.inner.delimiter);
        Ok(self.apply(tree::nest(&path, value)))
    }

    /// The value at `key` as a string. Numbers and booleans are formatted.
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).as_ref().and_then(cast::to_string)
    }

    /// The value at `key` as a signed integer. Numeric strings are parsed.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).as_ref().and_then(cast::to_i64)
    }

    /// The value at `key` as an unsigned integer. Numeric strings are parsed.
    pub fn get_uint(&self, key: &str) -> Option<u64> {
        self.get(key).as_ref().and_then(cast::to_u64)
    }

    /// The value at `key` as a float. Numeric strings are parsed.
    pub fn get_float(&self, key: &str) -> Option<f64> {
        self.get(key).as_ref().and_then(cast::to_f64)
    }

    /// The value at `key` as a boolean. Accepts `true/false`, `yes/no`, `on/off`, `1/0`.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).as_ref().and_then(cast::to_bool)
    }

    /// The value at `key` as a duration: `"1s"`, `"1m 30s"`, or bare seconds.
    pub fn get_duration(&self, key: &str) -> Option<Duration> {
        self.get(key).as_ref().and_then(cast::to_duration)
    }

    /// The value at `key` as a list of strings. A single string is split on commas
    /// and whitespace.
    pub fn get_string_slice(&self, key: &str) -> Option<Vec<String>> {
        self.get(key).as_ref().and_then(cast::to_string_slice)
    }

    /// The table at `key`.
    pub fn get_string_map(&self, key: &str) -> Option<Table> {
        self.get(key).as_ref().and_then(cast::to_table)
    }

    /// The table at `key`, with every value formatted as a string.
    pub fn get_string_map_string(&self, key: &str) -> Option<HashMap<String, String>> {
        self.get(key).as_ref().and_then(cast::to_string_map)
    }

    /// Decode the value at `key` (the whole tree for `""`) into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidKey`] if `key` does not resolve, or
    /// [`ConfigError::DeserializationError`] if the value does not fit `T`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hotswap_store::prelude::*;
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct Database {
    ///     dsn: String,
    /// }
    ///
    /// let store = Store::new();
    /// store.set("dbs.default.dsn", "mysql://a")?;
    ///
    /// let db: Database = store.unmarshal_key("dbs.default")?;
    /// assert_eq!(db.dsn, "mysql://a");
    /// assert!(store.unmarshal_key::<Database>("dbs.other").is_err());
    /// # Ok::<(), ConfigError>(())
    /// ```
    pub fn unmarshal_key<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.unmarshal_key_with(key, &UnmarshalOptions::default())
    }

    /// Like [`Store::unmarshal_key`], with decoding options.
    ///
    /// # Errors
    ///
    /// Same as [`Store::unmarshal_key`].
    pub fn unmarshal_key_with<T: DeserializeOwned>(
        &self,
        key: &str,
        options: &UnmarshalOptions,
    ) -> Result<T> {
        let value = self
            .get(key)
            .ok_or_else(|| ConfigError::InvalidKey(key.to_string()))?;
        decode(key, value, options)
    }

    /// An independent store seeded with a copy of the table at `key`.
    ///
    /// Later changes to either store are not visible in the other. If `key` is
    /// missing or holds a leaf, the returned store is empty.
    pub fn sub(&self, key: &str) -> Store {
        let tree = match self.get(key) {
            Some(Value::Object(table)) => table,
            _ => Table::new(),
        };
        let settings = StoreSettings {
            delimiter: self.inner.delimiter.clone(),
            callback_timeout: self.inner.dispatcher.callback_timeout(),
            #[cfg(feature = "metrics")]
            metrics: None,
        };
        Store::from_settings(tree, settings)
    }

    /// Every leaf of the tree, keyed by its path joined with `sep`.
    pub fn traverse(&self, sep: &str) -> BTreeMap<String, Value> {
        let snapshot = self.inner.current.load();
        if sep == self.inner.delimiter {
            return snapshot
                .leaves
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
        }
        tree::flatten(&snapshot.tree, sep).into_iter().collect()
    }

    /// Register `callback` for every change anywhere in the tree.
    pub fn on_change<F>(&self, callback: F)
    where
        F: Fn(&Store) + Send + Sync + 'static,
    {
        self.register(Vec::new(), Arc::new(callback));
    }

    /// Register `callback` for changes under `prefix`.
    ///
    /// Matching is by whole path segment: a watcher on `db` fires for `db.dsn` but
    /// not for `dbtools.dsn`. It fires at most once per apply, however many keys
    /// under the prefix changed. Registrations cannot be removed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hotswap_store::prelude::*;
    ///
    /// let store = Store::new();
    /// store.watch("dbs.default", |store| {
    ///     let dsn = store.get_string("dbs.default.dsn");
    ///     println!("reconnect to {:?}", dsn);
    /// });
    /// ```
    pub fn watch<F>(&self, prefix: &str, callback: F)
    where
        F: Fn(&Store) + Send + Sync + 'static,
    {
        let prefix = tree::segments(prefix, &self.inner.delimiter)
            .into_iter()
            .map(str::to_string)
            .collect();
        self.register(prefix, Arc::new(callback));
    }

    fn register(&self, prefix: Vec<String>, callback: Callback) {
        self.inner.watchers.register(prefix, callback);

        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.inner.metrics {
            metrics.update_watcher_count(self.inner.watchers.len());
        }
    }

    /// Number of registered watchers.
    pub fn watcher_count(&self) -> usize {
        self.inner.watchers.len()
    }
}

/// Decode `value`, read from `key`, into `T`.
pub(crate) fn decode<T: DeserializeOwned>(
    key: &str,
    value: Value,
    options: &UnmarshalOptions,
) -> Result<T> {
    serde_json::from_value(options.prepare(value)).map_err(|e| ConfigError::DeserializationError {
        key: key.to_string(),
        message: e.to_string(),
    })
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.inner.current.load();
        f.debug_struct("Store")
            .field("version", &snapshot.version)
            .field("keys", &snapshot.leaves.len())
            .field("watchers", &self.inner.watchers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::Json;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn table(value: Value) -> Table {
        match value {
            Value::Object(table) => table,
            _ => panic!("not a table"),
        }
    }

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    #[test]
    fn test_apply_and_get() {
        let store = Store::new();
        let changed = store.apply(table(json!({"dbs": {"default": {"dsn": "A", "pool": 4}}})));
        assert_eq!(changed, vec!["dbs.default.dsn", "dbs.default.pool"]);

        assert_eq!(store.get("dbs.default.dsn"), Some(json!("A")));
        assert_eq!(store.get("dbs.default"), Some(json!({"dsn": "A", "pool": 4})));
        assert_eq!(store.get("dbs.missing"), None);
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn test_apply_merges_objects() {
        let store = Store::new();
        store.apply(table(json!({"a": {"b": 1}})));
        store.apply(table(json!({"a": {"c": 2}})));

        let all = store.traverse(".");
        assert_eq!(all.get("a.b"), Some(&json!(1)));
        assert_eq!(all.get("a.c"), Some(&json!(2)));
    }

    #[test]
    fn test_reapplying_same_content_changes_nothing() {
        let store = Store::new();
        let calls = counter();
        let calls_clone = Arc::clone(&calls);
        store.on_change(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        let content = br#"{"a": {"b": 1}}"#;
        store.load(content, &Json).unwrap();
        assert!(store.load(content, &Json).unwrap().is_empty());

        // No runtime: delivery is inline and already done.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn test_decode_error_leaves_tree_untouched() {
        let store = Store::new();
        store.load(br#"{"a": 1}"#, &Json).unwrap();

        let err = store.load(b"{not json", &Json).unwrap_err();
        assert!(matches!(err, ConfigError::DecodeError(_)));
        assert_eq!(store.get("a"), Some(json!(1)));
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn test_conflict_incoming_wins_and_removed_keys_count() {
        let store = Store::new();
        store.apply(table(json!({"a": {"b": 1, "c": 2}})));

        let changed = store.apply(table(json!({"a": "flat"})));
        assert_eq!(changed, vec!["a", "a.b", "a.c"]);
        assert_eq!(store.get("a"), Some(json!("flat")));
        assert_eq!(store.get("a.b"), None);
    }

    #[test]
    fn test_set_builds_path_and_notifies() {
        let store = Store::new();
        let calls = counter();
        let calls_clone = Arc::clone(&calls);
        store.watch("server", move |store| {
            assert_eq!(store.get_int("server.http.port"), Some(8080));
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        store.set("server.http.port", 8080).unwrap();
        assert_eq!(store.get("server"), Some(json!({"http": {"port": 8080}})));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_set_empty_key_rejected() {
        let store = Store::new();
        let err = store.set("", 1).unwrap_err();
        assert_eq!(err.invalid_key(), Some(""));
    }

    #[test]
    fn test_prefix_watchers_are_segment_scoped() {
        let store = Store::new();
        let default_calls = counter();
        let db_calls = counter();

        let c = Arc::clone(&default_calls);
        store.watch("dbs.default", move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        let c = Arc::clone(&db_calls);
        store.watch("db", move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        store.set("dbs.other.dsn", "x").unwrap();
        store.set("dbtools.path", "/bin").unwrap();
        assert_eq!(default_calls.load(Ordering::SeqCst), 0);
        assert_eq!(db_calls.load(Ordering::SeqCst), 0);

        store.apply(table(json!({"dbs": {"default": {"dsn": "A", "pool": 2}}})));
        assert_eq!(default_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_typed_accessors() {
        let store = Store::new();
        store
            .load(
                br#"{
                    "name": "svc", "port": "8080", "ratio": 0.25, "debug": "yes",
                    "timeout": "1500ms", "hosts": ["a", "b"], "labels": {"env": "prod", "zone": 3}
                }"#,
                &Json,
            )
            .unwrap();

        assert_eq!(store.get_string("name").as_deref(), Some("svc"));
        assert_eq!(store.get_int("port"), Some(8080));
        assert_eq!(store.get_uint("port"), Some(8080));
        assert_eq!(store.get_float("ratio"), Some(0.25));
        assert_eq!(store.get_bool("debug"), Some(true));
        assert_eq!(store.get_duration("timeout"), Some(Duration::from_millis(1500)));
        assert_eq!(
            store.get_string_slice("hosts"),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(store.get_string_map("labels").map(|t| t.len()), Some(2));
        assert_eq!(
            store.get_string_map_string("labels").unwrap()["zone"],
            "3".to_string()
        );
        assert_eq!(store.get_int("missing"), None);
        assert!(store.contains("labels.env"));
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Database {
        dsn: String,
        #[serde(default)]
        max_idle: u32,
    }

    #[test]
    fn test_unmarshal_key() {
        let store = Store::new();
        store.set("dbs.default", json!({"dsn": "A", "max_idle": 5})).unwrap();

        let db: Database = store.unmarshal_key("dbs.default").unwrap();
        assert_eq!(db, Database { dsn: "A".to_string(), max_idle: 5 });
    }

    #[test]
    fn test_unmarshal_missing_key() {
        let store = Store::new();
        let err = store.unmarshal_key::<Database>("does.not.exist").unwrap_err();
        assert_eq!(err.invalid_key(), Some("does.not.exist"));
    }

    #[test]
    fn test_unmarshal_type_mismatch() {
        let store = Store::new();
        store.set("dbs.default.dsn", 42).unwrap();
        let err = store.unmarshal_key::<Database>("dbs.default").unwrap_err();
        assert!(matches!(err, ConfigError::DeserializationError { ref key, .. } if key == "dbs.default"));
    }

    #[test]
    fn test_unmarshal_with_key_case() {
        use crate::core::KeyCase;

        let store = Store::new();
        store.set("dbs.default", json!({"dsn": "A", "maxIdle": 7})).unwrap();

        let options = UnmarshalOptions::default().key_case(KeyCase::Snake);
        let db: Database = store.unmarshal_key_with("dbs.default", &options).unwrap();
        assert_eq!(db.max_idle, 7);
    }

    #[test]
    fn test_unmarshal_whole_tree() {
        #[derive(Deserialize)]
        struct Root {
            dbs: HashMap<String, Database>,
        }

        let store = Store::new();
        store.set("dbs.a.dsn", "x").unwrap();
        store.set("dbs.b.dsn", "y").unwrap();

        let root: Root = store.unmarshal_key("").unwrap();
        assert_eq!(root.dbs.len(), 2);
    }

    #[test]
    fn test_sub_is_a_snapshot_copy() {
        let store = Store::new();
        store.set("dbs.default.dsn", "A").unwrap();

        let sub = store.sub("dbs");
        assert_eq!(sub.get_string("default.dsn").as_deref(), Some("A"));

        store.set("dbs.default.dsn", "B").unwrap();
        assert_eq!(sub.get_string("default.dsn").as_deref(), Some("A"));

        sub.set("default.dsn", "C").unwrap();
        assert_eq!(store.get_string("dbs.default.dsn").as_deref(), Some("B"));

        assert!(store.sub("dbs.default.dsn").traverse(".").is_empty());
        assert!(store.sub("nothing").traverse(".").is_empty());
    }

    #[test]
    fn test_traverse_with_custom_separator() {
        let store = Store::new();
        store.set("a.b.c", 1).unwrap();
        store.set("a.d", true).unwrap();

        let all = store.traverse("/");
        assert_eq!(all.len(), 2);
        assert_eq!(all.get("a/b/c"), Some(&json!(1)));
        assert_eq!(all.get("a/d"), Some(&json!(true)));
    }

    #[test]
    fn test_custom_delimiter() {
        let store = Store::builder().delimiter("::").build();
        store.set("dbs::default::dsn", "A").unwrap();
        assert_eq!(store.get_string("dbs::default::dsn").as_deref(), Some("A"));
        assert!(store.traverse("::").contains_key("dbs::default::dsn"));
    }

    #[test]
    fn test_watcher_count_and_debug() {
        let store = Store::new();
        store.on_change(|_| {});
        store.watch("a", |_| {});
        assert_eq!(store.watcher_count(), 2);
        assert!(format!("{:?}", store).contains("watchers: 2"));
    }

    #[test]
    fn test_clones_share_state() {
        let store = Store::new();
        let other = store.clone();
        store.set("a", 1).unwrap();
        assert_eq!(other.get_int("a"), Some(1));
    }
}

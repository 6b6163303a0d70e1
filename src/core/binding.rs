//! Typed component configuration bound to a sub-path of the store.
//!
//! A database pool or cache client usually cares about one section of the
//! configuration and about one leaf in it that forces it to act (a DSN change
//! means reconnecting). [`Binding`] decodes the section once, watches only that
//! section, and bumps a version counter when the watched leaf actually changes.

use crate::core::Store;
use crate::core::options::UnmarshalOptions;
use crate::core::store::decode;
use crate::core::tree::{self, Value};
use crate::error::{ConfigError, Result};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tracing::{info, warn};

/// A typed view of the section at `key`, refreshed when `key.<leaf>` changes.
///
/// Consumers compare versions instead of draining a channel: a receiver from
/// [`Binding::subscribe`] wakes once however many relevant changes happened since
/// it last looked, and the current value is always re-read with [`Binding::get`].
///
/// # Examples
///
/// ```rust
/// use hotswap_store::prelude::*;
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize)]
/// struct Database {
///     dsn: String,
/// }
///
/// let store = Store::new();
/// store.set("dbs.default.dsn", "mysql://a")?;
///
/// let db = Binding::<Database>::bind(&store, "dbs.default", "dsn")?;
/// assert_eq!(db.get().dsn, "mysql://a");
/// assert_eq!(db.version(), 0);
///
/// store.set("dbs.default.dsn", "mysql://b")?;
/// assert_eq!(db.get().dsn, "mysql://b");
/// assert_eq!(db.version(), 1);
/// # Ok::<(), ConfigError>(())
/// ```
pub struct Binding<T> {
    key: String,
    leaf: String,
    watched_key: String,
    current: ArcSwap<T>,
    last_seen: Mutex<Option<Value>>,
    version: watch::Sender<u64>,
}

impl<T> Binding<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    /// Decode the section at `key` and start watching `key.<leaf>`.
    ///
    /// An empty `leaf` watches the whole section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidKey`](crate::error::ConfigError::InvalidKey)
    /// if the section is missing, or a deserialization error if it does not fit
    /// `T`. Both usually mean the process should not start.
    pub fn bind(store: &Store, key: &str, leaf: &str) -> Result<Arc<Self>> {
        let binding = Arc::new(Self::detached(store, key, leaf)?);
        binding.attach(store);
        Ok(binding)
    }

    /// Decode the current section without watching it yet.
    fn detached(store: &Store, key: &str, leaf: &str) -> Result<Self> {
        let section = store
            .get(key)
            .ok_or_else(|| ConfigError::InvalidKey(key.to_string()))?;
        let last_seen = leaf_of(&section, leaf, store.delimiter());
        let value: T = decode(key, section, &UnmarshalOptions::default())?;

        let watched_key = if leaf.is_empty() {
            key.to_string()
        } else if key.is_empty() {
            leaf.to_string()
        } else {
            format!("{}{}{}", key, store.delimiter(), leaf)
        };
        let (version, _) = watch::channel(0);

        Ok(Self {
            key: key.to_string(),
            leaf: leaf.to_string(),
            watched_key,
            current: ArcSwap::from_pointee(value),
            last_seen: Mutex::new(last_seen),
            version,
        })
    }

    /// Register the watcher, then catch up with anything applied since the
    /// section was first decoded.
    fn attach(self: &Arc<Self>, store: &Store) {
        let weak: Weak<Self> = Arc::downgrade(self);
        store.watch(&self.key, move |store| {
            if let Some(binding) = weak.upgrade() {
                binding.refresh(store);
            }
        });
        self.refresh(store);
    }

    fn refresh(&self, store: &Store) {
        let mut last_seen = self.last_seen.lock();
        // One read, so the decoded value and the watched leaf agree.
        let section = store.get(&self.key);
        let observed = section
            .as_ref()
            .and_then(|section| leaf_of(section, &self.leaf, store.delimiter()));
        if *last_seen == observed {
            return;
        }

        let decoded = section
            .ok_or_else(|| ConfigError::InvalidKey(self.key.clone()))
            .and_then(|section| decode::<T>(&self.key, section, &UnmarshalOptions::default()));
        match decoded {
            Ok(value) => {
                self.current.store(Arc::new(value));
                *last_seen = observed;
                self.version.send_modify(|version| *version += 1);
                info!(key = %self.watched_key, "bound configuration changed");
            }
            Err(err) => {
                warn!(
                    key = %self.key,
                    error = %err,
                    "failed to decode changed section, keeping the previous value"
                );
            }
        }
    }

    /// The current decoded value.
    pub fn get(&self) -> Arc<T> {
        self.current.load_full()
    }
}

impl<T> Binding<T> {
    /// The section this binding decodes.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The flattened key whose changes are forwarded.
    pub fn watched_key(&self) -> &str {
        &self.watched_key
    }

    /// Number of relevant changes observed so far.
    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    /// A receiver that wakes after relevant changes; it starts at the current version.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }
}

impl<T> std::fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("key", &self.key)
            .field("watched_key", &self.watched_key)
            .field("version", &self.version())
            .finish()
    }
}

/// The watched leaf inside `section`; an empty `leaf` is the section itself.
fn leaf_of(section: &Value, leaf: &str, delimiter: &str) -> Option<Value> {
    if leaf.is_empty() {
        return Some(section.clone());
    }
    match section {
        Value::Object(table) => tree::lookup(table, &tree::segments(leaf, delimiter)).cloned(),
        _ => None,
    }
}

/// Bindings created on demand and memoised by section key.
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
/// let databases = BindingSet::<Database>::new(store.clone(), "dsn");
/// let first = databases.get("dbs.default")?;
/// let again = databases.get("dbs.default")?;
/// assert!(std::sync::Arc::ptr_eq(&first, &again));
/// # Ok::<(), ConfigError>(())
/// ```
pub struct BindingSet<T> {
    store: Store,
    leaf: String,
    bindings: Mutex<HashMap<String, Arc<Binding<T>>>>,
}

impl<T> BindingSet<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    /// Create an empty set whose bindings watch `leaf` under their section.
    pub fn new(store: Store, leaf: impl Into<String>) -> Self {
        Self {
            store,
            leaf: leaf.into(),
            bindings: Mutex::new(HashMap::new()),
        }
    }

    /// The binding for `key`, created on first use.
    ///
    /// # Errors
    ///
    /// Same as [`Binding::bind`]. A failed bind is not memoised.
    pub fn get(&self, key: &str) -> Result<Arc<Binding<T>>> {
        let mut bindings = self.bindings.lock();
        if let Some(binding) = bindings.get(key) {
            return Ok(Arc::clone(binding));
        }
        let binding = Binding::bind(&self.store, key, &self.leaf)?;
        bindings.insert(key.to_string(), Arc::clone(&binding));
        Ok(binding)
    }

    /// Number of bindings created so far.
    pub fn len(&self) -> usize {
        self.bindings.lock().len()
    }

    /// Whether no binding has been created yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

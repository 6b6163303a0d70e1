//! Builder for constructing Store instances.

use crate::core::Store;
use crate::core::tree::Table;
use std::time::Duration;

#[cfg(feature = "metrics")]
use crate::metrics::StoreMetrics;

/// Default delimiter between path segments of a flattened key.
pub const DEFAULT_DELIMITER: &str = ".";

/// Default time a watcher callback may run before the dispatcher moves on.
pub const DEFAULT_CALLBACK_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolved store settings.
pub(crate) struct StoreSettings {
    pub(crate) delimiter: String,
    pub(crate) callback_timeout: Duration,
    #[cfg(feature = "metrics")]
    pub(crate) metrics: Option<StoreMetrics>,
}

/// Builder for constructing a [`Store`].
///
/// # Examples
///
/// ```rust
/// use hotswap_store::prelude::*;
/// use std::time::Duration;
///
/// let store = Store::builder()
///     .delimiter("/")
///     .callback_timeout(Duration::from_secs(2))
///     .build();
///
/// store.set("server/port", 8080)?;
/// assert_eq!(store.get_int("server/port"), Some(8080));
/// # Ok::<(), ConfigError>(())
/// ```
pub struct StoreBuilder {
    delimiter: String,
    callback_timeout: Duration,
    initial: Table,
    #[cfg(feature = "metrics")]
    metrics: Option<StoreMetrics>,
}

impl StoreBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            callback_timeout: DEFAULT_CALLBACK_TIMEOUT,
            initial: Table::new(),
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Set the delimiter used to join and split flattened keys.
    ///
    /// An empty delimiter is ignored.
    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        let delimiter = delimiter.into();
        if !delimiter.is_empty() {
            self.delimiter = delimiter;
        }
        self
    }

    /// Set how long a watcher callback may run before the dispatcher stops
    /// waiting for it and moves on.
    ///
    /// The overrunning callback keeps its blocking thread until it returns, and
    /// is skipped by later deliveries until then, so at most one thread per
    /// registered callback can be held this way.
    pub fn callback_timeout(mut self, timeout: Duration) -> Self {
        self.callback_timeout = timeout;
        self
    }

    /// Seed the store with an initial tree. Seeding does not notify watchers.
    pub fn with_defaults(mut self, table: Table) -> Self {
        self.initial = table;
        self
    }

    /// Record store activity on the given OpenTelemetry meter.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, meter: opentelemetry::metrics::Meter) -> Self {
        self.metrics = Some(StoreMetrics::new(meter));
        self
    }

    /// Build the store.
    pub fn build(self) -> Store {
        let settings = StoreSettings {
            delimiter: self.delimiter,
            callback_timeout: self.callback_timeout,
            #[cfg(feature = "metrics")]
            metrics: self.metrics,
        };
        Store::from_settings(self.initial, settings)
    }
}

impl Default for StoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//! Store metrics tracking using OpenTelemetry.

use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter};
use std::time::Instant;

/// Metrics collector for store operations.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_store::metrics::StoreMetrics;
/// use opentelemetry::global;
///
/// let metrics = StoreMetrics::new(global::meter("hotswap-store"));
///
/// let timer = metrics.start_apply();
/// // ... merge and diff ...
/// metrics.record_apply(timer, 3);
/// ```
#[derive(Clone)]
pub struct StoreMetrics {
    applies: Counter<u64>,
    changed_keys: Counter<u64>,
    apply_duration: Histogram<f64>,
    reload_failures: Counter<u64>,
    watcher_invocations: Counter<u64>,
    watcher_failures: Counter<u64>,
    registered_watchers: Gauge<i64>,
}

impl StoreMetrics {
    /// Create a new metrics collector with the provided meter.
    pub fn new(meter: Meter) -> Self {
        let applies = meter
            .u64_counter("hotswap_store.apply.count")
            .with_description("Total number of applies")
            .build();

        let changed_keys = meter
            .u64_counter("hotswap_store.apply.changed_keys")
            .with_description("Number of flattened keys changed by applies")
            .build();

        let apply_duration = meter
            .f64_histogram("hotswap_store.apply.duration")
            .with_description("Duration of merge, diff and publish in seconds")
            .with_unit("s")
            .build();

        let reload_failures = meter
            .u64_counter("hotswap_store.reload.failures")
            .with_description("Background reloads that failed and kept the previous state")
            .build();

        let watcher_invocations = meter
            .u64_counter("hotswap_store.watcher.invocations")
            .with_description("Watcher callbacks dispatched")
            .build();

        let watcher_failures = meter
            .u64_counter("hotswap_store.watcher.failures")
            .with_description("Watcher callbacks that panicked or timed out")
            .build();

        let registered_watchers = meter
            .i64_gauge("hotswap_store.watcher.registered")
            .with_description("Number of registered watchers")
            .build();

        Self {
            applies,
            changed_keys,
            apply_duration,
            reload_failures,
            watcher_invocations,
            watcher_failures,
            registered_watchers,
        }
    }

    /// Start an apply timer.
    pub fn start_apply(&self) -> Instant {
        Instant::now()
    }

    /// Record a finished apply and how many keys it changed.
    pub fn record_apply(&self, start: Instant, changed: usize) {
        self.applies.add(1, &[]);
        self.changed_keys.add(changed as u64, &[]);
        self.apply_duration.record(start.elapsed().as_secs_f64(), &[]);
    }

    /// Record a background reload that was swallowed.
    pub fn record_reload_failure(&self) {
        self.reload_failures.add(1, &[]);
    }

    /// Record one dispatched watcher callback.
    pub fn record_watcher_invocation(&self) {
        self.watcher_invocations.add(1, &[]);
    }

    /// Record a watcher callback that panicked or exceeded its timeout.
    pub fn record_watcher_failure(&self) {
        self.watcher_failures.add(1, &[]);
    }

    /// Update the number of registered watchers.
    pub fn update_watcher_count(&self, count: usize) {
        self.registered_watchers.record(count as i64, &[]);
    }
}

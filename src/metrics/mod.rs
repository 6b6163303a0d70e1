//! Built-in metrics for store operations.
//!
//! Provides OpenTelemetry metrics tracking:
//! - Applies and changed keys
//! - Apply duration
//! - Background reload failures
//! - Watcher invocations and failures (panics, timeouts)
//! - Registered watchers
//!
//! # Examples
//!
//! ```rust,no_run
//! use hotswap_store::prelude::*;
//! use opentelemetry::global;
//!
//! let meter = global::meter("my-app");
//!
//! let store = Store::builder()
//!     .with_metrics(meter)
//!     .build();
//! ```

mod store_metrics;

pub use store_metrics::StoreMetrics;

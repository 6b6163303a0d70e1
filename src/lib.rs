//! # hotswap-store
//!
//! A dynamic configuration store: one in-process hierarchical key/value tree,
//! fed by a pluggable data source, with change notification.
//!
//! ## Overview
//!
//! - Reads go through an immutable snapshot published with `arc-swap`, so they
//!   never block and never observe a half-applied update
//! - Every update merges a decoded tree into the current one, diffs the
//!   flattened keys, and notifies the watchers whose prefix covers a changed key
//! - Watcher callbacks run one at a time on a background task, each under a
//!   timeout, so a slow callback cannot stall writers
//! - Data sources (a watched file, an HTTP long-poll endpoint, anything
//!   implementing [`DataSource`](sources::DataSource)) are chosen by the scheme
//!   of a configuration address
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hotswap_store::prelude::*;
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct Database {
//!     dsn: String,
//! }
//!
//! # async fn example() -> hotswap_store::error::Result<()> {
//! let source = SourceRegistry::with_defaults().resolve("file:///etc/app.yaml")?;
//! let decoder = hotswap_store::formats::for_path("/etc/app.yaml")?;
//!
//! let store = Store::new();
//! store.load_from_source(source, decoder).await?;
//!
//! let db: Database = store.unmarshal_key("dbs.default")?;
//! store.watch("dbs.default", |store| {
//!     println!("dsn is now {:?}", store.get_string("dbs.default.dsn"));
//! });
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `file-watch` (default): [`FileSource`](sources::FileSource)
//! - `remote` (default): [`HttpSource`](sources::HttpSource); `remote-tls` adds rustls
//! - `yaml` (default), `toml`: extra decoders
//! - `metrics`: OpenTelemetry instruments for applies, reloads and watchers

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod formats;
pub mod notify;
pub mod sources;

#[cfg(feature = "metrics")]
pub mod metrics;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{
        Binding, BindingSet, KeyCase, Store, StoreBuilder, Table, UnmarshalOptions, Value,
    };
    pub use crate::error::{ConfigError, Result};
    pub use crate::formats::Decoder;
    pub use crate::sources::{DataSource, SourceRegistry};
}

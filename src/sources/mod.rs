//! Data sources feeding the store, and the scheme registry that selects one.

mod data_source;
#[cfg(feature = "file-watch")]
mod file;
mod registry;
#[cfg(feature = "remote")]
mod remote;

pub use data_source::{ChangeSignal, DataSource};
#[cfg(feature = "file-watch")]
pub use file::FileSource;
pub use registry::{ADDRESS_ENV, DEFAULT_SCHEME, SourceAddress, SourceFactory, SourceRegistry};
#[cfg(feature = "remote")]
pub use remote::{HttpAuth, HttpSource, HttpSourceBuilder};

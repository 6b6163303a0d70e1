//! Core store types.

mod binding;
mod builder;
mod cast;
mod options;
mod snapshot;
mod store;
mod tree;

pub use binding::{Binding, BindingSet};
pub use builder::{DEFAULT_CALLBACK_TIMEOUT, DEFAULT_DELIMITER, StoreBuilder};
pub use options::{KeyCase, UnmarshalOptions};
pub use store::Store;
pub use tree::{Table, Value};

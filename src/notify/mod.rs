//! Change notification: prefix-scoped watchers and their dispatcher.
//!
//! After every apply the store hands the set of changed flattened keys to the
//! registry, which selects each registration whose path-segment prefix covers a
//! changed key. Matched callbacks are delivered by the dispatcher, one at a time,
//! with a per-callback timeout.

mod dispatcher;
mod registry;

pub(crate) use dispatcher::{Batch, Dispatcher};
pub use registry::Callback;
pub(crate) use registry::WatcherRegistry;

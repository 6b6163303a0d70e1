//! Bounded, sequential delivery of watcher callbacks.

use crate::core::Store;
use crate::notify::Callback;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[cfg(feature = "metrics")]
use crate::metrics::StoreMetrics;

/// Callbacks matched by one apply, delivered together.
pub(crate) struct Batch {
    pub(crate) store: Store,
    pub(crate) callbacks: Vec<Callback>,
}

/// Delivers batches to a single worker task.
///
/// Callbacks run one at a time in submission order. Each one runs on the
/// blocking pool and is awaited for at most `callback_timeout`; a callback that
/// panics or overruns is logged and the worker moves on.
///
/// Work is bounded by the number of registered callbacks:
/// - a callback already queued and not yet started is not queued again, since
///   it reads the store when it runs and will see the later change anyway
/// - a callback whose earlier run overran its timeout and is still executing
///   is skipped, so a hung callback holds at most one blocking thread
pub(crate) struct Dispatcher {
    callback_timeout: Duration,
    queue: OnceLock<mpsc::UnboundedSender<Batch>>,
    tracker: Arc<Tracker>,
    hooks: Hooks,
}

/// Identities of callbacks that are queued or executing.
#[derive(Default)]
struct Tracker {
    pending: Mutex<HashSet<usize>>,
    running: Mutex<HashSet<usize>>,
}

fn callback_id(callback: &Callback) -> usize {
    Arc::as_ptr(callback) as *const () as usize
}

/// Clears a callback's running mark when its blocking task ends, panics included.
struct InFlight {
    tracker: Arc<Tracker>,
    id: usize,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.tracker.running.lock().remove(&self.id);
    }
}

impl Dispatcher {
    pub(crate) fn new(callback_timeout: Duration) -> Self {
        Self {
            callback_timeout,
            queue: OnceLock::new(),
            tracker: Arc::new(Tracker::default()),
            hooks: Hooks::default(),
        }
    }

    #[cfg(feature = "metrics")]
    pub(crate) fn with_metrics(mut self, metrics: Option<StoreMetrics>) -> Self {
        self.hooks.metrics = metrics;
        self
    }

    pub(crate) fn callback_timeout(&self) -> Duration {
        self.callback_timeout
    }

    /// Queue a batch for the worker, starting it on first use.
    ///
    /// Hands the batch back when there is no tokio runtime to run the worker on
    /// (or the worker's runtime has shut down); the caller then runs it with
    /// [`Dispatcher::run_inline`].
    pub(crate) fn submit(&self, batch: Batch) -> Result<(), Batch> {
        let queue = match self.queue.get() {
            Some(queue) => queue,
            None => {
                let Ok(handle) = tokio::runtime::Handle::try_current() else {
                    return Err(batch);
                };
                self.queue.get_or_init(|| {
                    let (tx, rx) = mpsc::unbounded_channel();
                    handle.spawn(run_worker(
                        rx,
                        self.callback_timeout,
                        Arc::clone(&self.tracker),
                        self.hooks.clone(),
                    ));
                    tx
                })
            }
        };

        let Batch { store, callbacks } = batch;
        let callbacks: Vec<Callback> = {
            let mut pending = self.tracker.pending.lock();
            callbacks
                .into_iter()
                .filter(|callback| pending.insert(callback_id(callback)))
                .collect()
        };
        if callbacks.is_empty() {
            return Ok(());
        }

        queue
            .send(Batch { store, callbacks })
            .map_err(|mpsc::error::SendError(batch)| {
                debug!("dispatcher worker is gone, delivering inline");
                let mut pending = self.tracker.pending.lock();
                for callback in &batch.callbacks {
                    pending.remove(&callback_id(callback));
                }
                batch
            })
    }

    /// Run a batch on the current thread, catching panics.
    pub(crate) fn run_inline(&self, batch: Batch) {
        for callback in batch.callbacks {
            self.hooks.invoked();
            if catch_unwind(AssertUnwindSafe(|| callback(&batch.store))).is_err() {
                warn!("watcher callback panicked");
                self.hooks.failed();
            }
        }
    }
}

async fn run_worker(
    mut rx: mpsc::UnboundedReceiver<Batch>,
    callback_timeout: Duration,
    tracker: Arc<Tracker>,
    hooks: Hooks,
) {
    while let Some(batch) = rx.recv().await {
        for callback in batch.callbacks {
            let id = callback_id(&callback);
            // A change arriving from here on queues this callback again.
            tracker.pending.lock().remove(&id);

            if !tracker.running.lock().insert(id) {
                warn!("watcher callback still running after an earlier timeout, skipping");
                hooks.failed();
                continue;
            }
            hooks.invoked();

            let store = batch.store.clone();
            let in_flight = InFlight {
                tracker: Arc::clone(&tracker),
                id,
            };
            let task = tokio::task::spawn_blocking(move || {
                let _in_flight = in_flight;
                callback(&store)
            });

            match tokio::time::timeout(callback_timeout, task).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(error = %err, "watcher callback panicked");
                    hooks.failed();
                }
                Err(_) => {
                    warn!(
                        timeout_ms = callback_timeout.as_millis() as u64,
                        "watcher callback timed out, continuing with the next one"
                    );
                    hooks.failed();
                }
            }
        }
    }
    debug!("dispatcher worker stopped");
}

/// Metric hooks around each delivery; no-ops without the `metrics` feature.
#[derive(Clone, Default)]
struct Hooks {
    #[cfg(feature = "metrics")]
    metrics: Option<StoreMetrics>,
}

impl Hooks {
    fn invoked(&self) {
        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.record_watcher_invocation();
        }
    }

    fn failed(&self) {
        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.record_watcher_failure();
        }
    }
}

//! The data source contract.

use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::watch;

/// An external supplier of raw configuration bytes.
///
/// Implement this trait to feed the store from a new backend (a file, an HTTP
/// endpoint, a key/value service). The store reads the content once at startup
/// and again after every change signal.
///
/// # Change signal
///
/// [`DataSource::is_config_changed`] returns a `watch` receiver over a version
/// counter. Producers bump the counter with `send_modify`, which never blocks, so
/// a slow consumer can never stall a producer and several changes between two
/// reads collapse into one wakeup. The signal carries no content: consumers
/// always call [`DataSource::read_config`] again. Once the source is closed the
/// receiver's `changed()` returns an error.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Read the current content. Idempotent; must not wait for a change.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    async fn read_config(&self) -> Result<Vec<u8>>;

    /// Subscribe to the change signal.
    fn is_config_changed(&self) -> watch::Receiver<u64>;

    /// Stop watching and release resources. Calling it more than once is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if releasing the underlying resources fails.
    fn close(&self) -> Result<()>;

    /// Human-readable name for logging.
    fn name(&self) -> String;
}

/// The producing half of a data source's change signal.
///
/// Wraps the `watch` sender so that closing is idempotent: the first
/// [`ChangeSignal::close`] drops the sender, later calls do nothing.
pub struct ChangeSignal {
    sender: parking_lot::Mutex<Option<watch::Sender<u64>>>,
    receiver: watch::Receiver<u64>,
}

impl ChangeSignal {
    /// Create an open signal at version 0.
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(0);
        Self {
            sender: parking_lot::Mutex::new(Some(sender)),
            receiver,
        }
    }

    /// Bump the version. Never blocks; does nothing once closed.
    pub fn notify(&self) {
        if let Some(sender) = self.sender.lock().as_ref() {
            sender.send_modify(|version| *version += 1);
        }
    }

    /// A new receiver that has seen the current version. After
    /// [`ChangeSignal::close`] it reports closed immediately.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        let mut receiver = self.receiver.clone();
        receiver.borrow_and_update();
        receiver
    }

    /// Current version.
    pub fn version(&self) -> u64 {
        *self.receiver.borrow()
    }

    /// Close the signal. Returns `true` only for the call that actually closed it.
    pub fn close(&self) -> bool {
        self.sender.lock().take().is_some()
    }

    /// Whether [`ChangeSignal::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }
}

impl Default for ChangeSignal {
    fn default() -> Self {
        Self::new()
    }
}

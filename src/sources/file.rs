//! Local file data source with filesystem change notification.

use crate::error::{ConfigError, Result};
use crate::sources::{ChangeSignal, DataSource};
use ::notify::event::ModifyKind;
use ::notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// File-based data source.
///
/// Watches the file's parent directory rather than the file itself, so editors
/// and deploy tools that replace the file by renaming keep being observed.
/// Only write and create events for the configured file raise the change signal.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_store::prelude::*;
/// use hotswap_store::sources::FileSource;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<()> {
/// let source = Arc::new(FileSource::new("config/app.yaml")?);
/// let decoder = hotswap_store::formats::for_path("config/app.yaml")?;
///
/// let store = Store::new();
/// store.load_from_source(source, decoder).await?;
/// # Ok(())
/// # }
/// ```
pub struct FileSource {
    path: PathBuf,
    signal: Arc<ChangeSignal>,
    watcher: Mutex<Option<RecommendedWatcher>>,
}

impl FileSource {
    /// Resolve `path` and start watching it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::WatchError`] if the path cannot be resolved or the
    /// watcher cannot be installed. A process that cannot watch its
    /// configuration file should not start.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().canonicalize().map_err(|e| {
            ConfigError::WatchError(format!(
                "Failed to resolve {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let dir = path
            .parent()
            .ok_or_else(|| {
                ConfigError::WatchError(format!("{} has no parent directory", path.display()))
            })?
            .to_path_buf();

        let signal = Arc::new(ChangeSignal::new());
        let target = path.clone();
        let events = Arc::clone(&signal);

        let mut watcher = ::notify::recommended_watcher(move |res: ::notify::Result<Event>| {
            match res {
                Ok(event) => {
                    if is_relevant(&event, &target) {
                        debug!(path = %target.display(), kind = ?event.kind, "configuration file changed");
                        events.notify();
                    }
                }
                Err(e) => error!(error = %e, "file watch error"),
            }
        })
        .map_err(|e| ConfigError::WatchError(format!("Failed to create watcher: {}", e)))?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| {
                ConfigError::WatchError(format!("Failed to watch {}: {}", dir.display(), e))
            })?;

        info!(path = %path.display(), "watching configuration file");

        Ok(Self {
            path,
            signal,
            watcher: Mutex::new(Some(watcher)),
        })
    }

    /// The resolved path being watched.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn is_relevant(event: &Event, target: &Path) -> bool {
    let kind = match event.kind {
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) | EventKind::Create(_) => true,
        _ => false,
    };

    kind && event
        .paths
        .iter()
        .any(|p| p == target || p.canonicalize().is_ok_and(|c| c == target))
}

#[async_trait]
impl DataSource for FileSource {
    async fn read_config(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path).await.map_err(|e| {
            ConfigError::SourceError(format!("Failed to read {}: {}", self.path.display(), e))
        })
    }

    fn is_config_changed(&self) -> watch::Receiver<u64> {
        self.signal.subscribe()
    }

    fn close(&self) -> Result<()> {
        // Dropping the watcher stops the backend thread.
        drop(self.watcher.lock().take());
        if self.signal.close() {
            info!(path = %self.path.display(), "stopped watching configuration file");
        }
        Ok(())
    }

    fn name(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::notify::event::{CreateKind, DataChange, MetadataKind, RemoveKind};
    use std::fs;
    use tempfile::TempDir;

    fn event(kind: EventKind, path: &Path) -> Event {
        Event::new(kind).add_path(path.to_path_buf())
    }

    #[test]
    fn test_is_relevant() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("app.yaml");
        fs::write(&target, "a: 1").unwrap();
        let target = target.canonicalize().unwrap();
        let sibling = dir.path().join("other.yaml");

        let write = EventKind::Modify(ModifyKind::Data(DataChange::Content));
        assert!(is_relevant(&event(write, &target), &target));
        assert!(is_relevant(
            &event(EventKind::Create(CreateKind::File), &target),
            &target
        ));
        assert!(!is_relevant(&event(write, &sibling), &target));
        assert!(!is_relevant(
            &event(EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any)), &target),
            &target
        ));
        assert!(!is_relevant(
            &event(EventKind::Remove(RemoveKind::File), &target),
            &target
        ));
    }

    #[test]
    fn test_missing_file_fails() {
        let result = FileSource::new("/nonexistent/hotswap/app.yaml");
        assert!(matches!(result, Err(ConfigError::WatchError(_))));
    }

    #[tokio::test]
    async fn test_read_and_close() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.json");
        fs::write(&path, r#"{"server": {"port": 8080}}"#).unwrap();

        let source = FileSource::new(&path).unwrap();
        assert_eq!(source.path(), path.canonicalize().unwrap());
        assert!(source.name().starts_with("file:"));
        assert_eq!(
            source.read_config().await.unwrap(),
            br#"{"server": {"port": 8080}}"#
        );

        let mut rx = source.is_config_changed();
        source.close().unwrap();
        source.close().unwrap();
        assert!(rx.changed().await.is_err());
    }

    #[tokio::test]
    async fn test_write_raises_signal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.json");
        fs::write(&path, r#"{"a": 1}"#).unwrap();

        let source = FileSource::new(&path).unwrap();
        let mut rx = source.is_config_changed();

        fs::write(&path, r#"{"a": 2}"#).unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(5), rx.changed())
            .await
            .expect("no change signal within 5s")
            .unwrap();
        assert_eq!(source.read_config().await.unwrap(), br#"{"a": 2}"#);
    }
}

//! Debounced snapshot persistence.
//!
//! [`DebouncedSaver`] collapses bursts of save requests into a single write of
//! the most recent snapshot. Writes are issued by one worker task, strictly in
//! request order.
//!
//! [`JsonFileStore`] is the file-backed [`SnapshotStore`]: it writes a
//! versioned JSON envelope next to a temporary file and renames it into place.

use serde::{Serialize, de::DeserializeOwned};
use std::future::Future;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tabstate_core::persistence::{PersistenceError, SnapshotStore};
use tokio::sync::{mpsc, oneshot};

enum SaveRequest<S> {
    Save(S),
    Flush(oneshot::Sender<()>),
}

/// Trailing-edge debouncer in front of a [`SnapshotStore`].
///
/// Every request restarts the quiet window and replaces the pending snapshot.
/// When the window elapses without a new request, the pending snapshot is
/// written. Failed writes are logged and dropped; there is no retry.
pub struct DebouncedSaver<S> {
    requests: mpsc::UnboundedSender<SaveRequest<S>>,
}

impl<S> Clone for DebouncedSaver<S> {
    fn clone(&self) -> Self {
        Self {
            requests: self.requests.clone(),
        }
    }
}

impl<S> std::fmt::Debug for DebouncedSaver<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebouncedSaver").finish_non_exhaustive()
    }
}

impl<S> DebouncedSaver<S>
where
    S: Send + 'static,
{
    /// Spawn the writer task.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn spawn(store: Arc<dyn SnapshotStore<S>>, window: Duration) -> Self {
        let (requests, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(rx, store, window));
        Self { requests }
    }

    /// Request that `snapshot` be saved once the window is quiet.
    ///
    /// Never blocks.
    pub fn request(&self, snapshot: S) {
        if self.requests.send(SaveRequest::Save(snapshot)).is_err() {
            tracing::warn!("Snapshot writer stopped, dropping save request");
        }
    }

    /// Write any pending snapshot now and wait for it to land.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.requests.send(SaveRequest::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }
}

async fn run_writer<S>(
    mut requests: mpsc::UnboundedReceiver<SaveRequest<S>>,
    store: Arc<dyn SnapshotStore<S>>,
    window: Duration,
) where
    S: Send + 'static,
{
    while let Some(request) = requests.recv().await {
        let mut pending = match request {
            SaveRequest::Save(snapshot) => snapshot,
            SaveRequest::Flush(done) => {
                let _ = done.send(());
                continue;
            },
        };
        let mut waiters = Vec::new();
        let mut collapsed = 0_u64;

        loop {
            tokio::select! {
                () = tokio::time::sleep(window) => break,
                next = requests.recv() => match next {
                    Some(SaveRequest::Save(snapshot)) => {
                        pending = snapshot;
                        collapsed += 1;
                    },
                    Some(SaveRequest::Flush(done)) => {
                        waiters.push(done);
                        break;
                    },
                    None => break,
                },
            }
        }

        tracing::trace!(collapsed, "Writing debounced snapshot");
        match store.save(pending).await {
            Ok(()) => {
                metrics::counter!("persistence.saves.total").increment(1);
            },
            Err(error) => {
                metrics::counter!("persistence.saves.failed").increment(1);
                tracing::warn!(error = %error, "Snapshot save failed");
            },
        }

        for done in waiters {
            let _ = done.send(());
        }
    }
    tracing::debug!("Snapshot writer stopped");
}

/// Format version written by [`JsonFileStore`].
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(serde::Serialize)]
struct EnvelopeOut<'a, T> {
    version: u32,
    state: &'a T,
}

#[derive(serde::Deserialize)]
struct EnvelopeIn {
    version: u32,
    state: serde_json::Value,
}

/// File-backed snapshot store using a versioned JSON envelope.
///
/// Implements `SnapshotStore<Arc<T>>` so it can sit directly behind a Store
/// whose state is an `Arc<T>`.
pub struct JsonFileStore<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for JsonFileStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFileStore")
            .field("path", &self.path)
            .finish()
    }
}

impl<T> JsonFileStore<T> {
    /// Create a store for the file at `path`.
    ///
    /// The file is not touched until the first `load` or `save`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    /// Location of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(std::ffi::OsStr::to_os_string).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl<T> SnapshotStore<Arc<T>> for JsonFileStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn load(&self) -> Pin<Box<dyn Future<Output = Result<Option<Arc<T>>, PersistenceError>> + Send + '_>> {
        Box::pin(async move {
            let bytes = match tokio::fs::read(&self.path).await {
                Ok(bytes) => bytes,
                Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
                Err(error) => return Err(PersistenceError::Io(error.to_string())),
            };

            let envelope: EnvelopeIn = serde_json::from_slice(&bytes)
                .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
            if envelope.version != SNAPSHOT_VERSION {
                return Err(PersistenceError::UnsupportedVersion {
                    found: envelope.version,
                    supported: SNAPSHOT_VERSION,
                });
            }

            let state: T = serde_json::from_value(envelope.state)
                .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
            tracing::debug!(path = %self.path.display(), "Loaded snapshot");
            Ok(Some(Arc::new(state)))
        })
    }

    fn save(&self, snapshot: Arc<T>) -> Pin<Box<dyn Future<Output = Result<(), PersistenceError>> + Send + '_>> {
        Box::pin(async move {
            let bytes = serde_json::to_vec(&EnvelopeOut {
                version: SNAPSHOT_VERSION,
                state: &*snapshot,
            })
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;

            let temp = self.temp_path();
            tokio::fs::write(&temp, bytes)
                .await
                .map_err(|e| PersistenceError::Io(e.to_string()))?;
            if let Err(error) = tokio::fs::rename(&temp, &self.path).await {
                if let Err(cleanup) = tokio::fs::remove_file(&temp).await {
                    tracing::debug!(path = %temp.display(), error = %cleanup, "Could not remove temporary snapshot");
                }
                return Err(PersistenceError::Io(error.to_string()));
            }

            tracing::trace!(path = %self.path.display(), "Saved snapshot");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabstate_testing::mocks::InMemorySnapshotStore;

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_to_last_snapshot() {
        let store = InMemorySnapshotStore::<u32>::new();
        let saver = DebouncedSaver::spawn(Arc::new(store.clone()), Duration::from_millis(50));

        saver.request(1);
        saver.request(2);
        saver.request(3);
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(store.saved(), vec![3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_outside_window_are_written_in_order() {
        let store = InMemorySnapshotStore::<u32>::new();
        let saver = DebouncedSaver::spawn(Arc::new(store.clone()), Duration::from_millis(50));

        saver.request(1);
        tokio::time::sleep(Duration::from_millis(100)).await;
        saver.request(2);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(store.saved(), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_writes_pending_immediately() {
        let store = InMemorySnapshotStore::<u32>::new();
        let saver = DebouncedSaver::spawn(Arc::new(store.clone()), Duration::from_secs(60));

        saver.request(7);
        saver.flush().await;

        assert_eq!(store.saved(), vec![7]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_save_does_not_stop_writer() {
        let store = InMemorySnapshotStore::<u32>::new();
        store.fail_next_save();
        let saver = DebouncedSaver::spawn(Arc::new(store.clone()), Duration::from_millis(10));

        saver.request(1);
        saver.flush().await;
        saver.request(2);
        saver.flush().await;

        assert_eq!(store.saved(), vec![2]);
    }

    #[tokio::test]
    async fn test_json_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::<Vec<String>>::new(dir.path().join("page.json"));

        assert!(store.load().await.unwrap().is_none());

        store.save(Arc::new(vec!["a".to_string()])).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(*loaded, vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn test_json_file_store_rejects_other_versions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.json");
        tokio::fs::write(&path, br#"{"version": 99, "state": []}"#).await.unwrap();

        let store = JsonFileStore::<Vec<String>>::new(path);
        let result = store.load().await;
        assert!(matches!(
            result,
            Err(PersistenceError::UnsupportedVersion { found: 99, supported: 1 })
        ));
    }

    #[tokio::test]
    async fn test_json_file_store_removes_temp_file_when_rename_fails() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in place of the snapshot file makes the rename fail
        let path = dir.path().join("page.json");
        tokio::fs::create_dir(&path).await.unwrap();

        let store = JsonFileStore::<Vec<String>>::new(&path);
        let result = store.save(Arc::new(vec!["a".to_string()])).await;

        assert!(matches!(result, Err(PersistenceError::Io(_))));
        assert!(!dir.path().join("page.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_json_file_store_reports_malformed_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.json");
        tokio::fs::write(&path, b"not json").await.unwrap();

        let store = JsonFileStore::<Vec<String>>::new(path);
        assert!(matches!(store.load().await, Err(PersistenceError::Serialization(_))));
    }
}

//! Snapshot store trait and related types.
//!
//! A snapshot store is the persistence gateway for a single state document:
//! it loads the last saved snapshot at startup and accepts whole-snapshot
//! writes afterwards. Debouncing lives in the runtime, not here.
//!
//! # Implementations
//!
//! - `JsonFileStore` (in `tabstate-runtime`): versioned JSON file on disk
//! - `InMemorySnapshotStore` (in `tabstate-testing`): records writes for tests
//!
//! # Dyn Compatibility
//!
//! Methods return `Pin<Box<dyn Future>>` instead of using `async fn` so the
//! runtime can hold an `Arc<dyn SnapshotStore<S>>`.

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors that can occur while loading or saving a snapshot.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Reading or writing the underlying medium failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// The snapshot could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The stored snapshot was written by an incompatible format version.
    #[error("Unsupported snapshot version {found} (supported: {supported})")]
    UnsupportedVersion {
        /// Version found in the stored snapshot.
        found: u32,
        /// Version this build reads and writes.
        supported: u32,
    },
}

/// Persistence gateway for a single state snapshot.
///
/// Implementations must be `Send + Sync`; the runtime calls `save` from a
/// background task.
pub trait SnapshotStore<S>: Send + Sync {
    /// Load the last saved snapshot.
    ///
    /// Returns `Ok(None)` when nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// - `Io`: the medium could not be read
    /// - `Serialization`: the stored data is malformed
    /// - `UnsupportedVersion`: the stored data uses another format version
    fn load(&self) -> Pin<Box<dyn Future<Output = Result<Option<S>, PersistenceError>> + Send + '_>>;

    /// Replace the saved snapshot with `snapshot`.
    ///
    /// # Errors
    ///
    /// - `Io`: the medium could not be written
    /// - `Serialization`: the snapshot could not be encoded
    fn save(&self, snapshot: S) -> Pin<Box<dyn Future<Output = Result<(), PersistenceError>> + Send + '_>>;
}

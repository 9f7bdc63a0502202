//! # Tabstate Testing
//!
//! Testing utilities and helpers for the tabstate reducer architecture.
//!
//! This crate provides:
//! - [`ReducerTest`], a Given/When/Then harness for reducers
//! - Effect assertion helpers
//! - An in-memory [`SnapshotStore`](tabstate_core::persistence::SnapshotStore)
//! - One-line tracing setup for tests
//!
//! ## Example
//!
//! ```ignore
//! use tabstate_testing::{ReducerTest, assertions};
//!
//! ReducerTest::new(PageReducer::new())
//!     .with_env(test_environment())
//!     .given_state(Arc::new(PageState::default()))
//!     .when_action(PageAction::StatsUpdated { stats })
//!     .then_state(|state| assert_eq!(state.stats.ads_blocked_stat, 3))
//!     .then_effects(assertions::assert_no_effects)
//!     .run();
//! ```

/// Given/When/Then harness for reducers
pub mod reducer_test;

/// Mock implementations of core traits
pub mod mocks {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::{Arc, Mutex, PoisonError};
    use tabstate_core::persistence::{PersistenceError, SnapshotStore};

    #[derive(Debug)]
    struct Inner<S> {
        stored: Option<S>,
        saved: Vec<S>,
        fail_next_save: bool,
    }

    /// In-memory snapshot store
    ///
    /// Keeps the last saved snapshot for `load` and records every successful
    /// save in order. Clones share the same storage.
    ///
    /// # Example
    ///
    /// ```
    /// use tabstate_testing::mocks::InMemorySnapshotStore;
    ///
    /// let store = InMemorySnapshotStore::with_snapshot(3_u32);
    /// assert!(store.saved().is_empty());
    /// ```
    #[derive(Debug)]
    pub struct InMemorySnapshotStore<S> {
        inner: Arc<Mutex<Inner<S>>>,
    }

    impl<S> Clone for InMemorySnapshotStore<S> {
        fn clone(&self) -> Self {
            Self {
                inner: Arc::clone(&self.inner),
            }
        }
    }

    impl<S: Clone> InMemorySnapshotStore<S> {
        /// Create an empty store (`load` returns `None`)
        #[must_use]
        pub fn new() -> Self {
            Self {
                inner: Arc::new(Mutex::new(Inner {
                    stored: None,
                    saved: Vec::new(),
                    fail_next_save: false,
                })),
            }
        }

        /// Create a store that already holds `snapshot`
        #[must_use]
        pub fn with_snapshot(snapshot: S) -> Self {
            let store = Self::new();
            store.lock().stored = Some(snapshot);
            store
        }

        /// Every successful save, oldest first
        #[must_use]
        pub fn saved(&self) -> Vec<S> {
            self.lock().saved.clone()
        }

        /// Make the next `save` fail with an I/O error
        pub fn fail_next_save(&self) {
            self.lock().fail_next_save = true;
        }

        fn lock(&self) -> std::sync::MutexGuard<'_, Inner<S>> {
            // A panicking test thread must not hide the recorded saves
            self.inner.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    impl<S: Clone> Default for InMemorySnapshotStore<S> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<S> SnapshotStore<S> for InMemorySnapshotStore<S>
    where
        S: Clone + Send + 'static,
    {
        fn load(&self) -> Pin<Box<dyn Future<Output = Result<Option<S>, PersistenceError>> + Send + '_>> {
            let stored = self.lock().stored.clone();
            Box::pin(async move { Ok(stored) })
        }

        fn save(&self, snapshot: S) -> Pin<Box<dyn Future<Output = Result<(), PersistenceError>> + Send + '_>> {
            let result = {
                let mut inner = self.lock();
                if inner.fail_next_save {
                    inner.fail_next_save = false;
                    Err(PersistenceError::Io("injected save failure".to_string()))
                } else {
                    inner.stored = Some(snapshot.clone());
                    inner.saved.push(snapshot);
                    Ok(())
                }
            };
            Box::pin(async move { result })
        }
    }
}

/// Test helpers and utilities
pub mod helpers {
    /// Install a `fmt` subscriber filtered by `RUST_LOG` for the current test
    ///
    /// Safe to call from many tests; only the first call installs anything.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    }
}

// Re-export commonly used items
pub use helpers::init_test_tracing;
pub use mocks::InMemorySnapshotStore;
pub use reducer_test::{ReducerTest, assertions};

//! # Tabstate Runtime
//!
//! Runtime implementation for the tabstate reducer architecture.
//!
//! This crate provides the Store that serializes dispatched actions through a
//! reducer, publishes each new state, and hands deferred work to the
//! side-effect scheduler and the debounced saver.
//!
//! ## Core Components
//!
//! - **Store**: Holds the current snapshot and runs one reducer call at a time
//! - **Scheduler**: Runs scheduled effects in order against the latest state
//! - **Debounced saver**: Collapses bursts of changes into single writes
//!
//! ## Example
//!
//! ```ignore
//! use tabstate_runtime::{Store, StoreConfig};
//!
//! let store = Store::with_config(initial_state, reducer, environment, StoreConfig::default())
//!     .with_persistence(snapshot_store);
//!
//! // Send an action
//! store.send(Action::DoSomething).await?;
//!
//! // Read state
//! let value = store.state(|s| s.some_field).await;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tabstate_core::{
    action::Action, effect::Effect, persistence::SnapshotStore, reducer::Reducer,
    snapshot::Snapshot,
};
use tokio::sync::{RwLock, watch};

/// Debounced snapshot persistence and the JSON file store
pub mod persistence;

/// Side-effect scheduler
pub mod scheduler;

pub use error::StoreError;
pub use persistence::{DebouncedSaver, JsonFileStore};
pub use scheduler::SideEffectScheduler;
pub use store::{Dispatch, Store};

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    ///
    /// Effect and save failures are not errors of the Store: they are logged
    /// where they happen and never reach the caller of `send`.
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects and saves to finish
        #[error("Shutdown timed out with {0} effects still pending")]
        ShutdownTimeout(usize),
    }
}

/// Configuration for Store instances
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tabstate_runtime::StoreConfig;
///
/// let config = StoreConfig::default()
///     .with_save_debounce(Duration::from_millis(200))
///     .with_shutdown_timeout(Duration::from_secs(2));
///
/// assert_eq!(config.save_debounce, Duration::from_millis(200));
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Quiet window before a changed state is written
    pub save_debounce: Duration,
    /// Default timeout for graceful shutdown
    pub shutdown_timeout: Duration,
}

impl StoreConfig {
    /// Create a new configuration with custom values
    #[must_use]
    pub const fn new(save_debounce: Duration, shutdown_timeout: Duration) -> Self {
        Self {
            save_debounce,
            shutdown_timeout,
        }
    }

    /// Set the save debounce window
    #[must_use]
    pub const fn with_save_debounce(mut self, window: Duration) -> Self {
        self.save_debounce = window;
        self
    }

    /// Set the default shutdown timeout
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            save_debounce: Duration::from_millis(50),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

/// Store module - The runtime for reducers
pub mod store {
    use super::{
        Action, Arc, AtomicBool, DebouncedSaver, Duration, Effect, Ordering, Reducer,
        RwLock, SideEffectScheduler, Snapshot, SnapshotStore, StoreConfig, StoreError, watch,
    };

    /// Outcome of a single dispatched action
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Dispatch {
        /// Whether the reducer produced a new snapshot
        pub changed: bool,
        /// Number of effects handed to the scheduler
        pub scheduled: usize,
    }

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock`; one reducer call at a time)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. The latest published snapshot (a `watch` channel read by effects)
    /// 5. Scheduled effects and debounced saves
    ///
    /// # Type Parameters
    ///
    /// - `S`: State snapshot type (compared by identity)
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: Arc<R>,
        environment: Arc<E>,
        latest: Arc<watch::Sender<S>>,
        scheduler: SideEffectScheduler<S>,
        saver: Option<DebouncedSaver<S>>,
        config: StoreConfig,
        shutdown: Arc<AtomicBool>,
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: Arc::clone(&self.reducer),
                environment: Arc::clone(&self.environment),
                latest: Arc::clone(&self.latest),
                scheduler: self.scheduler.clone(),
                saver: self.saver.clone(),
                config: self.config.clone(),
                shutdown: Arc::clone(&self.shutdown),
            }
        }
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        S: Snapshot + Send + Sync + 'static,
        A: Action + Send + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// Uses [`StoreConfig::default`]. No persistence is attached.
        ///
        /// # Panics
        ///
        /// Panics if called outside a Tokio runtime (the scheduler worker is
        /// spawned here).
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new Store with custom configuration
        ///
        /// # Panics
        ///
        /// Panics if called outside a Tokio runtime.
        #[must_use]
        pub fn with_config(
            initial_state: S,
            reducer: R,
            environment: E,
            config: StoreConfig,
        ) -> Self {
            let (latest, latest_rx) = watch::channel(initial_state.clone());
            let scheduler = SideEffectScheduler::spawn(latest_rx);

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer: Arc::new(reducer),
                environment: Arc::new(environment),
                latest: Arc::new(latest),
                scheduler,
                saver: None,
                config,
                shutdown: Arc::new(AtomicBool::new(false)),
            }
        }

        /// Attach a persistence gateway
        ///
        /// Every changed snapshot is handed to a [`DebouncedSaver`] using the
        /// configured `save_debounce` window.
        ///
        /// # Panics
        ///
        /// Panics if called outside a Tokio runtime.
        #[must_use]
        pub fn with_persistence(mut self, store: Arc<dyn SnapshotStore<S>>) -> Self {
            self.saver = Some(DebouncedSaver::spawn(store, self.config.save_debounce));
            self
        }

        /// Send an action to the store
        ///
        /// Runs the reducer under the write lock. If the snapshot changed, the
        /// new one is published and a debounced save is requested. Effects are
        /// then queued, still under the lock, in the order the reducer returned
        /// them, so they run after the new state is published and in the order
        /// their transitions happened.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        ///
        /// # Example
        ///
        /// ```ignore
        /// let dispatch = store.send(PageAction::StatsUpdated { stats }).await?;
        /// assert!(dispatch.changed);
        /// ```
        #[tracing::instrument(skip(self, action), fields(action = action.name()), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<Dispatch, StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            let name = action.name();
            metrics::counter!("store.actions.total", "action" => name).increment(1);

            let (changed, scheduled) = {
                let mut state = self.state.write().await;
                tracing::trace!("Acquired write lock on state");

                let before = state.clone();
                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut *state, action, &*self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                let changed = !before.same_snapshot(&*state);
                if changed {
                    self.latest.send_replace(state.clone());
                    if let Some(saver) = &self.saver {
                        saver.request(state.clone());
                    }
                }

                // Still under the lock: queue order must match transition order
                let mut scheduled = 0;
                for effect in effects {
                    if let Effect::Schedule(job) = effect {
                        self.scheduler.schedule(job);
                        scheduled += 1;
                    }
                }
                (changed, scheduled)
            };

            if changed {
                metrics::counter!("store.transitions.changed", "action" => name).increment(1);
            }

            tracing::debug!(changed, scheduled, "Action processed");
            Ok(Dispatch { changed, scheduled })
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let loaded = store.state(|s| s.initial_data_loaded).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// The most recently published snapshot
        #[must_use]
        pub fn snapshot(&self) -> S {
            self.latest.borrow().clone()
        }

        /// Subscribe to published snapshots
        ///
        /// The receiver sees every snapshot published after the call (values
        /// may be skipped if the receiver lags; the latest is always kept).
        #[must_use]
        pub fn subscribe(&self) -> watch::Receiver<S> {
            self.latest.subscribe()
        }

        /// Number of scheduled effects that have not finished yet
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.scheduler.pending()
        }

        /// Wait for scheduled effects to finish and write any pending save
        pub async fn flush(&self) {
            self.scheduler.wait_idle().await;
            if let Some(saver) = &self.saver {
                saver.flush().await;
            }
        }

        /// Stop accepting actions and flush outstanding work
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if outstanding effects and
        /// saves do not finish within `timeout`.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            self.shutdown.store(true, Ordering::Release);

            if tokio::time::timeout(timeout, self.flush()).await.is_ok() {
                tracing::info!("All effects completed, shutdown successful");
                Ok(())
            } else {
                let remaining = self.pending_effects();
                tracing::error!(remaining, "Shutdown timed out");
                Err(StoreError::ShutdownTimeout(remaining))
            }
        }

        /// Shut down using the configured `shutdown_timeout`
        ///
        /// # Errors
        ///
        /// See [`Store::shutdown`].
        pub async fn shutdown_default(&self) -> Result<(), StoreError> {
            self.shutdown(self.config.shutdown_timeout).await
        }
    }
}

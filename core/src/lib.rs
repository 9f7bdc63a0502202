//! # Tabstate Core
//!
//! Core traits and types for the tabstate reducer architecture.
//!
//! This crate holds the abstractions shared by the runtime and by domain crates.
//! It performs no I/O of its own.
//!
//! ## Core Concepts
//!
//! - **State**: An immutable snapshot, replaced wholesale when a transition changes it
//! - **Action**: A discrete, externally triggered event
//! - **Reducer**: `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: A description of deferred work, run later against the latest state
//! - **Snapshot**: Identity comparison used to detect "no change"
//!
//! ## Example
//!
//! ```ignore
//! use tabstate_core::{effect::Effect, reducer::Reducer, SmallVec};
//! use std::sync::Arc;
//!
//! impl Reducer for PageReducer {
//!     type State = Arc<PageState>;
//!     type Action = PageAction;
//!     type Environment = PageEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut Arc<PageState>,
//!         action: PageAction,
//!         env: &PageEnvironment,
//!     ) -> SmallVec<[Effect<Arc<PageState>>; 4]> {
//!         // Replace `*state` with a new Arc to publish a change
//!         SmallVec::new()
//!     }
//! }
//! ```

pub use smallvec::{SmallVec, smallvec};

/// Persistence abstraction for state snapshots
pub mod persistence;

/// Snapshot identity
pub mod snapshot;

/// Action module - naming for dispatched actions
///
/// Actions are plain enums owned by domain crates. The runtime only needs a
/// stable, cheap name for each action to label spans and metrics.
pub mod action {
    /// Common behavior for dispatched actions
    pub trait Action {
        /// Stable name of the action kind (e.g. `"stats_updated"`)
        fn name(&self) -> &'static str;
    }
}

/// Reducer module - The core trait for business logic
///
/// Reducers are functions: `(State, Action, Environment) → (State, Effects)`.
/// They may call synchronous, non-blocking collaborators from the environment,
/// but anything asynchronous is returned as an [`Effect`](crate::effect::Effect).
pub mod reducer {
    use super::{SmallVec, effect::Effect};

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state snapshot this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// # Change detection
    ///
    /// Callers compare the state before and after `reduce` by identity (see
    /// [`Snapshot`](crate::snapshot::Snapshot)). A reducer that recognizes no
    /// change must leave `state` untouched; a reducer that changes anything
    /// must replace `state` with a newly allocated snapshot and never mutate
    /// the previous one.
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into a new state and effects
        ///
        /// # Arguments
        ///
        /// - `state`: The current snapshot, replaced on change
        /// - `action`: The action to process
        /// - `env`: Reference to injected dependencies
        ///
        /// # Returns
        ///
        /// Effects to be scheduled by the runtime, in order
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::State>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects are values. The reducer returns them and the runtime executes them
/// after the transition that produced them has been published.
pub mod effect {
    use futures::future::BoxFuture;
    use thiserror::Error;

    /// Failure raised inside a scheduled effect
    ///
    /// Effect failures are logged by the runtime and never reach the caller
    /// that dispatched the action.
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum EffectError {
        /// The effect returned an error
        #[error("Effect failed: {0}")]
        Failed(String),

        /// The effect panicked while running
        #[error("Effect panicked: {0}")]
        Panicked(String),
    }

    type EffectFn<S> = Box<dyn FnOnce(S) -> BoxFuture<'static, Result<(), EffectError>> + Send>;

    /// A named unit of deferred work
    ///
    /// The closure receives whatever state is current when the effect runs,
    /// which may be several transitions newer than the one that scheduled it.
    pub struct ScheduledEffect<S> {
        name: &'static str,
        run: EffectFn<S>,
    }

    impl<S> ScheduledEffect<S> {
        /// Create a scheduled effect from a closure
        #[must_use]
        pub fn new<F>(name: &'static str, run: F) -> Self
        where
            F: FnOnce(S) -> BoxFuture<'static, Result<(), EffectError>> + Send + 'static,
        {
            Self {
                name,
                run: Box::new(run),
            }
        }

        /// Name used in logs and metrics
        #[must_use]
        pub const fn name(&self) -> &'static str {
            self.name
        }

        /// Run the effect against `latest`
        pub fn run(self, latest: S) -> BoxFuture<'static, Result<(), EffectError>> {
            (self.run)(latest)
        }
    }

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what
    /// should happen, returned from reducers and executed by the Store runtime.
    ///
    /// # Type Parameters
    ///
    /// - `S`: The state snapshot handed to scheduled effects
    pub enum Effect<S> {
        /// No-op effect
        ///
        /// Lets a match arm return an effect without scheduling anything. The
        /// Store drops it and does not count it in `Dispatch::scheduled`.
        None,

        /// Fire-and-forget work run against the latest state
        Schedule(ScheduledEffect<S>),
    }

    // Manual Debug implementation since closures don't implement Debug
    impl<S> std::fmt::Debug for Effect<S> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Schedule(effect) => f
                    .debug_tuple("Effect::Schedule")
                    .field(&effect.name())
                    .finish(),
            }
        }
    }

    impl<S> Effect<S> {
        /// Schedule a named closure to run against the latest state
        #[must_use]
        pub fn schedule<F>(name: &'static str, run: F) -> Self
        where
            F: FnOnce(S) -> BoxFuture<'static, Result<(), EffectError>> + Send + 'static,
        {
            Effect::Schedule(ScheduledEffect::new(name, run))
        }

        /// Name of the scheduled work, if any
        #[must_use]
        pub const fn name(&self) -> Option<&'static str> {
            match self {
                Effect::None => None,
                Effect::Schedule(effect) => Some(effect.name()),
            }
        }
    }
}

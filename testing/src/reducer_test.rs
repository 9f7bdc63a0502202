//! Ergonomic testing utilities for reducers
//!
//! This module provides a fluent API for testing reducers with readable Given-When-Then syntax.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use tabstate_core::{effect::Effect, reducer::Reducer, snapshot::Snapshot};

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Type alias for effect assertion functions
type EffectAssertion<S> = Box<dyn FnOnce(&[Effect<S>])>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// # Example
///
/// ```ignore
/// use tabstate_testing::ReducerTest;
///
/// ReducerTest::new(PageReducer::new())
///     .with_env(test_environment())
///     .given_state(Arc::new(PageState::default()))
///     .when_action(PageAction::CreateWallet)
///     .then_state(|state| {
///         assert!(state.rewards_state.wallet_creating);
///     })
///     .then_effects(|effects| {
///         assert!(effects.is_empty());
///     })
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    action: Option<A>,
    expect_unchanged: Option<bool>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<S>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
    S: Snapshot,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            action: None,
            expect_unchanged: None,
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Set the action to test (When)
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.action = Some(action);
        self
    }

    /// Assert the reducer returned the very same snapshot (Then)
    #[must_use]
    pub fn then_unchanged(mut self) -> Self {
        self.expect_unchanged = Some(true);
        self
    }

    /// Assert the reducer replaced the snapshot (Then)
    #[must_use]
    pub fn then_changed(mut self) -> Self {
        self.expect_unchanged = Some(false);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the resulting effects (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<S>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, action, or environment is not set,
    /// or if any assertions fail.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let initial = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        let action = self.action.expect("Action must be set with when_action()");

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        // Execute reducer
        let mut state = initial.clone();
        let effects = self.reducer.reduce(&mut state, action, &env);

        if let Some(expect_unchanged) = self.expect_unchanged {
            let unchanged = initial.same_snapshot(&state);
            assert_eq!(
                unchanged, expect_unchanged,
                "Expected the reducer to {} the snapshot",
                if expect_unchanged { "keep" } else { "replace" }
            );
        }

        // Run state assertions
        for assertion in self.state_assertions {
            assertion(&state);
        }

        // Run effect assertions
        for assertion in self.effect_assertions {
            assertion(&effects);
        }
    }
}

/// Helper assertions for effects
pub mod assertions {
    use tabstate_core::effect::Effect;

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if any effect other than `Effect::None` is present.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<S>(effects: &[Effect<S>]) {
        assert!(
            effects.iter().all(|e| matches!(e, Effect::None)),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count<S>(effects: &[Effect<S>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Assert that exactly one scheduled effect carries `name`
    ///
    /// # Panics
    ///
    /// Panics if no scheduled effect, or more than one, has the given name.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_scheduled<S>(effects: &[Effect<S>], name: &str) {
        let matching = effects.iter().filter(|e| e.name() == Some(name)).count();
        assert_eq!(
            matching, 1,
            "Expected exactly one scheduled effect named {name:?}, found {matching}: {effects:?}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::Arc;
    use tabstate_core::{SmallVec, effect::EffectError, smallvec};

    #[derive(Clone, Debug)]
    struct TestState {
        count: i32,
    }

    #[derive(Clone, Debug)]
    enum TestAction {
        Increment,
        Noop,
        Notify,
    }

    struct TestReducer;

    struct TestEnv;

    impl Reducer for TestReducer {
        type State = Arc<TestState>;
        type Action = TestAction;
        type Environment = TestEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::State>; 4]> {
            match action {
                TestAction::Increment => {
                    *state = Arc::new(TestState {
                        count: state.count + 1,
                    });
                    SmallVec::new()
                },
                TestAction::Noop => SmallVec::new(),
                TestAction::Notify => {
                    smallvec![Effect::schedule("notify", |_| {
                        async { Ok::<(), EffectError>(()) }.boxed()
                    })]
                },
            }
        }
    }

    #[test]
    fn test_reducer_test_increment() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(Arc::new(TestState { count: 0 }))
            .when_action(TestAction::Increment)
            .then_changed()
            .then_state(|state| {
                assert_eq!(state.count, 1);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_reducer_test_noop_keeps_snapshot() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(Arc::new(TestState { count: 5 }))
            .when_action(TestAction::Noop)
            .then_unchanged()
            .run();
    }

    #[test]
    fn test_assert_scheduled() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(Arc::new(TestState { count: 0 }))
            .when_action(TestAction::Notify)
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_scheduled(effects, "notify");
            })
            .run();
    }

    #[test]
    fn test_assertions_no_effects() {
        assertions::assert_no_effects::<u8>(&[Effect::None]);
        assertions::assert_no_effects::<u8>(&[]);
    }
}

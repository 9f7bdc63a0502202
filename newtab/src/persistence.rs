//! Startup state loading.

use crate::state::PageState;
use std::sync::Arc;
use tabstate_core::persistence::SnapshotStore;

/// Facts about the current browser session that never come from a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    /// The page lives in an incognito profile
    pub is_incognito: bool,
}

/// Load the page state persisted by a previous page.
///
/// The snapshot is merged over the defaults field by field, so snapshots from
/// older pages that lack newer fields still load. Session-scoped fields are
/// always taken from `session`: `initial_data_loaded` is reset and
/// `is_incognito` is the live value.
///
/// A missing snapshot yields the defaults. A snapshot that fails to load is
/// logged and also yields the defaults; startup never fails on persistence.
pub async fn load_page_state(store: &dyn SnapshotStore<Arc<PageState>>, session: Session) -> Arc<PageState> {
    let persisted = match store.load().await {
        Ok(Some(snapshot)) => {
            tracing::debug!("Restoring persisted page state");
            Some(snapshot)
        },
        Ok(None) => {
            tracing::debug!("No persisted page state, starting from defaults");
            None
        },
        Err(error) => {
            tracing::error!(error = %error, "Failed to load persisted page state, starting from defaults");
            None
        },
    };

    let mut state = persisted.map_or_else(PageState::default, |snapshot| PageState::clone(&snapshot));
    state.initial_data_loaded = false;
    state.is_incognito = session.is_incognito;
    Arc::new(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Promotion, RewardsState};
    use tabstate_core::persistence::PersistenceError;
    use tabstate_testing::InMemorySnapshotStore;

    #[tokio::test]
    async fn test_missing_snapshot_gives_defaults() {
        let store = InMemorySnapshotStore::<Arc<PageState>>::new();
        let state = load_page_state(&store, Session { is_incognito: true }).await;

        assert!(state.is_incognito);
        assert_eq!(*state, PageState::new(true));
    }

    #[tokio::test]
    async fn test_snapshot_keeps_persisted_fields_but_not_session_fields() {
        let mut persisted = PageState::default();
        persisted.initial_data_loaded = true;
        persisted.is_incognito = true;
        persisted.preferences.show_top_sites = true;
        persisted.rewards_state = Arc::new(RewardsState {
            promotions: vec![Promotion::new("p", 1)],
            ..RewardsState::default()
        });
        let store = InMemorySnapshotStore::with_snapshot(Arc::new(persisted));

        let state = load_page_state(&store, Session::default()).await;

        assert!(!state.initial_data_loaded);
        assert!(!state.is_incognito);
        assert!(state.preferences.show_top_sites);
        assert_eq!(state.rewards_state.promotions, vec![Promotion::new("p", 1)]);
    }

    struct BrokenStore;

    impl SnapshotStore<Arc<PageState>> for BrokenStore {
        fn load(
            &self,
        ) -> std::pin::Pin<
            Box<dyn std::future::Future<Output = Result<Option<Arc<PageState>>, PersistenceError>> + Send + '_>,
        > {
            Box::pin(async { Err(PersistenceError::Serialization("truncated".to_string())) })
        }

        fn save(
            &self,
            _snapshot: Arc<PageState>,
        ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), PersistenceError>> + Send + '_>> {
            Box::pin(async { Ok(()) })
        }
    }

    #[tokio::test]
    async fn test_load_failure_falls_back_to_defaults() {
        let state = load_page_state(&BrokenStore, Session { is_incognito: false }).await;
        assert_eq!(*state, PageState::default());
    }
}

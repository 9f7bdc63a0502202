//! End-to-end tests: New Tab reducer running inside the runtime Store.

use std::sync::Arc;
use std::time::Duration;
use tabstate_newtab::action::{InitialData, PrivateTabData};
use tabstate_newtab::mocks::{MockCollaborators, WallpaperApiBehavior};
use tabstate_newtab::state::{Preferences, PreferencesPatch, StatsSnapshot};
use tabstate_newtab::{
    NewTabAction, NewTabStore, PageState, RewardsResult, Session, WalletStatus, load_page_state, new_tab_store,
};
use tabstate_runtime::{JsonFileStore, StoreConfig};
use tabstate_testing::{InMemorySnapshotStore, init_test_tracing};

fn initial_data(show_background_image: bool) -> NewTabAction {
    NewTabAction::SetInitialData(InitialData {
        preferences: Preferences {
            show_background_image,
            ..Preferences::default()
        },
        stats: StatsSnapshot::default(),
        branded_wallpaper_data: None,
        private_tab_data: PrivateTabData::default(),
    })
}

fn stats(ads_blocked_stat: u64) -> NewTabAction {
    NewTabAction::StatsUpdated {
        stats: StatsSnapshot {
            ads_blocked_stat,
            ..StatsSnapshot::default()
        },
    }
}

fn store_with(
    initial: PageState,
    mocks: &MockCollaborators,
    snapshots: &InMemorySnapshotStore<Arc<PageState>>,
) -> NewTabStore {
    new_tab_store(
        Arc::new(initial),
        mocks.environment(),
        StoreConfig::default(),
        Arc::new(snapshots.clone()),
    )
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_changes_is_saved_once() {
    init_test_tracing();
    let mocks = MockCollaborators::new();
    let snapshots = InMemorySnapshotStore::new();
    let store = store_with(PageState::default(), &mocks, &snapshots);

    for count in 1..=3 {
        assert!(store.send(stats(count)).await.unwrap().changed);
    }
    tokio::time::sleep(Duration::from_millis(200)).await;

    let saved = snapshots.saved();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].stats.ads_blocked_stat, 3);
}

#[tokio::test]
async fn test_identity_transitions_are_not_saved() {
    let mocks = MockCollaborators::new();
    let snapshots = InMemorySnapshotStore::new();
    let store = store_with(PageState::default(), &mocks, &snapshots);
    let before = store.snapshot();

    let dispatch = store.send(NewTabAction::Unrecognized).await.unwrap();
    let dispatch_failed = store
        .send(NewTabAction::OnPromotions {
            result: RewardsResult::LedgerError,
            promotions: Vec::new(),
        })
        .await
        .unwrap();
    store.flush().await;

    assert!(!dispatch.changed);
    assert!(!dispatch_failed.changed);
    assert!(Arc::ptr_eq(&before, &store.snapshot()));
    assert!(snapshots.saved().is_empty());
}

#[tokio::test]
async fn test_view_is_registered_for_regular_pages() {
    let mocks = MockCollaborators::new();
    let snapshots = InMemorySnapshotStore::new();
    let store = store_with(PageState::new(false), &mocks, &snapshots);

    let dispatch = store.send(initial_data(false)).await.unwrap();
    store.flush().await;

    assert_eq!(dispatch.scheduled, 1);
    assert_eq!(mocks.branded_wallpaper.views(), 1);
}

#[tokio::test]
async fn test_incognito_pages_skip_view_registration() {
    let mocks = MockCollaborators::new();
    let snapshots = InMemorySnapshotStore::new();
    let store = store_with(PageState::new(true), &mocks, &snapshots);

    store.send(initial_data(false)).await.unwrap();
    store.flush().await;

    assert_eq!(mocks.branded_wallpaper.attempts(), 0);
    assert!(store.snapshot().initial_data_loaded);
}

#[tokio::test]
async fn test_failing_view_registration_does_not_touch_state() {
    init_test_tracing();
    for behavior in [WallpaperApiBehavior::Fail, WallpaperApiBehavior::Panic] {
        let mocks = MockCollaborators::new().with_wallpaper_behavior(behavior);
        let snapshots = InMemorySnapshotStore::new();
        let store = store_with(PageState::default(), &mocks, &snapshots);

        store.send(initial_data(false)).await.unwrap();
        store.flush().await;
        let after_effect = store.snapshot();

        assert_eq!(mocks.branded_wallpaper.attempts(), 1);
        assert_eq!(mocks.branded_wallpaper.views(), 0);
        assert!(after_effect.initial_data_loaded);
        assert_eq!(store.pending_effects(), 0);

        // The dispatch path keeps working afterwards
        assert!(store.send(stats(9)).await.unwrap().changed);
        assert_eq!(store.state(|s| s.stats.ads_blocked_stat).await, 9);
    }
}

#[tokio::test]
async fn test_turning_backgrounds_on_shows_an_image() {
    let mocks = MockCollaborators::new();
    let snapshots = InMemorySnapshotStore::new();
    let store = store_with(PageState::default(), &mocks, &snapshots);
    assert!(store.snapshot().background_image.is_none());

    store
        .send(NewTabAction::PreferencesUpdated(PreferencesPatch {
            show_background_image: Some(true),
            ..PreferencesPatch::default()
        }))
        .await
        .unwrap();

    assert!(store.snapshot().background_image.is_some());
    assert_eq!(mocks.backgrounds.calls(), 1);
}

#[tokio::test]
async fn test_wallet_creation_flow() {
    let mocks = MockCollaborators::new();
    let snapshots = InMemorySnapshotStore::new();
    let store = store_with(PageState::default(), &mocks, &snapshots);
    let mut updates = store.subscribe();

    store.send(NewTabAction::CreateWallet).await.unwrap();
    assert!(updates.has_changed().unwrap());
    assert_eq!(
        updates.borrow_and_update().rewards_state.wallet_status(),
        WalletStatus::Creating
    );

    store
        .send(NewTabAction::OnWalletInitialized {
            result: RewardsResult::WalletCreated,
        })
        .await
        .unwrap();
    store.flush().await;

    assert_eq!(store.snapshot().rewards_state.wallet_status(), WalletStatus::Created);
    assert_eq!(mocks.rewards.wallets_requested(), 1);
    assert_eq!(
        mocks.rewards.settings(),
        vec![("adsEnabled".to_string(), "true".to_string())]
    );
    let saved = snapshots.saved();
    assert_eq!(
        saved.last().map(|s| s.rewards_state.wallet_status()),
        Some(WalletStatus::Created)
    );
}

#[tokio::test]
async fn test_json_snapshot_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("newtab-state.json");
    let mocks = MockCollaborators::new();

    let file = Arc::new(JsonFileStore::<PageState>::new(&path));
    let store = new_tab_store(
        load_page_state(&*file, Session::default()).await,
        mocks.environment(),
        StoreConfig::default(),
        file.clone(),
    );
    store.send(initial_data(true)).await.unwrap();
    store
        .send(NewTabAction::DismissNotification { id: "promo-1".to_string() })
        .await
        .unwrap();
    store.shutdown(Duration::from_secs(5)).await.unwrap();

    let restored = load_page_state(&*file, Session { is_incognito: true }).await;
    assert!(!restored.initial_data_loaded);
    assert!(restored.is_incognito);
    assert!(restored.preferences.show_background_image);
    assert!(restored.background_image.is_some());
    assert_eq!(restored.rewards_state.dismissed_notifications, vec!["promo-1".to_string()]);
}

#[tokio::test]
async fn test_shutdown_rejects_new_actions() {
    let mocks = MockCollaborators::new();
    let snapshots = InMemorySnapshotStore::new();
    let store = store_with(PageState::default(), &mocks, &snapshots);

    store.shutdown(Duration::from_secs(1)).await.unwrap();
    assert!(store.send(stats(1)).await.is_err());
}

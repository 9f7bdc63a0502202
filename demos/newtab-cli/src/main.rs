//! New Tab controller binary
//!
//! Loads the persisted page state, replays a script of host messages (one JSON
//! object per line, from the file given as the first argument or a built-in
//! script), then shuts down and writes the final snapshot.
//!
//! Host bridges are stand-ins that log what the page asked for.

use anyhow::Context;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::sync::Arc;
use tabstate_core::effect::EffectError;
use tabstate_newtab::environment::{BrandedWallpaperApi, PreferencesAdapter, RewardsHost};
use tabstate_newtab::{
    ImageCatalog, NewTabAction, NewTabConfig, NewTabEnvironment, PageState, Session, load_page_state, new_tab_store,
};
use tabstate_runtime::JsonFileStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_SCRIPT: &str = r#"
{"type": "set_initial_data", "payload": {"preferences": {"showBackgroundImage": true, "showStats": true, "brandedWallpaperOptIn": true, "isBrandedWallpaperNotificationDismissed": false}, "stats": {"adsBlockedStat": 42}, "privateTabData": {"useAlternativePrivateSearchEngine": false}}}
{"type": "set_pre_initial_rewards_data", "payload": {"enabledAds": false, "adsSupported": true, "enabledMain": true}}
{"type": "create_wallet"}
{"type": "on_wallet_initialized", "payload": {"result": 12}}
{"type": "set_initial_rewards_data", "payload": {"onlyAnonWallet": false, "balance": 10.0, "report": {"ads": 1.0, "contribute": 2.0, "grant": 0.0, "monthly": 1.0, "tips": 0.5}, "adsEstimatedEarnings": 1.25}}
{"type": "on_promotions", "payload": {"result": 0, "promotions": [{"promotionId": "welcome", "type": 0}, {"promotionId": "ads-bonus", "type": 1}]}}
{"type": "on_promotion_finish", "payload": {"result": 0, "promotion": {"promotionId": "welcome", "type": 0}}}
{"type": "dismiss_branded_wallpaper_notification", "payload": {"isUserAction": true}}
{"type": "top_sites_updated", "payload": {"sites": []}}
{"type": "stats_updated", "payload": {"stats": {"adsBlockedStat": 43, "httpsUpgradesStat": 7}}}
"#;

/// Rewards bridge that only logs
struct LoggingRewardsHost;

impl RewardsHost for LoggingRewardsHost {
    fn create_wallet(&self) {
        tracing::info!("Host: create wallet");
    }

    fn save_ads_setting(&self, key: &str, value: &str) {
        tracing::info!(key, value, "Host: save ads setting");
    }
}

/// Preference storage that only logs
struct LoggingPreferences;

impl PreferencesAdapter for LoggingPreferences {
    fn save_is_branded_wallpaper_notification_dismissed(&self, dismissed: bool) {
        tracing::info!(dismissed, "Host: save wallpaper notification dismissed");
    }
}

/// Wallpaper reporting that only logs
struct LoggingWallpaperApi;

impl BrandedWallpaperApi for LoggingWallpaperApi {
    fn register_view_count(&self) -> BoxFuture<'static, Result<(), EffectError>> {
        async {
            tracing::info!("Host: register wallpaper view");
            Ok::<(), EffectError>(())
        }
        .boxed()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = NewTabConfig::from_env().context("invalid configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let catalog = match &config.background_catalog {
        Some(path) => ImageCatalog::from_file(path)
            .await
            .with_context(|| format!("failed to load background catalog {}", path.display()))?,
        None => ImageCatalog::bundled(),
    };

    let environment = NewTabEnvironment::new(
        Arc::new(catalog),
        Arc::new(LoggingWallpaperApi),
        Arc::new(LoggingPreferences),
        Arc::new(LoggingRewardsHost),
    );

    let snapshots = Arc::new(JsonFileStore::<PageState>::new(&config.snapshot_path));
    let session = Session {
        is_incognito: config.incognito,
    };
    let initial = load_page_state(&*snapshots, session).await;
    let store = new_tab_store(initial, environment, config.store_config(), snapshots);

    let script = match std::env::args().nth(1) {
        Some(path) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read script {path}"))?,
        None => DEFAULT_SCRIPT.to_string(),
    };

    for line in script.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let action = match NewTabAction::from_json(line) {
            Ok(action) => action,
            Err(error) => {
                tracing::warn!(error = %error, "Skipping undecodable host message");
                continue;
            },
        };
        let dispatch = store.send(action).await?;
        tracing::info!(changed = dispatch.changed, scheduled = dispatch.scheduled, "Dispatched");
    }

    store.shutdown_default().await?;

    let state = store.snapshot();
    println!("{}", serde_json::to_string_pretty(&*state)?);
    println!(
        "Wallet: {:?}, active promotions: {}, snapshot: {}",
        state.rewards_state.wallet_status(),
        state.rewards_state.promotions.len(),
        config.snapshot_path.display()
    );
    Ok(())
}

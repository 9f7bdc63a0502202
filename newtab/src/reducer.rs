//! Reducer for the New Tab page.
//!
//! Every arm either leaves `state` untouched (identity transition, nothing is
//! published or saved) or replaces it with a freshly allocated [`PageState`].
//! Arms that touch rewards also allocate a fresh [`RewardsState`]; all other
//! arms keep sharing the previous one.

use crate::action::{InitialData, InitialRewardsData, NewTabAction, PreInitialRewardsData, RewardsResult};
use crate::environment::NewTabEnvironment;
use crate::rewards::{status_after_initialization, total_contributions};
use crate::state::{PageState, PreferencesPatch, RewardsState, WalletStatus};
use futures::FutureExt;
use std::sync::Arc;
use tabstate_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};

/// Effects produced by one transition
type Effects = SmallVec<[Effect<Arc<PageState>>; 4]>;

/// Name of the scheduled sponsored-wallpaper view registration
pub const REGISTER_VIEW_COUNT: &str = "register_view_count";

/// Setting written when a new wallet turns ads on by default
const ADS_ENABLED_SETTING: &str = "adsEnabled";

/// Reducer for the New Tab page
#[derive(Clone, Debug)]
pub struct NewTabReducer;

impl NewTabReducer {
    /// Creates a new `NewTabReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Publish a copy of the page with `f` applied
    fn update(state: &mut Arc<PageState>, f: impl FnOnce(&mut PageState)) {
        let mut next = PageState::clone(state);
        f(&mut next);
        *state = Arc::new(next);
    }

    /// Publish a copy of the page whose rewards are a copy with `f` applied
    fn update_rewards(state: &mut Arc<PageState>, f: impl FnOnce(&mut RewardsState)) {
        let mut rewards = RewardsState::clone(&state.rewards_state);
        f(&mut rewards);
        Self::update(state, |page| page.rewards_state = Arc::new(rewards));
    }

    fn set_initial_data(state: &mut Arc<PageState>, data: InitialData, env: &NewTabEnvironment) -> Effects {
        let background = data
            .preferences
            .show_background_image
            .then(|| env.backgrounds.random_background_image());

        Self::update(state, |page| {
            page.initial_data_loaded = true;
            page.preferences = data.preferences;
            page.stats = data.stats;
            page.branded_wallpaper_data = data.branded_wallpaper_data;
            page.use_alternative_private_search_engine = data.private_tab_data.use_alternative_private_search_engine;
            if let Some(image) = background {
                page.background_image = Some(image);
            }
        });

        let api = Arc::clone(&env.branded_wallpaper);
        smallvec![Effect::schedule(REGISTER_VIEW_COUNT, move |latest: Arc<PageState>| {
            async move {
                if latest.is_incognito {
                    tracing::trace!("Incognito page, not registering wallpaper view");
                    return Ok(());
                }
                api.register_view_count().await
            }
            .boxed()
        })]
    }

    fn preferences_updated(state: &mut Arc<PageState>, patch: PreferencesPatch, env: &NewTabEnvironment) {
        let previous = &state.preferences;
        // Counting a view may dismiss the notification in storage; keep
        // showing it until the page is reloaded
        let merged = PreferencesPatch {
            is_branded_wallpaper_notification_dismissed: None,
            ..patch
        }
        .apply(previous);

        let has_branded = state.branded_wallpaper_data.is_some();
        let turned_wallpaper_off = previous.show_background_image && !merged.show_background_image;
        let clear_branded = has_branded && (!merged.branded_wallpaper_opt_in || turned_wallpaper_off);
        let background = (!previous.show_background_image && merged.show_background_image)
            .then(|| env.backgrounds.random_background_image());

        Self::update(state, |page| {
            page.preferences = merged;
            if clear_branded {
                page.branded_wallpaper_data = None;
            }
            if let Some(image) = background {
                page.background_image = Some(image);
            }
        });
    }

    fn wallet_initialized(state: &mut Arc<PageState>, result: RewardsResult, env: &NewTabEnvironment) {
        let Some(status) = status_after_initialization(result) else {
            tracing::debug!(result = i32::from(result), "Wallet initialization result leaves status as is");
            Self::update_rewards(state, |_| {});
            return;
        };

        if status == WalletStatus::Created {
            env.rewards.save_ads_setting(ADS_ENABLED_SETTING, "true");
        }
        tracing::debug!(from = ?state.rewards_state.wallet_status(), to = ?status, "Wallet status changed");
        Self::update_rewards(state, |rewards| rewards.set_wallet_status(status));
    }

    fn set_pre_initial_rewards_data(state: &mut Arc<PageState>, data: PreInitialRewardsData) {
        Self::update_rewards(state, |rewards| {
            rewards.enabled_ads = data.enabled_ads;
            rewards.ads_supported = data.ads_supported;
            rewards.enabled_main = data.enabled_main;
        });
    }

    fn set_initial_rewards_data(state: &mut Arc<PageState>, data: InitialRewardsData) {
        Self::update_rewards(state, |rewards| {
            rewards.only_anon_wallet = data.only_anon_wallet;
            rewards.balance = data.balance;
            rewards.total_contribution = total_contributions(Some(&data.report));
            rewards.ads_estimated_earnings = data.ads_estimated_earnings;
        });
    }
}

impl Default for NewTabReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for NewTabReducer {
    type State = Arc<PageState>;
    type Action = NewTabAction;
    type Environment = NewTabEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::State>; 4]> {
        match action {
            // ========== Page ==========
            NewTabAction::SetInitialData(data) => return Self::set_initial_data(state, data, env),

            NewTabAction::StatsUpdated { stats } => Self::update(state, |page| page.stats = stats),

            NewTabAction::PrivateTabDataUpdated(data) => Self::update(state, |page| {
                page.use_alternative_private_search_engine = data.use_alternative_private_search_engine;
            }),

            NewTabAction::DismissBrandedWallpaperNotification { is_user_action } => {
                env.preferences
                    .save_is_branded_wallpaper_notification_dismissed(true);
                // Automatic dismissals only update storage
                if is_user_action {
                    Self::update(state, |page| {
                        page.preferences.is_branded_wallpaper_notification_dismissed = true;
                    });
                }
            },

            NewTabAction::PreferencesUpdated(preferences) => Self::preferences_updated(state, preferences, env),

            // ========== Wallet ==========
            NewTabAction::CreateWallet => {
                env.rewards.create_wallet();
                Self::update_rewards(state, |rewards| rewards.set_wallet_status(WalletStatus::Creating));
            },

            NewTabAction::OnWalletInitialized { result } => Self::wallet_initialized(state, result, env),

            NewTabAction::OnWalletExists { exists } => {
                if exists && state.rewards_state.wallet_status() != WalletStatus::Created {
                    Self::update_rewards(state, |rewards| rewards.set_wallet_status(WalletStatus::Created));
                }
            },

            // ========== Rewards fields ==========
            NewTabAction::OnEnabledMain {
                enabled_main,
                enabled_ads,
            } => Self::update_rewards(state, |rewards| {
                rewards.enabled_main = enabled_main;
                if let Some(enabled_ads) = enabled_ads {
                    rewards.enabled_ads = enabled_ads;
                }
            }),

            NewTabAction::OnAdsEnabled { enabled } => {
                Self::update_rewards(state, |rewards| rewards.enabled_ads = enabled);
            },

            NewTabAction::OnAdsEstimatedEarnings { amount } => {
                Self::update_rewards(state, |rewards| rewards.ads_estimated_earnings = amount);
            },

            NewTabAction::OnBalanceReport { report } => Self::update_rewards(state, |rewards| {
                rewards.total_contribution = total_contributions(report.as_ref());
            }),

            NewTabAction::OnBalance { balance } => {
                Self::update_rewards(state, |rewards| rewards.balance = balance);
            },

            NewTabAction::SetPreInitialRewardsData(data) => Self::set_pre_initial_rewards_data(state, data),

            NewTabAction::SetInitialRewardsData(data) => Self::set_initial_rewards_data(state, data),

            // ========== Promotions ==========
            NewTabAction::OnPromotions { result, promotions } => {
                if result == RewardsResult::LedgerError {
                    return SmallVec::new();
                }
                Self::update_rewards(state, |rewards| {
                    let added = rewards.ingest_promotions(&promotions);
                    tracing::debug!(offered = promotions.len(), added, "Promotions ingested");
                });
            },

            NewTabAction::DismissNotification { id } => Self::update_rewards(state, |rewards| rewards.dismiss(&id)),

            NewTabAction::OnPromotionFinish { result, promotion } => {
                if result == RewardsResult::Ok {
                    Self::update_rewards(state, |rewards| rewards.dismiss(&promotion.promotion_id));
                }
            },

            NewTabAction::Unrecognized => {},
        }

        SmallVec::new()
    }
}

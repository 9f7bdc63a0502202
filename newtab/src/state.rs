//! Page state for the New Tab surface.
//!
//! [`PageState`] is the single document the reducer transitions. Published
//! snapshots are shared as `Arc<PageState>` and never mutated; a transition
//! that changes anything clones the record, edits the clone, and publishes a
//! new `Arc`. The same applies one level down to [`RewardsState`]: transitions
//! that do not touch rewards share the previous `Arc<RewardsState>`, and those
//! that do build a fresh one.
//!
//! Field names serialize in camelCase so persisted snapshots keep the layout
//! the page has always used.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// User-facing page preferences.
///
/// Flattened into [`PageState`] on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    /// Show a background image behind the page
    pub show_background_image: bool,
    /// Show the privacy stats widget
    pub show_stats: bool,
    /// Show the clock widget
    pub show_clock: bool,
    /// Show the top sites grid
    pub show_top_sites: bool,
    /// Show the rewards widget
    pub show_rewards: bool,
    /// Allow sponsored (branded) wallpapers
    pub branded_wallpaper_opt_in: bool,
    /// The sponsored wallpaper notification was dismissed
    pub is_branded_wallpaper_notification_dismissed: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            show_background_image: false,
            show_stats: false,
            show_clock: false,
            show_top_sites: false,
            show_rewards: false,
            branded_wallpaper_opt_in: false,
            is_branded_wallpaper_notification_dismissed: true,
        }
    }
}

/// Preference fields reported by the host.
///
/// Fields the message leaves out are `None` and keep their current value when
/// applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreferencesPatch {
    /// New `show_background_image`, if reported
    pub show_background_image: Option<bool>,
    /// New `show_stats`, if reported
    pub show_stats: Option<bool>,
    /// New `show_clock`, if reported
    pub show_clock: Option<bool>,
    /// New `show_top_sites`, if reported
    pub show_top_sites: Option<bool>,
    /// New `show_rewards`, if reported
    pub show_rewards: Option<bool>,
    /// New `branded_wallpaper_opt_in`, if reported
    pub branded_wallpaper_opt_in: Option<bool>,
    /// New `is_branded_wallpaper_notification_dismissed`, if reported
    pub is_branded_wallpaper_notification_dismissed: Option<bool>,
}

impl PreferencesPatch {
    /// `current` with every reported field replaced
    #[must_use]
    pub fn apply(&self, current: &Preferences) -> Preferences {
        Preferences {
            show_background_image: self.show_background_image.unwrap_or(current.show_background_image),
            show_stats: self.show_stats.unwrap_or(current.show_stats),
            show_clock: self.show_clock.unwrap_or(current.show_clock),
            show_top_sites: self.show_top_sites.unwrap_or(current.show_top_sites),
            show_rewards: self.show_rewards.unwrap_or(current.show_rewards),
            branded_wallpaper_opt_in: self.branded_wallpaper_opt_in.unwrap_or(current.branded_wallpaper_opt_in),
            is_branded_wallpaper_notification_dismissed: self
                .is_branded_wallpaper_notification_dismissed
                .unwrap_or(current.is_branded_wallpaper_notification_dismissed),
        }
    }
}

impl From<Preferences> for PreferencesPatch {
    fn from(preferences: Preferences) -> Self {
        Self {
            show_background_image: Some(preferences.show_background_image),
            show_stats: Some(preferences.show_stats),
            show_clock: Some(preferences.show_clock),
            show_top_sites: Some(preferences.show_top_sites),
            show_rewards: Some(preferences.show_rewards),
            branded_wallpaper_opt_in: Some(preferences.branded_wallpaper_opt_in),
            is_branded_wallpaper_notification_dismissed: Some(preferences.is_branded_wallpaper_notification_dismissed),
        }
    }
}

/// Privacy counters supplied by the browser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsSnapshot {
    /// Ads and trackers blocked
    pub ads_blocked_stat: u64,
    /// Scripts blocked
    pub javascript_blocked_stat: u64,
    /// Connections upgraded to HTTPS
    pub https_upgrades_stat: u64,
    /// Fingerprinting attempts blocked
    pub fingerprinting_blocked_stat: u64,
}

/// Logo shown alongside a sponsored wallpaper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandLogo {
    /// Logo image URL
    pub image: String,
    /// Sponsor name
    pub company_name: String,
    /// Alt text
    pub alt: String,
    /// Where clicking the logo navigates
    pub destination_url: String,
}

/// A sponsored wallpaper selected for this page view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WallpaperInfo {
    /// Wallpaper image URL
    pub wallpaper_image_url: String,
    /// Whether the wallpaper is paid placement
    #[serde(default)]
    pub is_sponsored: bool,
    /// Sponsor logo, if any
    #[serde(default)]
    pub logo: Option<BrandLogo>,
}

/// A (non-sponsored) background image reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundImage {
    /// Display name
    pub name: String,
    /// Image URL
    pub source: String,
    /// Photographer credit
    pub author: String,
    /// Link to the photographer
    pub link: String,
}

/// A reward grant offered to the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Promotion {
    /// Identifier assigned by the rewards host
    #[serde(rename = "promotionId")]
    pub promotion_id: String,
    /// Host-defined promotion type code
    #[serde(rename = "type")]
    pub promotion_type: i32,
}

impl Promotion {
    /// Create a promotion
    #[must_use]
    pub fn new(promotion_id: impl Into<String>, promotion_type: i32) -> Self {
        Self {
            promotion_id: promotion_id.into(),
            promotion_type,
        }
    }
}

/// Lifecycle of the rewards wallet.
///
/// Stored as four flags on [`RewardsState`] for snapshot compatibility; the
/// flags are only ever written together through
/// [`RewardsState::set_wallet_status`], so at most one of them is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum WalletStatus {
    /// No wallet and none requested
    #[default]
    NoWallet,
    /// Creation requested, waiting for the host
    Creating,
    /// Wallet exists
    Created,
    /// The host reported a failed creation
    CreateFailed,
    /// The host reported a corrupted wallet
    Corrupted,
}

/// Rewards program sub-state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RewardsState {
    pub(crate) wallet_creating: bool,
    pub(crate) wallet_created: bool,
    pub(crate) wallet_create_failed: bool,
    pub(crate) wallet_corrupted: bool,
    /// Rewards enabled
    pub enabled_main: bool,
    /// Ads enabled
    pub enabled_ads: bool,
    /// Ads available in this region
    pub ads_supported: bool,
    /// Wallet is anonymous-only (no verified funds)
    pub only_anon_wallet: bool,
    /// Estimated ads earnings this month
    pub ads_estimated_earnings: f64,
    /// Wallet balance
    pub balance: f64,
    /// Sum of this month's contributions
    pub total_contribution: f64,
    /// Active promotions, unique by id, in arrival order
    pub promotions: Vec<Promotion>,
    /// Dismissed promotion ids, in dismissal order
    pub dismissed_notifications: Vec<String>,
}

/// The New Tab page document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageState {
    /// Initial data has arrived from the browser
    pub initial_data_loaded: bool,
    /// Page preferences
    #[serde(flatten)]
    pub preferences: Preferences,
    /// Privacy counters
    pub stats: StatsSnapshot,
    /// Sponsored wallpaper for this page view
    pub branded_wallpaper_data: Option<WallpaperInfo>,
    /// Background image for this page view
    pub background_image: Option<BackgroundImage>,
    /// Private windows use the alternative search engine
    pub use_alternative_private_search_engine: bool,
    /// The page lives in an incognito profile
    pub is_incognito: bool,
    /// Rewards sub-state
    pub rewards_state: Arc<RewardsState>,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            initial_data_loaded: false,
            preferences: Preferences::default(),
            stats: StatsSnapshot::default(),
            branded_wallpaper_data: None,
            background_image: None,
            use_alternative_private_search_engine: false,
            is_incognito: false,
            rewards_state: Arc::new(RewardsState::default()),
        }
    }
}

impl PageState {
    /// Defaults for a fresh page in the given profile
    #[must_use]
    pub fn new(is_incognito: bool) -> Self {
        Self {
            is_incognito,
            ..Self::default()
        }
    }

    /// Shorthand for the preference of the same name
    #[must_use]
    pub const fn is_branded_wallpaper_notification_dismissed(&self) -> bool {
        self.preferences.is_branded_wallpaper_notification_dismissed
    }
}

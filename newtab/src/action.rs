//! Actions accepted by the New Tab reducer.
//!
//! Host messages arrive as JSON objects of the form
//! `{"type": "<kind>", "payload": {...}}`. [`NewTabAction::from_json`] decodes
//! them; kinds this page does not know decode to
//! [`NewTabAction::Unrecognized`], which the reducer treats as an identity
//! transition.

use crate::state::{Preferences, PreferencesPatch, Promotion, StatsSnapshot, WallpaperInfo};
use serde::{Deserialize, Serialize};
use tabstate_core::action::Action;
use thiserror::Error;

/// Integer result code reported by the rewards host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum RewardsResult {
    /// `LEDGER_OK` (0)
    Ok,
    /// `LEDGER_ERROR` (1)
    LedgerError,
    /// `WALLET_CREATED` (12)
    WalletCreated,
    /// `WALLET_CORRUPT` (17)
    WalletCorrupt,
    /// Any other code
    Other(i32),
}

impl From<i32> for RewardsResult {
    fn from(code: i32) -> Self {
        match code {
            0 => Self::Ok,
            1 => Self::LedgerError,
            12 => Self::WalletCreated,
            17 => Self::WalletCorrupt,
            other => Self::Other(other),
        }
    }
}

impl From<RewardsResult> for i32 {
    fn from(result: RewardsResult) -> Self {
        match result {
            RewardsResult::Ok => 0,
            RewardsResult::LedgerError => 1,
            RewardsResult::WalletCreated => 12,
            RewardsResult::WalletCorrupt => 17,
            RewardsResult::Other(code) => code,
        }
    }
}

/// Monthly contribution breakdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceReport {
    /// Earned from ads
    pub ads: f64,
    /// Auto-contribute total
    pub contribute: f64,
    /// Grants claimed
    pub grant: f64,
    /// Recurring tips
    pub monthly: f64,
    /// One-off tips
    pub tips: f64,
}

/// Private-window fields of the initial payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrivateTabData {
    /// Use the alternative search engine in private windows
    pub use_alternative_private_search_engine: bool,
}

/// Everything the browser sends when the page first loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialData {
    /// Stored preferences
    pub preferences: Preferences,
    /// Privacy counters
    #[serde(default)]
    pub stats: StatsSnapshot,
    /// Sponsored wallpaper chosen for this view
    #[serde(default)]
    pub branded_wallpaper_data: Option<WallpaperInfo>,
    /// Private-window fields
    #[serde(default)]
    pub private_tab_data: PrivateTabData,
}

/// Rewards fields known before the wallet is queried.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreInitialRewardsData {
    /// Ads enabled
    pub enabled_ads: bool,
    /// Ads available in this region
    pub ads_supported: bool,
    /// Rewards enabled
    pub enabled_main: bool,
}

/// Full rewards payload, once the wallet has answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InitialRewardsData {
    /// Wallet is anonymous-only
    pub only_anon_wallet: bool,
    /// Wallet balance
    pub balance: f64,
    /// This month's contribution breakdown
    pub report: BalanceReport,
    /// Estimated ads earnings
    pub ads_estimated_earnings: f64,
}

/// Every event the New Tab page reacts to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum NewTabAction {
    /// Initial page data arrived
    SetInitialData(InitialData),

    /// Privacy counters changed
    StatsUpdated {
        /// New counters
        stats: StatsSnapshot,
    },

    /// Private-window fields changed
    PrivateTabDataUpdated(PrivateTabData),

    /// The sponsored wallpaper notification was dismissed
    #[serde(rename_all = "camelCase")]
    DismissBrandedWallpaperNotification {
        /// Dismissed by an explicit click rather than automatically
        is_user_action: bool,
    },

    /// Preferences changed in another page or in settings; carries only the
    /// fields that changed
    PreferencesUpdated(PreferencesPatch),

    /// The user asked for a wallet
    CreateWallet,

    /// Rewards main toggle changed
    #[serde(rename_all = "camelCase")]
    OnEnabledMain {
        /// Rewards enabled
        enabled_main: bool,
        /// Ads toggle, when reported alongside
        #[serde(default)]
        enabled_ads: Option<bool>,
    },

    /// The host finished wallet initialization
    OnWalletInitialized {
        /// Host result code
        result: RewardsResult,
    },

    /// Ads toggle changed
    OnAdsEnabled {
        /// Ads enabled
        enabled: bool,
    },

    /// Ads earnings estimate changed
    OnAdsEstimatedEarnings {
        /// Estimated amount
        amount: f64,
    },

    /// Monthly report arrived
    OnBalanceReport {
        /// The report; absent counts as all zero
        #[serde(default)]
        report: Option<BalanceReport>,
    },

    /// A promotion notification was dismissed
    DismissNotification {
        /// Promotion id
        id: String,
    },

    /// The host reported available promotions
    OnPromotions {
        /// Host result code
        result: RewardsResult,
        /// Offered promotions
        #[serde(default)]
        promotions: Vec<Promotion>,
    },

    /// A promotion was claimed
    OnPromotionFinish {
        /// Host result code
        result: RewardsResult,
        /// The claimed promotion
        promotion: Promotion,
    },

    /// Balance changed
    OnBalance {
        /// New balance
        balance: f64,
    },

    /// The host reported whether a wallet exists
    OnWalletExists {
        /// A wallet exists
        exists: bool,
    },

    /// Early rewards data
    SetPreInitialRewardsData(PreInitialRewardsData),

    /// Full rewards data
    SetInitialRewardsData(InitialRewardsData),

    /// Any kind this page does not handle
    #[serde(other)]
    Unrecognized,
}

/// Kinds [`NewTabAction::from_json`] will decode into a handled variant.
pub const KNOWN_KINDS: &[&str] = &[
    "set_initial_data",
    "stats_updated",
    "private_tab_data_updated",
    "dismiss_branded_wallpaper_notification",
    "preferences_updated",
    "create_wallet",
    "on_enabled_main",
    "on_wallet_initialized",
    "on_ads_enabled",
    "on_ads_estimated_earnings",
    "on_balance_report",
    "dismiss_notification",
    "on_promotions",
    "on_promotion_finish",
    "on_balance",
    "on_wallet_exists",
    "set_pre_initial_rewards_data",
    "set_initial_rewards_data",
];

/// A host message that could not be decoded.
#[derive(Error, Debug)]
pub enum ActionDecodeError {
    /// Not a `{"type": ..., "payload": ...}` object
    #[error("Malformed action envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    /// The kind is known but its payload does not fit
    #[error("Invalid payload for {kind}: {source}")]
    Payload {
        /// Action kind
        kind: String,
        /// Underlying decode error
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct RawAction {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Option<serde_json::Value>,
}

impl NewTabAction {
    /// Decode a host message.
    ///
    /// Unknown kinds decode to [`NewTabAction::Unrecognized`] whatever their
    /// payload looks like.
    ///
    /// # Errors
    ///
    /// Returns [`ActionDecodeError`] if the message is not an action envelope
    /// or if a known kind carries a payload of the wrong shape.
    pub fn from_json(json: &str) -> Result<Self, ActionDecodeError> {
        let raw: RawAction = serde_json::from_str(json).map_err(ActionDecodeError::Envelope)?;
        if !KNOWN_KINDS.contains(&raw.kind.as_str()) {
            tracing::debug!(kind = %raw.kind, "Unrecognized action kind");
            return Ok(Self::Unrecognized);
        }

        let mut envelope = serde_json::Map::new();
        envelope.insert("type".to_string(), serde_json::Value::String(raw.kind.clone()));
        if let Some(payload) = raw.payload.filter(|p| !p.is_null()) {
            envelope.insert("payload".to_string(), payload);
        }

        serde_json::from_value(serde_json::Value::Object(envelope))
            .map_err(|source| ActionDecodeError::Payload { kind: raw.kind, source })
    }
}

impl Action for NewTabAction {
    fn name(&self) -> &'static str {
        match self {
            Self::SetInitialData(_) => "set_initial_data",
            Self::StatsUpdated { .. } => "stats_updated",
            Self::PrivateTabDataUpdated(_) => "private_tab_data_updated",
            Self::DismissBrandedWallpaperNotification { .. } => "dismiss_branded_wallpaper_notification",
            Self::PreferencesUpdated(_) => "preferences_updated",
            Self::CreateWallet => "create_wallet",
            Self::OnEnabledMain { .. } => "on_enabled_main",
            Self::OnWalletInitialized { .. } => "on_wallet_initialized",
            Self::OnAdsEnabled { .. } => "on_ads_enabled",
            Self::OnAdsEstimatedEarnings { .. } => "on_ads_estimated_earnings",
            Self::OnBalanceReport { .. } => "on_balance_report",
            Self::DismissNotification { .. } => "dismiss_notification",
            Self::OnPromotions { .. } => "on_promotions",
            Self::OnPromotionFinish { .. } => "on_promotion_finish",
            Self::OnBalance { .. } => "on_balance",
            Self::OnWalletExists { .. } => "on_wallet_exists",
            Self::SetPreInitialRewardsData(_) => "set_pre_initial_rewards_data",
            Self::SetInitialRewardsData(_) => "set_initial_rewards_data",
            Self::Unrecognized => "unrecognized",
        }
    }
}

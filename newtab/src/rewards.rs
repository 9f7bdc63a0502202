//! Rewards wallet state machine and promotion tracking.
//!
//! Everything here edits an owned [`RewardsState`]. The reducer clones the
//! published record, applies one of these operations to the clone and wraps
//! the result in a fresh `Arc`, so nothing reachable from an older snapshot is
//! ever touched.

use crate::action::{BalanceReport, RewardsResult};
use crate::state::{Promotion, RewardsState, WalletStatus};

/// Sum of this month's outgoing contributions.
///
/// A missing report counts as all zero.
#[must_use]
pub fn total_contributions(report: Option<&BalanceReport>) -> f64 {
    report.map_or(0.0, |r| r.contribute + r.monthly + r.tips)
}

/// Wallet status a `wallet_initialized` result moves to.
///
/// `None` means the result leaves the wallet where it is.
#[must_use]
pub const fn status_after_initialization(result: RewardsResult) -> Option<WalletStatus> {
    match result {
        RewardsResult::WalletCreated => Some(WalletStatus::Created),
        RewardsResult::WalletCorrupt => Some(WalletStatus::Corrupted),
        // The host reports LEDGER_OK when creation did not produce a wallet
        RewardsResult::Ok => Some(WalletStatus::CreateFailed),
        RewardsResult::LedgerError | RewardsResult::Other(_) => None,
    }
}

impl RewardsState {
    /// Current wallet lifecycle state.
    ///
    /// Snapshots written by older pages may carry more than one flag; the most
    /// severe one wins.
    #[must_use]
    pub const fn wallet_status(&self) -> WalletStatus {
        if self.wallet_corrupted {
            WalletStatus::Corrupted
        } else if self.wallet_create_failed {
            WalletStatus::CreateFailed
        } else if self.wallet_created {
            WalletStatus::Created
        } else if self.wallet_creating {
            WalletStatus::Creating
        } else {
            WalletStatus::NoWallet
        }
    }

    /// Move the wallet to `status`, clearing every other lifecycle flag.
    pub const fn set_wallet_status(&mut self, status: WalletStatus) {
        self.wallet_creating = matches!(status, WalletStatus::Creating);
        self.wallet_created = matches!(status, WalletStatus::Created);
        self.wallet_create_failed = matches!(status, WalletStatus::CreateFailed);
        self.wallet_corrupted = matches!(status, WalletStatus::Corrupted);
    }

    /// Builder form of [`set_wallet_status`](Self::set_wallet_status)
    #[must_use]
    pub const fn with_wallet_status(mut self, status: WalletStatus) -> Self {
        self.set_wallet_status(status);
        self
    }

    /// Creation was requested and the host has not answered yet
    #[must_use]
    pub const fn wallet_creating(&self) -> bool {
        self.wallet_creating
    }

    /// A wallet exists
    #[must_use]
    pub const fn wallet_created(&self) -> bool {
        self.wallet_created
    }

    /// The last creation attempt failed
    #[must_use]
    pub const fn wallet_create_failed(&self) -> bool {
        self.wallet_create_failed
    }

    /// The host reported a corrupted wallet
    #[must_use]
    pub const fn wallet_corrupted(&self) -> bool {
        self.wallet_corrupted
    }

    /// Whether `id` was dismissed
    #[must_use]
    pub fn is_dismissed(&self, id: &str) -> bool {
        self.dismissed_notifications.iter().any(|d| d == id)
    }

    /// Whether a promotion with `id` is active
    #[must_use]
    pub fn has_promotion(&self, id: &str) -> bool {
        self.promotions.iter().any(|p| p.promotion_id == id)
    }

    /// Append offered promotions that are neither dismissed nor already active.
    ///
    /// Duplicates inside `incoming` are collapsed to their first occurrence.
    /// Returns how many promotions were added.
    pub fn ingest_promotions(&mut self, incoming: &[Promotion]) -> usize {
        let mut added = 0;
        for promotion in incoming {
            if self.is_dismissed(&promotion.promotion_id) || self.has_promotion(&promotion.promotion_id) {
                continue;
            }
            self.promotions.push(promotion.clone());
            added += 1;
        }
        added
    }

    /// Mark `id` dismissed and drop it from the active promotions.
    ///
    /// Dismissing an id twice records it once.
    pub fn dismiss(&mut self, id: &str) {
        if !self.is_dismissed(id) {
            self.dismissed_notifications.push(id.to_string());
        }
        self.promotions.retain(|p| p.promotion_id != id);
    }
}

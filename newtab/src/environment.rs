//! New Tab environment.
//!
//! This module defines the collaborators the reducer calls into and the
//! environment type that bundles them for dependency injection.
//!
//! Calls made directly from the reducer (`random_background_image`, the
//! preference write, the rewards host calls) must be synchronous and must not
//! block: they hand work to the browser and return. The only asynchronous
//! collaborator is [`BrandedWallpaperApi`], which is always invoked from a
//! scheduled effect.

use crate::state::BackgroundImage;
use futures::future::BoxFuture;
use std::sync::Arc;
use tabstate_core::effect::EffectError;

/// Source of non-sponsored background images.
pub trait BackgroundImageProvider: Send + Sync {
    /// Pick an image for this page view.
    ///
    /// Not expected to be deterministic.
    fn random_background_image(&self) -> BackgroundImage;
}

/// Sponsored wallpaper reporting.
pub trait BrandedWallpaperApi: Send + Sync {
    /// Count one view of the current sponsored wallpaper.
    fn register_view_count(&self) -> BoxFuture<'static, Result<(), EffectError>>;
}

/// Preference storage owned by the browser.
pub trait PreferencesAdapter: Send + Sync {
    /// Persist the wallpaper notification dismissed flag.
    fn save_is_branded_wallpaper_notification_dismissed(&self, dismissed: bool);
}

/// Imperative calls into the rewards service.
pub trait RewardsHost: Send + Sync {
    /// Ask the host to create a wallet; the answer arrives as an action.
    fn create_wallet(&self);

    /// Write a rewards setting (e.g. `"adsEnabled"`, `"true"`).
    fn save_ads_setting(&self, key: &str, value: &str);
}

/// Environment for the New Tab reducer.
///
/// Cheap to clone; every collaborator is shared.
#[derive(Clone)]
pub struct NewTabEnvironment {
    /// Background image provider.
    pub backgrounds: Arc<dyn BackgroundImageProvider>,

    /// Sponsored wallpaper reporting.
    pub branded_wallpaper: Arc<dyn BrandedWallpaperApi>,

    /// Browser preference storage.
    pub preferences: Arc<dyn PreferencesAdapter>,

    /// Rewards service bridge.
    pub rewards: Arc<dyn RewardsHost>,
}

impl NewTabEnvironment {
    /// Create a new environment.
    #[must_use]
    pub fn new(
        backgrounds: Arc<dyn BackgroundImageProvider>,
        branded_wallpaper: Arc<dyn BrandedWallpaperApi>,
        preferences: Arc<dyn PreferencesAdapter>,
        rewards: Arc<dyn RewardsHost>,
    ) -> Self {
        Self {
            backgrounds,
            branded_wallpaper,
            preferences,
            rewards,
        }
    }
}

impl std::fmt::Debug for NewTabEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewTabEnvironment").finish_non_exhaustive()
    }
}

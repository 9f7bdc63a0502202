//! Recording mocks for the New Tab collaborators.
//!
//! Every mock is cheap to clone and clones share their recordings, so a test
//! can keep a handle while the environment owns another.

use crate::environment::{
    BackgroundImageProvider, BrandedWallpaperApi, NewTabEnvironment, PreferencesAdapter, RewardsHost,
};
use crate::state::BackgroundImage;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tabstate_core::effect::EffectError;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Background provider that always returns the same image.
#[derive(Debug, Clone)]
pub struct FixedBackgroundProvider {
    image: BackgroundImage,
    calls: Arc<AtomicUsize>,
}

impl FixedBackgroundProvider {
    /// Provider returning `image`
    #[must_use]
    pub fn new(image: BackgroundImage) -> Self {
        Self {
            image,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// How many images were requested
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for FixedBackgroundProvider {
    fn default() -> Self {
        Self::new(BackgroundImage {
            name: "Test Image".to_string(),
            source: "test-image.webp".to_string(),
            author: "Test Author".to_string(),
            link: "https://example.com/test-author".to_string(),
        })
    }
}

impl BackgroundImageProvider for FixedBackgroundProvider {
    fn random_background_image(&self) -> BackgroundImage {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.image.clone()
    }
}

/// How [`MockBrandedWallpaperApi`] answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WallpaperApiBehavior {
    /// Count the view
    #[default]
    Succeed,
    /// Return an error
    Fail,
    /// Panic inside the future
    Panic,
}

/// Wallpaper API that counts view registrations.
#[derive(Debug, Clone, Default)]
pub struct MockBrandedWallpaperApi {
    behavior: WallpaperApiBehavior,
    views: Arc<AtomicUsize>,
    attempts: Arc<AtomicUsize>,
}

impl MockBrandedWallpaperApi {
    /// API that accepts every view
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// API that answers with `behavior`
    #[must_use]
    pub fn with_behavior(behavior: WallpaperApiBehavior) -> Self {
        Self {
            behavior,
            ..Self::default()
        }
    }

    /// Views successfully registered
    #[must_use]
    pub fn views(&self) -> usize {
        self.views.load(Ordering::SeqCst)
    }

    /// Registration attempts, successful or not
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl BrandedWallpaperApi for MockBrandedWallpaperApi {
    fn register_view_count(&self) -> BoxFuture<'static, Result<(), EffectError>> {
        let behavior = self.behavior;
        let views = Arc::clone(&self.views);
        let attempts = Arc::clone(&self.attempts);
        async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            match behavior {
                WallpaperApiBehavior::Succeed => {
                    views.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                },
                WallpaperApiBehavior::Fail => Err(EffectError::Failed("view count endpoint unavailable".to_string())),
                #[allow(clippy::panic)] // Exercises the scheduler's panic containment
                WallpaperApiBehavior::Panic => panic!("view count registration panicked"),
            }
        }
        .boxed()
    }
}

/// Preference adapter that records every write.
#[derive(Debug, Clone, Default)]
pub struct RecordingPreferences {
    writes: Arc<Mutex<Vec<bool>>>,
}

impl RecordingPreferences {
    /// Empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every dismissed-flag write, oldest first
    #[must_use]
    pub fn dismissed_writes(&self) -> Vec<bool> {
        lock(&self.writes).clone()
    }
}

impl PreferencesAdapter for RecordingPreferences {
    fn save_is_branded_wallpaper_notification_dismissed(&self, dismissed: bool) {
        lock(&self.writes).push(dismissed);
    }
}

/// Rewards host that records every call.
#[derive(Debug, Clone, Default)]
pub struct RecordingRewardsHost {
    wallets_requested: Arc<AtomicUsize>,
    settings: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingRewardsHost {
    /// Empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times wallet creation was requested
    #[must_use]
    pub fn wallets_requested(&self) -> usize {
        self.wallets_requested.load(Ordering::SeqCst)
    }

    /// Every `(key, value)` setting written, oldest first
    #[must_use]
    pub fn settings(&self) -> Vec<(String, String)> {
        lock(&self.settings).clone()
    }
}

impl RewardsHost for RecordingRewardsHost {
    fn create_wallet(&self) {
        self.wallets_requested.fetch_add(1, Ordering::SeqCst);
    }

    fn save_ads_setting(&self, key: &str, value: &str) {
        lock(&self.settings).push((key.to_string(), value.to_string()));
    }
}

/// One of each mock, with handles kept for assertions.
#[derive(Debug, Clone, Default)]
pub struct MockCollaborators {
    /// Background provider
    pub backgrounds: FixedBackgroundProvider,
    /// Wallpaper API
    pub branded_wallpaper: MockBrandedWallpaperApi,
    /// Preference adapter
    pub preferences: RecordingPreferences,
    /// Rewards host
    pub rewards: RecordingRewardsHost,
}

impl MockCollaborators {
    /// Mocks that all succeed
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the wallpaper API behavior
    #[must_use]
    pub fn with_wallpaper_behavior(mut self, behavior: WallpaperApiBehavior) -> Self {
        self.branded_wallpaper = MockBrandedWallpaperApi::with_behavior(behavior);
        self
    }

    /// Environment wired to these mocks
    #[must_use]
    pub fn environment(&self) -> NewTabEnvironment {
        NewTabEnvironment::new(
            Arc::new(self.backgrounds.clone()),
            Arc::new(self.branded_wallpaper.clone()),
            Arc::new(self.preferences.clone()),
            Arc::new(self.rewards.clone()),
        )
    }
}

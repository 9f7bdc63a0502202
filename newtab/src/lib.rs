//! # Tabstate New Tab
//!
//! State controller for the browser's New Tab page.
//!
//! The page owns one [`PageState`] document. Host events arrive as
//! [`NewTabAction`]s, the [`NewTabReducer`] turns each into either the same
//! snapshot (nothing happened) or a new one, and the runtime
//! [`Store`](tabstate_runtime::Store) publishes the result, saves it after a
//! short quiet window, and runs scheduled work such as sponsored wallpaper view
//! registration against whatever state is current when it runs.
//!
//! ## Modules
//!
//! - [`state`]: the page document and its rewards sub-state
//! - [`action`]: the action sum type and host message decoding
//! - [`reducer`]: page transitions
//! - [`rewards`]: wallet state machine and promotion tracking
//! - [`environment`]: collaborators the reducer calls into
//! - [`background`]: the bundled background image catalog
//! - [`persistence`]: loading the page state at startup
//! - [`config`]: process configuration
//! - [`mocks`]: recording collaborators for tests
//!
//! ## Example
//!
//! ```ignore
//! use tabstate_newtab::{NewTabAction, NewTabReducer, PageState, mocks::MockCollaborators};
//! use tabstate_runtime::Store;
//! use std::sync::Arc;
//!
//! let store = Store::new(
//!     Arc::new(PageState::default()),
//!     NewTabReducer::new(),
//!     MockCollaborators::new().environment(),
//! );
//! store.send(NewTabAction::CreateWallet).await?;
//! ```

pub mod action;
pub mod background;
pub mod config;
pub mod environment;
pub mod mocks;
pub mod persistence;
pub mod reducer;
pub mod rewards;
pub mod state;

pub use action::{NewTabAction, RewardsResult};
pub use background::ImageCatalog;
pub use config::NewTabConfig;
pub use environment::NewTabEnvironment;
pub use persistence::{Session, load_page_state};
pub use reducer::NewTabReducer;
pub use state::{PageState, PreferencesPatch, RewardsState, WalletStatus};

use std::sync::Arc;
use tabstate_core::persistence::SnapshotStore;
use tabstate_runtime::{Store, StoreConfig};

/// Store running the New Tab reducer
pub type NewTabStore = Store<Arc<PageState>, NewTabAction, NewTabEnvironment, NewTabReducer>;

/// Build a New Tab store that saves every changed snapshot to `snapshots`.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
#[must_use]
pub fn new_tab_store(
    initial: Arc<PageState>,
    environment: NewTabEnvironment,
    config: StoreConfig,
    snapshots: Arc<dyn SnapshotStore<Arc<PageState>>>,
) -> NewTabStore {
    Store::with_config(initial, NewTabReducer::new(), environment, config).with_persistence(snapshots)
}

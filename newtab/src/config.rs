//! Configuration for a New Tab controller process.
//!
//! Settings come from environment variables with sensible defaults:
//!
//! | Variable | Default |
//! |---|---|
//! | `NEWTAB_SNAPSHOT_PATH` | `newtab-state.json` |
//! | `NEWTAB_SAVE_DEBOUNCE_MS` | `50` |
//! | `NEWTAB_INCOGNITO` | `false` |
//! | `NEWTAB_LOG_LEVEL` | `info` |
//! | `NEWTAB_BACKGROUND_CATALOG` | unset (bundled images) |
//!
//! # Example
//!
//! ```no_run
//! use tabstate_newtab::config::NewTabConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = NewTabConfig::from_env()?;
//! println!("Snapshot file: {}", config.snapshot_path.display());
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tabstate_runtime::StoreConfig;
use thiserror::Error;

/// Configuration error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue {
        /// Variable name
        var: &'static str,
        /// Offending value
        value: String,
    },

    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Process configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTabConfig {
    /// Where page snapshots are written
    pub snapshot_path: PathBuf,
    /// Debounce window for snapshot writes, in milliseconds
    pub save_debounce_ms: u64,
    /// Run as an incognito page
    pub incognito: bool,
    /// Default log level when `RUST_LOG` is unset
    pub log_level: String,
    /// Optional JSON file with background images
    pub background_catalog: Option<PathBuf>,
}

impl Default for NewTabConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("newtab-state.json"),
            save_debounce_ms: 50,
            incognito: false,
            log_level: "info".to_string(),
            background_catalog: None,
        }
    }
}

impl NewTabConfig {
    /// Load configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns error if a variable cannot be parsed or validation fails
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value
    ///
    /// # Errors
    ///
    /// Returns error if a variable cannot be parsed or validation fails
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("NEWTAB_SNAPSHOT_PATH") {
            config.snapshot_path = PathBuf::from(path);
        }
        if let Some(value) = lookup("NEWTAB_SAVE_DEBOUNCE_MS") {
            config.save_debounce_ms = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                var: "NEWTAB_SAVE_DEBOUNCE_MS",
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup("NEWTAB_INCOGNITO") {
            config.incognito = parse_bool(&value).ok_or(ConfigError::InvalidValue {
                var: "NEWTAB_INCOGNITO",
                value,
            })?;
        }
        if let Some(level) = lookup("NEWTAB_LOG_LEVEL") {
            config.log_level = level.trim().to_lowercase();
        }
        if let Some(path) = lookup("NEWTAB_BACKGROUND_CATALOG").filter(|p| !p.is_empty()) {
            config.background_catalog = Some(PathBuf::from(path));
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.snapshot_path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError("snapshot_path cannot be empty".to_string()));
        }
        if self.save_debounce_ms == 0 {
            return Err(ConfigError::ValidationError("save_debounce_ms must be > 0".to_string()));
        }
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "log_level must be one of {LOG_LEVELS:?}, got {:?}",
                self.log_level
            )));
        }
        Ok(())
    }

    /// Debounce window as Duration
    #[must_use]
    pub const fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }

    /// Store configuration for this process
    #[must_use]
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::default().with_save_debounce(self.save_debounce())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

//! Earmark Configuration System
//!
//! `config.toml` holds a `[session]` table for playback timing and a
//! `[storage]` table for the library database. Missing keys take their
//! defaults and invalid values are reported by their TOML path.
//!
//! # Example
//!
//! ```rust,no_run
//! use earmark_config::{Config, ConfigManager};
//!
//! let manager = ConfigManager::new().expect("Failed to initialize config");
//! let config = manager.load_or_default();
//!
//! println!("Poll interval: {:?}", config.session.poll_interval());
//! ```

mod error;
mod manager;
mod persistence;
mod validation;

// Config sections
mod session_config;
mod storage_config;

pub use error::{ConfigError, ConfigResult, FieldError};
pub use manager::ConfigManager;
pub use validation::{Checks, ConfigSection};

pub use session_config::SessionConfig;
pub use storage_config::StorageConfig;

use serde::{Deserialize, Serialize};

/// Current config file format version
pub const CONFIG_VERSION: u32 = 1;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Config file format version
    pub version: u32,

    /// Playback session timing
    pub session: SessionConfig,

    /// Library database location
    pub storage: StorageConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks both sections, returning every invalid field
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut checks = Checks::default();
        checks
            .ensure("version", self.version >= 1, "must be at least 1")
            .section(&self.session)
            .section(&self.storage);
        checks.finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            session: SessionConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

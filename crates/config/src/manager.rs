//! Configuration manager - main API for config operations

use crate::persistence::ConfigFile;
use crate::{Config, ConfigError, ConfigResult};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Prefix of environment variables that override file values
const ENV_PREFIX: &str = "EARMARK";

/// Main configuration manager
///
/// Owns the config file location and the data directory that relative
/// storage paths are resolved against.
pub struct ConfigManager {
    file: ConfigFile,
    data_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a new config manager using the platform directories
    ///
    /// - Linux: `~/.config/earmark/` and `~/.local/share/earmark/`
    /// - macOS: `~/Library/Application Support/earmark/`
    /// - Windows: `%APPDATA%\earmark\`
    pub fn new() -> ConfigResult<Self> {
        let dirs = ProjectDirs::from("", "", "earmark").ok_or(ConfigError::NoHomeDirectory)?;

        let mut manager = Self::with_directory(dirs.config_dir().to_path_buf())?;
        manager.data_dir = dirs.data_dir().to_path_buf();
        Ok(manager)
    }

    /// Creates a config manager keeping both config and data in `config_dir`
    pub fn with_directory(config_dir: PathBuf) -> ConfigResult<Self> {
        Ok(Self {
            file: ConfigFile::new(config_dir.join("config.toml")),
            data_dir: config_dir,
        })
    }

    /// Returns the full config file path
    pub fn config_path(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }

    /// Resolves the configured database path against the data directory
    pub fn database_path(&self, config: &Config) -> PathBuf {
        let path = &config.storage.database_path;
        if path.is_absolute() {
            path.clone()
        } else {
            self.data_dir.join(path)
        }
    }

    /// Loads `config.toml`, or the defaults when it has not been written yet
    ///
    /// Out-of-range values are logged but still returned, so the file can be
    /// inspected and repaired.
    pub fn load(&self) -> ConfigResult<Config> {
        let config = self.file.read()?.unwrap_or_default();
        if let Err(errors) = config.validate() {
            for error in errors {
                log::warn!("{}: {}", self.file.path().display(), error);
            }
        }
        Ok(config)
    }

    /// Loads the configuration, falling back to defaults on any error
    pub fn load_or_default(&self) -> Config {
        match self.load() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config: {}, using defaults", e);
                Config::default()
            }
        }
    }

    /// Writes `config`, refusing invalid values
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.file.write(config)?;
        log::info!("Config saved to {}", self.file.path().display());
        Ok(())
    }

    /// Generates a default config file if one doesn't exist
    ///
    /// Returns Ok(true) if a new file was created, Ok(false) if one already exists.
    pub fn initialize(&self) -> ConfigResult<bool> {
        if self.config_path().exists() {
            log::info!(
                "Config file already exists at {}",
                self.config_path().display()
            );
            return Ok(false);
        }

        self.save(&Config::default())?;
        Ok(true)
    }

    /// Resets the configuration to defaults
    pub fn reset(&self) -> ConfigResult<()> {
        self.save(&Config::default())
    }

    /// Validates the current configuration file
    ///
    /// Returns all validation errors found, or an empty list if valid.
    pub fn validate(&self) -> ConfigResult<Vec<String>> {
        let config = self.load()?;

        let errors = config.validate().err().unwrap_or_default();
        Ok(errors.iter().map(ToString::to_string).collect())
    }

    /// Loads the config and applies environment variable overrides
    ///
    /// Variables follow the pattern `EARMARK_SECTION_FIELD`, for example
    /// `EARMARK_STORAGE_DATABASE_PATH=/tmp/library.db`.
    pub fn load_with_env_overrides(&self) -> ConfigResult<Config> {
        let mut config = self.load()?;
        apply_env_overrides(&mut config, |name| std::env::var(name).ok());

        if let Err(errors) = config.validate() {
            for error in errors {
                log::warn!("After {}_* overrides: {}", ENV_PREFIX, error);
            }
        }

        Ok(config)
    }
}

fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    let var = |name: &str| lookup(&format!("{}_{}", ENV_PREFIX, name));

    if let Some(path) = var("STORAGE_DATABASE_PATH") {
        config.storage.database_path = PathBuf::from(path);
    }

    if let Some(wal) = var("STORAGE_ENABLE_WAL").and_then(|v| v.parse().ok()) {
        config.storage.enable_wal = wal;
    }

    if let Some(ms) = var("SESSION_POLL_INTERVAL_MS").and_then(|v| v.parse().ok()) {
        config.session.poll_interval_ms = ms;
    }

    if let Some(secs) = var("SESSION_AUTOSAVE_INTERVAL_SECS").and_then(|v| v.parse().ok()) {
        config.session.autosave_interval_secs = secs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn setup_test_manager() -> (TempDir, ConfigManager) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let manager = ConfigManager::with_directory(temp_dir.path().to_path_buf())
            .expect("Failed to create manager");
        (temp_dir, manager)
    }

    #[test]
    fn test_load_or_default_with_missing_file() {
        let (_temp_dir, manager) = setup_test_manager();
        let config = manager.load_or_default();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_or_default_with_corrupt_file() {
        let (_temp_dir, manager) = setup_test_manager();
        std::fs::write(manager.config_path(), "[[[").expect("Should write");
        assert_eq!(manager.load_or_default(), Config::default());
    }

    #[test]
    fn test_save_then_load() {
        let (_temp_dir, manager) = setup_test_manager();
        let mut config = Config::default();
        config.session.autosave_interval_secs = 20;

        manager.save(&config).expect("Should save");

        let loaded = manager.load().expect("Should load");
        assert_eq!(loaded.session.autosave_interval_secs, 20);
    }

    #[test]
    fn test_initialize_creates_file_once() {
        let (_temp_dir, manager) = setup_test_manager();

        assert!(manager.initialize().expect("Should initialize"));
        assert!(manager.config_path().exists());
        assert!(!manager.initialize().expect("Should initialize"));
    }

    #[test]
    fn test_reset() {
        let (_temp_dir, manager) = setup_test_manager();

        let mut config = Config::default();
        config.storage.enable_wal = false;
        manager.save(&config).expect("Should save");

        manager.reset().expect("Should reset");

        assert_eq!(manager.load().expect("Should load"), Config::default());
    }

    #[test]
    fn test_invalid_config_not_saved() {
        let (_temp_dir, manager) = setup_test_manager();

        let mut config = Config::default();
        config.session.load_attempts = 0;
        manager
            .save(&config)
            .expect_err("Should not save invalid config");
    }

    #[test]
    fn test_relative_database_path_resolved() {
        let (temp_dir, manager) = setup_test_manager();
        let config = Config::default();

        assert_eq!(
            manager.database_path(&config),
            temp_dir.path().join("earmark.db")
        );
    }

    #[test]
    fn test_absolute_database_path_kept() {
        let (temp_dir, manager) = setup_test_manager();
        let absolute = temp_dir.path().join("elsewhere").join("lib.db");
        let mut config = Config::default();
        config.storage.database_path = absolute.clone();

        assert_eq!(manager.database_path(&config), absolute);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("EARMARK_STORAGE_DATABASE_PATH", "/tmp/override.db"),
            ("EARMARK_SESSION_POLL_INTERVAL_MS", "250"),
            ("EARMARK_SESSION_AUTOSAVE_INTERVAL_SECS", "not a number"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        apply_env_overrides(&mut config, |name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.storage.database_path, PathBuf::from("/tmp/override.db"));
        assert_eq!(config.session.poll_interval_ms, 250);
        assert_eq!(config.session.autosave_interval_secs, 10);
    }

    #[test]
    fn test_config_file_path() {
        let (_temp_dir, manager) = setup_test_manager();
        assert!(manager.config_path().ends_with("config.toml"));
    }
}

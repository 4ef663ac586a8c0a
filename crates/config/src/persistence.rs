//! Reading and writing `config.toml`

use crate::{Config, ConfigError, ConfigResult, CONFIG_VERSION};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const HEADER: &str = "# Earmark configuration. Keys left out take their defaults.\n\n";

#[derive(Debug, Clone)]
pub(crate) struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file, or `None` when none has been written yet
    ///
    /// Files from an older format version are rewritten in place.
    pub fn read(&self) -> ConfigResult<Option<Config>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if text.trim().is_empty() {
            return Err(ConfigError::Empty {
                path: self.path.clone(),
            });
        }

        let mut config: Config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })?;

        if config.version < CONFIG_VERSION {
            log::info!(
                "Upgrading {} from config version {} to {}",
                self.path.display(),
                config.version,
                CONFIG_VERSION
            );
            config.version = CONFIG_VERSION;
            if let Err(e) = self.write(&config) {
                log::warn!("Keeping the old config file: {}", e);
            }
        } else if config.version > CONFIG_VERSION {
            log::warn!(
                "{} has config version {}, newer than {}; unknown keys are ignored",
                self.path.display(),
                config.version,
                CONFIG_VERSION
            );
        }

        Ok(Some(config))
    }

    /// Replaces the file with `config` through a rename, so a crash mid-write
    /// leaves the previous file intact
    pub fn write(&self, config: &Config) -> ConfigResult<()> {
        config.validate().map_err(ConfigError::Invalid)?;
        let body = toml::to_string_pretty(config)?;

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| self.write_error(e))?;

        let staged = stage(dir, &body).map_err(|e| self.write_error(e))?;
        staged
            .persist(&self.path)
            .map_err(|e| self.write_error(e.error))?;

        log::debug!("Wrote {}", self.path.display());
        Ok(())
    }

    fn write_error(&self, source: io::Error) -> ConfigError {
        ConfigError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

fn stage(dir: &Path, body: &str) -> io::Result<NamedTempFile> {
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(HEADER.as_bytes())?;
    file.write_all(body.as_bytes())?;
    file.as_file().sync_all()?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_file() -> (TempDir, ConfigFile) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let file = ConfigFile::new(temp_dir.path().join("config.toml"));
        (temp_dir, file)
    }

    #[test]
    fn test_missing_file_reads_as_none() {
        let (_temp_dir, file) = config_file();
        assert!(file.read().expect("Should read").is_none());
    }

    #[test]
    fn test_written_file_carries_header_and_reads_back() {
        let (_temp_dir, file) = config_file();
        let mut config = Config::default();
        config.session.autosave_interval_secs = 25;

        file.write(&config).expect("Should write");

        let text = fs::read_to_string(file.path()).expect("Should read file");
        assert!(text.starts_with("# Earmark configuration"));
        let loaded = file.read().expect("Should read").expect("Should exist");
        assert_eq!(loaded.session.autosave_interval_secs, 25);
    }

    #[test]
    fn test_write_creates_missing_directories() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let file = ConfigFile::new(temp_dir.path().join("nested").join("config.toml"));

        file.write(&Config::default()).expect("Should write");
        assert!(file.path().exists());
    }

    #[test]
    fn test_invalid_config_is_not_written() {
        let (_temp_dir, file) = config_file();
        let mut config = Config::default();
        config.session.poll_interval_ms = 1;

        let err = file.write(&config).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref fields) if fields.len() == 1));
        assert!(!file.path().exists());
    }

    #[test]
    fn test_failed_write_keeps_previous_file() {
        let (_temp_dir, file) = config_file();
        file.write(&Config::default()).expect("Should write");

        let mut broken = Config::default();
        broken.storage.max_connections = 0;
        assert!(file.write(&broken).is_err());

        let loaded = file.read().expect("Should read").expect("Should exist");
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_garbage_and_empty_files_are_errors() {
        let (_temp_dir, file) = config_file();

        fs::write(file.path(), "session = {{{").expect("Should write file");
        assert!(matches!(file.read(), Err(ConfigError::Parse { .. })));

        fs::write(file.path(), "  \n").expect("Should write file");
        assert!(matches!(file.read(), Err(ConfigError::Empty { .. })));
    }

    #[test]
    fn test_old_version_is_upgraded_on_read() {
        let (_temp_dir, file) = config_file();
        fs::write(file.path(), "version = 0\n[session]\npoll_interval_ms = 750\n")
            .expect("Should write file");

        let config = file.read().expect("Should read").expect("Should exist");

        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.session.poll_interval_ms, 750);
        let rewritten = fs::read_to_string(file.path()).expect("Should read file");
        assert!(rewritten.contains("version = 1"));
    }
}

//! Error types for the configuration system

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No home directory to keep the earmark config in")]
    NoHomeDirectory,

    #[error("Could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Empty files are rejected rather than silently treated as defaults
    #[error("{path} is empty; fix it or run `earmark config --reset`")]
    Empty { path: PathBuf },

    #[error("{path} is not valid TOML: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Could not encode config: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("Could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Refusing to save invalid config: {}", summarize(.0))]
    Invalid(Vec<FieldError>),
}

/// One invalid setting, named by its TOML path (e.g. `session.load_attempts`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub problem: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.problem)
    }
}

impl std::error::Error for FieldError {}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_lists_every_field() {
        let err = ConfigError::Invalid(vec![
            FieldError {
                field: "session.load_attempts".to_string(),
                problem: "0 is outside 1..=5".to_string(),
            },
            FieldError {
                field: "storage.database_path".to_string(),
                problem: "must name a file".to_string(),
            },
        ]);

        assert_eq!(
            err.to_string(),
            "Refusing to save invalid config: session.load_attempts: 0 is outside 1..=5; \
             storage.database_path: must name a file"
        );
    }

    #[test]
    fn test_empty_file_message_points_at_reset() {
        let err = ConfigError::Empty {
            path: PathBuf::from("/tmp/config.toml"),
        };
        assert!(err.to_string().contains("earmark config --reset"));
    }
}

//! Error types and recovery strategies for Earmark
//!
//! Errors are classified into three severity tiers:
//! - **Recoverable**: Can be automatically retried (locked store, dropped device session)
//! - **Degraded**: Feature disabled but app continues (playback device unavailable, etc.)
//! - **Fatal**: Requires app restart or user intervention (corrupted store, etc.)
//!
//! Each error includes a recovery action to guide automatic error handling.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Recovery actions that can be taken when an error occurs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Retry the operation immediately
    RetryImmediate,
    /// Retry with exponential backoff
    RetryWithBackoff,
    /// Re-create the playback session and retry once
    ReinitializeDevice,
    /// Fall back to default values
    UseDefaults,
    /// No automatic recovery - user intervention required
    UserIntervention,
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RetryImmediate => write!(f, "Retrying immediately"),
            Self::RetryWithBackoff => write!(f, "Retrying with backoff"),
            Self::ReinitializeDevice => write!(f, "Reinitializing playback device"),
            Self::UseDefaults => write!(f, "Using default values"),
            Self::UserIntervention => write!(f, "User intervention required"),
        }
    }
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Error can be automatically recovered from
    Recoverable,
    /// Feature degraded but app can continue
    Degraded,
    /// Critical error requiring restart or user action
    Fatal,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recoverable => write!(f, "Recoverable"),
            Self::Degraded => write!(f, "Degraded"),
            Self::Fatal => write!(f, "Fatal"),
        }
    }
}

/// Main error type for Earmark
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Storage Errors =====
    /// Key-value store operation failed
    #[error("Database error: {message}")]
    DatabaseError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Store is locked by another writer
    #[error("Database locked: {operation}")]
    DatabaseLocked { operation: String },

    /// Stored value could not be decoded
    #[error("Corrupted record under '{key}': {reason}")]
    CorruptedRecord { key: String, reason: String },

    /// Value could not be encoded for storage
    #[error("Serialization error: {message}")]
    SerializationError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // ===== Playback Errors =====
    /// Media-session device call failed
    #[error("Playback device error: {message}")]
    PlaybackDeviceError { message: String },

    /// Media-session device is not bound (e.g. background session torn down)
    #[error("Playback device unavailable during {operation}")]
    DeviceUnavailable { operation: String },

    // ===== File System Errors =====
    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// General I/O error
    #[error("I/O error: {message}")]
    IoError {
        message: String,
        #[source]
        source: io::Error,
    },

    // ===== Configuration Errors =====
    /// Invalid configuration
    #[error("Invalid configuration: {setting} = '{value}' ({reason})")]
    InvalidConfiguration {
        setting: String,
        value: String,
        reason: String,
    },

    // ===== Generic Errors =====
    /// Invalid argument provided
    #[error("Invalid argument: {argument} - {reason}")]
    InvalidArgument { argument: String, reason: String },
}

impl AppError {
    /// Returns the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::DatabaseLocked { .. } | Self::DeviceUnavailable { .. } => {
                ErrorSeverity::Recoverable
            }

            Self::InvalidConfiguration { .. } => ErrorSeverity::Fatal,

            _ => ErrorSeverity::Degraded,
        }
    }

    /// Returns the recommended recovery action for this error
    pub fn recovery_action(&self) -> RecoveryAction {
        match self {
            Self::DatabaseLocked { .. } => RecoveryAction::RetryWithBackoff,
            Self::DatabaseError { .. } => RecoveryAction::RetryImmediate,
            Self::DeviceUnavailable { .. } | Self::PlaybackDeviceError { .. } => {
                RecoveryAction::ReinitializeDevice
            }
            Self::CorruptedRecord { .. } => RecoveryAction::UseDefaults,
            _ => RecoveryAction::UserIntervention,
        }
    }

    /// Returns a user-friendly error message suitable for display in the UI
    pub fn user_message(&self) -> String {
        match self {
            Self::DatabaseError { .. } | Self::DatabaseLocked { .. } => {
                "Your library is temporarily unavailable. Please try again.".to_string()
            }
            Self::CorruptedRecord { .. } => {
                "Some saved data could not be read and was reset.".to_string()
            }
            Self::SerializationError { .. } => "Could not save your changes.".to_string(),
            Self::PlaybackDeviceError { .. } | Self::DeviceUnavailable { .. } => {
                "Cannot start playback right now. Please try again.".to_string()
            }
            Self::FileNotFound { .. } => {
                "The file was not found. It may have been moved or deleted.".to_string()
            }
            Self::IoError { .. } => "A file operation failed. Please try again.".to_string(),
            Self::InvalidConfiguration { setting, .. } => {
                format!("Invalid setting: {}. Please check your configuration.", setting)
            }
            Self::InvalidArgument { reason, .. } => format!("Invalid input: {}", reason),
        }
    }

    /// Returns true if this error should be logged at ERROR level
    pub fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Fatal
    }

    /// Returns true if this error can be automatically retried
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.recovery_action(),
            RecoveryAction::RetryImmediate
                | RecoveryAction::RetryWithBackoff
                | RecoveryAction::ReinitializeDevice
        )
    }

    /// Helper to create a database error from any error type
    pub fn database<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::DatabaseError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Helper to create a serialization error from any error type
    pub fn serialization<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::SerializationError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Helper to create a playback device error
    pub fn playback_device(message: impl Into<String>) -> Self {
        Self::PlaybackDeviceError {
            message: message.into(),
        }
    }
}

/// Convenience type alias for Results using AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::FileNotFound {
                path: PathBuf::from("unknown"),
            },
            _ => Self::IoError {
                message: err.to_string(),
                source: err,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_recovery_action_display() {
        assert_eq!(
            RecoveryAction::RetryImmediate.to_string(),
            "Retrying immediately"
        );
        assert_eq!(
            RecoveryAction::ReinitializeDevice.to_string(),
            "Reinitializing playback device"
        );
        assert_eq!(RecoveryAction::UseDefaults.to_string(), "Using default values");
    }

    #[test]
    fn test_error_severity_ordering() {
        assert!(ErrorSeverity::Recoverable < ErrorSeverity::Degraded);
        assert!(ErrorSeverity::Degraded < ErrorSeverity::Fatal);
    }

    #[test]
    fn test_device_unavailable_is_retryable() {
        let err = AppError::DeviceUnavailable {
            operation: "load".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Recoverable);
        assert_eq!(err.recovery_action(), RecoveryAction::ReinitializeDevice);
        assert!(err.is_retryable());
        assert!(!err.is_critical());
    }

    #[test]
    fn test_corrupted_record_falls_back_to_defaults() {
        let err = AppError::CorruptedRecord {
            key: "earmark.settings".to_string(),
            reason: "expected object".to_string(),
        };
        assert_eq!(err.recovery_action(), RecoveryAction::UseDefaults);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_user_messages_hide_internals() {
        let err = AppError::DatabaseError {
            message: "SQLITE_BUSY".to_string(),
            source: None,
        };
        let msg = err.user_message();
        assert!(!msg.contains("SQLITE"));
        assert!(msg.contains("library"));
    }

    #[test]
    fn test_database_helper_keeps_source() {
        let inner = io::Error::new(io::ErrorKind::Other, "disk gone");
        let err = AppError::database("write failed", inner);
        assert!(matches!(err, AppError::DatabaseError { .. }));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_from_io_error_not_found() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::FileNotFound { .. }));
    }

    #[test]
    fn test_from_io_error_other() {
        let io_err = io::Error::new(io::ErrorKind::Other, "Unknown error");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::IoError { .. }));
    }

    #[test]
    fn test_invalid_configuration_is_critical() {
        let err = AppError::InvalidConfiguration {
            setting: "session.poll_interval_ms".to_string(),
            value: "0".to_string(),
            reason: "must be positive".to_string(),
        };
        assert!(err.is_critical());
        assert!(err.user_message().contains("session.poll_interval_ms"));
    }
}

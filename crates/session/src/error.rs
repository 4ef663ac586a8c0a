// FILE: crates/session/src/error.rs

use earmark_core::{AppError, BookId};
use thiserror::Error;

/// Failures reported by a media-session device
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeviceError {
    /// The platform session was torn down or never set up
    #[error("Device not initialized")]
    NotInitialized,

    #[error("Device call '{operation}' failed: {message}")]
    CallFailed { operation: String, message: String },

    #[error("Queue index {index} out of range (queue length {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

impl DeviceError {
    pub fn call_failed(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CallFailed {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

pub type DeviceResult<T> = Result<T, DeviceError>;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Playback device error: {0}")]
    Device(#[from] DeviceError),

    #[error("Audiobook {0} has no playable location")]
    NothingToPlay(BookId),
}

pub type SessionResult<T> = Result<T, SessionError>;

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Device(DeviceError::NotInitialized) => AppError::DeviceUnavailable {
                operation: "load".to_string(),
            },
            SessionError::Device(e) => AppError::playback_device(e.to_string()),
            SessionError::NothingToPlay(id) => AppError::InvalidArgument {
                argument: "audiobook".to_string(),
                reason: format!("{} has no playable location", id),
            },
        }
    }
}

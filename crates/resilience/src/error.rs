// crates/resilience/src/error.rs
//! Error types for resilience operations

use thiserror::Error;

/// Result type for resilience operations
pub type ResilienceResult<T> = Result<T, ResilienceError>;

/// Errors raised by the resilience helpers themselves
///
/// Errors from retried operations are passed through untouched; these only
/// describe problems with the retry machinery.
#[derive(Debug, Error)]
pub enum ResilienceError {
    /// The retry policy cannot be used as configured
    #[error("Invalid retry policy: {0}")]
    InvalidPolicy(String),

    /// All retry attempts exhausted
    #[error("All {attempts} retry attempts exhausted: {last_error}")]
    RetriesExhausted { attempts: usize, last_error: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_policy_error() {
        let err = ResilienceError::InvalidPolicy("max_attempts must be at least 1".into());
        assert!(err.to_string().contains("Invalid retry policy"));
    }

    #[test]
    fn test_retries_exhausted_error() {
        let err = ResilienceError::RetriesExhausted {
            attempts: 3,
            last_error: "connection failed".to_string(),
        };
        assert!(err.to_string().contains("3"));
        assert!(err.to_string().contains("connection failed"));
    }
}

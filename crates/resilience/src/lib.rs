// crates/resilience/src/lib.rs
//! Resilience patterns for fault-tolerant device and store calls
//!
//! Currently provides retry with exponential backoff and a recovery hook
//! that runs between attempts (used to re-create a torn-down playback
//! session before reloading).
//!
//! # Example
//!
//! ```rust
//! use earmark_resilience::RetryPolicy;
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::new(2)
//!     .with_initial_delay(Duration::ZERO)
//!     .with_jitter(false);
//! assert_eq!(policy.max_attempts(), 2);
//! ```

mod error;
mod retry;

pub use error::{ResilienceError, ResilienceResult};
pub use retry::{with_retry_async, RetryPolicy};

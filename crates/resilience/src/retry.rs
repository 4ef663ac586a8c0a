// crates/resilience/src/retry.rs
//! Retry policies with exponential backoff

use crate::error::{ResilienceError, ResilienceResult};
use std::future::Future;
use std::time::Duration;

/// Retry policy configuration
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first attempt)
    max_attempts: usize,
    /// Initial delay between retries
    initial_delay: Duration,
    /// Maximum delay between retries
    max_delay: Duration,
    /// Backoff multiplier
    multiplier: f64,
    /// Whether to use jitter
    use_jitter: bool,
}

impl RetryPolicy {
    /// Creates a new retry policy
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            use_jitter: true,
        }
    }

    /// A single retry with no delay, for failures a recovery step is expected to fix
    pub fn once() -> Self {
        Self::new(2)
            .with_initial_delay(Duration::ZERO)
            .with_jitter(false)
    }

    /// Sets the initial delay
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Sets whether to use jitter
    pub fn with_jitter(mut self, use_jitter: bool) -> Self {
        self.use_jitter = use_jitter;
        self
    }

    /// Checks the policy for values that would make retrying meaningless
    pub fn validate(&self) -> ResilienceResult<()> {
        if self.max_attempts == 0 {
            return Err(ResilienceError::InvalidPolicy(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(ResilienceError::InvalidPolicy(format!(
                "multiplier must be >= 1.0, got {}",
                self.multiplier
            )));
        }
        Ok(())
    }

    /// Calculates the delay for a given attempt
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        if attempt == 0 {
            return Duration::from_secs(0);
        }

        let base_delay = self.initial_delay.as_millis() as f64
            * self.multiplier.powi((attempt - 1) as i32);

        let capped_delay = base_delay.min(self.max_delay.as_millis() as f64);

        let final_delay = if self.use_jitter {
            // Add up to 25% jitter
            let jitter_factor = 0.75 + (attempt as f64 * 0.1 % 0.25);
            capped_delay * jitter_factor
        } else {
            capped_delay
        };

        Duration::from_millis(final_delay as u64)
    }

    /// Returns the maximum number of attempts
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Runs `operation` until it succeeds or the policy's attempts are used up
///
/// After every failed attempt that will be retried, `recover` runs before the
/// backoff delay. The error of the final attempt is returned unchanged.
pub async fn with_retry_async<T, E, Op, Fut, Rec, RecFut>(
    policy: &RetryPolicy,
    mut operation: Op,
    mut recover: Rec,
) -> Result<T, E>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    Rec: FnMut() -> RecFut,
    RecFut: Future<Output = ()>,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts().max(1);
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                attempt += 1;

                if attempt >= max_attempts {
                    log::debug!("Giving up after {} attempt(s): {}", attempt, e);
                    return Err(e);
                }

                log::warn!(
                    "Attempt {}/{} failed: {}, recovering before retry",
                    attempt,
                    max_attempts,
                    e
                );
                recover().await;

                let delay = policy.delay_for_attempt(attempt);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_retry_policy_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_retry_policy_builder() {
        let policy = RetryPolicy::new(5)
            .with_initial_delay(Duration::from_millis(200))
            .with_max_delay(Duration::from_secs(60))
            .with_multiplier(3.0)
            .with_jitter(false);

        assert_eq!(policy.max_attempts(), 5);
        assert_eq!(policy.initial_delay, Duration::from_millis(200));
        assert_eq!(policy.max_delay, Duration::from_secs(60));
        assert_eq!(policy.multiplier, 3.0);
        assert!(!policy.use_jitter);
    }

    #[test]
    fn test_once_policy() {
        let policy = RetryPolicy::once();
        assert_eq!(policy.max_attempts(), 2);
        assert_eq!(policy.delay_for_attempt(1), Duration::ZERO);
    }

    #[test]
    fn test_invalid_policies() {
        assert!(RetryPolicy::new(0).validate().is_err());
        assert!(RetryPolicy::new(3).with_multiplier(0.5).validate().is_err());
    }

    #[test]
    fn test_exponential_backoff() {
        let policy = RetryPolicy::new(4)
            .with_initial_delay(Duration::from_millis(100))
            .with_multiplier(2.0)
            .with_jitter(false);

        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(0));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(400));
    }

    #[test]
    fn test_max_delay_capping() {
        let policy = RetryPolicy::new(10)
            .with_initial_delay(Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(5))
            .with_multiplier(2.0)
            .with_jitter(false);

        assert!(policy.delay_for_attempt(10) <= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_success_first_attempt_skips_recovery() {
        let calls = Cell::new(0);
        let recoveries = Cell::new(0);

        let result: Result<i32, String> = with_retry_async(
            &RetryPolicy::once(),
            || async {
                calls.set(calls.get() + 1);
                Ok(42)
            },
            || async {
                recoveries.set(recoveries.get() + 1);
            },
        )
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.get(), 1);
        assert_eq!(recoveries.get(), 0);
    }

    #[tokio::test]
    async fn test_recovers_then_succeeds() {
        let calls = Cell::new(0);
        let recoveries = Cell::new(0);

        let result: Result<&str, String> = with_retry_async(
            &RetryPolicy::once(),
            || async {
                calls.set(calls.get() + 1);
                if recoveries.get() == 0 {
                    Err("session gone".to_string())
                } else {
                    Ok("loaded")
                }
            },
            || async {
                recoveries.set(recoveries.get() + 1);
            },
        )
        .await;

        assert_eq!(result, Ok("loaded"));
        assert_eq!(calls.get(), 2);
        assert_eq!(recoveries.get(), 1);
    }

    #[tokio::test]
    async fn test_final_error_is_returned_unchanged() {
        let calls = Cell::new(0);

        let result: Result<(), String> = with_retry_async(
            &RetryPolicy::once(),
            || async {
                calls.set(calls.get() + 1);
                Err(format!("failure {}", calls.get()))
            },
            || async {},
        )
        .await;

        assert_eq!(result, Err("failure 2".to_string()));
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_delay_is_applied() {
        let policy = RetryPolicy::new(3)
            .with_initial_delay(Duration::from_millis(100))
            .with_jitter(false);
        let start = tokio::time::Instant::now();

        let result: Result<(), &str> =
            with_retry_async(&policy, || async { Err("nope") }, || async {}).await;

        assert!(result.is_err());
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_zero_attempts_still_runs_once() {
        let calls = Cell::new(0);
        let result: Result<(), &str> = with_retry_async(
            &RetryPolicy::new(0),
            || async {
                calls.set(calls.get() + 1);
                Err("nope")
            },
            || async {},
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }
}

//! # Peer Send Retries
//!
//! Bounded exponential backoff. `max_attempts` counts every send, including
//! the first one, and every send is cut off after `attempt_timeout`.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

/// Retry policy for peer sends.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total send attempts per peer (at least one).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound on any single delay.
    pub max_backoff: Duration,
    /// Backoff multiplier.
    pub multiplier: f64,
    /// Jitter factor (0.0-1.0) applied to each delay.
    pub jitter: f64,
    /// Longest a single attempt may take before it counts as failed.
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    /// Doubling backoff with 10% jitter.
    #[must_use]
    pub fn exponential(max_attempts: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff,
            multiplier: 2.0,
            jitter: 0.1,
            attempt_timeout: Duration::from_secs(5),
        }
    }

    /// Single attempt, no retries.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            multiplier: 1.0,
            jitter: 0.0,
            attempt_timeout: Duration::from_secs(5),
        }
    }

    /// Cut each attempt off after `timeout`.
    #[must_use]
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Disable jitter (deterministic delays).
    #[must_use]
    pub fn without_jitter(mut self) -> Self {
        self.jitter = 0.0;
        self
    }

    /// Delay before retry number `retry` (1-based). Zero for `retry == 0`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    #[allow(clippy::cast_possible_wrap)]
    #[allow(clippy::cast_precision_loss)]
    #[allow(clippy::cast_sign_loss)]
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }

        // Nanosecond arithmetic keeps jitter-free delays exact.
        let exponent = (retry.min(64) as i32) - 1;
        let base = self.initial_backoff.as_nanos() as f64 * self.multiplier.powi(exponent);
        let clamped = base.min(self.max_backoff.as_nanos() as f64);

        let jitter = self.jitter.clamp(0.0, 1.0);
        let offset = if jitter > 0.0 {
            clamped * jitter * rand::thread_rng().gen_range(-1.0..=1.0)
        } else {
            0.0
        };

        Duration::from_nanos((clamped + offset).max(0.0) as u64)
    }

    /// Whether another attempt is allowed after `attempts` have been made.
    #[must_use]
    pub fn should_retry(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential(3, Duration::from_millis(100), Duration::from_secs(2))
    }
}

/// Run `op` until it succeeds or the policy is exhausted.
///
/// An attempt still pending after `attempt_timeout` is abandoned and turned
/// into an error by `timed_out`. `on_error` sees every failure with its
/// 1-based attempt number.
///
/// # Errors
///
/// Returns the last error once `max_attempts` sends have failed.
pub async fn with_retry<F, Fut, T, E, D, H>(
    policy: &RetryPolicy,
    mut op: F,
    timed_out: D,
    mut on_error: H,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    D: Fn(Duration) -> E,
    H: FnMut(u32, &E),
{
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        let outcome = tokio::time::timeout(policy.attempt_timeout, op())
            .await
            .unwrap_or_else(|_| Err(timed_out(policy.attempt_timeout)));
        match outcome {
            Ok(value) => return Ok(value),
            Err(error) => {
                on_error(attempts, &error);
                if !policy.should_retry(attempts) {
                    return Err(error);
                }
                let delay = policy.delay_for_retry(attempts);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

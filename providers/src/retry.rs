//! Bounded retry with exponential backoff.
//!
//! # Retry Policy
//!
//! - Max attempts: 5 (the first try counts)
//! - Initial delay: 500ms, doubling per retry
//! - Max delay: 8 seconds
//! - Jitter: down-jitter up to 25% (multiplier in [0.75, 1.0])
//! - Per-attempt timeout: 30 seconds, surfaced as a timeout failure and retried
//!
//! The loop is generic over the attempt future so it can be exercised without
//! any network. Errors decide for themselves whether another attempt is worth
//! making through [`RetryableError`].

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Retry configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts, including the first. Values below 1 are treated as 1.
    pub max_attempts: u32,
    /// Backoff delay before the first retry.
    pub initial_delay: Duration,
    /// Maximum backoff delay.
    pub max_delay: Duration,
    /// Jitter factor for down-jitter (0.25 = up to 25% reduction).
    pub jitter_factor: f64,
    /// Deadline for a single attempt. `None` disables it.
    pub attempt_timeout: Option<Duration>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            jitter_factor: 0.25,
            attempt_timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// Failure type that the retry loop can reason about.
pub trait RetryableError: Sized {
    /// Build the error reported when an attempt exceeds its deadline.
    fn timed_out(after: Duration) -> Self;

    fn is_retryable(&self) -> bool;
}

/// Calculate retry delay with exponential backoff and jitter.
///
/// `backoff_step` is 0 before the first retry, 1 before the second, etc.
#[must_use]
pub fn calculate_retry_delay(backoff_step: u32, config: &RetryConfig) -> Duration {
    // Exponential backoff: initial_delay * 2^backoff_step
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(backoff_step.min(30) as i32);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Down-jitter: multiply by random factor in [1 - jitter_factor, 1.0]
    let factor = if config.jitter_factor.is_finite() {
        config.jitter_factor.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let jitter = 1.0 - rand::random::<f64>() * factor;
    Duration::from_secs_f64(capped * jitter)
}

/// Outcome of a retry operation.
///
/// A sum type that structurally distinguishes success from the two failure
/// modes, so callers cannot treat an exhausted loop as a reply.
#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    /// An attempt succeeded.
    Success { value: T, attempts: u32 },
    /// Every allowed attempt failed. Carries the last failure.
    Exhausted { attempts: u32, last_error: E },
    /// An attempt failed with an error that must not be retried.
    NonRetryable { attempts: u32, error: E },
}

impl<T, E: Display> RetryOutcome<T, E> {
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Success { attempts, .. }
            | Self::Exhausted { attempts, .. }
            | Self::NonRetryable { attempts, .. } => *attempts,
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns the value, or a one-line failure description.
    pub fn into_result(self) -> Result<T, String> {
        match self {
            Self::Success { value, .. } => Ok(value),
            Self::Exhausted {
                attempts,
                last_error,
            } => Err(format!("failed after {attempts} attempts: {last_error}")),
            Self::NonRetryable { error, .. } => Err(format!("request error: {error}")),
        }
    }
}

/// Run `attempt` until it succeeds, fails permanently, or the attempt budget is spent.
///
/// The closure receives the 1-based attempt number and must build a fresh
/// future each time; every attempt reissues the identical request.
pub async fn run_with_retry<T, E, F, Fut>(config: &RetryConfig, mut attempt: F) -> RetryOutcome<T, E>
where
    E: RetryableError + Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut n = 0;

    loop {
        n += 1;
        let result = match config.attempt_timeout {
            Some(limit) => match tokio::time::timeout(limit, attempt(n)).await {
                Ok(result) => result,
                Err(_) => Err(E::timed_out(limit)),
            },
            None => attempt(n).await,
        };

        let error = match result {
            Ok(value) => return RetryOutcome::Success { value, attempts: n },
            Err(error) => error,
        };

        if !error.is_retryable() {
            tracing::debug!(attempt = n, error = %error, "Giving up on non-retryable error");
            return RetryOutcome::NonRetryable { attempts: n, error };
        }

        if n >= max_attempts {
            tracing::warn!(attempts = n, error = %error, "Retries exhausted");
            return RetryOutcome::Exhausted {
                attempts: n,
                last_error: error,
            };
        }

        let delay = calculate_retry_delay(n - 1, config);
        tracing::debug!(
            error = %error,
            retry_count = n,
            delay_ms = delay.as_millis(),
            "Retrying request after failure"
        );
        tokio::time::sleep(delay).await;
    }
}

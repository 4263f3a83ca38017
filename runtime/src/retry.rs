//! Retry with exponential backoff for transient booking failures.
//!
//! The booking engine uses this to re-run a whole booking transaction when
//! the generated reference collides with an existing one. Only errors the
//! caller's predicate accepts are retried; anything else fails immediately.
//!
//! # Example
//!
//! ```rust
//! use boxoffice_runtime::retry::{RetryPolicy, retry_when};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), String> {
//! let policy = RetryPolicy::builder()
//!     .max_attempts(3)
//!     .initial_delay(Duration::from_millis(5))
//!     .build();
//!
//! let value = retry_when(
//!     &policy,
//!     || async { Ok::<_, String>(42) },
//!     |err: &String| err.contains("collision"),
//! )
//! .await?;
//! assert_eq!(value, 42);
//! # Ok(())
//! # }
//! ```

use crate::metrics::RetryMetrics;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Retry policy configuration for exponential backoff.
///
/// # Default Values
///
/// - `max_attempts`: 3 (the first try plus two retries)
/// - `initial_delay`: 10ms
/// - `max_delay`: 500ms
/// - `multiplier`: 2.0
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one
    pub max_attempts: usize,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Cap for the exponential delay
    pub max_delay: Duration,
    /// Growth factor between retries
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(500),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Create a new policy builder starting from the defaults.
    #[must_use]
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder {
            policy: Self::default(),
        }
    }

    /// Delay before retry number `retry` (0-based).
    ///
    /// `initial_delay * multiplier^retry`, capped at `max_delay`.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_sign_loss
    )]
    pub fn delay_for_retry(&self, retry: usize) -> Duration {
        let exponent = retry.min(32) as i32;
        let delay_ms = self.initial_delay.as_millis() as f64 * self.multiplier.powi(exponent);
        let capped = delay_ms.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped.max(0.0) as u64)
    }
}

/// Builder for [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryPolicyBuilder {
    policy: RetryPolicy,
}

impl RetryPolicyBuilder {
    /// Set the total number of attempts. Values below 1 are treated as 1.
    #[must_use]
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.policy.max_attempts = attempts.max(1);
        self
    }

    /// Set the delay before the first retry.
    #[must_use]
    pub const fn initial_delay(mut self, delay: Duration) -> Self {
        self.policy.initial_delay = delay;
        self
    }

    /// Set the cap for the exponential delay.
    #[must_use]
    pub const fn max_delay(mut self, delay: Duration) -> Self {
        self.policy.max_delay = delay;
        self
    }

    /// Set the growth factor between retries.
    #[must_use]
    pub const fn multiplier(mut self, multiplier: f64) -> Self {
        self.policy.multiplier = multiplier;
        self
    }

    /// Build the [`RetryPolicy`].
    #[must_use]
    pub fn build(self) -> RetryPolicy {
        self.policy
    }
}

/// Run `operation` until it succeeds, fails with an error `is_retryable`
/// rejects, or the policy's attempts are used up.
///
/// The last error is returned when attempts run out.
///
/// # Errors
///
/// Returns the operation's error when it is not retryable or when every
/// attempt has failed.
pub async fn retry_when<F, Fut, T, E, P>(
    policy: &RetryPolicy,
    mut operation: F,
    is_retryable: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(attempt, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) if !is_retryable(&err) => return Err(err),
            Err(err) if attempt >= policy.max_attempts => {
                tracing::error!(attempt, error = %err, "Operation failed after max attempts");
                RetryMetrics::record_exhausted();
                return Err(err);
            }
            Err(err) => {
                let delay = policy.delay_for_retry(attempt - 1);
                tracing::warn!(
                    attempt,
                    delay_ms = delay.as_millis(),
                    error = %err,
                    "Operation failed, retrying"
                );
                RetryMetrics::record_attempt();
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

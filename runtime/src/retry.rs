//! Bounded retry with fixed or exponential backoff.
//!
//! The upstream clients wrap each attempt future in [`retry_with_predicate`],
//! which re-runs the attempt only while the predicate classifies the error as
//! transient and the attempt budget is not spent.
//!
//! # Example
//!
//! ```rust
//! use movies_runtime::retry::{Backoff, RetryError, RetryPolicy, retry_with_predicate};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), RetryError<String>> {
//! let policy = RetryPolicy::builder()
//!     .max_retries(3)
//!     .backoff(Backoff::Fixed(Duration::from_secs(1)))
//!     .build();
//!
//! let value = retry_with_predicate(
//!     &policy,
//!     || async { Ok::<_, String>(42) },
//!     |err: &String| err.starts_with("5"),
//! )
//! .await?;
//! assert_eq!(value, 42);
//! # Ok(())
//! # }
//! ```

use crate::metrics::RetryMetrics;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Delay schedule between attempts.
#[derive(Debug, Clone, PartialEq)]
pub enum Backoff {
    /// Same delay before every retry.
    Fixed(Duration),
    /// `initial * multiplier^retry`, capped at `max_delay`.
    Exponential {
        /// Delay before the first retry.
        initial: Duration,
        /// Upper bound for any single delay.
        max_delay: Duration,
        /// Growth factor per retry.
        multiplier: f64,
        /// Scale every delay after the first by a random factor in `0.5..=1.0`.
        ///
        /// The first delay is always exactly `initial`.
        jitter: bool,
    },
}

/// Retry policy configuration.
///
/// # Default Values
///
/// - `max_retries`: 3 (four attempts in total)
/// - `backoff`: fixed 1 second
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt
    pub max_retries: usize,
    /// Delay schedule
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Backoff::Fixed(Duration::from_secs(1)),
        }
    }
}

impl RetryPolicy {
    /// Create a new policy builder.
    #[must_use]
    pub const fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder {
            max_retries: None,
            backoff: None,
        }
    }

    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Backoff::Fixed(Duration::ZERO),
        }
    }

    /// Delay to wait before retry number `retry` (0-indexed).
    #[must_use]
    pub fn delay_for_retry(&self, retry: usize) -> Duration {
        match &self.backoff {
            Backoff::Fixed(delay) => *delay,
            Backoff::Exponential {
                initial,
                max_delay,
                multiplier,
                jitter,
            } => {
                #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                let exponent = retry.min(i32::MAX as usize) as i32;
                let base = initial.as_secs_f64() * multiplier.powi(exponent);
                let capped = base.min(max_delay.as_secs_f64());

                let scaled = if *jitter && retry > 0 {
                    use rand::Rng;
                    capped * rand::thread_rng().gen_range(0.5..=1.0)
                } else {
                    capped
                };

                Duration::from_secs_f64(scaled)
            }
        }
    }

    /// Total attempts this policy allows, including the first.
    #[must_use]
    pub const fn max_attempts(&self) -> usize {
        self.max_retries + 1
    }
}

/// Builder for [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryPolicyBuilder {
    max_retries: Option<usize>,
    backoff: Option<Backoff>,
}

impl RetryPolicyBuilder {
    /// Set maximum number of retries.
    #[must_use]
    pub const fn max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Set the delay schedule.
    #[must_use]
    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = Some(backoff);
        self
    }

    /// Shorthand for [`Backoff::Fixed`].
    #[must_use]
    pub fn fixed_delay(self, delay: Duration) -> Self {
        self.backoff(Backoff::Fixed(delay))
    }

    /// Build the [`RetryPolicy`].
    #[must_use]
    pub fn build(self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        RetryPolicy {
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            backoff: self.backoff.unwrap_or(defaults.backoff),
        }
    }
}

/// Why [`retry_with_predicate`] gave up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    /// The predicate rejected the error; no further attempts were made.
    Aborted(E),
    /// Every allowed attempt failed with a retryable error.
    Exhausted {
        /// Attempts made, including the first.
        attempts: usize,
        /// Error from the final attempt.
        last: E,
    },
}

impl<E> RetryError<E> {
    /// The underlying error, whichever way the loop ended.
    pub fn into_inner(self) -> E {
        match self {
            Self::Aborted(err) | Self::Exhausted { last: err, .. } => err,
        }
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aborted(err) => write!(f, "{err}"),
            Self::Exhausted { attempts, last } => {
                write!(f, "retries exhausted after {attempts} attempts: {last}")
            }
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for RetryError<E> {}

/// Retry an async operation while `is_retryable` accepts its error.
///
/// The attempt counter is local to the call. Dropping the returned future
/// (e.g. on request cancellation) cancels the in-flight attempt or sleep and
/// no further attempts are issued.
///
/// # Errors
///
/// - [`RetryError::Aborted`] with the first non-retryable error.
/// - [`RetryError::Exhausted`] with the last error once `policy.max_retries`
///   retries have failed.
pub async fn retry_with_predicate<F, Fut, T, E, P>(
    policy: &RetryPolicy,
    mut operation: F,
    is_retryable: P,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut retry = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if retry > 0 {
                    tracing::info!(attempt = retry + 1, "Operation succeeded after retry");
                    RetryMetrics::record_success();
                }
                return Ok(result);
            }
            Err(err) => {
                if !is_retryable(&err) {
                    tracing::debug!(error = %err, "Error is not retryable, failing immediately");
                    return Err(RetryError::Aborted(err));
                }

                if retry >= policy.max_retries {
                    tracing::error!(
                        attempts = retry + 1,
                        error = %err,
                        "Operation failed after max retries"
                    );
                    RetryMetrics::record_exhausted();
                    return Err(RetryError::Exhausted {
                        attempts: retry + 1,
                        last: err,
                    });
                }

                let delay = policy.delay_for_retry(retry);
                tracing::warn!(
                    attempt = retry + 1,
                    delay_ms = delay.as_millis(),
                    error = %err,
                    "Operation failed, retrying..."
                );
                RetryMetrics::record_attempt();

                sleep(delay).await;
                retry += 1;
            }
        }
    }
}

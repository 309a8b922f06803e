//! Retry with exponential back-off and jitter for storefront requests.
//!
//! [`retry_with_backoff`] wraps a single fallible network call. The policy is
//! applied per request, so a strategy that makes two requests gets two
//! independent retry budgets. Sleeping goes through a [`Sleeper`] so tests can
//! observe the schedule without waiting on the wall clock.

use std::future::Future;
use std::time::Duration;

use futures::future::BoxFuture;
use restock_core::RetrySettings;

use crate::error::ScraperError;

/// Upper bound for a single computed back-off step (before jitter).
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Suspends the current task between attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, delay: Duration) -> BoxFuture<'_, ()>;
}

/// Production sleeper backed by `tokio::time::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, delay: Duration) -> BoxFuture<'_, ()> {
        Box::pin(tokio::time::sleep(delay))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Values below 1 are treated as 1.
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Upper bound of the uniformly random extra delay per retry.
    pub jitter: Duration,
    /// A server-requested `Retry-After` above this ends the loop early.
    pub max_retry_after: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            base_delay: Duration::from_millis(settings.backoff_base_ms),
            jitter: Duration::from_millis(settings.backoff_jitter_ms),
            max_retry_after: Duration::from_secs(settings.max_retry_after_secs),
        }
    }

    /// A single attempt, no sleeping.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            jitter: Duration::ZERO,
            max_retry_after: Duration::ZERO,
        }
    }

    /// 429, 403 and every 5xx.
    #[must_use]
    pub fn is_retryable_status(status: u16) -> bool {
        status == 429 || status == 403 || (500..600).contains(&status)
    }

    /// Returns `true` if `err` is a transient condition worth another attempt.
    ///
    /// Retriable:
    /// - [`ScraperError::RateLimited`] (429/403).
    /// - [`ScraperError::UnexpectedStatus`] with a 5xx status.
    /// - [`ScraperError::Http`] timeouts, connection failures and send errors.
    ///
    /// Everything else (404, malformed bodies, bad URLs) fails immediately.
    #[must_use]
    pub fn is_retriable(&self, err: &ScraperError) -> bool {
        match err {
            ScraperError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            ScraperError::RateLimited { status, .. }
            | ScraperError::UnexpectedStatus { status, .. } => Self::is_retryable_status(*status),
            ScraperError::Deserialize { .. }
            | ScraperError::NotFound { .. }
            | ScraperError::InvalidUrl { .. }
            | ScraperError::RetryExhausted { .. } => false,
        }
    }

    /// Deterministic part of the delay after the failed attempt with 0-based
    /// index `attempt`: `base_delay * 2^attempt`, capped at 60 s.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(1u32 << attempt.min(20))
            .min(MAX_BACKOFF)
    }

    fn sample_jitter(&self) -> Duration {
        let max_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::random_range(0..=max_ms))
    }
}

/// Executes `operation` under `policy`.
///
/// | Failed attempt | Sleep before next attempt                  |
/// |----------------|--------------------------------------------|
/// | 1              | `base × 2⁰ + rand(0..=jitter)`             |
/// | 2              | `base × 2¹ + rand(0..=jitter)`             |
/// | n              | `base × 2ⁿ⁻¹ + rand(0..=jitter)`           |
///
/// A `Retry-After` hint on a rate-limit response raises the delay to at
/// least the requested value, or stops immediately if it exceeds
/// `max_retry_after`.
///
/// # Errors
///
/// - Non-retriable errors are returned unchanged after a single attempt.
/// - Retriable errors that survive every attempt (or hit the `Retry-After`
///   cap) are wrapped in [`ScraperError::RetryExhausted`].
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        attempts += 1;

        if !policy.is_retriable(&err) {
            return Err(err);
        }
        if attempts >= max_attempts {
            return Err(ScraperError::RetryExhausted {
                attempts,
                source: Box::new(err),
            });
        }

        let mut delay = policy.backoff_delay(attempts - 1) + policy.sample_jitter();
        if let ScraperError::RateLimited {
            retry_after_secs: Some(secs),
            ..
        } = &err
        {
            let requested = Duration::from_secs(*secs);
            if requested > policy.max_retry_after {
                tracing::warn!(
                    attempts,
                    retry_after_secs = secs,
                    error = %err,
                    "rate limit asks for a longer wait than allowed; giving up on this request"
                );
                return Err(ScraperError::RetryExhausted {
                    attempts,
                    source: Box::new(err),
                });
            }
            delay = delay.max(requested);
        }

        tracing::warn!(
            attempt = attempts,
            max_attempts,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "transient storefront error, retrying after back-off"
        );
        sleeper.sleep(delay).await;
    }
}

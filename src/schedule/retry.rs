//! Retry combinator with optional backoff.
//!
//! [`retry`] calls a provider until it succeeds or the retry budget runs out.
//! [`retry_with`] is the curried form: it captures the options once and returns a
//! [`Retrying`] value that can wrap any number of providers.
//!
//! # Attempt Budget
//!
//! `count` is the number of retries allowed after the first failure. With
//! `count(n)` the provider is called at most `n + 1` times. Without a count
//! the provider is retried until it succeeds.
//!
//! # Delay
//!
//! After failure number `k` (1-based) and before attempt `k + 1`, the delay
//! configured by [`RetryDelay`] is awaited. No delay follows the final failure.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::pause::pause;

/// A delay computed from the 1-based failure count and the last error.
type DelayFunction<E> = Arc<dyn Fn(usize, &E) -> Duration + Send + Sync>;

// =============================================================================
// RetryDelay
// =============================================================================

/// How long to wait between two attempts.
pub enum RetryDelay<E> {
    /// Retry immediately.
    None,
    /// Wait the same duration before every retry.
    Fixed(Duration),
    /// Compute the wait from the failure count (starting at 1) and the last error.
    Computed(DelayFunction<E>),
}

impl<E> RetryDelay<E> {
    /// Returns the wait before the next attempt, if any.
    fn after_failure(&self, failures: usize, error: &E) -> Option<Duration> {
        match self {
            Self::None => None,
            Self::Fixed(duration) => Some(*duration),
            Self::Computed(function) => Some(function(failures, error)),
        }
    }
}

impl<E> Default for RetryDelay<E> {
    fn default() -> Self {
        Self::None
    }
}

impl<E> Clone for RetryDelay<E> {
    fn clone(&self) -> Self {
        match self {
            Self::None => Self::None,
            Self::Fixed(duration) => Self::Fixed(*duration),
            Self::Computed(function) => Self::Computed(Arc::clone(function)),
        }
    }
}

impl<E> fmt::Debug for RetryDelay<E> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => formatter.write_str("None"),
            Self::Fixed(duration) => formatter.debug_tuple("Fixed").field(duration).finish(),
            Self::Computed(_) => formatter.write_str("Computed(<function>)"),
        }
    }
}

// =============================================================================
// RetryOptions
// =============================================================================

/// Options for [`retry`] and [`retry_with`].
///
/// The default retries without limit and without delay.
///
/// # Examples
///
/// ```rust
/// use asyncfx::schedule::RetryOptions;
/// use std::time::Duration;
///
/// let options: RetryOptions<std::io::Error> = RetryOptions::new()
///     .count(3)
///     .delay(Duration::from_millis(100));
/// assert_eq!(options.max_retries(), Some(3));
/// ```
pub struct RetryOptions<E> {
    count: Option<usize>,
    delay: RetryDelay<E>,
}

impl<E> RetryOptions<E> {
    /// Creates options that retry forever with no delay.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            count: None,
            delay: RetryDelay::None,
        }
    }

    /// Allows at most `count` retries after the first failure.
    #[must_use]
    pub fn count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    /// Removes the retry limit.
    #[must_use]
    pub fn unbounded(mut self) -> Self {
        self.count = None;
        self
    }

    /// Waits `duration` before every retry.
    #[must_use]
    pub fn delay(mut self, duration: Duration) -> Self {
        self.delay = RetryDelay::Fixed(duration);
        self
    }

    /// Waits `milliseconds` milliseconds before every retry.
    #[must_use]
    pub fn delay_millis(self, milliseconds: u64) -> Self {
        self.delay(Duration::from_millis(milliseconds))
    }

    /// Computes the wait before each retry from the failure count and the last error.
    ///
    /// The failure count passed to `function` starts at 1.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use asyncfx::schedule::RetryOptions;
    /// use std::time::Duration;
    ///
    /// // Exponential backoff: 100ms, 200ms, 400ms, ...
    /// let options: RetryOptions<String> = RetryOptions::new().count(5).delay_with(|attempt, _| {
    ///     Duration::from_millis(100).saturating_mul(1 << (attempt - 1).min(16))
    /// });
    /// ```
    #[must_use]
    pub fn delay_with<F>(mut self, function: F) -> Self
    where
        F: Fn(usize, &E) -> Duration + Send + Sync + 'static,
    {
        self.delay = RetryDelay::Computed(Arc::new(function));
        self
    }

    /// Returns the retry limit, or `None` when unbounded.
    #[must_use]
    pub const fn max_retries(&self) -> Option<usize> {
        self.count
    }

    /// Returns the configured delay.
    #[must_use]
    pub const fn retry_delay(&self) -> &RetryDelay<E> {
        &self.delay
    }

    fn is_exhausted(&self, failures: usize) -> bool {
        self.count.is_some_and(|count| failures > count)
    }
}

impl<E> Default for RetryOptions<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for RetryOptions<E> {
    fn clone(&self) -> Self {
        Self {
            count: self.count,
            delay: self.delay.clone(),
        }
    }
}

impl<E> fmt::Debug for RetryOptions<E> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RetryOptions")
            .field("count", &self.count)
            .field("delay", &self.delay)
            .finish()
    }
}

// =============================================================================
// Entry Points
// =============================================================================

/// Calls `provider` until it succeeds or the retry budget is exhausted.
///
/// Attempts are strictly sequential. On exhaustion the error of the last attempt
/// is returned and earlier errors are dropped.
///
/// # Errors
///
/// Returns the last attempt's error when every allowed attempt failed. The
/// error is returned as soon as the final attempt fails: the configured delay
/// only separates attempts and is not awaited after the last one.
///
/// # Examples
///
/// ```rust,ignore
/// use asyncfx::schedule::{retry, RetryOptions};
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let calls = AtomicUsize::new(0);
/// let result = retry(
///     || async {
///         if calls.fetch_add(1, Ordering::SeqCst) < 2 { Err("flaky") } else { Ok(42) }
///     },
///     RetryOptions::new().count(5),
/// )
/// .await;
/// assert_eq!(result, Ok(42));
/// assert_eq!(calls.load(Ordering::SeqCst), 3);
/// ```
pub async fn retry<T, E, P, Fut>(provider: P, options: RetryOptions<E>) -> Result<T, E>
where
    P: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    run_attempts(provider, &options).await
}

/// Captures `options` and returns a reusable [`Retrying`] wrapper.
///
/// # Examples
///
/// ```rust,ignore
/// use asyncfx::schedule::{retry_with, RetryOptions};
///
/// let persistent = retry_with(RetryOptions::new().count(2).delay_millis(10));
/// let first = persistent.run(|| async { Ok::<_, String>(1) }).await;
/// let second = persistent.run(|| async { Ok::<_, String>(2) }).await;
/// ```
#[must_use]
pub fn retry_with<E>(options: RetryOptions<E>) -> Retrying<E> {
    Retrying { options }
}

/// Retry options bound once and applied to many providers.
///
/// Created by [`retry_with`].
#[derive(Debug)]
pub struct Retrying<E> {
    options: RetryOptions<E>,
}

impl<E> Clone for Retrying<E> {
    fn clone(&self) -> Self {
        Self {
            options: self.options.clone(),
        }
    }
}

impl<E> Retrying<E> {
    /// Calls `provider` under the captured options.
    ///
    /// # Errors
    ///
    /// Returns the last attempt's error when every allowed attempt failed,
    /// without waiting the configured delay after that attempt.
    pub async fn run<T, P, Fut>(&self, provider: P) -> Result<T, E>
    where
        P: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        run_attempts(provider, &self.options).await
    }

    /// Returns the captured options.
    #[must_use]
    pub const fn options(&self) -> &RetryOptions<E> {
        &self.options
    }
}

async fn run_attempts<T, E, P, Fut>(mut provider: P, options: &RetryOptions<E>) -> Result<T, E>
where
    P: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut failures: usize = 0;

    loop {
        match provider().await {
            Ok(value) => {
                if failures > 0 {
                    tracing::debug!(failures, "retry succeeded");
                }
                return Ok(value);
            }
            Err(error) => {
                failures = failures.saturating_add(1);
                if options.is_exhausted(failures) {
                    tracing::warn!(attempts = failures, "retry budget exhausted");
                    return Err(error);
                }
                let delay = options.delay.after_failure(failures, &error);
                tracing::debug!(attempt = failures, ?delay, "attempt failed, retrying");
                if let Some(duration) = delay {
                    pause(duration).await;
                }
            }
        }
    }
}

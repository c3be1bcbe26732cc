//! Delay primitive.
//!
//! [`pause`] suspends the awaiting task for at least the requested duration.
//! The scheduler may resume it later than that under load; no upper bound is
//! guaranteed.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use pin_project_lite::pin_project;

pin_project! {
    /// Future returned by [`pause`] and [`pause_millis`].
    ///
    /// Resolves with `()` once the requested duration has elapsed. It cannot fail.
    #[must_use = "futures do nothing unless you `.await` or poll them"]
    #[derive(Debug)]
    pub struct Pause {
        #[pin]
        sleep: tokio::time::Sleep,
    }
}

impl Future for Pause {
    type Output = ();

    fn poll(self: Pin<&mut Self>, context: &mut Context<'_>) -> Poll<Self::Output> {
        self.project().sleep.poll(context)
    }
}

/// Suspends the current task for at least `duration`.
///
/// # Panics
///
/// Panics if called outside of a Tokio runtime with the time driver enabled.
///
/// # Examples
///
/// ```rust,ignore
/// use asyncfx::schedule::pause;
/// use std::time::{Duration, Instant};
///
/// let start = Instant::now();
/// pause(Duration::from_millis(25)).await;
/// assert!(start.elapsed() >= Duration::from_millis(25));
/// ```
pub fn pause(duration: Duration) -> Pause {
    Pause {
        sleep: tokio::time::sleep(duration),
    }
}

/// Suspends the current task for at least `milliseconds` milliseconds.
///
/// Shorthand for `pause(Duration::from_millis(milliseconds))`.
///
/// # Panics
///
/// Panics if called outside of a Tokio runtime with the time driver enabled.
pub fn pause_millis(milliseconds: u64) -> Pause {
    pause(Duration::from_millis(milliseconds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::time::Instant;

    #[rstest]
    #[tokio::test]
    async fn test_pause_waits_at_least_duration() {
        let start = Instant::now();
        pause(Duration::from_millis(25)).await;
        assert!(start.elapsed() >= Duration::from_millis(25));
    }

    #[rstest]
    #[tokio::test]
    async fn test_pause_millis_waits_at_least_duration() {
        let start = Instant::now();
        pause_millis(25).await;
        assert!(start.elapsed() >= Duration::from_millis(25));
    }

    #[rstest]
    #[tokio::test]
    async fn test_pause_zero_resolves() {
        pause(Duration::ZERO).await;
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_pause_is_driven_by_tokio_clock() {
        let start = tokio::time::Instant::now();
        pause(Duration::from_secs(60)).await;
        assert!(start.elapsed() >= Duration::from_secs(60));
    }
}

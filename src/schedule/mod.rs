//! Scheduling combinators for asynchronous work.
//!
//! This module provides the building blocks that coordinate *when* and *how
//! many* asynchronous operations run:
//!
//! - [`pause`]: Suspend the current task for a duration
//! - [`retry`] / [`retry_with`]: Re-run a failable operation with optional backoff
//! - [`async_map`] / [`async_map_with`]: Map over a slice with bounded concurrency,
//!   keeping the input order in the output
//!
//! All combinators are cooperative: "concurrent" means several operations are
//! in flight at once on the same task, not that they run on different threads.
//!
//! # Examples
//!
//! ```rust,ignore
//! use asyncfx::schedule::{retry, RetryOptions};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let options = RetryOptions::new()
//!         .count(3)
//!         .delay_with(|attempt, _error: &std::io::Error| Duration::from_millis(attempt as u64 * 10));
//!
//!     let value = retry(|| async { Ok::<_, std::io::Error>(42) }, options).await;
//!     assert_eq!(value.unwrap(), 42);
//! }
//! ```

// =============================================================================
// Delay Primitive
// =============================================================================

mod pause;

pub use pause::{Pause, pause, pause_millis};

// =============================================================================
// Retry Combinator
// =============================================================================

mod retry;

pub use retry::{RetryDelay, RetryOptions, Retrying, retry, retry_with};

// =============================================================================
// Bounded Concurrent Mapper
// =============================================================================

mod async_map;

pub use async_map::{
    AsyncMapOptions, AsyncMapResult, AsyncMapper, Collect, DEFAULT_CONCURRENCY, FailFast,
    FailureMode, IndexMode, Indexed, Plain, async_map, async_map_with,
};

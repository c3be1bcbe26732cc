//! # asyncfx
//!
//! Functional asynchronous primitives for Rust: deferred computations,
//! retry with backoff, and bounded-concurrency mapping that keeps input order.
//!
//! ## Overview
//!
//! - **Schedule**: [`pause`](schedule::pause), [`retry`](schedule::retry) and
//!   [`async_map`](schedule::async_map), each with a curried form
//!   ([`retry_with`](schedule::retry_with),
//!   [`async_map_with`](schedule::async_map_with)) that can be reused.
//! - **Task**: [`Task`](task::Task), a write-once `Pending` / `Complete` /
//!   `Failed` cell that settles in the background, with `map`, `flat_map`
//!   and the [`task_do!`] do-notation macro for sequencing.
//!
//! ## Feature Flags
//!
//! - `schedule`: `pause`, `retry`, `async_map`
//! - `task`: `Task` and `task_do!`
//! - `full`: Enable all features
//!
//! ## Example
//!
//! ```rust,ignore
//! use asyncfx::prelude::*;
//!
//! #[tokio::main]
//! async fn main() {
//!     let doubled = async_map(
//!         &[1, 2, 3],
//!         |n: &i32, _, _| {
//!             let n = *n;
//!             async move { Ok::<_, std::io::Error>(n * 2) }
//!         },
//!         AsyncMapOptions::new().concurrent(2).fail_fast(),
//!     )
//!     .await;
//!     assert_eq!(doubled.unwrap(), vec![2, 4, 6]);
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types and functions.
///
/// # Usage
///
/// ```rust
/// use asyncfx::prelude::*;
/// ```
pub mod prelude {

    #[cfg(feature = "schedule")]
    pub use crate::schedule::*;

    #[cfg(feature = "task")]
    pub use crate::task::*;
}

#[cfg(feature = "schedule")]
pub mod schedule;

#[cfg(feature = "task")]
pub mod task;

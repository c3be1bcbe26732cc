//! Do-notation for `Task`.
//!
//! `task_do!` turns a block of steps into a single pending [`Task`]. The block
//! runs as one future: each `<=` step is lifted into a task, awaited until it
//! settles, and its value bound before the next step is evaluated. The first
//! failed step ends the block and becomes the failure of the resulting task.
//!
//! [`Task`]: crate::task::Task
//!
//! # Syntax
//!
//! `<=` is the bind operator (`<-` cannot be matched in Rust macros).
//!
//! ```text
//! task_do! {
//!     pattern <= step;             // step: a Task or a Result; pattern gets its value
//!     let pattern = expression;    // plain binding
//!     let name: Type = expression; // plain binding with a type
//!     ...
//!     step                         // final step: a Task or a Result
//! }
//! ```
//!
//! A step's error is converted with `From` into the error type of the final
//! task, so steps with narrower error types can be mixed in one block.
//!
//! # Examples
//!
//! ```rust,ignore
//! use asyncfx::task::Task;
//! use asyncfx::task_do;
//!
//! #[tokio::main]
//! async fn main() {
//!     let summary: Task<String, FetchError> = task_do! {
//!         user <= fetch_user(1);
//!         let name = user.name.clone();
//!         posts <= fetch_posts(user.id);
//!         Ok(format!("{name}: {} posts", posts.len()))
//!     };
//!     println!("{:?}", summary.await);
//! }
//! ```

/// Sequences `Task` steps into one pending `Task`.
///
/// Steps are evaluated lazily and strictly one after another: a step's
/// expression is only evaluated after the previous step completed. A failed
/// step short-circuits the block.
///
/// Inside a Tokio runtime the block is driven in the background like any task
/// built with [`Task::from_future`](crate::task::Task::from_future).
///
/// # Examples
///
/// ```rust
/// use asyncfx::task::Task;
/// use asyncfx::task_do;
///
/// let sum: Task<i32, String> = task_do! {
///     x <= Task::<i32, String>::complete(1);
///     y <= Ok::<_, String>(2);
///     Ok(x + y)
/// };
/// assert_eq!(futures::executor::block_on(sum.settled()), Ok(3));
/// ```
#[macro_export]
macro_rules! task_do {
    (@step let $name:ident : $ty:ty = $value:expr ; $($rest:tt)+) => {{
        let $name: $ty = $value;
        $crate::task_do!(@step $($rest)+)
    }};

    (@step let $pattern:pat = $value:expr ; $($rest:tt)+) => {{
        let $pattern = $value;
        $crate::task_do!(@step $($rest)+)
    }};

    // `$pattern` is a single token tree: an identifier, `_` or a parenthesized tuple.
    (@step $pattern:tt <= $step:expr ; $($rest:tt)+) => {{
        let $pattern = $crate::task::Task::lift($step).settled().await?;
        $crate::task_do!(@step $($rest)+)
    }};

    (@step $last:expr) => {
        $crate::task::Task::lift($last).settled().await
    };

    ($($body:tt)+) => {
        $crate::task::Task::from_future(async move { $crate::task_do!(@step $($body)+) })
    };
}

#[cfg(test)]
mod tests {
    use crate::task::Task;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn after(milliseconds: u64, value: i32) -> Task<i32, String> {
        Task::from_future(async move {
            tokio::time::sleep(Duration::from_millis(milliseconds)).await;
            Ok(value)
        })
    }

    #[tokio::test]
    async fn test_block_is_pending_until_steps_settle() {
        let total: Task<i32, String> = task_do! {
            x <= after(10, 1);
            y <= after(10, 2);
            Ok(x + y)
        };

        assert!(total.is_pending());
        assert_eq!(total.clone().await, Ok(3));
        assert!(total.is_complete());
    }

    #[tokio::test]
    async fn test_later_step_is_not_evaluated_before_earlier_one_settles() {
        let started = Arc::new(AtomicUsize::new(0));
        let observed = Arc::clone(&started);

        let total: Task<usize, String> = task_do! {
            _ <= after(20, 0);
            let seen = observed.fetch_add(1, Ordering::SeqCst);
            Ok(seen)
        };

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(started.load(Ordering::SeqCst), 0);

        assert_eq!(total.await, Ok(0));
        assert_eq!(started.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_step_without_runtime() {
        let evaluated = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&evaluated);

        let result: Task<i32, String> = task_do! {
            x <= Task::<i32, String>::complete(1);
            _ <= Task::<i32, String>::failed(format!("failed after {x}"));
            let (a, b) = (counter.fetch_add(1, Ordering::SeqCst), 2);
            Ok(i32::try_from(a + b).unwrap_or(i32::MAX))
        };

        let outcome = futures::executor::block_on(result.settled());

        assert_eq!(outcome, Err("failed after 1".to_string()));
        assert_eq!(result.to_string(), "Task(Failed: failed after 1)");
        assert_eq!(evaluated.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_final_step_may_be_a_task() {
        let result: Task<(i32, i32), String> = task_do! {
            (x, y) <= Ok::<_, String>((10, 20));
            let total: i32 = x + y;
            Task::complete((total, x))
        };

        assert_eq!(futures::executor::block_on(result.settled()), Ok((30, 10)));
    }
}

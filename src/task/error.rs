//! Error types for `Task`.

use thiserror::Error;

/// Returned by [`Task::try_unwrap`](super::Task::try_unwrap) when the task is not
/// `Complete`.
///
/// Unwrapping is only meaningful once a task is known to be complete; both
/// variants signal a programmer error rather than a failure of the wrapped
/// computation.
///
/// # Examples
///
/// ```rust
/// use asyncfx::task::{Task, UnwrapError};
///
/// let task: Task<i32, String> = Task::failed("boom".to_string());
/// assert_eq!(task.try_unwrap(), Err(UnwrapError::Failed));
/// assert_eq!(UnwrapError::Failed.to_string(), "tried to unwrap a failed Task");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum UnwrapError {
    /// The task has not settled yet.
    #[error("tried to unwrap a pending Task")]
    Pending,
    /// The task settled with a failure.
    #[error("tried to unwrap a failed Task")]
    Failed,
}

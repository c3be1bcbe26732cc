//! `Task` - a deferred computation that settles in the background.
//!
//! A [`Task<T, E>`] is in exactly one of three states:
//!
//! - **Pending**: the underlying operation has not settled yet
//! - **Complete**: it holds a value of type `T`
//! - **Failed**: it holds an error of type `E`
//!
//! The only transition is `Pending -> Complete` or `Pending -> Failed`, and it
//! happens once. A pending task created inside a Tokio runtime is driven in the
//! background, so [`Task::is_pending`], [`Task::is_complete`] and
//! [`Task::is_failed`] reflect the settled state as soon as the operation is
//! done, even if nobody awaits the task.
//!
//! `Task` is a cheap handle: clones share the same state. Composition
//! operators never mutate their receiver; they return new tasks.
//!
//! # Failure as a Value
//!
//! `map`, `try_map`, `map_async`, `flat_map` and [`task_do!`](crate::task_do)
//! never panic on failure: a failed task short-circuits and the failure is
//! carried by the resulting task. [`Task::unwrap`] is the one exception, and
//! [`Task::try_unwrap`] is its non-panicking counterpart.
//!
//! # Examples
//!
//! ```rust,ignore
//! use asyncfx::task::Task;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let task: Task<i32, String> = Task::from_future(async {
//!         tokio::time::sleep(Duration::from_millis(10)).await;
//!         Ok(5)
//!     });
//!     assert!(task.is_pending());
//!
//!     let doubled = task.map(|n| n * 2);
//!     assert_eq!(doubled.await, Ok(10));
//! }
//! ```
//!
//! # Sequencing
//!
//! ```rust,ignore
//! use asyncfx::task::Task;
//! use asyncfx::task_do;
//!
//! let posts = task_do! {
//!     user <= fetch_user(1);
//!     posts <= fetch_posts(user.id);
//!     Task::complete(posts.len())
//! };
//! ```

mod error;
mod state;
mod task_do_macro;

pub use error::UnwrapError;
pub use state::TaskStatus;

use std::fmt;
use std::future::{Future, IntoFuture};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};

use self::state::{TaskCell, TaskState, spawn_settlement};

// =============================================================================
// Task Struct Definition
// =============================================================================

/// A deferred computation that is pending, complete with a `T`, or failed with an `E`.
///
/// # Type Parameters
///
/// - `T`: The success value.
/// - `E`: The failure value.
///
/// # Examples
///
/// ```rust
/// use asyncfx::task::{Task, TaskStatus};
///
/// let task: Task<i32, String> = Task::complete(5);
/// assert_eq!(task.status(), TaskStatus::Complete);
/// assert_eq!(task.map(|n| n + 5).unwrap(), 10);
/// ```
pub struct Task<T, E> {
    cell: Arc<TaskCell<T, E>>,
}

impl<T, E> Clone for Task<T, E> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

// =============================================================================
// Constructors
// =============================================================================

impl<T, E> Task<T, E> {
    /// Creates a task that is already complete with `value`.
    #[must_use]
    pub fn complete(value: T) -> Self {
        Self::from_state(TaskState::Complete(value))
    }

    /// Creates a task that has already failed with `error`.
    #[must_use]
    pub fn failed(error: E) -> Self {
        Self::from_state(TaskState::Failed(error))
    }

    /// Converts anything that can become a task.
    ///
    /// A `Task` is returned unchanged, `Ok` becomes complete and `Err` becomes
    /// failed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use asyncfx::task::Task;
    ///
    /// let from_result: Task<i32, String> = Task::lift(Ok(1));
    /// let from_task = Task::lift(from_result.clone());
    /// assert!(from_task.is_complete());
    /// ```
    #[must_use]
    pub fn lift<I>(thing: I) -> Self
    where
        I: IntoTask<T, E>,
    {
        thing.into_task()
    }

    fn from_state(state: TaskState<T, E>) -> Self {
        Self {
            cell: Arc::new(TaskCell::settled(state)),
        }
    }
}

impl<T, E> Task<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Creates a pending task that settles with the outcome of `future`.
    ///
    /// When called inside a Tokio runtime the future is spawned, so the task
    /// settles in the background. Otherwise it runs when the task is first
    /// awaited.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use asyncfx::task::Task;
    ///
    /// let task: Task<i32, String> = Task::from_future(async { Ok(5) });
    /// assert_eq!(task.await, Ok(5));
    /// ```
    #[must_use]
    pub fn from_future<Fut>(future: Fut) -> Self
    where
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let cell = TaskCell::pending(future);
        if let Some(settlement) = cell.settlement() {
            spawn_settlement(settlement);
        }
        Self { cell }
    }

    /// Adapts a fallible function into one that returns tasks.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use asyncfx::task::Task;
    ///
    /// let parse = Task::wrap_function(|text: &str| text.parse::<i32>().map_err(|e| e.to_string()));
    /// assert!(parse("5").is_complete());
    /// assert!(parse("five").is_failed());
    /// ```
    pub fn wrap_function<A, F>(function: F) -> impl Fn(A) -> Self
    where
        F: Fn(A) -> Result<T, E>,
    {
        move |argument| Self::from(function(argument))
    }

    /// Adapts an asynchronous fallible function into one that returns pending tasks.
    ///
    /// Each call starts the returned future through [`Task::from_future`].
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use asyncfx::task::Task;
    ///
    /// let fetch = Task::wrap_async_function(|id: u32| async move {
    ///     if id == 0 { Err("no such id".to_string()) } else { Ok(id * 10) }
    /// });
    /// let task = fetch(4);
    /// assert!(task.is_pending());
    /// assert_eq!(task.await, Ok(40));
    /// ```
    pub fn wrap_async_function<A, F, Fut>(function: F) -> impl Fn(A) -> Self
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        move |argument| Self::from_future(function(argument))
    }
}

// =============================================================================
// Queries
// =============================================================================

impl<T, E> Task<T, E> {
    /// Returns the state at the time of the call.
    #[must_use]
    pub fn status(&self) -> TaskStatus {
        self.cell.status()
    }

    /// Returns `true` if the task has not settled yet.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status() == TaskStatus::Pending
    }

    /// Returns `true` if the task holds a value.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status() == TaskStatus::Complete
    }

    /// Returns `true` if the task holds an error.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.status() == TaskStatus::Failed
    }

    /// Returns `true` if both handles share the same state.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}

impl<T: Clone, E> Task<T, E> {
    /// Returns the value if the task is complete.
    ///
    /// # Errors
    ///
    /// Returns [`UnwrapError::Pending`] or [`UnwrapError::Failed`] when the task is
    /// not complete at the time of the call.
    pub fn try_unwrap(&self) -> Result<T, UnwrapError> {
        self.cell.inspect(|state| match state {
            TaskState::Complete(value) => Ok(value.clone()),
            TaskState::Pending { .. } => Err(UnwrapError::Pending),
            TaskState::Failed(_) => Err(UnwrapError::Failed),
        })
    }

    /// Returns the value of a complete task.
    ///
    /// Only meaningful once the task is known to be complete.
    ///
    /// # Panics
    ///
    /// Panics if the task is pending or failed.
    #[must_use]
    pub fn unwrap(&self) -> T {
        match self.try_unwrap() {
            Ok(value) => value,
            Err(error) => panic!("{error}"),
        }
    }
}

// =============================================================================
// Settlement
// =============================================================================

impl<T, E> Task<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Waits for the task to settle and returns its outcome.
    ///
    /// # Errors
    ///
    /// Returns the task's error if it failed.
    pub async fn settled(&self) -> Result<T, E> {
        if let Some(settlement) = self.cell.settlement() {
            settlement.await;
        }
        match self.cell.outcome() {
            Some(outcome) => outcome,
            None => unreachable!("settlement finished without recording an outcome"),
        }
    }

    /// Waits for the task to settle and returns its value, or `default` if it failed.
    pub async fn or_default(&self, default: T) -> T {
        self.settled().await.unwrap_or(default)
    }

    /// Waits for the task to settle and applies exactly one of the two functions.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use asyncfx::task::Task;
    ///
    /// let task: Task<i32, String> = Task::failed("boom".to_string());
    /// let message = task.fold(|n| n.to_string(), |error| format!("error: {error}")).await;
    /// assert_eq!(message, "error: boom");
    /// ```
    pub async fn fold<R, OnComplete, OnFailed>(
        &self,
        on_complete: OnComplete,
        on_failed: OnFailed,
    ) -> R
    where
        OnComplete: FnOnce(T) -> R,
        OnFailed: FnOnce(E) -> R,
    {
        match self.settled().await {
            Ok(value) => on_complete(value),
            Err(error) => on_failed(error),
        }
    }
}

impl<T, E> IntoFuture for Task<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    type Output = Result<T, E>;
    type IntoFuture = BoxFuture<'static, Result<T, E>>;

    fn into_future(self) -> Self::IntoFuture {
        async move { self.settled().await }.boxed()
    }
}

// =============================================================================
// Composition
// =============================================================================

impl<T, E> Task<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Transforms the value of a complete task.
    ///
    /// - Complete: `function` runs immediately.
    /// - Failed: the failure is passed through and `function` is never called.
    /// - Pending: a new pending task applies `function` once this one settles.
    #[must_use]
    pub fn map<U, F>(&self, function: F) -> Task<U, E>
    where
        F: FnOnce(T) -> U + Send + 'static,
        U: Send + Sync + 'static,
    {
        self.try_map(move |value| Ok(function(value)))
    }

    /// Transforms the value with a function that can fail.
    ///
    /// An `Err` returned by `function` replaces the success: the resulting task
    /// fails with that error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use asyncfx::task::Task;
    ///
    /// let task: Task<i32, String> = Task::complete(5);
    /// let checked = task.try_map(|n| if n > 10 { Ok(n) } else { Err(format!("{n} too small")) });
    /// assert!(checked.is_failed());
    /// ```
    #[must_use]
    pub fn try_map<U, F>(&self, function: F) -> Task<U, E>
    where
        F: FnOnce(T) -> Result<U, E> + Send + 'static,
        U: Send + Sync + 'static,
    {
        match self.cell.outcome() {
            Some(Ok(value)) => Task::from(function(value)),
            Some(Err(error)) => Task::failed(error),
            None => {
                let source = self.clone();
                Task::from_future(async move { source.settled().await.and_then(function) })
            }
        }
    }

    /// Transforms the value with an asynchronous function.
    ///
    /// The resulting task is pending until the returned future settles, and
    /// fails if that future fails.
    #[must_use]
    pub fn map_async<U, F, Fut>(&self, function: F) -> Task<U, E>
    where
        F: FnOnce(T) -> Fut + Send + 'static,
        Fut: Future<Output = Result<U, E>> + Send + 'static,
        U: Send + Sync + 'static,
    {
        match self.cell.outcome() {
            Some(Ok(value)) => Task::from_future(function(value)),
            Some(Err(error)) => Task::failed(error),
            None => {
                let source = self.clone();
                Task::from_future(async move {
                    let value = source.settled().await?;
                    function(value).await
                })
            }
        }
    }

    /// Chains a function that returns another task, flattening one level.
    ///
    /// Failure short-circuits exactly as in [`Task::map`].
    #[must_use]
    pub fn flat_map<U, F>(&self, function: F) -> Task<U, E>
    where
        F: FnOnce(T) -> Task<U, E> + Send + 'static,
        U: Clone + Send + Sync + 'static,
    {
        match self.cell.outcome() {
            Some(Ok(value)) => function(value),
            Some(Err(error)) => Task::failed(error),
            None => {
                let source = self.clone();
                Task::from_future(async move {
                    let value = source.settled().await?;
                    function(value).settled().await
                })
            }
        }
    }
}

impl<U, E> Task<Task<U, E>, E>
where
    U: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Removes one level of nesting.
    #[must_use]
    pub fn flatten(&self) -> Task<U, E> {
        self.flat_map(|inner| inner)
    }
}

// =============================================================================
// Conversions
// =============================================================================

/// Conversion into a [`Task`].
///
/// Implemented for `Task` itself (identity) and for `Result`.
pub trait IntoTask<T, E> {
    /// Converts `self` into a task.
    fn into_task(self) -> Task<T, E>;
}

impl<T, E> IntoTask<T, E> for Task<T, E> {
    fn into_task(self) -> Self {
        self
    }
}

impl<T, E> IntoTask<T, E> for Result<T, E> {
    fn into_task(self) -> Task<T, E> {
        Task::from(self)
    }
}

impl<T, E> From<Result<T, E>> for Task<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::complete(value),
            Err(error) => Self::failed(error),
        }
    }
}

// =============================================================================
// Display
// =============================================================================

impl<T: fmt::Debug, E: fmt::Display> fmt::Display for Task<T, E> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.cell.inspect(|state| match state {
            TaskState::Pending { .. } => write!(formatter, "Task(Pending)"),
            TaskState::Complete(value) => write!(formatter, "Task(Complete: {value:?})"),
            TaskState::Failed(error) => write!(formatter, "Task(Failed: {error})"),
        })
    }
}

impl<T: fmt::Debug, E: fmt::Debug> fmt::Debug for Task<T, E> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.cell.inspect(|state| match state {
            TaskState::Pending { .. } => formatter.write_str("Task::Pending"),
            TaskState::Complete(value) => formatter.debug_tuple("Task::Complete").field(value).finish(),
            TaskState::Failed(error) => formatter.debug_tuple("Task::Failed").field(error).finish(),
        })
    }
}

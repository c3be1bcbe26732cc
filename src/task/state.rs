//! Write-once state cell shared by all clones of a `Task`.

use std::sync::{Arc, Weak};

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::RwLock;

/// Resolves once the pending operation has settled and its outcome is recorded.
pub(super) type Settlement = Shared<BoxFuture<'static, ()>>;

/// The three states of a task.
///
/// Transitions are `Pending -> Complete` or `Pending -> Failed`, exactly once.
pub(super) enum TaskState<T, E> {
    Pending { settlement: Settlement },
    Complete(T),
    Failed(E),
}

/// Observable state of a [`Task`](super::Task) at the time of the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    /// The underlying operation has not settled yet.
    Pending,
    /// The task holds a value.
    Complete,
    /// The task holds an error.
    Failed,
}

pub(super) struct TaskCell<T, E> {
    state: RwLock<TaskState<T, E>>,
}

impl<T, E> TaskCell<T, E> {
    pub(super) fn settled(state: TaskState<T, E>) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Creates a pending cell whose settlement future records the outcome of `future`.
    ///
    /// The settlement future only holds a weak reference to the cell, so an
    /// abandoned task does not keep itself alive.
    pub(super) fn pending<Fut>(future: Fut) -> Arc<Self>
    where
        Fut: std::future::Future<Output = Result<T, E>> + Send + 'static,
        T: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        Arc::new_cyclic(|cell: &Weak<Self>| {
            let cell = cell.clone();
            let settlement = async move {
                let outcome = future.await;
                match cell.upgrade() {
                    Some(cell) => cell.settle(outcome),
                    None => tracing::trace!("task dropped before settlement, outcome discarded"),
                }
            }
            .boxed()
            .shared();
            Self {
                state: RwLock::new(TaskState::Pending { settlement }),
            }
        })
    }

    fn settle(&self, outcome: Result<T, E>) {
        let mut state = self.state.write();
        debug_assert!(
            matches!(*state, TaskState::Pending { .. }),
            "a task settles exactly once"
        );
        tracing::trace!(complete = outcome.is_ok(), "task settled");
        *state = match outcome {
            Ok(value) => TaskState::Complete(value),
            Err(error) => TaskState::Failed(error),
        };
    }

    pub(super) fn status(&self) -> TaskStatus {
        match &*self.state.read() {
            TaskState::Pending { .. } => TaskStatus::Pending,
            TaskState::Complete(_) => TaskStatus::Complete,
            TaskState::Failed(_) => TaskStatus::Failed,
        }
    }

    /// Returns the settlement future while the cell is still pending.
    pub(super) fn settlement(&self) -> Option<Settlement> {
        match &*self.state.read() {
            TaskState::Pending { settlement } => Some(settlement.clone()),
            _ => None,
        }
    }

    /// Returns a copy of the outcome, or `None` while pending.
    pub(super) fn outcome(&self) -> Option<Result<T, E>>
    where
        T: Clone,
        E: Clone,
    {
        match &*self.state.read() {
            TaskState::Pending { .. } => None,
            TaskState::Complete(value) => Some(Ok(value.clone())),
            TaskState::Failed(error) => Some(Err(error.clone())),
        }
    }

    /// Runs `function` against the current state without cloning it.
    pub(super) fn inspect<R>(&self, function: impl FnOnce(&TaskState<T, E>) -> R) -> R {
        function(&self.state.read())
    }
}

/// Drives `settlement` on the current Tokio runtime so the task settles even if
/// nobody awaits it.
///
/// Without a runtime the task settles lazily, when first awaited.
pub(super) fn spawn_settlement(settlement: Settlement) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(settlement);
        }
        Err(_) => {
            tracing::debug!("no Tokio runtime, task settles when first awaited");
        }
    }
}

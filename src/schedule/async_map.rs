//! Bounded-concurrency asynchronous mapping.
//!
//! [`async_map`] applies an asynchronous transformation to every element of a
//! slice while keeping at most `concurrent` transformations in flight. It is a
//! sliding window, not a batch: as soon as one transformation settles, the next
//! unscheduled element is started, so the window stays saturated until the input
//! is exhausted.
//!
//! The output always follows input order, whatever order the transformations
//! settle in.
//!
//! # Output Shapes
//!
//! The shape of the output is chosen at the type level by the options:
//!
//! | Failure mode | Index mode | Output |
//! |--------------|------------|--------|
//! | [`Collect`]  | [`Plain`]   | `AsyncMapResult<U, E>` |
//! | [`Collect`]  | [`Indexed`] | `AsyncMapResult<(usize, U), (usize, E)>` |
//! | [`FailFast`] | [`Plain`]   | `Result<Vec<U>, E>` |
//! | [`FailFast`] | [`Indexed`] | `Result<Vec<(usize, U)>, E>` |
//!
//! # Fail-Fast Abort
//!
//! In [`FailFast`] mode the first failure stops scheduling and becomes the
//! result. Transformations that are already in flight are not cancelled: they
//! are moved to a detached Tokio task which drives them to completion and
//! discards their outcomes.
//!
//! # Examples
//!
//! ```rust,ignore
//! use asyncfx::schedule::{async_map, AsyncMapOptions};
//!
//! let outcome = async_map(
//!     &[1, 2, 3, 4],
//!     |n: &u32, _index, _all| {
//!         let n = *n;
//!         async move { if n % 2 == 0 { Ok(n * 10) } else { Err(format!("odd: {n}")) } }
//!     },
//!     AsyncMapOptions::new().concurrent(2).with_source_indexes(),
//! )
//! .await;
//!
//! assert_eq!(outcome.results, vec![(1, 20), (3, 40)]);
//! assert_eq!(outcome.errors, vec![(0, "odd: 1".to_string()), (2, "odd: 3".to_string())]);
//! ```

use std::future::Future;
use std::marker::PhantomData;

use futures::stream::{FuturesUnordered, StreamExt};

use self::private::{Sealed, Settlement};

/// Number of transformations kept in flight when no limit is configured.
pub const DEFAULT_CONCURRENCY: usize = 5;

// =============================================================================
// Modes
// =============================================================================

mod private {
    pub trait Sealed {}

    /// Everything one run of the scheduler produced, before shaping.
    pub struct Settlement<U, E> {
        pub results: Vec<(usize, U)>,
        pub errors: Vec<(usize, E)>,
        pub abort: Option<E>,
    }
}

/// Failures are recorded next to the successes and scheduling continues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Collect;

/// The first failure aborts the whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailFast;

/// Outputs carry only the values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Plain;

/// Outputs carry `(source_index, value)` pairs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Indexed;

impl Sealed for Collect {}
impl Sealed for FailFast {}
impl Sealed for Plain {}
impl Sealed for Indexed {}

/// Whether source indexes are kept in the output.
///
/// Implemented by [`Plain`] and [`Indexed`]; sealed.
pub trait IndexMode: Sealed {
    /// The output item for a value of type `V`.
    type Item<V>;

    /// Builds an output item from its source index and value.
    fn project<V>(index: usize, value: V) -> Self::Item<V>;
}

impl IndexMode for Plain {
    type Item<V> = V;

    fn project<V>(_index: usize, value: V) -> V {
        value
    }
}

impl IndexMode for Indexed {
    type Item<V> = (usize, V);

    fn project<V>(index: usize, value: V) -> (usize, V) {
        (index, value)
    }
}

/// How failures affect a run, and what the run returns.
///
/// Implemented by [`Collect`] and [`FailFast`]; sealed.
pub trait FailureMode: Sealed {
    /// Whether the first failure aborts the run.
    const FAIL_FAST: bool;

    /// The value returned by a run with successes `U`, failures `E` and index mode `I`.
    type Output<U, E, I: IndexMode>;

    #[doc(hidden)]
    fn assemble<U, E, I: IndexMode>(settlement: Settlement<U, E>) -> Self::Output<U, E, I>;
}

impl FailureMode for Collect {
    const FAIL_FAST: bool = false;

    type Output<U, E, I: IndexMode> = AsyncMapResult<I::Item<U>, I::Item<E>>;

    fn assemble<U, E, I: IndexMode>(settlement: Settlement<U, E>) -> Self::Output<U, E, I> {
        debug_assert!(settlement.abort.is_none(), "collect mode never aborts");
        AsyncMapResult {
            results: project_all::<U, I>(settlement.results),
            errors: project_all::<E, I>(settlement.errors),
        }
    }
}

impl FailureMode for FailFast {
    const FAIL_FAST: bool = true;

    type Output<U, E, I: IndexMode> = Result<Vec<I::Item<U>>, E>;

    fn assemble<U, E, I: IndexMode>(settlement: Settlement<U, E>) -> Self::Output<U, E, I> {
        match settlement.abort {
            Some(error) => Err(error),
            None => Ok(project_all::<U, I>(settlement.results)),
        }
    }
}

fn project_all<V, I: IndexMode>(pairs: Vec<(usize, V)>) -> Vec<I::Item<V>> {
    pairs
        .into_iter()
        .map(|(index, value)| I::project(index, value))
        .collect()
}

// =============================================================================
// Output
// =============================================================================

/// Successes and failures of a [`Collect`] run, each in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncMapResult<R, E> {
    /// Successful outputs.
    pub results: Vec<R>,
    /// Failures.
    pub errors: Vec<E>,
}

impl<R, E> AsyncMapResult<R, E> {
    /// Returns `true` if no transformation failed.
    #[must_use]
    pub fn is_all_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Converts into a `Result`, failing with the first error in source order.
    ///
    /// # Errors
    ///
    /// Returns the first recorded failure if there is one.
    pub fn into_result(self) -> Result<Vec<R>, E> {
        match self.errors.into_iter().next() {
            Some(error) => Err(error),
            None => Ok(self.results),
        }
    }
}

impl<R, E> Default for AsyncMapResult<R, E> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            errors: Vec::new(),
        }
    }
}

// =============================================================================
// Options
// =============================================================================

/// Options for [`async_map`] and [`async_map_with`].
///
/// The type parameters select the output shape: `M` is the failure mode
/// ([`Collect`] or [`FailFast`]) and `I` the index mode ([`Plain`] or
/// [`Indexed`]). The defaults are `Collect`, `Plain` and a concurrency of
/// [`DEFAULT_CONCURRENCY`].
///
/// # Examples
///
/// ```rust
/// use asyncfx::schedule::{AsyncMapOptions, FailFast, Indexed};
///
/// let options: AsyncMapOptions<FailFast, Indexed> =
///     AsyncMapOptions::new().concurrent(8).fail_fast().with_source_indexes();
/// assert_eq!(options.concurrency(), 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsyncMapOptions<M = Collect, I = Plain> {
    concurrent: usize,
    modes: PhantomData<fn() -> (M, I)>,
}

impl AsyncMapOptions {
    /// Creates the default options: 5 in flight, errors collected, no indexes.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            concurrent: DEFAULT_CONCURRENCY,
            modes: PhantomData,
        }
    }
}

impl Default for AsyncMapOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl<M, I> AsyncMapOptions<M, I> {
    /// Sets the maximum number of transformations in flight.
    ///
    /// A limit of `0` would never schedule anything, so it is raised to `1`.
    #[must_use]
    pub const fn concurrent(self, limit: usize) -> Self {
        Self {
            concurrent: if limit == 0 { 1 } else { limit },
            modes: PhantomData,
        }
    }

    /// Returns the maximum number of transformations in flight.
    #[must_use]
    pub const fn concurrency(&self) -> usize {
        self.concurrent
    }

    /// Aborts on the first failure.
    #[must_use]
    pub const fn fail_fast(self) -> AsyncMapOptions<FailFast, I> {
        AsyncMapOptions {
            concurrent: self.concurrent,
            modes: PhantomData,
        }
    }

    /// Records failures and keeps going.
    #[must_use]
    pub const fn collect_errors(self) -> AsyncMapOptions<Collect, I> {
        AsyncMapOptions {
            concurrent: self.concurrent,
            modes: PhantomData,
        }
    }

    /// Pairs every output with the index of its source element.
    #[must_use]
    pub const fn with_source_indexes(self) -> AsyncMapOptions<M, Indexed> {
        AsyncMapOptions {
            concurrent: self.concurrent,
            modes: PhantomData,
        }
    }

    /// Outputs values only.
    #[must_use]
    pub const fn without_source_indexes(self) -> AsyncMapOptions<M, Plain> {
        AsyncMapOptions {
            concurrent: self.concurrent,
            modes: PhantomData,
        }
    }
}

// =============================================================================
// Entry Points
// =============================================================================

/// Maps `function` over `data` with at most `options.concurrency()` calls in flight.
///
/// `function` receives the element, its index and the whole slice. It is called
/// when the element is scheduled; the returned future is then polled alongside
/// the other in-flight futures.
///
/// An empty `data` resolves immediately to the empty output without calling
/// `function`.
///
/// # Examples
///
/// ```rust,ignore
/// use asyncfx::schedule::{async_map, AsyncMapOptions};
///
/// let doubled = async_map(
///     &[1, 2, 3],
///     |n: &i32, _, _| {
///         let n = *n;
///         async move { Ok::<_, String>(n * 2) }
///     },
///     AsyncMapOptions::new().fail_fast(),
/// )
/// .await;
/// assert_eq!(doubled, Ok(vec![2, 4, 6]));
/// ```
pub async fn async_map<T, U, E, F, Fut, M, I>(
    data: &[T],
    function: F,
    options: AsyncMapOptions<M, I>,
) -> M::Output<U, E, I>
where
    F: Fn(&T, usize, &[T]) -> Fut,
    Fut: Future<Output = Result<U, E>> + Send + 'static,
    U: Send + 'static,
    E: Send + 'static,
    M: FailureMode,
    I: IndexMode,
{
    let settlement = run_window(data, &function, options.concurrent, M::FAIL_FAST).await;
    M::assemble::<U, E, I>(settlement)
}

/// Binds `function` and `options` into a reusable [`AsyncMapper`].
///
/// # Examples
///
/// ```rust,ignore
/// use asyncfx::schedule::{async_map_with, AsyncMapOptions};
///
/// let lengths = async_map_with(
///     |word: &String, _: usize, _: &[String]| {
///         let length = word.len();
///         async move { Ok::<_, String>(length) }
///     },
///     AsyncMapOptions::new().concurrent(2),
/// );
///
/// let first = lengths.run(&["a".to_string(), "bb".to_string()]).await;
/// let second = lengths.run(&["ccc".to_string()]).await;
/// assert_eq!(first.results, vec![1, 2]);
/// assert_eq!(second.results, vec![3]);
/// ```
#[must_use]
pub fn async_map_with<F, M, I>(
    function: F,
    options: AsyncMapOptions<M, I>,
) -> AsyncMapper<F, M, I> {
    AsyncMapper { function, options }
}

/// A transformation and its options, applicable to any number of inputs.
///
/// Created by [`async_map_with`].
#[derive(Debug, Clone)]
pub struct AsyncMapper<F, M = Collect, I = Plain> {
    function: F,
    options: AsyncMapOptions<M, I>,
}

impl<F, M, I> AsyncMapper<F, M, I> {
    /// Maps the bound transformation over `data`.
    ///
    /// See [`async_map`].
    pub async fn run<T, U, E, Fut>(&self, data: &[T]) -> M::Output<U, E, I>
    where
        F: Fn(&T, usize, &[T]) -> Fut,
        Fut: Future<Output = Result<U, E>> + Send + 'static,
        U: Send + 'static,
        E: Send + 'static,
        M: FailureMode,
        I: IndexMode,
    {
        let settlement =
            run_window(data, &self.function, self.options.concurrent, M::FAIL_FAST).await;
        M::assemble::<U, E, I>(settlement)
    }

    /// Returns the bound options.
    #[must_use]
    pub const fn options(&self) -> &AsyncMapOptions<M, I> {
        &self.options
    }
}

// =============================================================================
// Scheduler
// =============================================================================

async fn run_window<T, U, E, F, Fut>(
    data: &[T],
    function: &F,
    concurrent: usize,
    fail_fast: bool,
) -> Settlement<U, E>
where
    F: Fn(&T, usize, &[T]) -> Fut,
    Fut: Future<Output = Result<U, E>> + Send + 'static,
    U: Send + 'static,
    E: Send + 'static,
{
    let mut settlement = Settlement {
        results: Vec::with_capacity(data.len()),
        errors: Vec::new(),
        abort: None,
    };
    if data.is_empty() {
        return settlement;
    }

    tracing::trace!(len = data.len(), concurrent, fail_fast, "async map started");

    let schedule = |index: usize| {
        let future = function(&data[index], index, data);
        async move { (index, future.await) }
    };

    let mut in_flight = FuturesUnordered::new();
    let mut next = 0;
    while next < data.len() && in_flight.len() < concurrent {
        in_flight.push(schedule(next));
        next += 1;
    }

    while let Some((index, outcome)) = in_flight.next().await {
        match outcome {
            Ok(value) => settlement.results.push((index, value)),
            Err(error) if fail_fast => {
                tracing::debug!(
                    index,
                    in_flight = in_flight.len(),
                    unscheduled = data.len() - next,
                    "async map aborted on first failure"
                );
                detach(in_flight);
                settlement.abort = Some(error);
                return settlement;
            }
            Err(error) => {
                tracing::trace!(index, "async map recorded a failure");
                settlement.errors.push((index, error));
            }
        }

        if next < data.len() {
            in_flight.push(schedule(next));
            next += 1;
        }
    }

    settlement.results.sort_unstable_by_key(|(index, _)| *index);
    settlement.errors.sort_unstable_by_key(|(index, _)| *index);
    settlement
}

/// Lets in-flight futures settle in the background after a fail-fast abort.
fn detach<Fut>(in_flight: FuturesUnordered<Fut>)
where
    Fut: Future + Send + 'static,
    Fut::Output: Send + 'static,
{
    if in_flight.is_empty() {
        return;
    }
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(in_flight.for_each(|_| async {}));
        }
        Err(_) => {
            tracing::debug!(
                dropped = in_flight.len(),
                "no Tokio runtime to detach in-flight futures onto; dropping them"
            );
        }
    }
}

//! Lazy value, version 2: a re-runnable future factory.
//!
//! A [`Lazy`] holds a factory that builds a fresh future per run. Combinators
//! wrap the factory, so building a sequence allocates no futures until
//! [`Lazy::run`] or [`Lazy::fork`] is called.
//!
//! [`Lazy::and_then`] is driven by the hand-polled [`AndThen`] future, which
//! moves from the first future to the second only after the first resolves.
//! Each `and_then` wraps the previous future, so a left fold of them polls
//! through one nested layer per link. [`Lazy::try_fold`] drives a whole
//! sequence from a single loop instead.

use core::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use futures_lite::future::{self, Boxed};
use futures_lite::{ready, FutureExt};
use parking_lot::Mutex;

use crate::error::TaskError;
use crate::primitives::flow::Callback;
use crate::types::{Task, TaskInput};

type Factory<T, E> = dyn Fn() -> Boxed<Result<T, E>> + Send + Sync;

/// A lazy, re-runnable asynchronous value backed by Rust futures.
pub struct Lazy<T, E> {
    factory: Arc<Factory<T, E>>,
}

impl<T, E> Clone for Lazy<T, E> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<T, E> fmt::Debug for Lazy<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lazy").finish_non_exhaustive()
    }
}

impl<T, E> Lazy<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Creates a lazy value from a future factory.
    pub fn new<F, Fut>(factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self {
            factory: Arc::new(move || factory().boxed()),
        }
    }

    /// A lazy value that resolves to `value` on every run.
    pub fn of(value: T) -> Self
    where
        T: Clone + Sync,
    {
        Self::new(move || future::ready(Ok(value.clone())))
    }

    /// A lazy value that fails with `error` on every run.
    pub fn rejected(error: E) -> Self
    where
        E: Clone + Sync,
    {
        Self::new(move || future::ready(Err(error.clone())))
    }

    /// Creates a lazy value from a callback-style function.
    ///
    /// `f` is invoked on the first poll of each run. A run whose callback is
    /// dropped without being called never resolves.
    pub fn from_callback<F>(f: F) -> Self
    where
        F: Fn(Callback<T, E>) + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Self::new(move || {
            let f = Arc::clone(&f);
            async move {
                let (callback, receiver) = handoff();
                f(callback);
                receiver.await
            }
        })
    }

    /// Transforms the resolved value.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Lazy<U, E>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let factory = self.factory;
        let f = Arc::new(f);
        Lazy::new(move || {
            let run = factory();
            let f = Arc::clone(&f);
            async move { run.await.map(&*f) }
        })
    }

    /// Sequences a dependent future after this value resolves.
    #[must_use]
    pub fn and_then<U, F, Fut>(self, f: F) -> Lazy<U, E>
    where
        U: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<U, E>> + Send + 'static,
    {
        let factory = self.factory;
        let f = Arc::new(f);
        Lazy::new(move || AndThen::new(factory(), Arc::clone(&f)))
    }

    /// Folds `items` into one lazy value driven by a single looping future.
    ///
    /// Each run starts from a clone of `init`. For every item, `step` builds
    /// the next link from the accumulator so far; the link is awaited and its
    /// value merged with `combine`. The first error ends the run.
    pub fn try_fold<I, V, S, C>(items: Vec<I>, init: T, step: S, combine: C) -> Self
    where
        T: Clone + Sync,
        I: Send + Sync + 'static,
        V: Send + 'static,
        S: Fn(&T, &I) -> Lazy<V, E> + Send + Sync + 'static,
        C: Fn(T, V) -> T + Send + Sync + 'static,
    {
        let items: Arc<[I]> = items.into();
        let step = Arc::new(step);
        let combine = Arc::new(combine);
        Self::new(move || {
            let items = Arc::clone(&items);
            let step = Arc::clone(&step);
            let combine = Arc::clone(&combine);
            let mut acc = init.clone();
            async move {
                for item in items.iter() {
                    let value = step(&acc, item).run().await?;
                    acc = combine(acc, value);
                }
                Ok::<T, E>(acc)
            }
        })
    }

    /// Builds a fresh future for one run.
    #[must_use]
    pub fn run(&self) -> Boxed<Result<T, E>> {
        (self.factory)()
    }

    /// Spawns one run on the current Tokio runtime and hands its result to
    /// `on_settled`.
    ///
    /// # Panics
    ///
    /// Panics if no Tokio runtime is running.
    pub fn fork<F>(&self, on_settled: F)
    where
        F: FnOnce(Result<T, E>) + Send + 'static,
    {
        let run = self.run();
        tokio::spawn(async move { on_settled(run.await) });
    }
}

impl Lazy<u8, TaskError> {
    /// Wraps one task invocation through its future convention.
    #[must_use]
    pub fn from_task(task: &Task, input: TaskInput) -> Self {
        let task = task.clone();
        Self::new(move || task.future(input))
    }
}

/// Future for [`Lazy::and_then`].
pub struct AndThen<T, E, F, Fut> {
    state: AndThenState<T, E, F, Fut>,
}

enum AndThenState<T, E, F, Fut> {
    First { run: Boxed<Result<T, E>>, f: Arc<F> },
    Second(Pin<Box<Fut>>),
    Done,
}

impl<T, E, F, Fut> AndThen<T, E, F, Fut> {
    fn new(run: Boxed<Result<T, E>>, f: Arc<F>) -> Self {
        Self {
            state: AndThenState::First { run, f },
        }
    }
}

impl<T, U, E, F, Fut> Future for AndThen<T, E, F, Fut>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<U, E>>,
{
    type Output = Result<U, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        loop {
            match &mut this.state {
                AndThenState::First { run, f } => match ready!(run.as_mut().poll(cx)) {
                    Ok(value) => {
                        let next = f(value);
                        this.state = AndThenState::Second(Box::pin(next));
                    }
                    Err(error) => {
                        this.state = AndThenState::Done;
                        return Poll::Ready(Err(error));
                    }
                },
                AndThenState::Second(next) => {
                    let output = ready!(next.as_mut().poll(cx));
                    this.state = AndThenState::Done;
                    return Poll::Ready(output);
                }
                AndThenState::Done => panic!("AndThen polled after completion"),
            }
        }
    }
}

struct Slot<T> {
    value: Option<T>,
    waker: Option<Waker>,
}

struct Handoff<T> {
    slot: Arc<Mutex<Slot<T>>>,
}

fn handoff<T, E>() -> (Callback<T, E>, Handoff<Result<T, E>>)
where
    T: Send + 'static,
    E: Send + 'static,
{
    let slot = Arc::new(Mutex::new(Slot {
        value: None,
        waker: None,
    }));
    let writer = Arc::clone(&slot);
    let callback: Callback<T, E> = Box::new(move |result: Result<T, E>| {
        let waker = {
            let mut slot = writer.lock();
            slot.value = Some(result);
            slot.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    });
    (callback, Handoff { slot })
}

impl<T> Future for Handoff<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let mut slot = self.slot.lock();
        if let Some(value) = slot.value.take() {
            return Poll::Ready(value);
        }
        slot.waker = Some(cx.waker().clone());
        Poll::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::run_test;
    use crate::types::TaskMode;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn run_builds_fresh_future_each_time() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let lazy: Lazy<usize, ()> = Lazy::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            future::ready(Ok(n))
        });
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(future::block_on(lazy.run()), Ok(0));
        assert_eq!(future::block_on(lazy.run()), Ok(1));
    }

    #[test]
    fn and_then_sequences_and_maps() {
        let lazy = Lazy::<u8, &'static str>::of(10)
            .and_then(|a| async move { Ok(a + 20) })
            .map(u32::from);
        assert_eq!(future::block_on(lazy.run()), Ok(30));
    }

    #[test]
    fn and_then_skips_continuation_on_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let lazy = Lazy::<u8, &'static str>::rejected("E").and_then(move |v| {
            seen.fetch_add(1, Ordering::SeqCst);
            future::ready(Ok::<u8, &'static str>(v))
        });
        assert_eq!(future::block_on(lazy.run()), Err("E"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn try_fold_threads_accumulator() {
        let lazy = Lazy::<Vec<u32>, &'static str>::try_fold(
            vec![1u32, 2, 3],
            Vec::new(),
            |acc: &Vec<u32>, item: &u32| Lazy::of(acc.iter().sum::<u32>() + item),
            |mut acc, value| {
                acc.push(value);
                acc
            },
        );
        assert_eq!(future::block_on(lazy.run()), Ok(vec![1, 3, 7]));
        assert_eq!(future::block_on(lazy.run()), Ok(vec![1, 3, 7]));
    }

    #[test]
    fn try_fold_stops_at_first_error() {
        let built = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&built);
        let lazy = Lazy::<u32, &'static str>::try_fold(
            vec![1u32, 0, 3],
            0,
            move |_: &u32, item: &u32| {
                seen.fetch_add(1, Ordering::SeqCst);
                if *item == 0 {
                    Lazy::rejected("zero")
                } else {
                    Lazy::of(*item)
                }
            },
            |acc, value| acc + value,
        );
        assert_eq!(future::block_on(lazy.run()), Err("zero"));
        assert_eq!(built.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn try_fold_long_deferred_sequence() {
        run_test(|| async {
            let tasks = vec![Task::value(TaskMode::Deferred, 1); 100_000];
            let lazy = Lazy::try_fold(
                tasks,
                0u64,
                |_: &u64, task: &Task| Lazy::from_task(task, TaskInput::default()),
                |acc, value| acc + u64::from(value),
            );
            assert_eq!(lazy.run().await, Ok(100_000));
        });
    }

    #[test]
    fn from_callback_resolves_through_waker() {
        run_test(|| async {
            let lazy: Lazy<u8, &'static str> = Lazy::from_callback(|callback| {
                tokio::spawn(async move { callback(Ok(42)) });
            });
            assert_eq!(lazy.run().await, Ok(42));
            assert_eq!(lazy.run().await, Ok(42));
        });
    }

    #[test]
    fn fork_delivers_on_spawned_task() {
        run_test(|| async {
            let lazy = Lazy::<u8, &'static str>::of(5).map(|v| v * 2);
            let (tx, rx) = tokio::sync::oneshot::channel();
            lazy.fork(move |result| {
                let _ = tx.send(result);
            });
            assert_eq!(rx.await.unwrap(), Ok(10));
        });
    }
}

//! Lazy value, version 1: a re-runnable computation driven by `fork`.
//!
//! A [`Deferred`] wraps a computation that reports through a [`Settle`]
//! handle. Building one with [`Deferred::map`] or [`Deferred::chain`] runs
//! nothing; the whole computation runs each time [`Deferred::fork`] is
//! called.
//!
//! # Semantics
//!
//! ```text
//! chain(d, f).fork(h):
//!   d.run(settle)
//!   on Ok(v):  f(v).run(h)
//!   on Err(e): h(Err(e))     -- f is never called
//! ```
//!
//! A left fold of `chain` nests one continuation per link, so long sequences
//! are built with [`Deferred::try_fold`], which forks each link from a flat
//! driving loop.

use core::fmt;
use std::sync::Arc;

use crate::error::TaskError;
use crate::primitives::flow::{self, Callback};
use crate::types::{Task, TaskInput};

/// One-shot handle through which a computation reports its result.
pub struct Settle<T, E> {
    deliver: Box<dyn FnOnce(Result<T, E>) + Send>,
}

impl<T, E> Settle<T, E> {
    /// Wraps a result handler.
    pub fn new<F>(deliver: F) -> Self
    where
        F: FnOnce(Result<T, E>) + Send + 'static,
    {
        Self {
            deliver: Box::new(deliver),
        }
    }

    /// Reports a result.
    pub fn settle(self, result: Result<T, E>) {
        (self.deliver)(result);
    }

    /// Reports success.
    pub fn resolve(self, value: T) {
        self.settle(Ok(value));
    }

    /// Reports failure.
    pub fn reject(self, error: E) {
        self.settle(Err(error));
    }
}

type Computation<T, E> = dyn Fn(Settle<T, E>) + Send + Sync;

/// A lazy, re-runnable asynchronous value.
pub struct Deferred<T, E> {
    computation: Arc<Computation<T, E>>,
}

impl<T, E> Clone for Deferred<T, E> {
    fn clone(&self) -> Self {
        Self {
            computation: Arc::clone(&self.computation),
        }
    }
}

impl<T, E> fmt::Debug for Deferred<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred").finish_non_exhaustive()
    }
}

impl<T, E> Deferred<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Creates a deferred value from a computation.
    pub fn new<F>(computation: F) -> Self
    where
        F: Fn(Settle<T, E>) + Send + Sync + 'static,
    {
        Self {
            computation: Arc::new(computation),
        }
    }

    /// A deferred value that resolves to `value` on every run.
    pub fn of(value: T) -> Self
    where
        T: Clone + Sync,
    {
        Self::new(move |settle| settle.resolve(value.clone()))
    }

    /// A deferred value that rejects with `error` on every run.
    pub fn rejected(error: E) -> Self
    where
        E: Clone + Sync,
    {
        Self::new(move |settle| settle.reject(error.clone()))
    }

    /// Transforms the resolved value.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Deferred<U, E>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let computation = self.computation;
        let f = Arc::new(f);
        Deferred::new(move |settle: Settle<U, E>| {
            let f = Arc::clone(&f);
            computation(Settle::new(move |result: Result<T, E>| {
                settle.settle(result.map(&*f));
            }));
        })
    }

    /// Sequences a dependent computation after this one.
    ///
    /// `f` runs only if this value resolves.
    #[must_use]
    pub fn chain<U, F>(self, f: F) -> Deferred<U, E>
    where
        U: Send + 'static,
        F: Fn(T) -> Deferred<U, E> + Send + Sync + 'static,
    {
        let computation = self.computation;
        let f = Arc::new(f);
        Deferred::new(move |settle: Settle<U, E>| {
            let f = Arc::clone(&f);
            computation(Settle::new(move |result: Result<T, E>| match result {
                Ok(value) => f(value).run(settle),
                Err(error) => settle.reject(error),
            }));
        })
    }

    /// Folds `items` into one deferred value.
    ///
    /// Each run starts from a clone of `init`. For every item, `step` builds
    /// the next link from the accumulator so far; the link is forked and its
    /// value merged with `combine`. The first rejection ends the run and the
    /// remaining links are never built.
    pub fn try_fold<I, V, S, C>(items: Vec<I>, init: T, step: S, combine: C) -> Self
    where
        T: Clone + Sync,
        I: Clone + Send + Sync + 'static,
        V: Send + 'static,
        S: Fn(&T, &I) -> Deferred<V, E> + Send + Sync + 'static,
        C: Fn(T, V) -> T + Send + Sync + 'static,
    {
        let items: Arc<[I]> = items.into();
        let step = Arc::new(step);
        let combine = Arc::new(combine);
        Self::new(move |settle: Settle<T, E>| {
            let step = Arc::clone(&step);
            let combine = Arc::clone(&combine);
            flow::reduce(
                items.to_vec(),
                init.clone(),
                move |acc: T, item: I, next: Callback<T, E>| {
                    let link = step(&acc, &item);
                    let combine = Arc::clone(&combine);
                    link.fork(move |result: Result<V, E>| {
                        next(result.map(|value| combine(acc, value)));
                    });
                },
                Box::new(move |result: Result<T, E>| settle.settle(result)),
            );
        })
    }

    /// Runs the computation and hands its result to `on_settled`.
    ///
    /// Every call runs the computation again.
    pub fn fork<F>(&self, on_settled: F)
    where
        F: FnOnce(Result<T, E>) + Send + 'static,
    {
        self.run(Settle::new(on_settled));
    }

    fn run(&self, settle: Settle<T, E>) {
        (self.computation)(settle);
    }
}

impl Deferred<u8, TaskError> {
    /// Wraps one task invocation through its callback convention.
    #[must_use]
    pub fn from_task(task: &Task, input: TaskInput) -> Self {
        let task = task.clone();
        Self::new(move |settle| task.call(input, move |result| settle.settle(result)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::counting_task;
    use crate::types::TaskMode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    fn fork_now<T: Send + 'static>(
        deferred: &Deferred<T, &'static str>,
    ) -> Result<T, &'static str> {
        let (tx, rx) = mpsc::channel();
        deferred.fork(move |result| tx.send(result).expect("receiver alive"));
        rx.try_recv().expect("settled synchronously")
    }

    #[test]
    fn nothing_runs_until_fork() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let deferred: Deferred<u8, &'static str> = Deferred::new(move |settle| {
            counter.fetch_add(1, Ordering::SeqCst);
            settle.resolve(1);
        });
        let mapped = deferred.map(|v| v + 1);
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        assert_eq!(fork_now(&mapped), Ok(2));
        assert_eq!(fork_now(&mapped), Ok(2));
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn chain_sequences_values() {
        let deferred = Deferred::<u8, &'static str>::of(10)
            .chain(|a| Deferred::of(a + 20))
            .map(|b| u32::from(b) * 2);
        assert_eq!(fork_now(&deferred), Ok(60));
    }

    #[test]
    fn chain_short_circuits_on_rejection() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let deferred = Deferred::<u8, &'static str>::rejected("E").chain(move |v| {
            seen.fetch_add(1, Ordering::SeqCst);
            Deferred::of(v)
        });
        assert_eq!(fork_now(&deferred), Err("E"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn try_fold_threads_accumulator() {
        let deferred = Deferred::<Vec<u32>, &'static str>::try_fold(
            vec![1u32, 2, 3],
            Vec::new(),
            |acc: &Vec<u32>, item: &u32| Deferred::of(acc.iter().sum::<u32>() + item),
            |mut acc, value| {
                acc.push(value);
                acc
            },
        );
        assert_eq!(fork_now(&deferred), Ok(vec![1, 3, 7]));
        assert_eq!(fork_now(&deferred), Ok(vec![1, 3, 7]));
    }

    #[test]
    fn try_fold_stops_building_after_rejection() {
        let built = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&built);
        let deferred = Deferred::<u32, &'static str>::try_fold(
            vec![1u32, 0, 3],
            0,
            move |_: &u32, item: &u32| {
                seen.fetch_add(1, Ordering::SeqCst);
                if *item == 0 {
                    Deferred::rejected("zero")
                } else {
                    Deferred::of(*item)
                }
            },
            |acc, value| acc + value,
        );
        assert_eq!(fork_now(&deferred), Err("zero"));
        assert_eq!(built.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn try_fold_long_synchronous_sequence() {
        let deferred = Deferred::<u64, &'static str>::try_fold(
            vec![1u8; 150_000],
            0,
            |_: &u64, item: &u8| Deferred::of(*item),
            |acc, value| acc + u64::from(value),
        );
        assert_eq!(fork_now(&deferred), Ok(150_000));
    }

    #[test]
    fn from_task_runs_body_per_fork() {
        let calls = Arc::new(AtomicUsize::new(0));
        let task = counting_task(TaskMode::Immediate, 9, &calls);
        let deferred = Deferred::from_task(&task, TaskInput::default());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let (tx, rx) = mpsc::channel();
        deferred.fork(move |r| tx.send(r).expect("receiver alive"));
        assert_eq!(rx.try_recv().unwrap(), Ok(9));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

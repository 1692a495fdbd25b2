//! Callback-flow helper: ordered control flow over continuation callbacks.
//!
//! Every step receives a [`Callback`] and must call it once when it is done.
//! Steps never overlap: step `n + 1` starts only after step `n` called back.
//!
//! # Semantics
//!
//! ```text
//! reduce(items, memo, iteratee, done):
//!   for item in items:
//!     memo <- iteratee(memo, item)   -- via callback
//!     if memo is Err: return done(Err)
//!   done(Ok(memo))
//! ```
//!
//! # Stack depth
//!
//! A step that calls back before `iteratee` returns is picked up by the
//! driving loop instead of recursing into the next step. A step that calls
//! back later resumes the loop on the caller's stack. Depth stays constant
//! whatever the mix of synchronous and asynchronous steps.

use std::mem;
use std::sync::Arc;

use parking_lot::Mutex;

/// Continuation receiving the result of one step.
pub type Callback<T, E> = Box<dyn FnOnce(Result<T, E>) + Send>;

/// A step that reports its result through a [`Callback`].
pub type Step<T, E> = Box<dyn FnOnce(Callback<T, E>) + Send>;

/// Folds `items` in order, threading `init` through `iteratee`.
///
/// The first error is delivered to `done` and the remaining items are never
/// visited. An empty `items` delivers `Ok(init)` immediately.
pub fn reduce<T, A, E, F>(items: Vec<T>, init: A, iteratee: F, done: Callback<A, E>)
where
    T: Send + 'static,
    A: Send + 'static,
    E: Send + 'static,
    F: Fn(A, T, Callback<A, E>) + Send + Sync + 'static,
{
    Reduction {
        rest: items.into_iter(),
        iteratee: Arc::new(iteratee),
        done,
    }
    .drive(init);
}

/// Where the result of the in-flight step goes.
enum Handoff<A, E, R> {
    /// The step has been started and has not called back.
    Running,
    /// The step called back before the driver checked.
    Ready(Result<A, E>),
    /// The driver returned; the callback resumes it.
    Parked(R),
}

struct Reduction<T, A, E, F> {
    rest: std::vec::IntoIter<T>,
    iteratee: Arc<F>,
    done: Callback<A, E>,
}

impl<T, A, E, F> Reduction<T, A, E, F>
where
    T: Send + 'static,
    A: Send + 'static,
    E: Send + 'static,
    F: Fn(A, T, Callback<A, E>) + Send + Sync + 'static,
{
    fn drive(mut self, mut memo: A) {
        loop {
            let Some(item) = self.rest.next() else {
                (self.done)(Ok(memo));
                return;
            };
            let slot = Arc::new(Mutex::new(Handoff::<A, E, Self>::Running));
            let writer = Arc::clone(&slot);
            (self.iteratee)(
                memo,
                item,
                Box::new(move |result: Result<A, E>| {
                    let mut state = writer.lock();
                    match mem::replace(&mut *state, Handoff::Running) {
                        Handoff::Parked(reduction) => {
                            drop(state);
                            reduction.resume(result);
                        }
                        _ => *state = Handoff::Ready(result),
                    }
                }),
            );

            let mut state = slot.lock();
            match mem::replace(&mut *state, Handoff::Running) {
                Handoff::Ready(Ok(next)) => memo = next,
                Handoff::Ready(Err(e)) => {
                    drop(state);
                    (self.done)(Err(e));
                    return;
                }
                _ => {
                    *state = Handoff::Parked(self);
                    return;
                }
            }
        }
    }

    fn resume(self, result: Result<A, E>) {
        match result {
            Ok(memo) => self.drive(memo),
            Err(e) => (self.done)(Err(e)),
        }
    }
}

/// Runs `steps` one after another and collects their values in order.
pub fn series<T, E>(steps: Vec<Step<T, E>>, done: Callback<Vec<T>, E>)
where
    T: Send + 'static,
    E: Send + 'static,
{
    let capacity = steps.len();
    reduce(
        steps,
        Vec::with_capacity(capacity),
        |mut values: Vec<T>, step: Step<T, E>, next: Callback<Vec<T>, E>| {
            step(Box::new(move |result: Result<T, E>| {
                next(result.map(|value| {
                    values.push(value);
                    values
                }));
            }));
        },
        done,
    );
}

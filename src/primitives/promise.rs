//! Eager promise.
//!
//! A [`Promise`] starts its work at construction: [`Promise::new`] runs the
//! executor before returning. The result is consumed exactly once, either
//! by a continuation ([`Promise::then`], [`Promise::map`],
//! [`Promise::on_settled`]) or by awaiting the promise.
//!
//! # States
//!
//! ```text
//! Pending { reaction, waker } --settle--> Settled(result) --take--> Consumed
//!          \--settle with reaction registered--> reaction(result), Consumed
//! ```
//!
//! A reaction registered on an already-settled promise runs synchronously.
//!
//! # Reaction queue
//!
//! Reactions go through a per-thread queue. The outermost settle or
//! registration on a thread drains it before returning; a reaction scheduled
//! while the queue is draining is appended instead of run in place. A long
//! cascade of already-settled links therefore runs from one loop rather than
//! one nested frame per link.

use core::fmt;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use parking_lot::Mutex;

use crate::error::TaskError;
use crate::types::{Task, TaskInput};

type Reaction<T, E> = Box<dyn FnOnce(Result<T, E>) + Send>;

type Job = Box<dyn FnOnce()>;

thread_local! {
    static REACTIONS: RefCell<Option<VecDeque<Job>>> = const { RefCell::new(None) };
}

/// Runs `job` now, or after the jobs ahead of it if this thread is draining.
fn schedule(job: Job) {
    let first = REACTIONS.with(|cell| {
        let mut queue = cell.borrow_mut();
        if let Some(queue) = queue.as_mut() {
            queue.push_back(job);
            None
        } else {
            *queue = Some(VecDeque::new());
            Some(job)
        }
    });
    let Some(first) = first else {
        return;
    };

    let _drain = DrainGuard;
    first();
    while let Some(job) = REACTIONS.with(|cell| cell.borrow_mut().as_mut()?.pop_front()) {
        job();
    }
}

/// Ends the drain, also when a reaction panics.
struct DrainGuard;

impl Drop for DrainGuard {
    fn drop(&mut self) {
        let _ = REACTIONS.try_with(|cell| cell.borrow_mut().take());
    }
}

enum State<T, E> {
    Pending {
        reaction: Option<Reaction<T, E>>,
        waker: Option<Waker>,
    },
    Settled(Result<T, E>),
    Consumed,
}

type Shared<T, E> = Arc<Mutex<State<T, E>>>;

/// Settles the paired [`Promise`].
///
/// Settling consumes the resolver. A resolver dropped without settling
/// leaves its promise pending forever.
pub struct Resolver<T, E> {
    shared: Shared<T, E>,
}

impl<T, E> Resolver<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Settles the promise with `result`.
    pub fn settle(self, result: Result<T, E>) {
        let mut state = self.shared.lock();
        match mem::replace(&mut *state, State::Consumed) {
            State::Pending {
                reaction: Some(reaction),
                ..
            } => {
                drop(state);
                schedule(Box::new(move || reaction(result)));
            }
            State::Pending {
                reaction: None,
                waker,
            } => {
                *state = State::Settled(result);
                drop(state);
                if let Some(waker) = waker {
                    waker.wake();
                }
            }
            // Unreachable for a single resolver; keep whatever is there.
            other => *state = other,
        }
    }

    /// Fulfils the promise.
    pub fn resolve(self, value: T) {
        self.settle(Ok(value));
    }

    /// Rejects the promise.
    pub fn reject(self, error: E) {
        self.settle(Err(error));
    }
}

/// An eager, single-consumer asynchronous value.
pub struct Promise<T, E> {
    shared: Shared<T, E>,
}

impl<T, E> fmt::Debug for Promise<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.shared.lock() {
            State::Pending { .. } => "pending",
            State::Settled(Ok(_)) => "fulfilled",
            State::Settled(Err(_)) => "rejected",
            State::Consumed => "consumed",
        };
        f.debug_struct("Promise").field("state", &state).finish()
    }
}

impl<T, E> Promise<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Creates a promise and runs `executor` immediately.
    pub fn new<F>(executor: F) -> Self
    where
        F: FnOnce(Resolver<T, E>),
    {
        let shared = Arc::new(Mutex::new(State::Pending {
            reaction: None,
            waker: None,
        }));
        executor(Resolver {
            shared: Arc::clone(&shared),
        });
        Self { shared }
    }

    /// A promise already fulfilled with `value`.
    pub fn resolved(value: T) -> Self {
        Self::new(|resolver| resolver.resolve(value))
    }

    /// A promise already rejected with `error`.
    pub fn rejected(error: E) -> Self {
        Self::new(|resolver| resolver.reject(error))
    }

    /// Returns true once the promise has a result that nobody has taken yet.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(&*self.shared.lock(), State::Settled(_))
    }

    /// Registers the terminal handler for this promise's result.
    ///
    /// Runs `reaction` now if the promise has already settled.
    pub fn on_settled<F>(self, reaction: F)
    where
        F: FnOnce(Result<T, E>) + Send + 'static,
    {
        let mut state = self.shared.lock();
        match mem::replace(&mut *state, State::Consumed) {
            State::Settled(result) => {
                drop(state);
                schedule(Box::new(move || reaction(result)));
            }
            State::Pending { waker, .. } => {
                *state = State::Pending {
                    reaction: Some(Box::new(reaction)),
                    waker,
                };
            }
            State::Consumed => {}
        }
    }

    /// Chains a dependent promise.
    ///
    /// `f` runs only if this promise fulfils; a rejection passes through.
    #[must_use]
    pub fn then<U, F>(self, f: F) -> Promise<U, E>
    where
        U: Send + 'static,
        F: FnOnce(T) -> Promise<U, E> + Send + 'static,
    {
        Promise::new(move |resolver: Resolver<U, E>| {
            self.on_settled(move |result| match result {
                Ok(value) => f(value).on_settled(move |next| resolver.settle(next)),
                Err(error) => resolver.reject(error),
            });
        })
    }

    /// Transforms the fulfilled value.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Promise<U, E>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        Promise::new(move |resolver: Resolver<U, E>| {
            self.on_settled(move |result| resolver.settle(result.map(f)));
        })
    }
}

impl Promise<u8, TaskError> {
    /// Starts one task invocation through its callback convention.
    #[must_use]
    pub fn from_task(task: &Task, input: TaskInput) -> Self {
        Self::new(|resolver| task.call(input, move |result| resolver.settle(result)))
    }
}

impl<T, E> Future for Promise<T, E> {
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.shared.lock();
        match mem::replace(&mut *state, State::Consumed) {
            State::Settled(result) => Poll::Ready(result),
            State::Pending { reaction, .. } => {
                *state = State::Pending {
                    reaction,
                    waker: Some(cx.waker().clone()),
                };
                Poll::Pending
            }
            State::Consumed => panic!("promise polled after completion"),
        }
    }
}

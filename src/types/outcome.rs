//! Terminal outcome of a reduction and the handle that delivers it.
//!
//! A reduction ends in exactly one [`Outcome`]: the full ordered
//! [`Accumulator`] or the first [`TaskError`]. Runners deliver it through a
//! [`Completion`], which is consumed by the call, so a second delivery does
//! not type-check.
//!
//! [`Completion::channel`] pairs a completion with a [`CompletionReceiver`]
//! future. A completion dropped without being called resolves the receiver
//! to [`Error::CompletionDropped`] instead of hanging.

use core::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::{Error, TaskError};

/// Ordered values produced by the tasks completed so far.
pub type Accumulator = Vec<u8>;

/// Terminal outcome of a reduction.
pub type Outcome = Result<Accumulator, TaskError>;

/// Exactly-once delivery of an [`Outcome`].
pub struct Completion {
    deliver: Box<dyn FnOnce(Outcome) + Send>,
}

impl Completion {
    /// Wraps a callback as a completion.
    pub fn new<F>(deliver: F) -> Self
    where
        F: FnOnce(Outcome) + Send + 'static,
    {
        Self {
            deliver: Box::new(deliver),
        }
    }

    /// Creates a completion whose outcome is observed through the returned future.
    #[must_use]
    pub fn channel(runner: &'static str) -> (Self, CompletionReceiver) {
        let (tx, rx) = oneshot::channel();
        let completion = Self::new(move |outcome| {
            // The receiver may be gone if the caller stopped waiting.
            let _ = tx.send(outcome);
        });
        (completion, CompletionReceiver { runner, rx })
    }

    /// Delivers the outcome.
    pub fn complete(self, outcome: Outcome) {
        (self.deliver)(outcome);
    }

    /// Delivers a successful outcome.
    pub fn succeed(self, values: Accumulator) {
        self.complete(Ok(values));
    }

    /// Delivers a failed outcome.
    pub fn fail(self, error: TaskError) {
        self.complete(Err(error));
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion").finish_non_exhaustive()
    }
}

/// Future side of [`Completion::channel`].
#[derive(Debug)]
pub struct CompletionReceiver {
    runner: &'static str,
    rx: oneshot::Receiver<Outcome>,
}

impl Future for CompletionReceiver {
    type Output = crate::Result<Accumulator>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let runner = self.runner;
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome.map_err(Error::from)),
            Poll::Ready(Err(_)) => Poll::Ready(Err(Error::CompletionDropped { runner })),
            Poll::Pending => Poll::Pending,
        }
    }
}

//! Tasks and their calling conventions.
//!
//! A [`Task`] is an immutable unit of work that takes a [`TaskInput`] and
//! produces either a byte or a [`TaskError`]. The same task can be driven
//! through each convention a runner needs:
//!
//! - [`Task::call`]: continuation passing, the result is handed to a callback
//! - [`Task::future`]: a lazy boxed future, nothing runs until it is polled
//! - [`Task::invoke`]: a direct synchronous call of the body
//!
//! # Modes
//!
//! - [`TaskMode::Immediate`] completes inside the call that started it.
//! - [`TaskMode::Deferred`] completes on a later tick of the Tokio scheduler.
//!
//! Deferred tasks need an ambient Tokio runtime.

use std::fmt;
use std::sync::Arc;

use futures_lite::future::Boxed;
use futures_lite::FutureExt;

use crate::error::TaskError;

/// Result produced by a single task.
pub type TaskResult = Result<u8, TaskError>;

type Body = dyn Fn(TaskInput) -> TaskResult + Send + Sync;

/// When a task delivers its result relative to the call that started it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskMode {
    /// Result is delivered before the starting call returns.
    Immediate,
    /// Result is delivered on a later scheduler tick.
    Deferred,
}

impl TaskMode {
    /// Returns true for [`TaskMode::Deferred`].
    #[must_use]
    pub const fn is_deferred(self) -> bool {
        matches!(self, Self::Deferred)
    }
}

/// The implicit input context handed to each task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskInput {
    /// Zero-based position of the task in its list.
    pub index: usize,
    /// Value produced by the preceding task, if any.
    pub previous: Option<u8>,
}

impl TaskInput {
    /// Input for the task that follows the given accumulated values.
    #[must_use]
    pub fn after(values: &[u8]) -> Self {
        Self {
            index: values.len(),
            previous: values.last().copied(),
        }
    }
}

/// An asynchronous unary task producing a byte.
#[derive(Clone)]
pub struct Task {
    mode: TaskMode,
    body: Arc<Body>,
}

impl Task {
    /// Creates a task from a mode and a body.
    pub fn new<F>(mode: TaskMode, body: F) -> Self
    where
        F: Fn(TaskInput) -> TaskResult + Send + Sync + 'static,
    {
        Self {
            mode,
            body: Arc::new(body),
        }
    }

    /// Creates a task that completes inside the starting call.
    pub fn immediate<F>(body: F) -> Self
    where
        F: Fn(TaskInput) -> TaskResult + Send + Sync + 'static,
    {
        Self::new(TaskMode::Immediate, body)
    }

    /// Creates a task that completes on a later scheduler tick.
    pub fn deferred<F>(body: F) -> Self
    where
        F: Fn(TaskInput) -> TaskResult + Send + Sync + 'static,
    {
        Self::new(TaskMode::Deferred, body)
    }

    /// Creates a task that always produces `value`.
    #[must_use]
    pub fn value(mode: TaskMode, value: u8) -> Self {
        Self::new(mode, move |_| Ok(value))
    }

    /// Creates a task that always fails with `error`.
    #[must_use]
    pub fn failing(mode: TaskMode, error: TaskError) -> Self {
        Self::new(mode, move |_| Err(error.clone()))
    }

    /// Returns the task's mode.
    #[must_use]
    pub const fn mode(&self) -> TaskMode {
        self.mode
    }

    /// Runs the body synchronously, ignoring the mode.
    pub fn invoke(&self, input: TaskInput) -> TaskResult {
        (self.body)(input)
    }

    /// Starts the task and hands its result to `done`.
    ///
    /// The body runs before this returns. For deferred tasks, `done` runs
    /// from a task spawned on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if the task is deferred and no Tokio runtime is running.
    pub fn call<F>(&self, input: TaskInput, done: F)
    where
        F: FnOnce(TaskResult) + Send + 'static,
    {
        let result = self.invoke(input);
        match self.mode {
            TaskMode::Immediate => done(result),
            TaskMode::Deferred => {
                tokio::spawn(async move { done(result) });
            }
        }
    }

    /// Returns a lazy future for the task.
    ///
    /// The body runs on first poll. Deferred tasks yield to the scheduler
    /// once before running.
    #[must_use]
    pub fn future(&self, input: TaskInput) -> Boxed<TaskResult> {
        let body = Arc::clone(&self.body);
        match self.mode {
            TaskMode::Immediate => async move { body(input) }.boxed(),
            TaskMode::Deferred => async move {
                tokio::task::yield_now().await;
                body(input)
            }
            .boxed(),
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("mode", &self.mode).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{counting_task, run_test};
    use futures_lite::future;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    #[test]
    fn input_after_tracks_position_and_previous() {
        assert_eq!(
            TaskInput::after(&[]),
            TaskInput {
                index: 0,
                previous: None
            }
        );
        assert_eq!(
            TaskInput::after(&[4, 9]),
            TaskInput {
                index: 2,
                previous: Some(9)
            }
        );
    }

    #[test]
    fn immediate_call_completes_before_returning() {
        let task = Task::value(TaskMode::Immediate, 7);
        let (tx, rx) = mpsc::channel();
        task.call(TaskInput::default(), move |r| tx.send(r).unwrap());
        assert_eq!(rx.try_recv().unwrap(), Ok(7));
    }

    #[test]
    fn deferred_call_completes_on_later_tick() {
        run_test(|| async {
            let task = Task::value(TaskMode::Deferred, 3);
            let (tx, rx) = tokio::sync::oneshot::channel();
            task.call(TaskInput::default(), move |r| {
                let _ = tx.send(r);
            });
            assert_eq!(rx.await.unwrap(), Ok(3));
        });
    }

    #[test]
    fn future_is_lazy_until_polled() {
        let calls = Arc::new(AtomicUsize::new(0));
        let task = counting_task(TaskMode::Immediate, 5, &calls);
        let fut = task.future(TaskInput::default());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(future::block_on(fut), Ok(5));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn deferred_future_yields_then_runs() {
        run_test(|| async {
            let task = Task::failing(TaskMode::Deferred, TaskError::new("E"));
            assert_eq!(
                task.future(TaskInput::default()).await,
                Err(TaskError::new("E"))
            );
        });
    }

    #[test]
    fn body_sees_input() {
        let task = Task::immediate(|input| Ok(input.previous.unwrap_or(0) + 1));
        assert_eq!(
            task.invoke(TaskInput {
                index: 1,
                previous: Some(41)
            }),
            Ok(42)
        );
    }
}

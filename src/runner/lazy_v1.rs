//! Reduction through fork-driven lazy values.
//!
//! The whole sequence is assembled as one [`Deferred`] before anything
//! runs; `fork` then starts the first task.

use super::Runner;
use crate::error::TaskError;
use crate::primitives::lazy::Deferred;
use crate::types::{Accumulator, Completion, Task, TaskInput};

/// Reduces with [`Deferred::try_fold`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LazyV1Runner;

impl Runner for LazyV1Runner {
    fn name(&self) -> &'static str {
        "lazy-v1"
    }

    fn run(&self, tasks: &[Task], done: Completion) {
        let sequence: Deferred<Accumulator, TaskError> = Deferred::try_fold(
            tasks.to_vec(),
            Vec::new(),
            |values: &Accumulator, task: &Task| {
                Deferred::from_task(task, TaskInput::after(values))
            },
            |mut values, value| {
                values.push(value);
                values
            },
        );
        sequence.fork(move |outcome| done.complete(outcome));
    }
}

//! Reduction through future-backed lazy values.
//!
//! The sequence is one [`Lazy`] whose run awaits each task's future in turn
//! from a single loop, so poll depth does not grow with the task count.

use super::Runner;
use crate::error::TaskError;
use crate::primitives::lazy::Lazy;
use crate::types::{Accumulator, Completion, Task, TaskInput};

/// Reduces with [`Lazy::try_fold`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LazyV2Runner;

impl Runner for LazyV2Runner {
    fn name(&self) -> &'static str {
        "lazy-v2"
    }

    fn run(&self, tasks: &[Task], done: Completion) {
        let sequence: Lazy<Accumulator, TaskError> = Lazy::try_fold(
            tasks.to_vec(),
            Vec::new(),
            |values: &Accumulator, task: &Task| Lazy::from_task(task, TaskInput::after(values)),
            |mut values, value| {
                values.push(value);
                values
            },
        );
        sequence.fork(move |outcome| done.complete(outcome));
    }
}

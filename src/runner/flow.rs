//! Reduction through the callback-flow helper.

use super::Runner;
use crate::error::TaskError;
use crate::primitives::flow::{self, Callback};
use crate::types::{Accumulator, Completion, Outcome, Task, TaskInput, TaskResult};

/// Reduces with [`flow::reduce`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FlowRunner;

impl Runner for FlowRunner {
    fn name(&self) -> &'static str {
        "flow"
    }

    fn run(&self, tasks: &[Task], done: Completion) {
        flow::reduce(
            tasks.to_vec(),
            Vec::with_capacity(tasks.len()),
            |mut values: Accumulator, task: Task, next: Callback<Accumulator, TaskError>| {
                task.call(TaskInput::after(&values), move |result: TaskResult| {
                    next(result.map(|value| {
                        values.push(value);
                        values
                    }));
                });
            },
            Box::new(move |outcome: Outcome| done.complete(outcome)),
        );
    }
}

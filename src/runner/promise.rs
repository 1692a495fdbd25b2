//! Reduction through eager promises.
//!
//! Building the chain links every step up front. Each link's handler starts
//! its task only once the previous link fulfils. Links that settle while
//! another link's reaction is running are picked up by the promise reaction
//! queue, so runs of immediate tasks do not nest.

use super::Runner;
use crate::primitives::promise::Promise;
use crate::types::{Accumulator, Completion, Task, TaskInput};

/// Reduces with [`Promise::then`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PromiseRunner;

impl Runner for PromiseRunner {
    fn name(&self) -> &'static str {
        "promise"
    }

    fn run(&self, tasks: &[Task], done: Completion) {
        let mut chain = Promise::resolved(Vec::with_capacity(tasks.len()));
        for task in tasks.iter().cloned() {
            chain = chain.then(move |mut values: Accumulator| {
                Promise::from_task(&task, TaskInput::after(&values)).map(move |value| {
                    values.push(value);
                    values
                })
            });
        }
        chain.on_settled(move |outcome| done.complete(outcome));
    }
}

//! Hand-written continuation chaining.
//!
//! Each task's callback hands its value back to the chain, which starts the
//! next task. An immediate task calls back before `call` returns; the chain
//! notices and keeps looping instead of nesting a frame per task. A deferred
//! task finds the chain parked and resumes it from the scheduler.

use std::mem;
use std::sync::Arc;

use parking_lot::Mutex;

use super::Runner;
use crate::types::{Accumulator, Completion, Task, TaskInput, TaskResult};

/// Reduces by chaining raw callbacks.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallbackRunner;

impl Runner for CallbackRunner {
    fn name(&self) -> &'static str {
        "callbacks"
    }

    fn run(&self, tasks: &[Task], done: Completion) {
        Chain {
            tasks: Arc::from(tasks),
            values: Vec::with_capacity(tasks.len()),
            done,
        }
        .drive();
    }
}

enum Handoff {
    Running,
    Ready(TaskResult),
    Parked(Chain),
}

struct Chain {
    tasks: Arc<[Task]>,
    values: Accumulator,
    done: Completion,
}

impl Chain {
    fn drive(mut self) {
        loop {
            let Some(task) = self.tasks.get(self.values.len()).cloned() else {
                self.done.succeed(self.values);
                return;
            };
            let slot = Arc::new(Mutex::new(Handoff::Running));
            let writer = Arc::clone(&slot);
            task.call(TaskInput::after(&self.values), move |result| {
                let mut state = writer.lock();
                if let Handoff::Parked(chain) = mem::replace(&mut *state, Handoff::Running) {
                    drop(state);
                    chain.resume(result);
                } else {
                    *state = Handoff::Ready(result);
                }
            });

            let mut state = slot.lock();
            match mem::replace(&mut *state, Handoff::Running) {
                Handoff::Ready(Ok(value)) => self.values.push(value),
                Handoff::Ready(Err(error)) => {
                    drop(state);
                    self.done.fail(error);
                    return;
                }
                _ => {
                    *state = Handoff::Parked(self);
                    return;
                }
            }
        }
    }

    fn resume(mut self, result: TaskResult) {
        match result {
            Ok(value) => {
                self.values.push(value);
                self.drive();
            }
            Err(error) => self.done.fail(error),
        }
    }
}

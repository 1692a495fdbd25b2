//! Core types for the sequential reducer.
//!
//! - [`task`]: Tasks, their input context, and their calling conventions
//! - [`outcome`]: The accumulator, the terminal outcome, and the exactly-once completion

pub mod outcome;
pub mod task;

pub use outcome::{Accumulator, Completion, CompletionReceiver, Outcome};
pub use task::{Task, TaskInput, TaskMode, TaskResult};

//! Seqreduce: a harness for measuring asynchronous sequencing primitives.
//!
//! # Overview
//!
//! Seqreduce feeds one ordered list of dependent tasks to several
//! interchangeable runners. Each runner reduces the list with a different
//! suspension mechanism and reports the ordered results. A thin measurement
//! wrapper times every runner and validates its output against a
//! precomputed sum.
//!
//! # Core Guarantees
//!
//! - **Strict ordering**: Task `n + 1` never starts before task `n` completes
//! - **Short-circuit**: The first failing task ends the reduction; later tasks never run
//! - **Exactly-once completion**: Every runner delivers one outcome, error XOR results
//! - **Deterministic input**: Task lists are generated from a seeded PRNG
//!
//! # Module Structure
//!
//! - [`types`]: Tasks, inputs, outcomes, and the completion handle
//! - [`primitives`]: Sequencing primitives (callback flow, lazy values, promises)
//! - [`runner`]: The [`Runner`] trait and its five adapters
//! - [`harness`]: Measurement wrapper, benchmark suite, and report
//! - [`generator`]: Synthetic task generation
//! - [`config`]: Harness configuration (defaults, environment, TOML)
//! - [`error`]: Error types
//! - [`util`]: Internal utilities (deterministic RNG)

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

pub mod config;
pub mod error;
pub mod generator;
pub mod harness;
pub mod primitives;
pub mod runner;
pub mod types;
pub mod util;

#[cfg(test)]
mod test_utils;

pub use config::{ConfigError, HarnessConfig};
pub use error::{Error, ErrorKind, Result, TaskError, ValidationError};
pub use generator::{GeneratedTasks, TaskGenerator};
pub use harness::{measure, EntryFailure, Measurement, Report, ReportEntry, Suite, Timing};
pub use runner::{default_runners, Runner, RunnerKind};
pub use types::{
    Accumulator, Completion, CompletionReceiver, Outcome, Task, TaskInput, TaskMode, TaskResult,
};
pub use util::DetRng;

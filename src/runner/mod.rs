//! Sequential reducer adapters.
//!
//! Every [`Runner`] implements the same contract with a different
//! sequencing primitive:
//!
//! ```text
//! run([t1..tn], done):
//!   acc <- []
//!   for t in [t1..tn]:
//!     r <- await t(after(acc))
//!     if r is Err: return done(Err(r))   -- later tasks never start
//!     acc.push(r)
//!   done(Ok(acc))
//! ```
//!
//! # Invariants
//!
//! - **Sequential ordering**: task `n + 1` starts only after task `n` completes
//! - **Error short-circuit**: the first error is delivered as-is
//! - **No partial results**: a failure never exposes the accumulator
//! - **Exactly once**: `done` receives one outcome
//!
//! Runners that deliver through deferred tasks or spawned futures need an
//! ambient Tokio runtime.

mod callbacks;
mod flow;
mod lazy_v1;
mod lazy_v2;
mod promise;

use core::fmt;
use std::str::FromStr;

use crate::types::{Completion, CompletionReceiver, Task};

pub use callbacks::CallbackRunner;
pub use flow::FlowRunner;
pub use lazy_v1::LazyV1Runner;
pub use lazy_v2::LazyV2Runner;
pub use promise::PromiseRunner;

/// A strategy for reducing a task list sequentially.
pub trait Runner: Send + Sync {
    /// Stable name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Runs `tasks` in order and delivers the outcome to `done`.
    fn run(&self, tasks: &[Task], done: Completion);

    /// Runs `tasks` and returns a future for the outcome.
    ///
    /// A runner that drops `done` without calling it resolves to
    /// [`Error::CompletionDropped`](crate::Error::CompletionDropped).
    fn reduce(&self, tasks: &[Task]) -> CompletionReceiver {
        let (done, receiver) = Completion::channel(self.name());
        self.run(tasks, done);
        receiver
    }
}

/// The built-in runners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunnerKind {
    /// Hand-written continuation chaining.
    Callbacks,
    /// The callback-flow helper.
    Flow,
    /// Fork-driven lazy values.
    LazyV1,
    /// Future-backed lazy values.
    LazyV2,
    /// Eager promises.
    Promise,
}

impl RunnerKind {
    /// All built-in runners in report order.
    pub const ALL: [Self; 5] = [
        Self::Callbacks,
        Self::Flow,
        Self::LazyV1,
        Self::LazyV2,
        Self::Promise,
    ];

    /// Returns the runner's name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Callbacks => "callbacks",
            Self::Flow => "flow",
            Self::LazyV1 => "lazy-v1",
            Self::LazyV2 => "lazy-v2",
            Self::Promise => "promise",
        }
    }

    /// Instantiates the runner.
    #[must_use]
    pub fn build(self) -> Box<dyn Runner> {
        match self {
            Self::Callbacks => Box::new(CallbackRunner),
            Self::Flow => Box::new(FlowRunner),
            Self::LazyV1 => Box::new(LazyV1Runner),
            Self::LazyV2 => Box::new(LazyV2Runner),
            Self::Promise => Box::new(PromiseRunner),
        }
    }
}

impl fmt::Display for RunnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown runner name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown runner {0:?}")]
pub struct UnknownRunner(pub String);

impl FromStr for RunnerKind {
    type Err = UnknownRunner;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownRunner(name.to_string()))
    }
}

/// Instantiates every built-in runner.
#[must_use]
pub fn default_runners() -> Vec<Box<dyn Runner>> {
    RunnerKind::ALL.into_iter().map(RunnerKind::build).collect()
}

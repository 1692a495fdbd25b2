//! Synthetic task generation.
//!
//! A [`TaskGenerator`] turns a seed into a task list whose values and modes
//! are fully reproducible. Each generated task ignores its input and yields
//! a pre-drawn random byte, so the expected sum is known before any runner
//! starts.

use crate::config::{HarnessConfig, DEFAULT_DEFERRED_PERCENT};
use crate::types::{Task, TaskMode};
use crate::util::DetRng;

/// A generated task list with its precomputed checks.
#[derive(Debug, Clone)]
pub struct GeneratedTasks {
    /// The tasks, in execution order.
    pub tasks: Vec<Task>,
    /// The value each task produces, index-aligned with `tasks`.
    pub values: Vec<u8>,
    /// Sum of `values`.
    pub expected_sum: u64,
}

/// Seeded generator of byte-producing tasks.
#[derive(Debug, Clone)]
pub struct TaskGenerator {
    rng: DetRng,
    deferred_percent: u8,
}

impl TaskGenerator {
    /// Creates a generator with the default deferred share.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            rng: DetRng::new(seed),
            deferred_percent: DEFAULT_DEFERRED_PERCENT,
        }
    }

    /// Creates a generator from a harness configuration.
    #[must_use]
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(config.seed).with_deferred_percent(config.deferred_percent)
    }

    /// Sets the share of generated tasks that complete on a later tick.
    ///
    /// Values above 100 are clamped.
    #[must_use]
    pub fn with_deferred_percent(mut self, percent: u8) -> Self {
        self.deferred_percent = percent.min(100);
        self
    }

    /// Draws a random byte value.
    pub fn random_byte(&mut self) -> u8 {
        self.rng.next_u8()
    }

    /// Draws a task mode according to the deferred share.
    pub fn next_mode(&mut self) -> TaskMode {
        if self.rng.chance(self.deferred_percent) {
            TaskMode::Deferred
        } else {
            TaskMode::Immediate
        }
    }

    /// Draws one task and the value it will produce.
    pub fn next_task(&mut self) -> (Task, u8) {
        let value = self.random_byte();
        let mode = self.next_mode();
        (Task::value(mode, value), value)
    }

    /// Generates `count` tasks.
    pub fn generate(&mut self, count: usize) -> GeneratedTasks {
        let (tasks, values): (Vec<_>, Vec<_>) = (0..count).map(|_| self.next_task()).unzip();
        let expected_sum = expected_sum(&values);
        tracing::debug!(
            count,
            expected_sum,
            deferred = tasks.iter().filter(|t| t.mode().is_deferred()).count(),
            "generated task list"
        );
        GeneratedTasks {
            tasks,
            values,
            expected_sum,
        }
    }
}

/// Sum of a value list, widened so it cannot overflow.
#[must_use]
pub fn expected_sum(values: &[u8]) -> u64 {
    values.iter().map(|&v| u64::from(v)).sum()
}

//! Measurement wrapper and benchmark suite.
//!
//! [`measure`] runs one runner over one task list, times it, and checks the
//! summed output against a precomputed expectation. A mismatch is a
//! [`ValidationError`], kept apart from task failures.
//!
//! A [`Suite`] generates one task list from its [`HarnessConfig`] and measures
//! every registered runner against it:
//!
//! ```text
//! for runner in runners:
//!   warmup_iterations x measure (untimed, errors end the entry)
//!   iterations        x measure (timed)
//!   entry <- Timing(samples) | first error
//! ```
//!
//! A failing entry never stops the other runners.

mod report;

use std::time::{Duration, Instant};

use crate::config::HarnessConfig;
use crate::error::{Error, Result, ValidationError};
use crate::generator::{self, GeneratedTasks, TaskGenerator};
use crate::runner::Runner;
use crate::types::Task;

pub use report::{EntryFailure, Report, ReportEntry, Timing};

/// One validated run of one runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measurement {
    /// Runner name.
    pub runner: &'static str,
    /// Number of tasks reduced.
    pub tasks: usize,
    /// Sum of the produced values.
    pub sum: u64,
    /// Wall time from start to completion.
    pub elapsed: Duration,
}

/// Runs `runner` over `tasks` and validates the summed output.
///
/// Task failures surface as [`Error::Task`]; a successful run whose sum
/// differs from `expected_sum` surfaces as [`Error::Validation`].
#[tracing::instrument(skip_all, fields(runner = runner.name(), tasks = tasks.len()))]
pub async fn measure(
    runner: &dyn Runner,
    tasks: &[Task],
    expected_sum: u64,
) -> Result<Measurement> {
    let started = Instant::now();
    let values = runner.reduce(tasks).await?;
    let elapsed = started.elapsed();

    let sum = generator::expected_sum(&values);
    if sum != expected_sum {
        tracing::warn!(sum, expected_sum, "runner output failed validation");
        return Err(ValidationError {
            runner: runner.name(),
            expected: expected_sum,
            actual: sum,
        }
        .into());
    }
    tracing::trace!(sum, ?elapsed, "runner output validated");
    Ok(Measurement {
        runner: runner.name(),
        tasks: tasks.len(),
        sum,
        elapsed,
    })
}

/// A set of runners benchmarked against one generated task list.
pub struct Suite {
    config: HarnessConfig,
    runners: Vec<Box<dyn Runner>>,
}

impl std::fmt::Debug for Suite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Suite")
            .field("config", &self.config)
            .field("runners", &self.runner_names())
            .finish()
    }
}

impl Suite {
    /// Creates a suite with no runners.
    #[must_use]
    pub const fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            runners: Vec::new(),
        }
    }

    /// Creates a suite with the runners named in `config.runners`.
    #[must_use]
    pub fn with_default_runners(config: HarnessConfig) -> Self {
        let runners = config.runners.iter().map(|kind| kind.build()).collect();
        Self { config, runners }
    }

    /// Adds a runner after the existing ones.
    pub fn register<R: Runner + 'static>(&mut self, runner: R) -> &mut Self {
        self.runners.push(Box::new(runner));
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Returns the registered runner names in order.
    #[must_use]
    pub fn runner_names(&self) -> Vec<&'static str> {
        self.runners.iter().map(|r| r.name()).collect()
    }

    /// Generates the task list and measures every runner.
    ///
    /// Only an invalid configuration fails the whole run; runner failures
    /// are recorded in their report entry.
    ///
    /// Deferred tasks need this future to be driven by a Tokio runtime.
    #[tracing::instrument(
        skip_all,
        fields(seed = self.config.seed, tasks = self.config.task_count)
    )]
    pub async fn run(&self) -> Result<Report> {
        self.config.validate()?;
        let generated = TaskGenerator::from_config(&self.config).generate(self.config.task_count);
        tracing::info!(
            runners = self.runners.len(),
            expected_sum = generated.expected_sum,
            "starting suite"
        );

        let mut entries = Vec::with_capacity(self.runners.len());
        for runner in &self.runners {
            entries.push(self.run_entry(runner.as_ref(), &generated).await);
        }
        let report = Report {
            seed: self.config.seed,
            expected_sum: generated.expected_sum,
            entries,
        };
        tracing::info!(failures = report.failures().len(), "suite finished");
        Ok(report)
    }

    /// Runs the suite on a fresh current-thread Tokio runtime.
    pub fn run_blocking(&self) -> Result<Report> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .map_err(Error::Runtime)?;
        runtime.block_on(self.run())
    }

    async fn run_entry(&self, runner: &dyn Runner, generated: &GeneratedTasks) -> ReportEntry {
        let mut entry = ReportEntry {
            name: runner.name(),
            tasks: generated.tasks.len(),
            iterations: 0,
            timing: None,
            failure: None,
        };

        for _ in 0..self.config.warmup_iterations {
            if let Err(error) = measure(runner, &generated.tasks, generated.expected_sum).await {
                tracing::warn!(runner = runner.name(), %error, "warmup failed");
                entry.failure = Some((&error).into());
                return entry;
            }
        }

        let mut samples = Vec::with_capacity(self.config.iterations as usize);
        for _ in 0..self.config.iterations {
            match measure(runner, &generated.tasks, generated.expected_sum).await {
                Ok(measurement) => samples.push(measurement.elapsed),
                Err(error) => {
                    tracing::warn!(runner = runner.name(), %error, "iteration failed");
                    entry.failure = Some((&error).into());
                    break;
                }
            }
        }
        entry.iterations = u32::try_from(samples.len()).unwrap_or(u32::MAX);
        if entry.failure.is_none() {
            entry.timing = Timing::from_samples(&samples);
        }
        tracing::debug!(runner = runner.name(), iterations = entry.iterations, "entry finished");
        entry
    }
}

//! Benchmark report: one named entry per runner.

use std::fmt::{self, Write as _};
use std::time::Duration;

use serde::Serialize;
use serde_json::json;

use crate::error::Error;

/// Timing statistics over the timed iterations of one runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Timing {
    /// Mean wall time per iteration, in nanoseconds.
    pub mean_ns: u64,
    /// Fastest iteration, in nanoseconds.
    pub min_ns: u64,
    /// Slowest iteration, in nanoseconds.
    pub max_ns: u64,
}

impl Timing {
    /// Summarizes `samples`; `None` when there are none.
    #[must_use]
    pub fn from_samples(samples: &[Duration]) -> Option<Self> {
        let min = samples.iter().min()?;
        let max = samples.iter().max()?;
        let total: u128 = samples.iter().map(Duration::as_nanos).sum();
        let mean = total / samples.len() as u128;
        Some(Self {
            mean_ns: saturating_u64(mean),
            min_ns: saturating_u64(min.as_nanos()),
            max_ns: saturating_u64(max.as_nanos()),
        })
    }

    /// Mean iteration time.
    #[must_use]
    pub const fn mean(&self) -> Duration {
        Duration::from_nanos(self.mean_ns)
    }

    /// Fastest iteration time.
    #[must_use]
    pub const fn min(&self) -> Duration {
        Duration::from_nanos(self.min_ns)
    }

    /// Slowest iteration time.
    #[must_use]
    pub const fn max(&self) -> Duration {
        Duration::from_nanos(self.max_ns)
    }
}

fn saturating_u64(nanos: u128) -> u64 {
    u64::try_from(nanos).unwrap_or(u64::MAX)
}

/// Why an entry stopped before finishing its iterations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryFailure {
    /// Stable error kind name.
    pub kind: &'static str,
    /// Rendered error.
    pub message: String,
}

impl From<&Error> for EntryFailure {
    fn from(error: &Error) -> Self {
        Self {
            kind: error.kind().as_str(),
            message: error.to_string(),
        }
    }
}

/// Result of benchmarking one runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    /// Runner name.
    pub name: &'static str,
    /// Number of tasks per iteration.
    pub tasks: usize,
    /// Timed iterations that completed and validated.
    pub iterations: u32,
    /// Timing over the completed iterations; absent on failure.
    pub timing: Option<Timing>,
    /// The first error, if any iteration failed.
    pub failure: Option<EntryFailure>,
}

impl ReportEntry {
    /// Returns true if every iteration completed and validated.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Ordered benchmark results for a suite run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Seed the task list was generated from.
    pub seed: u64,
    /// Sum every runner was validated against.
    pub expected_sum: u64,
    /// One entry per runner, in registration order.
    pub entries: Vec<ReportEntry>,
}

impl Report {
    /// Returns the entry for `name`.
    #[must_use]
    pub fn entry(&self, name: &str) -> Option<&ReportEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Returns true if no entry failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.entries.iter().all(ReportEntry::is_success)
    }

    /// Returns the entries that failed.
    #[must_use]
    pub fn failures(&self) -> Vec<&ReportEntry> {
        self.entries.iter().filter(|e| !e.is_success()).collect()
    }

    /// Renders a human-readable table.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            &mut out,
            "seed {:#x}, expected sum {}, {} runners, {} failures",
            self.seed,
            self.expected_sum,
            self.entries.len(),
            self.failures().len()
        );
        let _ = writeln!(
            &mut out,
            "{:<10} {:>6} {:>6} {:>12} {:>12} {:>12}  status",
            "runner", "tasks", "iters", "mean", "min", "max"
        );
        for entry in &self.entries {
            let (mean, min, max) = entry.timing.map_or_else(
                || ("-".to_string(), "-".to_string(), "-".to_string()),
                |t| {
                    (
                        format!("{:?}", t.mean()),
                        format!("{:?}", t.min()),
                        format!("{:?}", t.max()),
                    )
                },
            );
            let status = entry
                .failure
                .as_ref()
                .map_or_else(|| "ok".to_string(), |f| format!("{}: {}", f.kind, f.message));
            let _ = writeln!(
                &mut out,
                "{:<10} {:>6} {:>6} {mean:>12} {min:>12} {max:>12}  {status}",
                entry.name, entry.tasks, entry.iterations
            );
        }
        out
    }

    /// Renders a JSON report.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let entries = self
            .entries
            .iter()
            .map(|e| {
                json!({
                    "name": e.name, "tasks": e.tasks, "iterations": e.iterations,
                    "timing": e.timing, "failure": e.failure,
                })
            })
            .collect::<Vec<_>>();
        json!({
            "summary": {
                "seed": self.seed, "expected_sum": self.expected_sum,
                "runners": self.entries.len(), "failures": self.failures().len(),
            },
            "entries": entries,
        })
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

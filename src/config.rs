//! Harness configuration with environment and config file support.
//!
//! # Configuration Precedence
//!
//! Settings are resolved in this order (highest priority first):
//!
//! 1. **Programmatic**: values set via builder methods (`with_task_count(512)`)
//! 2. **Environment variables**: values from `SEQREDUCE_*` env vars
//! 3. **Config file**: values loaded from a TOML file (requires `config-file` feature)
//! 4. **Defaults**: built-in defaults from [`HarnessConfig::default()`]
//!
//! # Supported Environment Variables
//!
//! | Variable | Type | Maps to |
//! |----------|------|---------|
//! | `SEQREDUCE_TASK_COUNT` | `usize` | `task_count` |
//! | `SEQREDUCE_SEED` | `u64` (decimal or `0x` hex) | `seed` |
//! | `SEQREDUCE_DEFERRED_PERCENT` | `u8` | `deferred_percent` |
//! | `SEQREDUCE_ITERATIONS` | `u32` | `iterations` |
//! | `SEQREDUCE_WARMUP_ITERATIONS` | `u32` | `warmup_iterations` |
//! | `SEQREDUCE_RUNNERS` | comma-separated runner names | `runners` |

use std::path::PathBuf;

use crate::runner::RunnerKind;

/// Environment variable name for the number of generated tasks.
pub const ENV_TASK_COUNT: &str = "SEQREDUCE_TASK_COUNT";
/// Environment variable name for the task generator seed.
pub const ENV_SEED: &str = "SEQREDUCE_SEED";
/// Environment variable name for the share of deferred tasks.
pub const ENV_DEFERRED_PERCENT: &str = "SEQREDUCE_DEFERRED_PERCENT";
/// Environment variable name for timed iterations per runner.
pub const ENV_ITERATIONS: &str = "SEQREDUCE_ITERATIONS";
/// Environment variable name for untimed warmup iterations per runner.
pub const ENV_WARMUP_ITERATIONS: &str = "SEQREDUCE_WARMUP_ITERATIONS";
/// Environment variable name for the runner selection.
pub const ENV_RUNNERS: &str = "SEQREDUCE_RUNNERS";

/// Default number of generated tasks.
pub const DEFAULT_TASK_COUNT: usize = 256;
/// Default generator seed.
pub const DEFAULT_SEED: u64 = 0xDEAD_BEEF;
/// Default share of deferred tasks, in percent.
pub const DEFAULT_DEFERRED_PERCENT: u8 = 50;
/// Default timed iterations per runner.
pub const DEFAULT_ITERATIONS: u32 = 10;
/// Default warmup iterations per runner.
pub const DEFAULT_WARMUP_ITERATIONS: u32 = 2;

/// Error loading or validating a [`HarnessConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A setting holds a value that cannot be used.
    #[error("invalid value for {key}: {reason}, got {value:?}")]
    InvalidValue {
        /// Setting or environment variable name.
        key: String,
        /// The offending value as written.
        value: String,
        /// What was expected.
        reason: String,
    },
    /// The config file could not be read.
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        /// Path of the config file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The config file is not valid TOML for this schema.
    #[error("failed to parse TOML config: {0}")]
    Parse(String),
}

impl ConfigError {
    fn invalid(key: &str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Settings for a benchmark [`Suite`](crate::harness::Suite).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct HarnessConfig {
    /// Number of tasks in the generated list.
    pub task_count: usize,
    /// Seed for the task generator.
    pub seed: u64,
    /// Share of generated tasks that complete on a later tick, 0..=100.
    pub deferred_percent: u8,
    /// Timed iterations per runner.
    pub iterations: u32,
    /// Untimed iterations per runner before timing starts.
    pub warmup_iterations: u32,
    /// Runners a suite registers, in report order.
    pub runners: Vec<RunnerKind>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            task_count: DEFAULT_TASK_COUNT,
            seed: DEFAULT_SEED,
            deferred_percent: DEFAULT_DEFERRED_PERCENT,
            iterations: DEFAULT_ITERATIONS,
            warmup_iterations: DEFAULT_WARMUP_ITERATIONS,
            runners: RunnerKind::ALL.to_vec(),
        }
    }
}

impl HarnessConfig {
    /// Defaults overridden by any `SEQREDUCE_*` variables that are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        apply_env_overrides(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, then the TOML file at `path`, then environment overrides.
    #[cfg(feature = "config-file")]
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        apply_toml_config(&mut config, &parse_toml_file(path)?);
        apply_env_overrides(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the number of generated tasks.
    #[must_use]
    pub fn with_task_count(mut self, task_count: usize) -> Self {
        self.task_count = task_count;
        self
    }

    /// Sets the generator seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the share of deferred tasks.
    #[must_use]
    pub fn with_deferred_percent(mut self, percent: u8) -> Self {
        self.deferred_percent = percent;
        self
    }

    /// Sets the timed iteration count.
    #[must_use]
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    /// Sets the warmup iteration count.
    #[must_use]
    pub fn with_warmup_iterations(mut self, iterations: u32) -> Self {
        self.warmup_iterations = iterations;
        self
    }

    /// Sets the runners a suite registers.
    #[must_use]
    pub fn with_runners(mut self, runners: impl IntoIterator<Item = RunnerKind>) -> Self {
        self.runners = runners.into_iter().collect();
        self
    }

    /// Checks that the settings describe a runnable suite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 {
            return Err(ConfigError::invalid(
                "iterations",
                "0",
                "expected at least one timed iteration",
            ));
        }
        if self.deferred_percent > 100 {
            return Err(ConfigError::invalid(
                "deferred_percent",
                self.deferred_percent.to_string(),
                "expected a percentage in 0..=100",
            ));
        }
        if self.runners.is_empty() {
            return Err(ConfigError::invalid(
                "runners",
                "",
                "expected at least one runner",
            ));
        }
        Ok(())
    }
}

/// Apply environment variable overrides to a [`HarnessConfig`].
///
/// Only variables that are set in the environment are applied.
/// Returns an error if a variable is set but contains an unparseable value.
pub fn apply_env_overrides(config: &mut HarnessConfig) -> Result<(), ConfigError> {
    if let Some(val) = read_env(ENV_TASK_COUNT) {
        config.task_count = parse_num(ENV_TASK_COUNT, &val, "unsigned integer")?;
    }
    if let Some(val) = read_env(ENV_SEED) {
        config.seed = parse_seed(ENV_SEED, &val)?;
    }
    if let Some(val) = read_env(ENV_DEFERRED_PERCENT) {
        config.deferred_percent = parse_num(ENV_DEFERRED_PERCENT, &val, "percentage")?;
    }
    if let Some(val) = read_env(ENV_ITERATIONS) {
        config.iterations = parse_num(ENV_ITERATIONS, &val, "u32")?;
    }
    if let Some(val) = read_env(ENV_WARMUP_ITERATIONS) {
        config.warmup_iterations = parse_num(ENV_WARMUP_ITERATIONS, &val, "u32")?;
    }
    if let Some(val) = read_env(ENV_RUNNERS) {
        config.runners = parse_runners(ENV_RUNNERS, &val)?;
    }
    Ok(())
}

/// Read an environment variable, returning `None` if unset.
fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn parse_num<T>(var_name: &str, val: &str, expected: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    val.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::invalid(var_name, val, format!("expected {expected} ({e})")))
}

fn parse_seed(var_name: &str, val: &str) -> Result<u64, ConfigError> {
    let trimmed = val.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => trimmed.parse::<u64>(),
    };
    parsed.map_err(|e| ConfigError::invalid(var_name, val, format!("expected u64 seed ({e})")))
}

fn parse_runners(var_name: &str, val: &str) -> Result<Vec<RunnerKind>, ConfigError> {
    val.split(',')
        .filter(|name| !name.trim().is_empty())
        .map(|name| {
            name.parse::<RunnerKind>()
                .map_err(|e| ConfigError::invalid(var_name, val, e.to_string()))
        })
        .collect()
}

// =========================================================================
// TOML config file support (feature-gated)
// =========================================================================

/// TOML-deserializable harness configuration.
///
/// ```toml
/// [tasks]
/// count = 512
/// seed = 42
/// deferred_percent = 25
///
/// [suite]
/// iterations = 20
/// warmup_iterations = 1
/// runners = ["callbacks", "lazy-v2"]
/// ```
#[cfg(feature = "config-file")]
#[derive(serde::Deserialize, Default, Debug)]
#[serde(deny_unknown_fields)]
pub struct HarnessTomlConfig {
    /// Task generation settings.
    #[serde(default)]
    pub tasks: TasksToml,
    /// Suite settings.
    #[serde(default)]
    pub suite: SuiteToml,
}

/// Task generation section of the TOML config.
#[cfg(feature = "config-file")]
#[derive(serde::Deserialize, Default, Debug)]
#[serde(deny_unknown_fields)]
pub struct TasksToml {
    /// Number of generated tasks.
    pub count: Option<usize>,
    /// Generator seed.
    pub seed: Option<u64>,
    /// Share of deferred tasks.
    pub deferred_percent: Option<u8>,
}

/// Suite section of the TOML config.
#[cfg(feature = "config-file")]
#[derive(serde::Deserialize, Default, Debug)]
#[serde(deny_unknown_fields)]
pub struct SuiteToml {
    /// Timed iterations per runner.
    pub iterations: Option<u32>,
    /// Warmup iterations per runner.
    pub warmup_iterations: Option<u32>,
    /// Runners to register.
    pub runners: Option<Vec<RunnerKind>>,
}

/// Apply a parsed TOML config to a [`HarnessConfig`].
///
/// Only fields that are `Some` in the TOML struct override the config.
#[cfg(feature = "config-file")]
pub fn apply_toml_config(config: &mut HarnessConfig, toml: &HarnessTomlConfig) {
    if let Some(v) = toml.tasks.count {
        config.task_count = v;
    }
    if let Some(v) = toml.tasks.seed {
        config.seed = v;
    }
    if let Some(v) = toml.tasks.deferred_percent {
        config.deferred_percent = v;
    }
    if let Some(v) = toml.suite.iterations {
        config.iterations = v;
    }
    if let Some(v) = toml.suite.warmup_iterations {
        config.warmup_iterations = v;
    }
    if let Some(ref v) = toml.suite.runners {
        config.runners.clone_from(v);
    }
}

/// Parse a TOML string into a [`HarnessTomlConfig`].
#[cfg(feature = "config-file")]
pub fn parse_toml_str(toml_str: &str) -> Result<HarnessTomlConfig, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))
}

/// Read and parse a TOML file into a [`HarnessTomlConfig`].
#[cfg(feature = "config-file")]
pub fn parse_toml_file(path: &std::path::Path) -> Result<HarnessTomlConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_toml_str(&content)
}

// =========================================================================
// Tests
// =========================================================================

//! Error types for Seqreduce.
//!
//! Error handling follows these principles:
//!
//! - Errors are explicit and typed (no stringly-typed errors at the crate boundary)
//! - A failing task aborts its reduction; there are no retries
//! - Validation failures are kept distinct from task failures
//!
//! # Error Kinds
//!
//! - **Task**: A task reported a failure from inside the sequence
//! - **Validation**: A runner succeeded but its summed output was wrong
//! - **CompletionDropped**: A runner released its completion without calling it
//! - **Config**: Harness configuration could not be loaded or was invalid
//! - **Runtime**: The Tokio runtime driving a blocking suite run could not start

use crate::config::ConfigError;

/// The kind of error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A task failed and the reduction was aborted.
    Task,
    /// The reduced output did not match the expected sum.
    Validation,
    /// A runner dropped its completion without delivering an outcome.
    CompletionDropped,
    /// Invalid harness configuration.
    Config,
    /// The async runtime could not be built.
    Runtime,
}

impl ErrorKind {
    /// Returns a short, stable name for this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Validation => "validation",
            Self::CompletionDropped => "completion_dropped",
            Self::Config => "config",
            Self::Runtime => "runtime",
        }
    }
}

/// Failure produced by a task.
///
/// Propagates unchanged from the failing task to the runner's completion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TaskError {
    message: String,
}

impl TaskError {
    /// Creates a task error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Mismatch between a runner's summed output and the expected sum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("runner {runner} produced sum {actual}, expected {expected}")]
pub struct ValidationError {
    /// Name of the runner that produced the output.
    pub runner: &'static str,
    /// The precomputed expected sum.
    pub expected: u64,
    /// The sum actually produced.
    pub actual: u64,
}

/// The main error type for Seqreduce operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A task failed.
    #[error("task failed: {0}")]
    Task(#[from] TaskError),
    /// Output validation failed.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    /// The runner never delivered an outcome.
    #[error("runner {runner} dropped its completion without an outcome")]
    CompletionDropped {
        /// Name of the offending runner.
        runner: &'static str,
    },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Building the async runtime failed.
    #[error("failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl Error {
    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Task(_) => ErrorKind::Task,
            Self::Validation(_) => ErrorKind::Validation,
            Self::CompletionDropped { .. } => ErrorKind::CompletionDropped,
            Self::Config(_) => ErrorKind::Config,
            Self::Runtime(_) => ErrorKind::Runtime,
        }
    }

    /// Returns true if this is a task failure.
    #[must_use]
    pub const fn is_task(&self) -> bool {
        matches!(self, Self::Task(_))
    }

    /// Returns true if this is a validation failure.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// A specialized Result type for Seqreduce operations.
pub type Result<T> = std::result::Result<T, Error>;

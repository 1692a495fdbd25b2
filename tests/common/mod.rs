#![allow(dead_code)]
#![allow(unused_imports)]
//! Shared integration test utilities.
//!
//! Import with:
//! ```
//! #[macro_use]
//! mod common;
//! use common::*;
//! ```

use proptest::prelude::ProptestConfig;
use proptest::test_runner::RngSeed;
use seqreduce::{Task, TaskError, TaskMode};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use tracing_subscriber::fmt::format::FmtSpan;

static INIT_LOGGING: Once = Once::new();

/// Default seed for property tests when running under CI.
pub const DEFAULT_PROPTEST_SEED: u64 = 0x5EED_5EED;

const PROPTEST_SEED_ENV: &str = "SEQREDUCE_PROPTEST_SEED";

/// Build a ProptestConfig with deterministic seed support for CI.
#[must_use]
pub fn test_proptest_config(cases: u32) -> ProptestConfig {
    let mut config = ProptestConfig::with_cases(cases);
    // Honor existing PROPTEST_RNG_SEED, otherwise apply our own.
    if matches!(config.rng_seed, RngSeed::Random) {
        if let Some(seed) = read_proptest_seed() {
            config.rng_seed = RngSeed::Fixed(seed);
        }
    }
    config
}

fn read_proptest_seed() -> Option<u64> {
    if let Ok(value) = std::env::var(PROPTEST_SEED_ENV) {
        return value.parse::<u64>().ok();
    }
    if std::env::var("CI").is_ok() {
        return Some(DEFAULT_PROPTEST_SEED);
    }
    None
}

/// Initialize test logging with trace-level output.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_ansi(false)
            .try_init();
    });
}

/// Run async test code on a current-thread Tokio runtime.
pub fn run_test<F, Fut>(f: F)
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = ()>,
{
    init_test_logging();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("failed to build runtime");
    runtime.block_on(f());
}

/// Log a test phase transition with a visual separator.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        tracing::info!(phase = %$name, "========================================");
        tracing::info!(phase = %$name, "TEST PHASE: {}", $name);
        tracing::info!(phase = %$name, "========================================");
    };
}

/// Log a section within a test phase.
#[macro_export]
macro_rules! test_section {
    ($name:expr) => {
        tracing::debug!(section = %$name, "--- {} ---", $name);
    };
}

/// Log test completion with summary.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        tracing::info!(test = %$name, "test completed successfully: {}", $name);
    };
    ($name:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::info!(
            test = %$name,
            $($key = %$value,)*
            "test completed successfully: {}",
            $name
        );
    };
}

/// Records which task bodies ran, in order.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    started: Arc<Mutex<Vec<usize>>>,
    calls: Arc<AtomicUsize>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A task that records its start and produces `value`.
    pub fn task(&self, id: usize, mode: TaskMode, value: u8) -> Task {
        self.task_with(id, mode, Ok(value))
    }

    /// A task that records its start and fails with `message`.
    pub fn failing(&self, id: usize, mode: TaskMode, message: &str) -> Task {
        self.task_with(id, mode, Err(TaskError::new(message)))
    }

    fn task_with(&self, id: usize, mode: TaskMode, result: Result<u8, TaskError>) -> Task {
        let started = Arc::clone(&self.started);
        let calls = Arc::clone(&self.calls);
        Task::new(mode, move |_| {
            started.lock().expect("recorder lock").push(id);
            calls.fetch_add(1, Ordering::SeqCst);
            result.clone()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn started(&self) -> Vec<usize> {
        self.started.lock().expect("recorder lock").clone()
    }

    pub fn reset(&self) {
        self.started.lock().expect("recorder lock").clear();
        self.calls.store(0, Ordering::SeqCst);
    }
}

/// Mode for position `i` from a bit pattern.
pub fn mode_for(pattern: u64, i: usize) -> TaskMode {
    if (pattern >> (i % 64)) & 1 == 1 {
        TaskMode::Deferred
    } else {
        TaskMode::Immediate
    }
}

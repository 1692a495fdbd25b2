//! Test utilities for Seqreduce.
//!
//! Shared helpers for unit tests:
//! - Consistent tracing-based logging initialization
//! - A current-thread Tokio driver for async tests
//! - Counting tasks that record their invocations
//! - A lock for tests that mutate environment variables

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Once};

use tracing_subscriber::fmt::format::FmtSpan;

use crate::types::{Task, TaskMode};

static INIT_LOGGING: Once = Once::new();
static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Initialize test logging with trace-level output.
///
/// Safe to call multiple times; only initializes once.
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

/// Acquire the global environment lock for tests that mutate env vars.
pub fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Run an async test body on a fresh current-thread runtime.
pub fn run_test<F, Fut>(f: F)
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = ()>,
{
    init_test_logging();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("failed to build test runtime");
    runtime.block_on(f());
}

/// A task that produces `value` and bumps `calls` each time its body runs.
pub fn counting_task(mode: TaskMode, value: u8, calls: &Arc<AtomicUsize>) -> Task {
    let calls = Arc::clone(calls);
    Task::new(mode, move |_| {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    })
}

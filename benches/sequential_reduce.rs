//! Sequential reduction benchmarks for Seqreduce.
//!
//! Every runner reduces the same generated task list, so the entries in a
//! group differ only in the sequencing primitive:
//! - callbacks: hand-written continuation chaining
//! - flow: the callback-flow helper
//! - lazy-v1 / lazy-v2: lazy values (fork-driven, future-backed)
//! - promise: eager promises
//!
//! Task counts and the deferred share come from `SEQREDUCE_*` variables
//! (see `HarnessConfig::from_env`). Log output follows `RUST_LOG` and is off
//! by default.

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use seqreduce::{measure, HarnessConfig, RunnerKind, TaskGenerator};
use tracing_subscriber::EnvFilter;

fn init_bench_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

// =============================================================================
// SEQUENTIAL REDUCE
// =============================================================================

fn bench_sequential_reduce(c: &mut Criterion) {
    init_bench_logging();
    let config = HarnessConfig::from_env().unwrap_or_default();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("failed to build runtime");
    let generated = TaskGenerator::from_config(&config).generate(config.task_count);

    let mut group = c.benchmark_group("sequential_reduce");
    group.throughput(Throughput::Elements(generated.tasks.len() as u64));
    for kind in &config.runners {
        let runner = kind.build();
        group.bench_with_input(
            BenchmarkId::new(kind.name(), generated.tasks.len()),
            &generated,
            |b, generated| {
                b.to_async(&runtime).iter(|| async {
                    let measurement =
                        measure(runner.as_ref(), &generated.tasks, generated.expected_sum)
                            .await
                            .expect("generated tasks validate");
                    black_box(measurement.sum)
                });
            },
        );
    }
    group.finish();
}

// =============================================================================
// MODE MIX
// =============================================================================

fn bench_deferred_share(c: &mut Criterion) {
    init_bench_logging();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("failed to build runtime");

    let mut group = c.benchmark_group("deferred_share");
    for percent in [0u8, 50, 100] {
        let generated = TaskGenerator::new(0xDEAD_BEEF)
            .with_deferred_percent(percent)
            .generate(64);
        for kind in [RunnerKind::Callbacks, RunnerKind::Promise] {
            let runner = kind.build();
            group.bench_with_input(
                BenchmarkId::new(kind.name(), percent),
                &generated,
                |b, generated| {
                    b.to_async(&runtime).iter(|| async {
                        black_box(runner.reduce(&generated.tasks).await.expect("no failures"))
                    });
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_sequential_reduce, bench_deferred_share);
criterion_main!(benches);

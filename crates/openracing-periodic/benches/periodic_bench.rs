//! Benchmarks for the periodic worker crate.

use criterion::{Criterion, criterion_group, criterion_main};
use openracing_periodic::{
    AtomicWorkerState, PeriodicWorker, StopSignal, Timeout, WaitBackend, WorkerConfig,
    WorkerState,
};
use std::hint::black_box;
use std::time::Instant;

fn condvar_config(timeout_us: u64) -> WorkerConfig {
    WorkerConfig {
        backend: WaitBackend::Condvar,
        ..WorkerConfig::with_timeout_us(timeout_us)
    }
}

fn bench_spawn_stop_cycle(c: &mut Criterion) {
    c.bench_function("spawn_stop_cycle", |b| {
        b.iter(|| {
            let config = condvar_config(black_box(60_000_000));
            let worker = PeriodicWorker::spawn_with(config, (), |handle| {
                while handle.wait() {}
            });
            worker.stop();
        });
    });
}

fn bench_zero_timeout_wait(c: &mut Criterion) {
    let signal = StopSignal::new();
    let state = AtomicWorkerState::new(WorkerState::Running);
    let strategy = WaitBackend::Condvar.strategy();

    c.bench_function("condvar_wait_zero_timeout", |b| {
        b.iter(|| {
            black_box(strategy.wait(&signal, &state, black_box(Timeout::ZERO)));
        });
    });
}

fn bench_terminated_wait(c: &mut Criterion) {
    let signal = StopSignal::new();
    let state = AtomicWorkerState::new(WorkerState::Stopping);
    let strategy = WaitBackend::Condvar.strategy();

    c.bench_function("wait_after_stop", |b| {
        b.iter(|| {
            black_box(strategy.wait(&signal, &state, black_box(Timeout::from_millis(100))));
        });
    });
}

fn bench_deadline(c: &mut Criterion) {
    let now = Instant::now();

    c.bench_function("timeout_deadline_from", |b| {
        b.iter(|| {
            black_box(Timeout::from_micros(black_box(1_999_999)).deadline_from(now));
        });
    });
}

fn bench_set_timeout(c: &mut Criterion) {
    let worker =
        PeriodicWorker::spawn_with(condvar_config(60_000_000), (), |handle| while handle.wait() {});

    c.bench_function("set_timeout", |b| {
        b.iter(|| {
            worker.set_timeout(black_box(1_000));
        });
    });

    worker.stop();
}

criterion_group!(
    benches,
    bench_spawn_stop_cycle,
    bench_zero_timeout_wait,
    bench_terminated_wait,
    bench_deadline,
    bench_set_timeout,
);

criterion_main!(benches);

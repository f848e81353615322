//! Tests for worker lifecycle edge cases: panics, self-stop and logging.

use openracing_periodic::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn init_tracing() {
    let _installed = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

#[test]
fn test_state_progression() -> TestResult {
    init_tracing();
    let (tx, rx) = mpsc::channel::<()>();
    let worker = PeriodicWorker::spawn((), 1_000, move |handle| {
        while handle.wait() {}
        let _sent = tx.send(());
    });

    assert_eq!(worker.state(), WorkerState::Running);
    assert!(worker.is_running());

    worker.stop();
    assert_eq!(worker.state(), WorkerState::Stopped);
    assert!(!worker.is_running());

    // The closure finished before stop() returned
    rx.try_recv()?;
    Ok(())
}

#[test]
fn test_panicking_detached_worker_is_absorbed() {
    init_tracing();
    let worker = PeriodicWorker::spawn((), 1_000, |handle| {
        let _keep_going = handle.wait();
        std::panic::panic_any("sampling failed");
    });

    worker.stop();
    assert_eq!(worker.state(), WorkerState::Stopped);
    assert!(!worker.is_running());
}

#[test]
fn test_panicking_attached_worker_is_absorbed() -> TestResult {
    init_tracing();
    let config = WorkerConfig::builder()
        .name("panicky")
        .timeout_us(1_000)
        .detach(false)
        .build()?;
    let worker = PeriodicWorker::try_spawn(config, (), |_handle| {
        std::panic::panic_any("sampling failed");
    })?;

    worker.stop();
    worker.stop();
    assert_eq!(worker.state(), WorkerState::Stopped);
    assert!(!worker.is_attached());
    Ok(())
}

#[test]
fn test_stop_from_worker_thread_does_not_deadlock() -> TestResult {
    init_tracing();
    let (worker_tx, worker_rx) = mpsc::channel::<PeriodicWorker<Arc<AtomicBool>>>();
    let (done_tx, done_rx) = mpsc::channel::<()>();
    let finished = Arc::new(AtomicBool::new(false));

    let worker = PeriodicWorker::spawn(Arc::clone(&finished), 1_000, move |handle| {
        // Receive our own owner and drop it on this thread.
        if let Ok(owner) = worker_rx.recv_timeout(Duration::from_secs(5)) {
            drop(owner);
        }
        // Termination was requested by the drop above.
        let keep_going = handle.wait();
        handle.context().store(!keep_going, Ordering::SeqCst);
        let _sent = done_tx.send(());
    });

    worker_tx.send(worker)?;
    done_rx.recv_timeout(Duration::from_secs(5))?;
    assert!(finished.load(Ordering::SeqCst));
    Ok(())
}

#[test]
fn test_worker_exits_on_first_wait_after_early_stop() -> TestResult {
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let waited = Arc::new(AtomicU32::new(0));

    let config = WorkerConfig::builder()
        .name("held")
        .timeout_us(60_000_000)
        .backend(WaitBackend::Condvar)
        .build()?;
    let worker = PeriodicWorker::try_spawn(config, Arc::clone(&waited), move |handle| {
        // Hold the worker before its first wait until the owner has stopped.
        let _released = release_rx.recv_timeout(Duration::from_secs(5));
        let start = Instant::now();
        let keep_going = handle.wait();
        if !keep_going && start.elapsed() < Duration::from_secs(1) {
            handle.context().store(1, Ordering::SeqCst);
        }
    })?;

    let stopper = thread::spawn(move || {
        worker.stop();
        worker
    });

    thread::sleep(Duration::from_millis(20));
    release_tx.send(())?;

    let worker = stopper
        .join()
        .map_err(|panic| format!("stopper panicked: {panic:?}"))?;
    assert_eq!(worker.state(), WorkerState::Stopped);
    assert_eq!(waited.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn test_many_short_lived_workers() {
    for round in 0..50u32 {
        let worker = PeriodicWorker::spawn(AtomicU32::new(round), 100, |handle| {
            while handle.wait() {
                handle.context().fetch_add(1, Ordering::Relaxed);
            }
        });
        if round % 2 == 0 {
            worker.stop();
        }
        // Odd rounds rely on Drop
    }
}

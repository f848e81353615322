//! Cancellable periodic-wakeup worker thread.
//!
//! This crate provides a single background thread that runs a caller-supplied
//! closure and parks between iterations on a microsecond timer. The owner can
//! reconfigure the interval, request shutdown at any time and tear the thread
//! down without leaking it or joining it twice. It includes:
//!
//! - **PeriodicWorker**: Owner side; spawns, detaches or keeps, and stops the thread
//! - **WorkerHandle**: Worker side; timed `wait()`, context and timeout access
//! - **WaitStrategy**: Condition-variable and uninterruptible-sleep wait backends
//! - **WorkerState**: Lock-free `CREATED → RUNNING → STOPPING → STOPPED` lifecycle
//! - **WorkerConfig**: Thread name, stack size, backend and initial timeout
//!
//! # Shutdown Guarantees
//!
//! - `stop()` is **idempotent** and runs automatically on drop
//! - The termination flag is published **before** the wake signal, so a parked
//!   wait never misses it
//! - `stop()` does **not return** until the worker thread has left the worker
//!   closure (unless it is called from the worker thread itself)
//! - Cancellation is **cooperative**: the worker loop must exit when `wait()`
//!   returns `false`
//!
//! # Example
//!
//! ```no_run
//! use openracing_periodic::PeriodicWorker;
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! let worker = PeriodicWorker::spawn(AtomicU64::new(0), 100_000, |handle| {
//!     while handle.wait() {
//!         handle.context().fetch_add(1, Ordering::Relaxed);
//!     }
//! });
//!
//! std::thread::sleep(std::time::Duration::from_millis(350));
//! worker.stop();
//! assert!(worker.context().load(Ordering::Relaxed) >= 3);
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(missing_docs, missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod state;
pub mod timeout;
pub mod wait;
pub mod worker;

pub mod prelude;

pub use config::{WorkerConfig, WorkerConfigBuilder};
pub use error::{WorkerError, WorkerResult};
pub use state::{AtomicWorkerState, ExitLatch, WorkerState};
pub use timeout::Timeout;
pub use wait::{CondvarWait, SleepWait, StopSignal, WaitBackend, WaitStrategy};
pub use worker::{PeriodicWorker, WorkerHandle};

/// Microseconds per second, used when splitting a timeout.
pub const MICROS_PER_SECOND: u64 = 1_000_000;

/// Nanoseconds per microsecond.
pub const NANOS_PER_MICRO: u32 = 1_000;

/// Default name given to the spawned worker thread.
pub const DEFAULT_THREAD_NAME: &str = "periodic-worker";

/// Smallest stack size accepted by [`WorkerConfig`] (16 KiB).
pub const MIN_STACK_SIZE: usize = 16 * 1024;

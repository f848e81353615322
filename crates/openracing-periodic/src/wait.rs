//! Timed wait strategies.
//!
//! Two interchangeable backends implement [`WaitStrategy`]:
//!
//! - [`CondvarWait`]: parks on a condition variable until the deadline or a
//!   stop signal, whichever comes first. Stop latency is immediate.
//! - [`SleepWait`]: sleeps for the whole timeout. A stop signal cannot cut the
//!   sleep short, so stop latency is bounded by the configured timeout. Meant
//!   for platforms whose timed condition waits are unreliable.
//!
//! The backend is picked through [`WaitBackend`], either at build time (the
//! `sleep-wait` feature changes the default) or at startup via
//! [`WorkerConfig`](crate::WorkerConfig).

use crate::state::AtomicWorkerState;
use crate::timeout::Timeout;
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Mutex and condition variable pair that interrupts a parked wait.
#[derive(Debug, Default)]
pub struct StopSignal {
    lock: Mutex<()>,
    cond: Condvar,
}

impl StopSignal {
    /// Create a new signal.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lock: Mutex::new(()),
            cond: Condvar::new(),
        }
    }

    /// Wake every thread parked on this signal.
    ///
    /// The mutex is taken and released first. A waiter checks the termination
    /// state while holding it, so once this returns any such waiter is either
    /// parked (and gets the notification) or will see the new state.
    pub fn notify(&self) {
        drop(self.lock.lock());
        self.cond.notify_all();
    }
}

/// A way of blocking the worker thread between iterations.
pub trait WaitStrategy: Send + Sync + fmt::Debug {
    /// Block for up to `timeout`.
    ///
    /// Returns `true` when the timeout elapsed normally and the worker should
    /// keep looping, `false` when termination was requested before or during
    /// the wait.
    fn wait(&self, signal: &StopSignal, state: &AtomicWorkerState, timeout: Timeout) -> bool;

    /// Whether a stop signal shortens a wait in progress.
    fn is_interruptible(&self) -> bool;
}

/// Condition-variable timed wait on the monotonic clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct CondvarWait;

impl WaitStrategy for CondvarWait {
    fn wait(&self, signal: &StopSignal, state: &AtomicWorkerState, timeout: Timeout) -> bool {
        if state.is_terminated() {
            return false;
        }

        let deadline = timeout.deadline_from(Instant::now());
        let mut guard = signal.lock.lock();

        loop {
            if state.is_terminated() {
                return false;
            }

            match deadline {
                Some(deadline) => {
                    if signal.cond.wait_until(&mut guard, deadline).timed_out() {
                        return !state.is_terminated();
                    }
                }
                // Deadline past the end of the clock: only a stop ends this.
                None => signal.cond.wait(&mut guard),
            }
            // Notified or spurious wakeup: re-check termination, re-park otherwise.
        }
    }

    fn is_interruptible(&self) -> bool {
        true
    }
}

/// Uninterruptible sleep for the full timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct SleepWait;

impl WaitStrategy for SleepWait {
    fn wait(&self, _signal: &StopSignal, state: &AtomicWorkerState, timeout: Timeout) -> bool {
        if state.is_terminated() {
            return false;
        }
        std::thread::sleep(timeout.as_duration());
        !state.is_terminated()
    }

    fn is_interruptible(&self) -> bool {
        false
    }
}

static CONDVAR_WAIT: CondvarWait = CondvarWait;
static SLEEP_WAIT: SleepWait = SleepWait;

/// Selects the [`WaitStrategy`] a worker uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitBackend {
    /// [`CondvarWait`]: interruptible timed wait.
    Condvar,
    /// [`SleepWait`]: plain sleep, cannot be interrupted.
    Sleep,
}

impl WaitBackend {
    /// The strategy implementing this backend.
    #[must_use]
    pub fn strategy(self) -> &'static dyn WaitStrategy {
        match self {
            WaitBackend::Condvar => &CONDVAR_WAIT,
            WaitBackend::Sleep => &SLEEP_WAIT,
        }
    }

    /// Backend selected by the build configuration.
    #[must_use]
    pub const fn build_default() -> Self {
        if cfg!(feature = "sleep-wait") {
            WaitBackend::Sleep
        } else {
            WaitBackend::Condvar
        }
    }
}

impl Default for WaitBackend {
    fn default() -> Self {
        Self::build_default()
    }
}

impl fmt::Display for WaitBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitBackend::Condvar => write!(f, "condvar"),
            WaitBackend::Sleep => write!(f, "sleep"),
        }
    }
}

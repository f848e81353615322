//! Worker lifecycle state and the exit latch.
//!
//! The lifecycle is a single atomic enum rather than separate flags:
//!
//! ```text
//! CREATED ──spawn──▶ RUNNING ──stop()──▶ STOPPING ──exit confirmed──▶ STOPPED
//! ```
//!
//! "Terminated" is any state at or past `STOPPING`. Thread liveness is tracked
//! separately by [`ExitLatch`] because a worker may leave its closure on its
//! own while the lifecycle is still `RUNNING`.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use parking_lot::{Condvar, Mutex};
use std::fmt;

/// Lifecycle of a periodic worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum WorkerState {
    /// Shared state exists, the thread has not been spawned yet.
    Created = 0,
    /// The thread was spawned and no stop was requested.
    Running = 1,
    /// Stop requested; waiting for the thread to leave the worker closure.
    Stopping = 2,
    /// Thread exit confirmed. Terminal.
    Stopped = 3,
}

impl WorkerState {
    #[inline]
    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Created,
            1 => Self::Running,
            2 => Self::Stopping,
            _ => Self::Stopped,
        }
    }

    /// Whether shutdown has been requested.
    #[inline]
    #[must_use]
    pub const fn is_terminated(self) -> bool {
        matches!(self, Self::Stopping | Self::Stopped)
    }

    /// Whether `next` is a legal successor of `self`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::Running)
                | (Self::Created, Self::Stopped)
                | (Self::Running, Self::Stopping)
                | (Self::Stopping, Self::Stopped)
        )
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerState::Created => write!(f, "created"),
            WorkerState::Running => write!(f, "running"),
            WorkerState::Stopping => write!(f, "stopping"),
            WorkerState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Lock-free holder for a [`WorkerState`].
///
/// Transitions go through [`transition`](Self::transition), which only moves
/// along the edges of the lifecycle, so `terminated` can flip exactly once.
pub struct AtomicWorkerState {
    raw: AtomicU8,
}

impl AtomicWorkerState {
    /// Create a holder in the given state.
    #[must_use]
    pub const fn new(state: WorkerState) -> Self {
        Self {
            raw: AtomicU8::new(state as u8),
        }
    }

    /// Current state.
    #[inline]
    pub fn load(&self) -> WorkerState {
        WorkerState::from_u8(self.raw.load(Ordering::Acquire))
    }

    /// Move `from → to` if the holder is currently in `from`.
    ///
    /// Returns `false` when the state was something else or the edge is not
    /// part of the lifecycle.
    pub fn transition(&self, from: WorkerState, to: WorkerState) -> bool {
        if !from.can_transition_to(to) {
            return false;
        }
        self.raw
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Whether shutdown has been requested.
    #[inline]
    pub fn is_terminated(&self) -> bool {
        self.load().is_terminated()
    }
}

impl Default for AtomicWorkerState {
    fn default() -> Self {
        Self::new(WorkerState::Created)
    }
}

impl fmt::Debug for AtomicWorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AtomicWorkerState").field(&self.load()).finish()
    }
}

/// Liveness flag of the worker thread with a blocking wait for it to clear.
///
/// The flag is raised before the thread is spawned and lowered by the worker
/// thread on its way out. [`wait_until_exited`](Self::wait_until_exited)
/// parks on a condition variable instead of spinning.
#[derive(Debug, Default)]
pub struct ExitLatch {
    alive: AtomicBool,
    lock: Mutex<()>,
    exited: Condvar,
}

impl ExitLatch {
    /// Create a latch with no live thread.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            alive: AtomicBool::new(false),
            lock: Mutex::new(()),
            exited: Condvar::new(),
        }
    }

    /// Mark the thread as alive.
    pub fn enter(&self) {
        let _guard = self.lock.lock();
        self.alive.store(true, Ordering::Release);
    }

    /// Mark the thread as gone and wake everyone waiting for it.
    pub fn exit(&self) {
        {
            let _guard = self.lock.lock();
            self.alive.store(false, Ordering::Release);
        }
        self.exited.notify_all();
    }

    /// Whether the thread is still alive. Lock-free.
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Block until the thread is gone. Returns immediately if it already is.
    pub fn wait_until_exited(&self) {
        let mut guard = self.lock.lock();
        while self.alive.load(Ordering::Acquire) {
            self.exited.wait(&mut guard);
        }
    }
}

/// Lowers the latch when dropped, including during a panic unwind.
pub(crate) struct ExitGuard<'a> {
    latch: &'a ExitLatch,
}

impl<'a> ExitGuard<'a> {
    pub(crate) fn new(latch: &'a ExitLatch) -> Self {
        Self { latch }
    }
}

impl Drop for ExitGuard<'_> {
    fn drop(&mut self) {
        self.latch.exit();
    }
}

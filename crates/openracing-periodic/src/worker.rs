//! Periodic worker thread ownership and shutdown.
//!
//! This module provides [`PeriodicWorker`], the owner side of the background
//! thread, and [`WorkerHandle`], which the worker closure receives to park
//! between iterations.

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::state::{AtomicWorkerState, ExitGuard, ExitLatch, WorkerState};
use crate::timeout::Timeout;
use crate::wait::{StopSignal, WaitBackend, WaitStrategy};
use core::sync::atomic::{AtomicU64, Ordering};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

/// State shared between the owner and the worker thread.
struct Shared<C> {
    /// Caller-supplied context
    context: Arc<C>,
    /// Lifecycle; "terminated" is `Stopping` or `Stopped`
    state: AtomicWorkerState,
    /// Wait timeout in microseconds; release store, acquire load
    timeout_us: AtomicU64,
    /// Mutex + condvar interrupting a parked wait
    signal: StopSignal,
    /// Worker thread liveness
    exit: ExitLatch,
    /// Strategy used by `wait()`
    strategy: &'static dyn WaitStrategy,
    backend: WaitBackend,
    name: String,
}

impl<C> Shared<C> {
    fn timeout(&self) -> Timeout {
        Timeout::from_micros(self.timeout_us.load(Ordering::Acquire))
    }

    fn set_timeout(&self, timeout: Timeout) {
        self.timeout_us.store(timeout.as_micros(), Ordering::Release);
    }

    fn wait(&self) -> bool {
        self.strategy.wait(&self.signal, &self.state, self.timeout())
    }
}

/// Worker-side view of a [`PeriodicWorker`].
///
/// The worker closure receives a reference to this handle. It refers to the
/// same state as the owner, so `set_timeout` from either side is visible to
/// the next [`wait`](Self::wait).
pub struct WorkerHandle<C> {
    shared: Arc<Shared<C>>,
}

impl<C> WorkerHandle<C> {
    /// Park until the timeout elapses or a stop is requested.
    ///
    /// Returns `true` when the timeout elapsed and the loop should continue,
    /// `false` when the loop must exit. Returns `false` without blocking if a
    /// stop was already requested.
    pub fn wait(&self) -> bool {
        self.shared.wait()
    }

    /// Context supplied at construction.
    #[inline]
    pub fn context(&self) -> &C {
        &self.shared.context
    }

    /// Shared pointer to the context.
    pub fn context_arc(&self) -> Arc<C> {
        Arc::clone(&self.shared.context)
    }

    /// Current wait timeout.
    #[inline]
    pub fn timeout(&self) -> Timeout {
        self.shared.timeout()
    }

    /// Change the wait timeout (microseconds).
    pub fn set_timeout(&self, timeout_us: u64) {
        self.shared.set_timeout(Timeout::from_micros(timeout_us));
    }

    /// Whether a stop has been requested.
    #[inline]
    pub fn is_terminated(&self) -> bool {
        self.shared.state.is_terminated()
    }

    /// Name of the worker thread.
    pub fn name(&self) -> &str {
        &self.shared.name
    }
}

impl<C> fmt::Debug for WorkerHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("name", &self.shared.name)
            .field("state", &self.shared.state.load())
            .field("timeout", &self.shared.timeout())
            .finish_non_exhaustive()
    }
}

/// Owner of a background thread that wakes up periodically.
///
/// The thread starts running the worker closure as soon as the worker is
/// constructed. The closure is expected to loop on [`WorkerHandle::wait`] and
/// return once it yields `false`.
///
/// # Shutdown
///
/// [`stop`](Self::stop) requests termination, wakes a parked wait and blocks
/// until the thread has left the closure. It is idempotent and is called by
/// `Drop`. A closure that never calls `wait()` (or ignores its result) makes
/// `stop()` block forever.
///
/// # Example
///
/// ```no_run
/// use openracing_periodic::{PeriodicWorker, WorkerConfig};
///
/// let config = WorkerConfig::builder()
///     .name("housekeeping")
///     .timeout_us(50_000)
///     .build()
///     .expect("valid config");
///
/// let worker = PeriodicWorker::try_spawn(config, (), |handle| {
///     while handle.wait() {
///         // periodic work
///     }
/// })
/// .expect("thread spawned");
///
/// worker.set_timeout(10_000);
/// worker.stop();
/// ```
pub struct PeriodicWorker<C = ()> {
    shared: Arc<Shared<C>>,
    /// Join handle while attached; `None` once detached or joined
    join_handle: Mutex<Option<JoinHandle<()>>>,
    thread_id: ThreadId,
}

impl<C> PeriodicWorker<C>
where
    C: Send + Sync + 'static,
{
    /// Spawn a detached worker with the default configuration and the given
    /// timeout (microseconds).
    ///
    /// Thread creation failure is unrecoverable here: it is logged and the
    /// process aborts. Use [`try_spawn`](Self::try_spawn) to handle it.
    pub fn spawn<F>(context: C, timeout_us: u64, work_fn: F) -> Self
    where
        F: FnOnce(&WorkerHandle<C>) + Send + 'static,
    {
        Self::spawn_with(WorkerConfig::with_timeout_us(timeout_us), context, work_fn)
    }

    /// Spawn a worker from a configuration, aborting the process on failure.
    pub fn spawn_with<F>(config: WorkerConfig, context: C, work_fn: F) -> Self
    where
        F: FnOnce(&WorkerHandle<C>) + Send + 'static,
    {
        match Self::try_spawn(config, context, work_fn) {
            Ok(worker) => worker,
            Err(err) => abort_on_setup_failure(&err),
        }
    }

    /// Spawn a worker from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::InvalidConfig`] if the configuration does not
    /// validate and [`WorkerError::Spawn`] if the OS cannot create the thread.
    pub fn try_spawn<F>(config: WorkerConfig, context: C, work_fn: F) -> WorkerResult<Self>
    where
        F: FnOnce(&WorkerHandle<C>) + Send + 'static,
    {
        config.validate()?;

        let shared = Arc::new(Shared {
            context: Arc::new(context),
            state: AtomicWorkerState::new(WorkerState::Created),
            timeout_us: AtomicU64::new(config.timeout_us),
            signal: StopSignal::new(),
            exit: ExitLatch::new(),
            strategy: config.backend.strategy(),
            backend: config.backend,
            name: config.name.clone(),
        });

        let mut builder = thread::Builder::new().name(config.name.clone());
        if let Some(stack_size) = config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        // Raised before the spawn so a stop racing the thread start still waits.
        shared.exit.enter();

        let handle = WorkerHandle {
            shared: Arc::clone(&shared),
        };
        let join_handle = match builder.spawn(move || run_worker(handle, work_fn)) {
            Ok(join_handle) => join_handle,
            Err(err) => {
                shared.exit.exit();
                shared
                    .state
                    .transition(WorkerState::Created, WorkerState::Stopped);
                return Err(WorkerError::spawn(config.name, err));
            }
        };

        shared
            .state
            .transition(WorkerState::Created, WorkerState::Running);
        let thread_id = join_handle.thread().id();

        let join_handle = if config.detach {
            // Dropping the handle detaches the thread.
            drop(join_handle);
            tracing::debug!(worker = %shared.name, "Worker thread detached");
            None
        } else {
            Some(join_handle)
        };

        tracing::debug!(
            worker = %shared.name,
            backend = %shared.backend,
            timeout_us = config.timeout_us,
            "Worker thread spawned"
        );

        Ok(Self {
            shared,
            join_handle: Mutex::new(join_handle),
            thread_id,
        })
    }
}

impl<C> PeriodicWorker<C> {
    /// Request termination and block until the worker thread has exited.
    ///
    /// Safe to call any number of times and from several threads. Called from
    /// the worker thread itself it only requests termination: the thread
    /// cannot wait for its own exit.
    pub fn stop(&self) {
        let shared = &self.shared;

        if shared
            .state
            .transition(WorkerState::Running, WorkerState::Stopping)
        {
            tracing::debug!(worker = %shared.name, "Stop requested");
        }
        // The state is published before the wake-up.
        shared.signal.notify();

        if self.is_worker_thread() {
            tracing::warn!(
                worker = %shared.name,
                "stop() called from the worker thread; skipping join"
            );
            return;
        }

        let join_handle = self.join_handle.lock().take();
        if let Some(join_handle) = join_handle
            && join_handle.join().is_err()
        {
            tracing::warn!(worker = %shared.name, "Worker thread panicked");
        }

        shared.exit.wait_until_exited();

        if shared
            .state
            .transition(WorkerState::Stopping, WorkerState::Stopped)
        {
            tracing::debug!(worker = %shared.name, "Worker thread stopped");
        }
    }

    /// Context supplied at construction.
    #[inline]
    pub fn context(&self) -> &C {
        &self.shared.context
    }

    /// Shared pointer to the context.
    pub fn context_arc(&self) -> Arc<C> {
        Arc::clone(&self.shared.context)
    }

    /// Change the timeout used by subsequent waits (microseconds).
    ///
    /// A wait already in progress may use either the old or the new value.
    pub fn set_timeout(&self, timeout_us: u64) {
        self.shared.set_timeout(Timeout::from_micros(timeout_us));
    }

    /// Change the timeout from a [`Duration`], truncated to microseconds.
    pub fn set_timeout_duration(&self, timeout: Duration) {
        self.shared.set_timeout(Timeout::from(timeout));
    }

    /// Current wait timeout.
    #[inline]
    pub fn timeout(&self) -> Timeout {
        self.shared.timeout()
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> WorkerState {
        self.shared.state.load()
    }

    /// Whether a stop has been requested.
    #[inline]
    pub fn is_terminated(&self) -> bool {
        self.shared.state.is_terminated()
    }

    /// Whether the worker thread is still inside the worker closure.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.shared.exit.is_alive()
    }

    /// Whether the join handle is still held.
    pub fn is_attached(&self) -> bool {
        self.join_handle.lock().is_some()
    }

    /// Id of the worker thread.
    #[inline]
    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    /// Name of the worker thread.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Wait backend in use.
    #[inline]
    pub fn backend(&self) -> WaitBackend {
        self.shared.backend
    }

    fn is_worker_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }
}

impl<C> Drop for PeriodicWorker<C> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<C> fmt::Debug for PeriodicWorker<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeriodicWorker")
            .field("name", &self.shared.name)
            .field("state", &self.state())
            .field("running", &self.is_running())
            .field("backend", &self.shared.backend)
            .field("timeout", &self.timeout())
            .field("thread_id", &self.thread_id)
            .finish_non_exhaustive()
    }
}

/// Worker thread entry point.
fn run_worker<C, F>(handle: WorkerHandle<C>, work_fn: F)
where
    F: FnOnce(&WorkerHandle<C>),
{
    let shared = Arc::clone(&handle.shared);
    let _exit = ExitGuard::new(&shared.exit);
    work_fn(&handle);
    tracing::trace!(worker = %shared.name, "Worker closure returned");
}

fn abort_on_setup_failure(err: &WorkerError) -> ! {
    tracing::error!(error = %err, "Periodic worker setup failed");
    eprintln!("fatal: {err}");
    std::process::abort()
}

//! Prelude module for common periodic worker types.
//!
//! This module provides a convenient way to import the most commonly used
//! types from the periodic worker crate.

pub use crate::config::{WorkerConfig, WorkerConfigBuilder};
pub use crate::error::{WorkerError, WorkerResult};
pub use crate::state::WorkerState;
pub use crate::timeout::Timeout;
pub use crate::wait::{WaitBackend, WaitStrategy};
pub use crate::worker::{PeriodicWorker, WorkerHandle};
pub use crate::{DEFAULT_THREAD_NAME, MICROS_PER_SECOND};

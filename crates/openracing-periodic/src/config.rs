//! Worker configuration.

use crate::error::{WorkerError, WorkerResult};
use crate::timeout::Timeout;
use crate::wait::WaitBackend;
use crate::{DEFAULT_THREAD_NAME, MIN_STACK_SIZE};
use serde::{Deserialize, Serialize};

/// Configuration for a [`PeriodicWorker`](crate::PeriodicWorker).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Name given to the spawned thread.
    pub name: String,
    /// Initial wait timeout (microseconds).
    pub timeout_us: u64,
    /// Wait strategy used by `wait()`.
    pub backend: WaitBackend,
    /// Drop the join handle right after spawning.
    ///
    /// A detached worker is confirmed gone through its exit latch only; an
    /// attached one is also joined by `stop()`.
    pub detach: bool,
    /// Stack size for the worker thread (bytes). `None` uses the platform default.
    pub stack_size: Option<usize>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_THREAD_NAME.to_string(),
            timeout_us: 1_000_000,
            backend: WaitBackend::default(),
            detach: true,
            stack_size: None,
        }
    }
}

impl WorkerConfig {
    /// Default configuration with the given timeout.
    #[must_use]
    pub fn with_timeout_us(timeout_us: u64) -> Self {
        Self {
            timeout_us,
            ..Self::default()
        }
    }

    /// Initial timeout as a [`Timeout`].
    #[must_use]
    pub fn timeout(&self) -> Timeout {
        Timeout::from_micros(self.timeout_us)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread name is empty or contains a NUL byte, or
    /// if the stack size is below [`MIN_STACK_SIZE`].
    pub fn validate(&self) -> WorkerResult<()> {
        if self.name.is_empty() {
            return Err(WorkerError::invalid_config("name must not be empty"));
        }
        if self.name.contains('\0') {
            return Err(WorkerError::invalid_config(
                "name must not contain NUL bytes",
            ));
        }
        if let Some(stack_size) = self.stack_size
            && stack_size < MIN_STACK_SIZE
        {
            return Err(WorkerError::invalid_config(format!(
                "stack_size must be at least {MIN_STACK_SIZE} bytes, got {stack_size}"
            )));
        }
        Ok(())
    }

    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> WorkerConfigBuilder {
        WorkerConfigBuilder::default()
    }
}

/// Builder for `WorkerConfig`.
#[derive(Debug, Default)]
pub struct WorkerConfigBuilder {
    config: WorkerConfig,
}

impl WorkerConfigBuilder {
    /// Set the thread name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Set the initial timeout in microseconds.
    #[must_use]
    pub fn timeout_us(mut self, us: u64) -> Self {
        self.config.timeout_us = us;
        self
    }

    /// Set the wait backend.
    #[must_use]
    pub fn backend(mut self, backend: WaitBackend) -> Self {
        self.config.backend = backend;
        self
    }

    /// Detach the thread after spawning, or keep it joinable.
    #[must_use]
    pub fn detach(mut self, detach: bool) -> Self {
        self.config.detach = detach;
        self
    }

    /// Set the thread stack size in bytes.
    #[must_use]
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.config.stack_size = Some(bytes);
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> WorkerResult<WorkerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

//! Error types for the periodic worker crate.
//!
//! Only construction and configuration can fail with a typed error. The
//! running worker reports trouble through `wait()` returning `false`.

use thiserror::Error;

/// Errors that can occur while setting up a periodic worker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerError {
    /// The operating system refused to create the worker thread.
    #[error("Failed to spawn worker thread '{name}': {reason}")]
    Spawn {
        /// Name the thread was going to be given.
        name: String,
        /// Error reported by the OS.
        reason: String,
    },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl WorkerError {
    /// Create a spawn failure error.
    #[must_use]
    pub fn spawn(name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Spawn {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Whether the failure came from the environment rather than the caller.
    #[must_use]
    pub fn is_environment_failure(&self) -> bool {
        matches!(self, Self::Spawn { .. })
    }
}

/// A specialized `Result` type for worker setup.
pub type WorkerResult<T> = std::result::Result<T, WorkerError>;

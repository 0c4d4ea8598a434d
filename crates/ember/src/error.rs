//! Engine start-up errors.

use thiserror::Error;

use crate::config::ConfigError;

/// Failures while building a scene or loading its configuration.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The background worker pool could not start.
    #[error("failed to start worker threads: {0}")]
    Workers(#[source] std::io::Error),
}

/// Result type for engine set-up.
pub type EngineResult<T> = Result<T, EngineError>;

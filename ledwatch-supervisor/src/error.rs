//! Error types for supervisor operations

use ledwatch_core::error::LedwatchError;
use thiserror::Error;

/// Result type for supervisor operations
pub type Result<T> = std::result::Result<T, SupervisorError>;

/// Error types for supervisor
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// Startup checks failed; no monitor was started
    #[error("Startup failed: {0}")]
    Startup(#[from] LedwatchError),

    /// Shutdown signal handlers could not be installed
    #[error("Failed to install signal handlers: {0}")]
    Signal(#[source] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

//! Runtime error types.

use spout_core::SourceError;
use thiserror::Error;

use crate::config::ConfigLoadError;

/// Errors that can occur while running a Spout pipeline.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigLoadError),

    /// The source failed to configure or start.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Installing a shutdown signal handler failed.
    #[error("Failed to listen for shutdown signal: {0}")]
    Signal(String),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

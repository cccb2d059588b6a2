//! Unified error types for the Spout core.
//!
//! Configuration and lifecycle errors are fatal and bubble up to the operator.
//! Handler and channel errors are per-request: the dispatcher switches on their
//! variants to pick an HTTP status and never lets them escape the request.

use thiserror::Error;

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors raised while configuring a source or its handler.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A mandatory key is absent.
    #[error("missing required configuration key: {key}")]
    MissingField {
        /// The missing key.
        key: String,
    },

    /// A key is present but its value cannot be interpreted.
    #[error("invalid value '{value}' for configuration key '{key}': {reason}")]
    InvalidValue {
        /// The offending key.
        key: String,
        /// The raw value.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// No handler is registered under the requested identifier.
    #[error("unknown handler '{name}' (registered: {available})")]
    UnknownHandler {
        /// The requested identifier.
        name: String,
        /// Comma-separated list of registered identifiers.
        available: String,
    },

    /// The handler rejected its own configuration.
    #[error("handler configuration failed: {0}")]
    Handler(String),
}

impl ConfigError {
    /// Creates a missing field error.
    pub fn missing_field(key: impl Into<String>) -> Self {
        Self::MissingField { key: key.into() }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Creates a handler configuration error.
    pub fn handler(msg: impl Into<String>) -> Self {
        Self::Handler(msg.into())
    }
}

// =============================================================================
// Lifecycle Errors
// =============================================================================

/// Invalid lifecycle transitions on a source.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum LifecycleError {
    /// `start` was called before `configure`.
    #[error("source has not been configured")]
    NotConfigured,

    /// `configure` was called on an already configured source.
    #[error("source is already configured; the handler may only be configured once")]
    AlreadyConfigured,

    /// `start` was called while a transport binding is live.
    #[error("a running HTTP server was found in the source before starting one; will not attempt to start")]
    AlreadyStarted,

    /// The source was stopped and cannot be restarted.
    #[error("source has been stopped; create a new instance to start again")]
    Stopped,
}

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors that can occur while binding or shutting down the HTTP transport.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Binding the listener failed.
    #[error("failed to bind HTTP server to {addr}: {reason}")]
    BindFailed {
        /// The requested bind address.
        addr: String,
        /// Reason for failure.
        reason: String,
    },

    /// The server task is not running after start.
    #[error("HTTP server is not running")]
    NotRunning,

    /// The server task terminated abnormally.
    #[error("HTTP server task failed: {0}")]
    Task(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// =============================================================================
// Per-request Errors
// =============================================================================

/// Failure reported by a handler while decoding a request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HandlerError {
    /// The request body or structure cannot be interpreted (HTTP 400).
    #[error("{0}")]
    Decode(String),

    /// Unexpected internal failure (HTTP 500).
    #[error("{0}")]
    Internal(String),
}

impl HandlerError {
    /// Creates a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Creates an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Failure reported by a channel while committing a batch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChannelError {
    /// The channel has no room for the batch (HTTP 503).
    #[error("{0}")]
    Full(String),

    /// Any other channel failure (HTTP 500).
    #[error("{0}")]
    Internal(String),
}

impl ChannelError {
    /// Creates a capacity error.
    pub fn full(msg: impl Into<String>) -> Self {
        Self::Full(msg.into())
    }

    /// Creates an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

// =============================================================================
// Source Errors
// =============================================================================

/// Fatal errors surfaced by the source lifecycle API.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// Configuration failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Invalid lifecycle transition.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// Transport failed to start.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for handler decoding.
pub type HandlerResult<T> = Result<T, HandlerError>;

/// Result type for channel submission.
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Result type for source lifecycle operations.
pub type SourceResult<T> = Result<T, SourceError>;

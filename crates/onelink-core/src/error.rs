//! Unified error types for onelink.
//!
//! Webhook rejections are not errors at this level; they live in the adapter
//! crate and map straight to HTTP status codes.

use thiserror::Error;

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors that can occur in transport operations.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Network-level failure (connect, send, read, decode).
    #[error("I/O error: {0}")]
    Io(String),

    /// The remote answered with a non-success HTTP status.
    #[error("HTTP {status} error: {body}")]
    Http {
        /// Response status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// Invalid configuration.
    #[error("invalid transport configuration: {0}")]
    InvalidConfig(String),

    /// Listener could not be bound.
    #[error("failed to bind {addr}: {reason}")]
    Bind {
        /// The requested bind address.
        addr: String,
        /// Reason for failure.
        reason: String,
    },

    /// A handler is already registered for this path.
    #[error("route '{path}' is already registered")]
    RouteExists {
        /// The contested path.
        path: String,
    },
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// =============================================================================
// Adapter Errors
// =============================================================================

/// Errors that can occur while wiring bots into an adapter.
#[derive(Debug, Clone, Error)]
pub enum AdapterError {
    /// A bot with the same self ID is already bound to the path.
    #[error("bot '{self_id}' is already listening on '{path}'")]
    DuplicateSelfId {
        /// The duplicate self ID.
        self_id: String,
        /// The listening path.
        path: String,
    },

    /// Transport error.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

// =============================================================================
// API Errors
// =============================================================================

/// Error type for outbound action calls.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The bot has no outbound endpoint configured.
    #[error("bot is not connected")]
    NotConnected,
    /// Transport error.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Result type for API calls.
pub type ApiResult<T> = Result<T, ApiError>;

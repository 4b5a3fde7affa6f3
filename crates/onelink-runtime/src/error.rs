//! Runtime error types.

use thiserror::Error;

pub use crate::config::{ConfigError, ConfigResult};

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The HTTP listener could not be started.
    #[error("Transport error: {0}")]
    Transport(#[from] onelink_core::TransportError),

    /// A bot could not be attached.
    #[error("Adapter error: {0}")]
    Adapter(#[from] onelink_core::AdapterError),

    /// `start` was called on a running runtime.
    #[error("Runtime is already running")]
    AlreadyRunning,
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

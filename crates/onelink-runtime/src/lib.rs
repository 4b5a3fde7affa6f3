//! Onelink Runtime - hosts OneBot HTTP bots from configuration.
//!
//! This crate provides:
//! - Layered configuration loading ([`ConfigLoader`], [`OnelinkConfig`])
//! - Logging initialisation ([`LoggingBuilder`])
//! - Runtime orchestration ([`OnelinkRuntime`]): one shared HTTP listener,
//!   every enabled bot forked into the OneBot adapter, events delivered
//!   through a [`DispatchReceiver`](onelink_core::DispatchReceiver)
//!
//! ```rust,ignore
//! use onelink_runtime::OnelinkRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = OnelinkRuntime::builder().build()?;
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{ConfigError, ConfigLoader, ConfigResult, LoggingConfig, OnelinkConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::LoggingBuilder;
pub use runtime::{OnelinkRuntime, RuntimeBuilder};

// Re-export tracing for use by downstream binaries
pub use tracing;

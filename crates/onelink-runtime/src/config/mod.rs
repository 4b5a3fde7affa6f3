//! Configuration for the onelink runtime.
//!
//! Layered loading via figment, a serde schema and post-load validation.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use schema::{LogFormat, LogLevel, LogOutput, LoggingConfig, OnelinkConfig, ServerConfig};
pub use validation::validate_config;

//! # Onelink Core
//!
//! Shared vocabulary for the onelink OneBot HTTP bridge.
//!
//! This crate carries no transport code. It defines the types every other
//! layer agrees on:
//!
//! - **Bot instances**: [`BotInstance`] with its immutable [`TransportConfig`]
//!   and an action-invocation slot ([`ApiCaller`])
//! - **Dispatch handoff**: [`SessionDispatcher`] and the queue-backed
//!   [`DispatchQueue`] that decouples event processing from webhook latency
//! - **Errors**: [`TransportError`], [`ApiError`], [`AdapterError`]
//!
//! ```text
//! ┌──────────────┐   call()    ┌───────────┐   POST /<action>   ┌─────────┐
//! │ runtime logic│────────────▶│BotInstance│───────────────────▶│ gateway │
//! └──────────────┘             └───────────┘                    └─────────┘
//!        ▲                                                           │
//!        │ DispatchReceiver        DispatchQueue ◀── webhook ◀───────┘
//!        └──────────────────────────────────────
//! ```

pub mod bot;
pub mod config;
pub mod dispatch;
pub mod error;

pub use bot::{ApiCaller, BotInstance, BotStatus};
pub use config::{DEFAULT_PATH, TransportConfig, normalize_path};
pub use dispatch::{
    DispatchQueue, DispatchReceiver, DispatchedEvent, SessionDispatcher, dispatch_queue,
};
pub use error::{
    AdapterError, AdapterResult, ApiError, ApiResult, TransportError, TransportResult,
};

//! # Onelink Transport
//!
//! HTTP capability implementations used by the OneBot adapter.
//!
//! ## Features
//!
//! - `http-client`: [`HttpClient`], a JSON POST client bound to a base URL
//!   and a set of default headers
//! - `http-server`: [`HttpServer`], a shared listener that routes POST
//!   requests to [`WebhookHandler`]s by path
//! - `full`: both
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  Adapter Layer      │  (OneBot HTTP)
//! ├─────────────────────┤
//! │  onelink-core       │  (bot, error and dispatch types)
//! ├─────────────────────┤
//! │  onelink-transport  │  <- This crate
//! ├─────────────────────┤
//! │  Network (TCP/HTTP) │
//! └─────────────────────┘
//! ```

#[cfg(feature = "http-client")]
pub mod client;

#[cfg(feature = "http-server")]
pub mod server;

#[cfg(feature = "http-client")]
pub use client::{HttpClient, HttpClientOptions};

#[cfg(feature = "http-server")]
pub use server::{HttpServer, ListenerHandle, StatusCode, WebhookHandler, WebhookRequest};

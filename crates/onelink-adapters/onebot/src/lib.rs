//! # Onelink Adapter for OneBot over HTTP
//!
//! Connects locally registered bots to a remote OneBot gateway using plain
//! HTTP in both directions.
//!
//! ## Overview
//!
//! - **Outbound**: [`ActionForwarder`] POSTs each action to
//!   `<endpoint>/<action>` with `Authorization: Token <token>` and returns the
//!   gateway's JSON body verbatim.
//! - **Inbound**: [`WebhookReceiver`] accepts event pushes on a listening
//!   path, resolves the target bot by `x-self-id`, checks the optional
//!   `x-signature` (HMAC-SHA1, see [`signature`]) and hands the event to a
//!   [`SessionDispatcher`](onelink_core::SessionDispatcher).
//!
//! Many bots may share one path; the path is registered on the HTTP server
//! once and every request is resolved against the path's current
//! [`ListenerBinding`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use onelink_adapter_onebot::OneBotHttpAdapter;
//! use onelink_core::{BotInstance, TransportConfig, dispatch_queue};
//! use onelink_transport::HttpServer;
//!
//! let server = HttpServer::new();
//! let (queue, mut events) = dispatch_queue();
//! let adapter = OneBotHttpAdapter::new(server.clone(), queue);
//!
//! let bot = BotInstance::new("10001", TransportConfig::with_endpoint("http://127.0.0.1:5700"));
//! adapter.fork(&bot)?;
//! let _listener = server.bind("0.0.0.0:8080").await?;
//!
//! bot.call("send_private_msg", json!({"user_id": 1, "message": "hi"})).await?;
//! while let Some(event) = events.recv().await {
//!     println!("{} <- {}", event.bot.self_id(), event.payload);
//! }
//! ```

mod adapter;
pub mod config;
pub mod error;
pub mod forwarder;
pub mod receiver;
pub mod registry;
pub mod signature;

#[cfg(test)]
mod test_support;

pub use adapter::OneBotHttpAdapter;
pub use config::{OneBotHttpConfig, Protocol};
pub use error::WebhookRejection;
pub use forwarder::ActionForwarder;
pub use receiver::{SELF_ID_HEADER, SIGNATURE_HEADER, WebhookReceiver};
pub use registry::ListenerBinding;
pub use signature::SignatureError;

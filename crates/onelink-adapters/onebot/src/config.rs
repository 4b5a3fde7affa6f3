//! Configuration types for the OneBot HTTP adapter.
//!
//! One entry per bot instance, typically loaded from the `bots` list of
//! `onelink.toml`.
//!
//! # Example Configuration
//!
//! ```toml
//! [[bots]]
//! self_id = "10001"
//! protocol = "http"
//! path = "/onebot"
//! secret = "hunter2"
//! endpoint = "http://127.0.0.1:5700"
//! token = "abc"
//! timeout_ms = 10000
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use onelink_core::{BotInstance, TransportConfig};

/// Transport marker. Only plain HTTP is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// HTTP webhook in, HTTP POST out.
    #[default]
    Http,
}

/// Configuration for one bot instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneBotHttpConfig {
    /// Self ID the gateway tags this bot's events with.
    pub self_id: String,

    /// Transport marker (`"http"`).
    #[serde(default)]
    pub protocol: Protocol,

    /// Whether this bot is started.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Inbound and outbound transport settings.
    #[serde(flatten)]
    pub transport: TransportConfig,
}

fn default_enabled() -> bool {
    true
}

impl OneBotHttpConfig {
    /// Creates a config with default transport settings.
    pub fn new(self_id: impl Into<String>) -> Self {
        Self {
            self_id: self_id.into(),
            protocol: Protocol::Http,
            enabled: true,
            transport: TransportConfig::default(),
        }
    }

    /// Builds the bot instance this entry describes.
    pub fn instance(&self) -> Arc<BotInstance> {
        BotInstance::new(self.self_id.clone(), self.transport.clone())
    }
}

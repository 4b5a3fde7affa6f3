//! Per-instance transport settings.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Listening path used when a bot does not configure one.
pub const DEFAULT_PATH: &str = "/onebot";

/// Immutable transport settings for one bot instance.
///
/// When `endpoint` is unset the outbound channel is never initialised and the
/// instance stays passive (inbound-only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Base URL of the gateway's HTTP API.
    #[serde(alias = "base_url", alias = "baseURL")]
    pub endpoint: Option<String>,

    /// Token sent as `Authorization: Token <token>` on outbound calls.
    pub token: Option<String>,

    /// Shared secret for inbound HMAC-SHA1 signatures.
    pub secret: Option<String>,

    /// Webhook path (default: `/onebot`).
    pub path: String,

    /// Outbound request timeout in milliseconds.
    pub timeout_ms: u64,

    /// Optional proxy URL for outbound calls.
    pub proxy: Option<String>,

    /// Extra headers added to every outbound call.
    pub headers: HashMap<String, String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            token: None,
            secret: None,
            path: DEFAULT_PATH.to_string(),
            timeout_ms: 30_000,
            proxy: None,
            headers: HashMap::new(),
        }
    }
}

impl TransportConfig {
    /// Creates a config for the given gateway endpoint.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            ..Default::default()
        }
    }

    /// Returns the configured endpoint, treating an empty string as unset.
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref().filter(|e| !e.is_empty())
    }

    /// Returns the configured secret, treating an empty string as unset.
    pub fn secret(&self) -> Option<&str> {
        self.secret.as_deref().filter(|s| !s.is_empty())
    }

    /// Returns the listening path with a guaranteed leading `/`.
    pub fn normalized_path(&self) -> String {
        normalize_path(&self.path)
    }

    /// Returns the outbound request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Normalises a route path: empty becomes the default, and a leading `/` is added.
pub fn normalize_path(path: &str) -> String {
    let path = path.trim();
    if path.is_empty() {
        DEFAULT_PATH.to_string()
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path() {
        let config = TransportConfig::default();
        assert_eq!(config.normalized_path(), "/onebot");
        assert!(config.endpoint().is_none());
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("hook"), "/hook");
        assert_eq!(normalize_path("/hook"), "/hook");
        assert_eq!(normalize_path("  "), "/onebot");
    }

    #[test]
    fn test_empty_strings_are_unset() {
        let config = TransportConfig {
            endpoint: Some(String::new()),
            secret: Some(String::new()),
            ..Default::default()
        };
        assert!(config.endpoint().is_none());
        assert!(config.secret().is_none());
    }

    #[test]
    fn test_base_url_alias() {
        let config: TransportConfig =
            serde_json::from_str(r#"{"base_url": "http://127.0.0.1:5700"}"#).unwrap();
        assert_eq!(config.endpoint(), Some("http://127.0.0.1:5700"));
        assert_eq!(config.path, "/onebot");
    }
}

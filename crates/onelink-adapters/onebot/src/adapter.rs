//! OneBot HTTP adapter lifecycle.
//!
//! Bots are forked into the adapter one at a time:
//!
//! 1. [`attach`](OneBotHttpAdapter::attach) builds the outbound client when an
//!    endpoint is configured and installs an [`ActionForwarder`] in the bot's
//!    action slot, then marks the bot ready.
//! 2. [`listen`](OneBotHttpAdapter::listen) adds the bot to the binding for its
//!    path. The first bot on a path creates the binding and registers the
//!    path's [`WebhookReceiver`] on the shared [`HttpServer`]; later bots only
//!    join the binding.
//!
//! # Programmatic Usage
//!
//! ```rust,ignore
//! let adapter = OneBotHttpAdapter::new(server.clone(), queue);
//! for entry in &config.bots {
//!     adapter.fork(&entry.instance())?;
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use onelink_core::{AdapterResult, BotInstance, BotStatus, SessionDispatcher};
use onelink_transport::{HttpClient, HttpClientOptions, HttpServer};

use crate::forwarder::ActionForwarder;
use crate::receiver::WebhookReceiver;
use crate::registry::ListenerBinding;

/// The OneBot HTTP adapter.
pub struct OneBotHttpAdapter {
    server: HttpServer,
    dispatcher: Arc<dyn SessionDispatcher>,
    /// Listening path → bots sharing it. Entries are never removed.
    bindings: RwLock<HashMap<String, Arc<ListenerBinding>>>,
}

impl OneBotHttpAdapter {
    /// Adapter name.
    pub const NAME: &'static str = "onebot-http";

    /// Creates an adapter mounting its routes on `server` and handing inbound
    /// events to `dispatcher`.
    pub fn new(server: HttpServer, dispatcher: impl SessionDispatcher + 'static) -> Self {
        Self {
            server,
            dispatcher: Arc::new(dispatcher),
            bindings: RwLock::new(HashMap::new()),
        }
    }

    /// Attaches and listens in one step.
    ///
    /// A bot that fails to listen is put back to [`BotStatus::Created`].
    ///
    /// # Errors
    /// See [`attach`](Self::attach) and [`listen`](Self::listen).
    pub fn fork(&self, bot: &Arc<BotInstance>) -> AdapterResult<()> {
        self.attach(bot)?;
        self.listen(bot).inspect_err(|_| bot.set_status(BotStatus::Created))
    }

    /// Wires the outbound channel, if any, and marks the bot ready.
    ///
    /// Without an endpoint the bot stays passive: inbound events still reach
    /// it, outbound calls fail with `NotConnected`.
    ///
    /// # Errors
    /// A transport error if the client cannot be built from the bot's settings.
    pub fn attach(&self, bot: &Arc<BotInstance>) -> AdapterResult<()> {
        let config = bot.config();
        match HttpClientOptions::from_config(config) {
            Some(options) => {
                let mut auth = vec![("Content-Type", "application/json".to_string())];
                let token = config.token.as_deref().filter(|t| !t.is_empty());
                if let Some(token) = token {
                    auth.push(("Authorization", format!("Token {token}")));
                }
                let client = HttpClient::new(options)?.extend(auth)?;
                info!(
                    self_id = %bot.self_id(),
                    endpoint = %client.base_url(),
                    authorization = token.is_some(),
                    "Configured HTTP API client"
                );
                bot.set_caller(Arc::new(ActionForwarder::new(client)));
            }
            None => {
                debug!(self_id = %bot.self_id(), "No endpoint configured, bot is inbound-only");
            }
        }

        bot.set_status(BotStatus::Ready);
        Ok(())
    }

    /// Adds the bot to the binding for its listening path.
    ///
    /// # Errors
    /// - `DuplicateSelfId` if the path already serves a bot with this self ID
    /// - a transport error if the route cannot be registered
    pub fn listen(&self, bot: &Arc<BotInstance>) -> AdapterResult<()> {
        let path = bot.config().normalized_path();
        let binding = {
            let mut bindings = self.bindings.write();
            match bindings.get(&path) {
                Some(binding) => Arc::clone(binding),
                None => {
                    let binding = Arc::new(ListenerBinding::new(path.clone()));
                    let receiver =
                        WebhookReceiver::new(Arc::clone(&binding), Arc::clone(&self.dispatcher));
                    self.server.register(&path, Arc::new(receiver))?;
                    bindings.insert(path.clone(), Arc::clone(&binding));
                    binding
                }
            }
        };

        binding.insert(Arc::clone(bot))?;
        info!(
            self_id = %bot.self_id(),
            path = %path,
            bots = binding.len(),
            has_secret = bot.config().secret().is_some(),
            "Listening for OneBot webhooks"
        );
        Ok(())
    }

    /// Removes the bot from its binding and marks it offline.
    ///
    /// The path's route stays registered for the remaining (or future) bots.
    pub fn detach(&self, self_id: &str) -> Option<Arc<BotInstance>> {
        let bindings: Vec<_> = self.bindings.read().values().cloned().collect();
        let (binding, bot) = bindings
            .iter()
            .find_map(|b| b.remove(self_id).map(|bot| (b, bot)))?;
        bot.set_status(BotStatus::Offline);
        info!(self_id = %self_id, path = %binding.path(), "Bot detached");
        if binding.is_empty() {
            debug!(path = %binding.path(), "No bots left on path, requests will be rejected");
        }
        Some(bot)
    }

    /// The binding for `path`, if any bot ever listened on it.
    pub fn binding(&self, path: &str) -> Option<Arc<ListenerBinding>> {
        self.bindings
            .read()
            .get(&onelink_core::normalize_path(path))
            .cloned()
    }

    /// Finds a listening bot by self ID across all paths.
    pub fn bot(&self, self_id: &str) -> Option<Arc<BotInstance>> {
        self.bindings
            .read()
            .values()
            .find_map(|b| b.find(self_id))
    }

    /// Paths with a registered route.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<_> = self.bindings.read().keys().cloned().collect();
        paths.sort();
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use onelink_core::{ApiError, DispatchReceiver, TransportConfig, dispatch_queue};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::receiver::{SELF_ID_HEADER, SIGNATURE_HEADER};
    use crate::signature;
    use crate::test_support::spawn_gateway;

    fn adapter() -> (OneBotHttpAdapter, HttpServer, DispatchReceiver) {
        let server = HttpServer::new();
        let (queue, events) = dispatch_queue();
        (OneBotHttpAdapter::new(server.clone(), queue), server, events)
    }

    fn secret_bot(self_id: &str, secret: &str) -> Arc<BotInstance> {
        BotInstance::new(
            self_id,
            TransportConfig {
                secret: Some(secret.to_string()),
                ..Default::default()
            },
        )
    }

    fn webhook(self_id: &str, signature: Option<&str>, body: &'static str) -> Request<Body> {
        let mut builder = Request::post("/onebot")
            .header("content-type", "application/json")
            .header(SELF_ID_HEADER, self_id);
        if let Some(sig) = signature {
            builder = builder.header(SIGNATURE_HEADER, sig);
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[tokio::test]
    async fn test_signed_event_dispatched() {
        let (adapter, server, mut events) = adapter();
        adapter.fork(&secret_bot("10001", "abc")).unwrap();

        let sig = signature::sign("abc", br#"{"x":1}"#).unwrap();
        let resp = server
            .router()
            .oneshot(webhook("10001", Some(&sig), r#"{"x":1}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let event = events.try_recv().unwrap();
        assert_eq!(event.bot.self_id(), "10001");
        assert_eq!(event.payload, json!({"x": 1}));
    }

    #[tokio::test]
    async fn test_unsigned_event_is_401() {
        let (adapter, server, mut events) = adapter();
        adapter.fork(&secret_bot("10001", "abc")).unwrap();

        let resp = server
            .router()
            .oneshot(webhook("10001", None, r#"{"x":1}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(events.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_bad_signature_is_403() {
        let (adapter, server, mut events) = adapter();
        adapter.fork(&secret_bot("10001", "abc")).unwrap();

        let resp = server
            .router()
            .oneshot(webhook("10001", Some("sha1=0000"), r#"{"x":1}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert!(events.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_unknown_self_id_is_403() {
        let (adapter, server, mut events) = adapter();
        adapter.fork(&secret_bot("10001", "abc")).unwrap();

        let sig = signature::sign("abc", br#"{"x":1}"#).unwrap();
        let resp = server
            .router()
            .oneshot(webhook("unknown", Some(&sig), r#"{"x":1}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert!(events.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_shared_path_routes_by_self_id() {
        let (adapter, server, mut events) = adapter();
        adapter.fork(&secret_bot("10001", "one")).unwrap();
        adapter.fork(&secret_bot("10002", "two")).unwrap();
        assert_eq!(adapter.paths(), vec!["/onebot"]);
        assert_eq!(adapter.binding("/onebot").unwrap().len(), 2);

        // each bot verifies with its own secret
        let sig = signature::sign("two", b"{}").unwrap();
        let resp = server
            .router()
            .oneshot(webhook("10002", Some(&sig), "{}"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(events.try_recv().unwrap().bot.self_id(), "10002");

        let resp = server
            .router()
            .oneshot(webhook("10001", Some(&sig), "{}"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_bot_joining_later_is_served() {
        let (adapter, server, mut events) = adapter();
        let router = server.router();
        adapter.fork(&secret_bot("10001", "abc")).unwrap();
        adapter
            .fork(&BotInstance::new("10002", TransportConfig::default()))
            .unwrap();

        let resp = router.oneshot(webhook("10002", None, "{}")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(events.try_recv().is_some());
    }

    #[tokio::test]
    async fn test_detached_bot_is_unknown() {
        let (adapter, server, mut events) = adapter();
        adapter
            .fork(&BotInstance::new("10001", TransportConfig::default()))
            .unwrap();

        let bot = adapter.detach("10001").unwrap();
        assert_eq!(bot.status(), BotStatus::Offline);
        assert!(adapter.detach("10001").is_none());
        assert!(adapter.binding("/onebot").unwrap().is_empty());
        assert!(server.has_route("/onebot"));

        let resp = server
            .router()
            .oneshot(webhook("10001", None, "{}"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert!(events.try_recv().is_none());
    }

    #[test]
    fn test_duplicate_self_id_on_path_rejected() {
        let (adapter, _server, _events) = adapter();
        adapter
            .fork(&BotInstance::new("10001", TransportConfig::default()))
            .unwrap();
        assert!(
            adapter
                .fork(&BotInstance::new("10001", TransportConfig::default()))
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_failed_listen_resets_status() {
        let (adapter, _server, _events) = adapter();
        adapter
            .fork(&BotInstance::new("10001", TransportConfig::default()))
            .unwrap();

        let clash = BotInstance::new("10001", TransportConfig::with_endpoint("http://127.0.0.1:5700"));
        assert!(adapter.fork(&clash).is_err());
        assert_eq!(clash.status(), BotStatus::Created);
        assert_eq!(adapter.binding("/onebot").unwrap().len(), 1);
    }

    #[test]
    fn test_separate_paths_get_separate_routes() {
        let (adapter, server, _events) = adapter();
        let other = TransportConfig {
            path: "backup".to_string(),
            ..Default::default()
        };
        adapter
            .fork(&BotInstance::new("10001", TransportConfig::default()))
            .unwrap();
        adapter.fork(&BotInstance::new("10002", other)).unwrap();

        assert_eq!(adapter.paths(), vec!["/backup", "/onebot"]);
        assert!(server.has_route("/backup"));
        assert_eq!(adapter.bot("10002").unwrap().self_id(), "10002");
    }

    #[tokio::test]
    async fn test_attach_without_endpoint_is_passive() {
        let (adapter, _server, _events) = adapter();
        let bot = BotInstance::new("10001", TransportConfig::default());
        adapter.attach(&bot).unwrap();

        assert_eq!(bot.status(), BotStatus::Ready);
        assert!(bot.is_passive());
        let err = bot.call("get_status", json!({})).await.unwrap_err();
        assert!(matches!(err, ApiError::NotConnected));
    }

    #[tokio::test]
    async fn test_outbound_call_is_authenticated() {
        let (base_url, seen) = spawn_gateway(StatusCode::OK).await;
        let (adapter, _server, _events) = adapter();
        let bot = BotInstance::new(
            "10001",
            TransportConfig {
                token: Some("s3cret".to_string()),
                ..TransportConfig::with_endpoint(base_url)
            },
        );
        adapter.attach(&bot).unwrap();

        let result = bot
            .call("send_msg", json!({"message": "hi"}))
            .await
            .unwrap();
        assert_eq!(result, json!({"status": "ok"}));

        let seen = seen.lock().clone().unwrap();
        assert_eq!(seen.action, "send_msg");
        assert_eq!(seen.authorization.as_deref(), Some("Token s3cret"));
        assert_eq!(seen.content_type.as_deref(), Some("application/json"));
        assert_eq!(seen.body, json!({"message": "hi"}));
    }

    #[tokio::test]
    async fn test_empty_token_sends_no_authorization() {
        let (base_url, seen) = spawn_gateway(StatusCode::OK).await;
        let (adapter, _server, _events) = adapter();
        let bot = BotInstance::new(
            "10001",
            TransportConfig {
                token: Some(String::new()),
                ..TransportConfig::with_endpoint(base_url)
            },
        );
        adapter.attach(&bot).unwrap();

        bot.call("get_status", json!({})).await.unwrap();
        let seen = seen.lock().clone().unwrap();
        assert_eq!(seen.authorization, None);
        assert_eq!(seen.content_type.as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn test_live_listener_end_to_end() {
        let (adapter, server, mut events) = adapter();
        adapter.fork(&secret_bot("10001", "abc")).unwrap();
        let handle = server.bind("127.0.0.1:0").await.unwrap();

        let body = r#"{"post_type":"meta_event"}"#;
        let sig = signature::sign("abc", body.as_bytes()).unwrap();
        let client = HttpClient::new(HttpClientOptions::new(format!(
            "http://{}",
            handle.local_addr()
        )))
        .unwrap()
        .extend([(SELF_ID_HEADER, "10001"), (SIGNATURE_HEADER, sig.as_str())])
        .unwrap();

        // the listener answers 200 with an empty body, which is not JSON
        let err = client
            .post_json("/onebot", &serde_json::from_str(body).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, onelink_core::TransportError::Io(_)));

        let event = tokio::time::timeout(std::time::Duration::from_secs(5), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.payload["post_type"], "meta_event");

        handle.stop().await;
    }
}

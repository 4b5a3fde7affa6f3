//! Inbound webhook handling.
//!
//! Each request walks the same steps, holding no state between requests:
//!
//! ```text
//! headers ──▶ resolve x-self-id ──▶ verify x-signature ──▶ decode ──▶ dispatch
//!               │ unknown: 403        │ missing: 401        │ bad: 400   │ 200
//!               ▼                     │ mismatch: 403       ▼            ▼
//!            rejected                 ▼                   rejected    enqueued
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use onelink_core::{BotInstance, SessionDispatcher};
use onelink_transport::{StatusCode, WebhookHandler, WebhookRequest};

use crate::error::WebhookRejection;
use crate::registry::ListenerBinding;
use crate::signature;

/// Header carrying the target bot's self ID.
pub const SELF_ID_HEADER: &str = "x-self-id";

/// Header carrying the `sha1=<hex>` body signature.
pub const SIGNATURE_HEADER: &str = "x-signature";

/// Webhook handler shared by every bot on one listening path.
pub struct WebhookReceiver {
    binding: Arc<ListenerBinding>,
    dispatcher: Arc<dyn SessionDispatcher>,
}

impl WebhookReceiver {
    /// Creates a receiver resolving bots against `binding`.
    pub fn new(binding: Arc<ListenerBinding>, dispatcher: Arc<dyn SessionDispatcher>) -> Self {
        Self {
            binding,
            dispatcher,
        }
    }

    /// Authenticates `request` and dispatches its event.
    ///
    /// Dispatch is enqueue-and-return; this never waits on event processing.
    ///
    /// # Errors
    /// A [`WebhookRejection`] describing why nothing was dispatched.
    pub fn receive(&self, request: &WebhookRequest) -> Result<Arc<BotInstance>, WebhookRejection> {
        let signature = request.header(SIGNATURE_HEADER);
        let self_id = request
            .header(SELF_ID_HEADER)
            .ok_or(WebhookRejection::UnknownIdentity(None))?;

        let bot = self
            .binding
            .find(self_id)
            .ok_or_else(|| WebhookRejection::UnknownIdentity(Some(self_id.to_string())))?;

        signature::verify(bot.config().secret(), request.body(), signature)
            .map_err(|e| WebhookRejection::from_signature(e, self_id))?;

        let payload: Value = serde_json::from_slice(request.body())
            .map_err(|e| WebhookRejection::MalformedBody(e.to_string()))?;

        debug!(self_id = %self_id, body = %payload, "Received event");
        self.dispatcher.dispatch(Arc::clone(&bot), payload);
        Ok(bot)
    }
}

#[async_trait]
impl WebhookHandler for WebhookReceiver {
    async fn handle(&self, request: WebhookRequest) -> StatusCode {
        match self.receive(&request) {
            Ok(_) => StatusCode::OK,
            Err(rejection) => {
                let status = rejection.status_code();
                match &rejection {
                    WebhookRejection::AuthenticationInvalid(_) => {
                        warn!(path = %self.binding.path(), status = %status, "Rejected webhook: {rejection}");
                    }
                    _ => {
                        debug!(path = %self.binding.path(), status = %status, "Rejected webhook: {rejection}");
                    }
                }
                status
            }
        }
    }
}

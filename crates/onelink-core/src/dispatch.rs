//! Handoff of decoded inbound events to session processing.
//!
//! Dispatch never blocks the webhook: [`DispatchQueue`] enqueues and returns,
//! and the session collaborator drains the matching [`DispatchReceiver`] at
//! its own pace. Slow consumers do not feed back into the gateway.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::warn;

use crate::bot::BotInstance;

/// Receives decoded inbound events together with the bot they belong to.
///
/// Implementations must return promptly; the webhook response does not wait
/// for downstream processing.
pub trait SessionDispatcher: Send + Sync {
    /// Hands `payload` off for processing on behalf of `bot`.
    fn dispatch(&self, bot: Arc<BotInstance>, payload: Value);
}

impl<F> SessionDispatcher for F
where
    F: Fn(Arc<BotInstance>, Value) + Send + Sync,
{
    fn dispatch(&self, bot: Arc<BotInstance>, payload: Value) {
        self(bot, payload);
    }
}

/// An inbound event waiting for session processing.
#[derive(Debug, Clone)]
pub struct DispatchedEvent {
    /// The resolved target bot.
    pub bot: Arc<BotInstance>,
    /// The decoded event payload, opaque to the bridge.
    pub payload: Value,
}

/// Enqueue-and-return [`SessionDispatcher`].
#[derive(Debug, Clone)]
pub struct DispatchQueue {
    tx: mpsc::UnboundedSender<DispatchedEvent>,
}

/// Consumer half of a [`DispatchQueue`].
#[derive(Debug)]
pub struct DispatchReceiver {
    rx: mpsc::UnboundedReceiver<DispatchedEvent>,
}

/// Creates a connected queue/receiver pair.
pub fn dispatch_queue() -> (DispatchQueue, DispatchReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (DispatchQueue { tx }, DispatchReceiver { rx })
}

impl SessionDispatcher for DispatchQueue {
    fn dispatch(&self, bot: Arc<BotInstance>, payload: Value) {
        let self_id = bot.self_id().to_string();
        if self.tx.send(DispatchedEvent { bot, payload }).is_err() {
            warn!(self_id = %self_id, "Dispatch receiver dropped, event discarded");
        }
    }
}

impl DispatchReceiver {
    /// Waits for the next event. Returns `None` once every queue handle is gone.
    pub async fn recv(&mut self) -> Option<DispatchedEvent> {
        self.rx.recv().await
    }

    /// Returns the next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<DispatchedEvent> {
        self.rx.try_recv().ok()
    }
}

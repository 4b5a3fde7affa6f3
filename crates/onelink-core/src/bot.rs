//! Bot instances and their action-invocation slot.
//!
//! A [`BotInstance`] is owned by the runtime. Adapters keep `Arc` clones for
//! routing and fill the [`ApiCaller`] slot when the instance has an outbound
//! endpoint.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::trace;

use crate::config::TransportConfig;
use crate::error::{ApiError, ApiResult};

/// Transport-specific action call mechanism.
///
/// The bot is unaware of how the call reaches the gateway; the adapter
/// installs an implementation during attach.
#[async_trait]
pub trait ApiCaller: Send + Sync {
    /// Performs `action` with `params` and returns the raw response body.
    ///
    /// # Errors
    /// Returns an [`ApiError`] if the call cannot be completed.
    async fn call(&self, action: &str, params: Value) -> ApiResult<Value>;
}

/// Lifecycle status of a bot instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BotStatus {
    /// Registered with the runtime, not yet attached.
    #[default]
    Created,
    /// Attached and initialised.
    Ready,
    /// Detached from its adapter.
    Offline,
}

impl fmt::Display for BotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Ready => write!(f, "ready"),
            Self::Offline => write!(f, "offline"),
        }
    }
}

/// A locally registered bot identity.
pub struct BotInstance {
    self_id: String,
    config: TransportConfig,
    status: RwLock<BotStatus>,
    caller: RwLock<Option<Arc<dyn ApiCaller>>>,
}

impl BotInstance {
    /// Creates a new bot instance.
    pub fn new(self_id: impl Into<String>, config: TransportConfig) -> Arc<Self> {
        Arc::new(Self {
            self_id: self_id.into(),
            config,
            status: RwLock::new(BotStatus::Created),
            caller: RwLock::new(None),
        })
    }

    /// The identifier the gateway tags inbound events with.
    pub fn self_id(&self) -> &str {
        &self.self_id
    }

    /// The instance's transport settings.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Current lifecycle status.
    pub fn status(&self) -> BotStatus {
        *self.status.read()
    }

    /// Updates the lifecycle status.
    pub fn set_status(&self, status: BotStatus) {
        *self.status.write() = status;
    }

    /// Installs the action-invocation implementation.
    pub fn set_caller(&self, caller: Arc<dyn ApiCaller>) {
        *self.caller.write() = Some(caller);
    }

    /// Returns `true` if no outbound channel is installed.
    pub fn is_passive(&self) -> bool {
        self.caller.read().is_none()
    }

    /// Invokes an action against the gateway.
    ///
    /// # Errors
    /// [`ApiError::NotConnected`] for passive instances; otherwise whatever the
    /// installed caller reports.
    pub async fn call(&self, action: &str, params: Value) -> ApiResult<Value> {
        let caller = self.caller.read().clone().ok_or(ApiError::NotConnected)?;
        trace!(self_id = %self.self_id, action = %action, "Invoking action");
        caller.call(action, params).await
    }
}

impl fmt::Debug for BotInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotInstance")
            .field("self_id", &self.self_id)
            .field("status", &self.status())
            .field("passive", &self.is_passive())
            .finish_non_exhaustive()
    }
}

//! Runtime orchestration.
//!
//! The runtime owns the shared [`HttpServer`], the OneBot adapter and the
//! dispatch queue. `start` binds the listener and forks every enabled bot
//! from the configuration; `stop` detaches them and shuts the listener down.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use onelink_runtime::OnelinkRuntime;
//!
//! let runtime = OnelinkRuntime::builder().config_file("onelink.toml").build()?;
//! let mut events = runtime.take_events().expect("first call");
//! tokio::spawn(async move {
//!     while let Some(event) = events.recv().await {
//!         println!("{} <- {}", event.bot.self_id(), event.payload);
//!     }
//! });
//! runtime.run().await?;
//! ```

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::signal;
use tracing::{error, info, warn};

use onelink_adapter_onebot::OneBotHttpAdapter;
use onelink_core::{BotInstance, DispatchReceiver, dispatch_queue};
use onelink_transport::{HttpServer, ListenerHandle};

use crate::config::{ConfigLoader, ConfigResult, OnelinkConfig};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

/// Hosts every configured bot behind one HTTP listener.
pub struct OnelinkRuntime {
    config: OnelinkConfig,
    server: HttpServer,
    adapter: Arc<OneBotHttpAdapter>,
    /// Handed out once by [`take_events`](Self::take_events).
    events: Mutex<Option<DispatchReceiver>>,
    listener: Mutex<Option<ListenerHandle>>,
    /// Bots forked by `start`, detached again by `stop`.
    bots: Mutex<Vec<Arc<BotInstance>>>,
}

impl OnelinkRuntime {
    /// Creates a runtime builder that loads configuration from files and
    /// the environment.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from an already loaded configuration.
    ///
    /// Initialises logging from `config.logging` unless a subscriber is
    /// already installed.
    pub fn from_config(config: &OnelinkConfig) -> Self {
        logging::init_from_config(&config.logging);

        let server = HttpServer::new();
        let (queue, events) = dispatch_queue();
        let adapter = Arc::new(OneBotHttpAdapter::new(server.clone(), queue));

        info!(
            log_level = %config.logging.level,
            bots = config.bots.len(),
            "Runtime initialized from configuration"
        );

        Self {
            config: config.clone(),
            server,
            adapter,
            events: Mutex::new(Some(events)),
            listener: Mutex::new(None),
            bots: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &OnelinkConfig {
        &self.config
    }

    pub fn server(&self) -> &HttpServer {
        &self.server
    }

    pub fn adapter(&self) -> &Arc<OneBotHttpAdapter> {
        &self.adapter
    }

    /// Takes the receiving end of the dispatch queue. Returns `None` after
    /// the first call, and after `start` if nobody took it before.
    pub fn take_events(&self) -> Option<DispatchReceiver> {
        self.events.lock().take()
    }

    /// The bound listener address while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.lock().as_ref().map(ListenerHandle::local_addr)
    }

    /// Bots started by this runtime.
    pub fn bots(&self) -> Vec<Arc<BotInstance>> {
        self.bots.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.listener.lock().is_some()
    }

    /// Binds the listener and forks every enabled bot.
    ///
    /// A bot that fails to attach is logged and skipped. An untaken event
    /// receiver is dropped so events do not accumulate unread.
    ///
    /// # Errors
    /// - [`RuntimeError::AlreadyRunning`] if called twice without `stop`
    /// - a transport error if the listener cannot bind
    pub async fn start(&self) -> RuntimeResult<()> {
        if self.is_running() {
            return Err(RuntimeError::AlreadyRunning);
        }

        let addr = self.config.server.bind_addr();
        let handle = self.server.bind(&addr).await?;

        if self.events.lock().take().is_some() {
            warn!("No event consumer attached, dispatched events will be discarded");
        }

        let mut started = Vec::new();
        for entry in self.config.enabled_bots() {
            let bot = entry.instance();
            match self.adapter.fork(&bot) {
                Ok(()) => started.push(bot),
                Err(e) => error!(self_id = %entry.self_id, error = %e, "Failed to start bot"),
            }
        }

        info!(
            addr = %handle.local_addr(),
            bots = started.len(),
            paths = ?self.adapter.paths(),
            "Onelink runtime started"
        );

        self.bots.lock().extend(started);
        *self.listener.lock() = Some(handle);
        Ok(())
    }

    /// Detaches every bot and stops the listener.
    pub async fn stop(&self) {
        let Some(handle) = self.listener.lock().take() else {
            warn!("Runtime is not running");
            return;
        };

        for bot in self.bots.lock().drain(..) {
            self.adapter.detach(bot.self_id());
        }
        handle.stop().await;
        info!("Onelink runtime stopped");
    }

    /// Runs until Ctrl+C (or SIGTERM on unix).
    ///
    /// # Errors
    /// See [`start`](Self::start).
    pub async fn run(&self) -> RuntimeResult<()> {
        self.run_until(wait_for_shutdown()).await
    }

    /// Runs until `shutdown` completes.
    ///
    /// # Errors
    /// See [`start`](Self::start).
    pub async fn run_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        self.start().await?;
        shutdown.await;
        self.stop().await;
        Ok(())
    }
}

/// Waits for Ctrl+C or SIGTERM.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
                return;
            }
            Err(e) => warn!(error = %e, "Cannot listen for SIGTERM"),
        }
    }

    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "Cannot listen for Ctrl+C, shutting down");
        return;
    }
    info!("Received Ctrl+C, shutting down");
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder loading an [`OnelinkRuntime`]'s configuration.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: OnelinkConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Loads the configuration and builds the runtime.
    ///
    /// # Errors
    /// Any configuration error.
    pub fn build(self) -> ConfigResult<OnelinkRuntime> {
        let config = self.config_loader.load()?;
        Ok(OnelinkRuntime::from_config(&config))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use onelink_adapter_onebot::{OneBotHttpConfig, SELF_ID_HEADER, SIGNATURE_HEADER, signature};
    use onelink_core::BotStatus;
    use onelink_transport::{HttpClient, HttpClientOptions};
    use serde_json::json;

    fn config(bots: Vec<OneBotHttpConfig>) -> OnelinkConfig {
        let mut config = OnelinkConfig {
            bots,
            ..Default::default()
        };
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;
        config
    }

    fn secret_bot(self_id: &str, secret: &str) -> OneBotHttpConfig {
        let mut bot = OneBotHttpConfig::new(self_id);
        bot.transport.secret = Some(secret.to_string());
        bot
    }

    #[tokio::test]
    async fn test_start_forks_enabled_bots() {
        let mut disabled = OneBotHttpConfig::new("10003");
        disabled.enabled = false;
        let runtime = OnelinkRuntime::from_config(&config(vec![
            OneBotHttpConfig::new("10001"),
            secret_bot("10002", "abc"),
            disabled,
        ]));

        runtime.start().await.unwrap();
        assert!(runtime.is_running());
        assert!(runtime.local_addr().is_some());
        assert_eq!(runtime.bots().len(), 2);
        assert!(runtime.server().has_route("/onebot"));
        assert!(runtime.adapter().bot("10003").is_none());

        assert!(matches!(
            runtime.start().await,
            Err(RuntimeError::AlreadyRunning)
        ));

        let bots = runtime.bots();
        runtime.stop().await;
        assert!(!runtime.is_running());
        assert!(bots.iter().all(|b| b.status() == BotStatus::Offline));
        assert!(runtime.adapter().bot("10001").is_none());
    }

    #[tokio::test]
    async fn test_events_flow_to_receiver() {
        let runtime = OnelinkRuntime::from_config(&config(vec![secret_bot("10001", "abc")]));
        let mut events = runtime.take_events().unwrap();
        assert!(runtime.take_events().is_none());
        runtime.start().await.unwrap();

        let body = json!({"post_type": "message", "message": "hi"});
        let sig = signature::sign("abc", body.to_string().as_bytes()).unwrap();
        let addr = runtime.local_addr().unwrap();
        let client = HttpClient::new(HttpClientOptions::new(format!("http://{addr}")))
            .unwrap()
            .extend([(SELF_ID_HEADER, "10001"), (SIGNATURE_HEADER, sig.as_str())])
            .unwrap();
        // the receiver answers with an empty 200 body, so only delivery matters
        let _ = client.post_json("/onebot", &body).await;

        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.bot.self_id(), "10001");
        assert_eq!(event.payload, body);

        runtime.stop().await;
    }

    #[tokio::test]
    async fn test_untaken_events_are_released_on_start() {
        let runtime = OnelinkRuntime::from_config(&config(vec![OneBotHttpConfig::new("10001")]));
        runtime.start().await.unwrap();
        assert!(runtime.take_events().is_none());
        runtime.stop().await;
    }

    #[tokio::test]
    async fn test_run_until_stops() {
        let runtime = OnelinkRuntime::from_config(&config(vec![OneBotHttpConfig::new("10001")]));
        runtime.run_until(async {}).await.unwrap();
        assert!(!runtime.is_running());
        assert!(runtime.bots().is_empty());
    }
}

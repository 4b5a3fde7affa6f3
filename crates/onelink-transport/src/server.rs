//! HTTP server capability implementation.
//!
//! One [`HttpServer`] owns a route table and can be bound to a TCP address.
//! A single catch-all POST route looks the request path up in the table at
//! request time, so routes registered after the listener started are served
//! immediately:
//!
//! ```text
//! 0.0.0.0:8080
//! ├── POST /onebot   → WebhookHandler (bots 10001, 10002)
//! └── POST /backup   → WebhookHandler (bot 20001)
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, Uri},
    response::{IntoResponse, Response},
    routing::post,
};
use parking_lot::RwLock;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use onelink_core::{TransportError, TransportResult, normalize_path};

pub use axum::http::StatusCode;

// ─── Request / handler ────────────────────────────────────────────────────────

/// A single inbound POST, reduced to what webhook handlers need.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    path: String,
    headers: HashMap<String, String>,
    body: Bytes,
}

impl WebhookRequest {
    /// Creates a request. Header names are lower-cased.
    pub fn new<I, K, V>(path: impl Into<String>, headers: I, body: impl Into<Bytes>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            path: path.into(),
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into()))
                .collect(),
            body: body.into(),
        }
    }

    fn from_parts(path: String, headers: &HeaderMap, body: Bytes) -> Self {
        let headers = headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        Self {
            path,
            headers,
            body,
        }
    }

    /// The request path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Looks up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The raw, unparsed request body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// Handles every POST arriving on one registered path.
#[async_trait]
pub trait WebhookHandler: Send + Sync {
    /// Processes the request and returns the response status.
    ///
    /// Responses carry no body.
    async fn handle(&self, request: WebhookRequest) -> StatusCode;
}

// ─── Route table ──────────────────────────────────────────────────────────────

type RouteTable = RwLock<HashMap<String, Arc<dyn WebhookHandler>>>;

/// Shared HTTP server with a dynamic path → handler table.
#[derive(Clone, Default)]
pub struct HttpServer {
    routes: Arc<RouteTable>,
}

impl HttpServer {
    /// Creates a server with an empty route table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for POST requests on `path`.
    ///
    /// # Errors
    /// [`TransportError::RouteExists`] if the path already has a handler.
    pub fn register(&self, path: &str, handler: Arc<dyn WebhookHandler>) -> TransportResult<()> {
        let path = normalize_path(path);
        let mut routes = self.routes.write();
        if routes.contains_key(&path) {
            return Err(TransportError::RouteExists { path });
        }
        info!(path = %path, "Registered HTTP route");
        routes.insert(path, handler);
        Ok(())
    }

    /// Returns `true` if `path` has a handler.
    pub fn has_route(&self, path: &str) -> bool {
        self.routes.read().contains_key(&normalize_path(path))
    }

    /// Builds the axum [`Router`] serving this route table.
    ///
    /// * `POST /{*path}` and `POST /` → [`http_dispatch`]
    ///
    /// Paths without a handler receive **404**.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/{*path}", post(http_dispatch))
            .route("/", post(http_dispatch))
            .with_state(self.routes.clone())
    }

    /// Binds `addr` and starts serving in the background.
    ///
    /// # Errors
    /// [`TransportError::Bind`] if the address cannot be bound.
    pub async fn bind(&self, addr: &str) -> TransportResult<ListenerHandle> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| TransportError::Bind {
                addr: addr.to_string(),
                reason: e.to_string(),
            })?;
        let local_addr = listener.local_addr()?;

        let router = self.router();
        let shutdown_token = CancellationToken::new();
        let token = shutdown_token.clone();

        info!(addr = %local_addr, "HTTP server listening");

        let task = tokio::spawn(async move {
            let server = axum::serve(listener, router)
                .with_graceful_shutdown(async move { token.cancelled().await });
            if let Err(e) = server.await {
                error!(error = %e, "HTTP server error");
            }
            info!(addr = %local_addr, "HTTP server shut down");
        });

        Ok(ListenerHandle {
            local_addr,
            shutdown_token,
            task: Some(task),
        })
    }
}

// ─── Listener lifecycle ───────────────────────────────────────────────────────

/// Handle to a bound listener.
///
/// Dropping the handle stops the listener.
#[derive(Debug)]
pub struct ListenerHandle {
    local_addr: SocketAddr,
    shutdown_token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ListenerHandle {
    /// The address actually bound (resolves port `0`).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting connections and waits for in-flight requests.
    pub async fn stop(mut self) {
        self.shutdown_token.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown_token.cancel();
    }
}

// ─── HTTP dispatch ────────────────────────────────────────────────────────────

/// Looks the request path up in the route table and delegates to its handler.
async fn http_dispatch(
    State(routes): State<Arc<RouteTable>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let handler = routes.read().get(&path).cloned();

    match handler {
        Some(h) => {
            debug!(path = %path, len = body.len(), "Received HTTP POST");
            h.handle(WebhookRequest::from_parts(path, &headers, body))
                .await
                .into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

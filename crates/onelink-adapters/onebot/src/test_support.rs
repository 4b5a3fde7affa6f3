//! Stub OneBot gateway for tests.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::post,
};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// The last request the stub gateway received.
#[derive(Debug, Default, Clone)]
pub struct SeenRequest {
    pub action: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Value,
}

type Seen = Arc<Mutex<Option<SeenRequest>>>;

/// Starts a gateway on an ephemeral port that answers every action with
/// `status` and `{"status":"ok"}`. Returns its base URL.
pub async fn spawn_gateway(status: StatusCode) -> (String, Seen) {
    let seen: Seen = Arc::new(Mutex::new(None));
    let app = Router::new()
        .route(
            "/{action}",
            post(
                move |State(seen): State<Seen>,
                      Path(action): Path<String>,
                      headers: HeaderMap,
                      Json(body): Json<Value>| async move {
                    let header = |name: &str| {
                        headers
                            .get(name)
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string)
                    };
                    *seen.lock() = Some(SeenRequest {
                        action,
                        authorization: header("authorization"),
                        content_type: header("content-type"),
                        body,
                    });
                    (status, Json(json!({"status": "ok"})))
                },
            ),
        )
        .with_state(seen.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), seen)
}

//! Outbound action forwarding.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use onelink_core::{ApiCaller, ApiResult};
use onelink_transport::HttpClient;

/// [`ApiCaller`] that POSTs each action to `<endpoint>/<action>`.
///
/// The client already carries the endpoint and the auth headers; the
/// gateway's response body is returned verbatim, success envelope or not.
/// Failures are surfaced to the caller without retrying.
#[derive(Debug, Clone)]
pub struct ActionForwarder {
    client: HttpClient,
}

impl ActionForwarder {
    /// Creates a forwarder over an authenticated client.
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ApiCaller for ActionForwarder {
    async fn call(&self, action: &str, params: Value) -> ApiResult<Value> {
        debug!(action = %action, "Calling OneBot API via HTTP");
        let response = self
            .client
            .post_json(&format!("/{action}"), &params)
            .await?;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use onelink_core::{ApiError, TransportError};
    use onelink_transport::HttpClientOptions;
    use serde_json::json;

    use crate::test_support::spawn_gateway;

    #[tokio::test]
    async fn test_response_returned_verbatim() {
        let (base_url, seen) = spawn_gateway(StatusCode::OK).await;
        let forwarder = ActionForwarder::new(HttpClient::new(HttpClientOptions::new(base_url)).unwrap());

        let result = forwarder
            .call("send_msg", json!({"message": "hi"}))
            .await
            .unwrap();
        assert_eq!(result, json!({"status": "ok"}));

        let seen = seen.lock().clone().unwrap();
        assert_eq!(seen.action, "send_msg");
        assert_eq!(seen.body, json!({"message": "hi"}));
    }

    #[tokio::test]
    async fn test_error_status_surfaces_as_transport_failure() {
        let (base_url, _seen) = spawn_gateway(StatusCode::INTERNAL_SERVER_ERROR).await;
        let forwarder = ActionForwarder::new(HttpClient::new(HttpClientOptions::new(base_url)).unwrap());

        let err = forwarder.call("get_status", json!({})).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Transport(TransportError::Http { status: 500, .. })
        ));
    }
}

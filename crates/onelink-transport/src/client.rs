//! HTTP client capability implementation.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder, Proxy};
use serde_json::Value;
use tracing::{debug, trace};

use onelink_core::{TransportConfig, TransportError, TransportResult};

/// Settings for building an [`HttpClient`].
#[derive(Debug, Clone)]
pub struct HttpClientOptions {
    /// Base URL every request path is joined onto.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Optional proxy URL.
    pub proxy: Option<String>,
    /// Default headers sent with every request.
    pub headers: HashMap<String, String>,
}

impl HttpClientOptions {
    /// Creates options for `base_url` with a 30 second timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
            proxy: None,
            headers: HashMap::new(),
        }
    }

    /// Derives client options from a bot's transport settings.
    ///
    /// Returns `None` when no endpoint is configured.
    pub fn from_config(config: &TransportConfig) -> Option<Self> {
        let base_url = config.endpoint()?;
        Some(Self {
            base_url: base_url.to_string(),
            timeout: config.timeout(),
            proxy: config.proxy.clone().filter(|p| !p.is_empty()),
            headers: config.headers.clone(),
        })
    }
}

/// JSON-over-HTTP client bound to a base URL and default headers.
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    headers: HeaderMap,
}

impl HttpClient {
    /// Builds a client from `options`.
    ///
    /// # Errors
    /// [`TransportError::InvalidConfig`] for a malformed proxy URL or header.
    pub fn new(options: HttpClientOptions) -> TransportResult<Self> {
        let mut builder = ClientBuilder::new().timeout(options.timeout);
        if let Some(proxy) = &options.proxy {
            let proxy = Proxy::all(proxy)
                .map_err(|e| TransportError::InvalidConfig(format!("invalid proxy: {e}")))?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            base_url: options.base_url,
            headers: to_header_map(&options.headers)?,
        })
    }

    /// Returns a client sharing this pool with extra default headers.
    ///
    /// Headers given here replace existing ones with the same name.
    ///
    /// # Errors
    /// [`TransportError::InvalidConfig`] if a header name or value is invalid.
    pub fn extend<I, K, V>(&self, headers: I) -> TransportResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut merged = self.headers.clone();
        for (name, value) in headers {
            let (name, value) = parse_header(name.as_ref(), value.as_ref())?;
            merged.insert(name, value);
        }
        Ok(Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            headers: merged,
        })
    }

    /// The base URL requests are joined onto.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The default headers sent with every request.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Joins `path` onto the base URL with exactly one `/` between them.
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// POSTs `body` as JSON to `path` and returns the decoded JSON response.
    ///
    /// # Errors
    /// - [`TransportError::Io`] if the request cannot be sent or the response
    ///   is not JSON
    /// - [`TransportError::Http`] for any non-success status
    pub async fn post_json(&self, path: &str, body: &Value) -> TransportResult<Value> {
        let url = self.url_for(path);
        debug!(url = %url, "POST");
        trace!(body = %body, "Request body");

        let resp = self
            .client
            .post(&url)
            .headers(self.headers.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Io(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(TransportError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        resp.json()
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }
}

fn parse_header(name: &str, value: &str) -> TransportResult<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| TransportError::InvalidConfig(format!("invalid header name '{name}': {e}")))?;
    let header_value = HeaderValue::from_str(value).map_err(|e| {
        TransportError::InvalidConfig(format!("invalid value for header '{name}': {e}"))
    })?;
    Ok((header_name, header_value))
}

fn to_header_map(headers: &HashMap<String, String>) -> TransportResult<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let (name, value) = parse_header(name, value)?;
        map.insert(name, value);
    }
    Ok(map)
}

//! HTTP transport seam and its reqwest implementation
//!
//! The transport sends exactly one request and reports the status, body and
//! any `Retry-After` hint. Classifying statuses and retrying belong to
//! [`super::retry`].

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::config::HttpConfig;
use crate::error::{Error, Result};
use crate::types::{JsonValue, Method};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// A single outgoing request
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL
    pub url: String,
    /// Request headers
    pub headers: Vec<(String, String)>,
    /// Query parameters
    pub query: Vec<(String, String)>,
    /// JSON body
    pub body: Option<JsonValue>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl HttpRequest {
    /// Create a request with no headers, query or body
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    /// Set timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// The outcome of one request that reached the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
    /// Parsed `Retry-After` header
    pub retry_after: Option<Duration>,
}

impl HttpResponse {
    /// Create a response without a retry hint
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            retry_after: None,
        }
    }

    /// Attach a retry hint
    #[must_use]
    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON
    pub fn json(&self) -> Result<JsonValue> {
        serde_json::from_str(&self.body)
            .map_err(|e| Error::decode(format!("Response is not valid JSON: {e}")))
    }
}

/// Sends HTTP requests
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send one request; transport failures (connect, timeout) are errors,
    /// every status code is a response
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Configuration for the reqwest transport
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Default request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Rate limiter configuration
    pub rate_limit: Option<RateLimiterConfig>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: format!("scope-extract/{}", env!("CARGO_PKG_VERSION")),
            rate_limit: None,
        }
    }
}

impl From<&HttpConfig> for TransportConfig {
    fn from(config: &HttpConfig) -> Self {
        Self {
            timeout: config.timeout(),
            rate_limit: config.requests_per_second.map(RateLimiterConfig::per_second),
            ..Self::default()
        }
    }
}

/// reqwest-backed transport
pub struct ReqwestTransport {
    client: Client,
    rate_limiter: Option<RateLimiter>,
}

impl ReqwestTransport {
    /// Create a transport with the given configuration
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            rate_limiter: config.rate_limit.as_ref().map(RateLimiter::new),
        })
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }

        let mut req = self
            .client
            .request(request.method.into(), &request.url)
            .timeout(request.timeout);

        for (key, value) in &request.headers {
            req = req.header(key.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            req = req.query(&request.query);
        }
        if let Some(ref body) = request.body {
            req = req.json(body);
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    timeout_ms: request.timeout.as_millis() as u64,
                }
            } else {
                Error::Http(e)
            }
        })?;

        let status = response.status().as_u16();
        let retry_after = extract_retry_after(response.headers());
        let body = response.text().await?;

        debug!(method = %request.method, url = %request.url, status, "Request completed");
        Ok(HttpResponse {
            status,
            body,
            retry_after,
        })
    }
}

/// Extract a `Retry-After` value given in whole seconds
pub(crate) fn extract_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

//! HTTP transport used by the stores.
//!
//! The stores only depend on the [`Transport`] trait, so tests and hosts with
//! their own HTTP stack can plug in a different implementation. The bundled
//! [`HttpTransport`] is a thin JSON wrapper over `reqwest` with no retry or
//! auth logic.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Result, StorefrontError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

// ---------------------------------------------------------------------------
// TransportResponse
// ---------------------------------------------------------------------------

/// Outcome of a request that reached the server.
///
/// Non-2xx responses carry `error` (the status text) and never `data`.
#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    pub data: Option<Value>,
    pub error: Option<String>,
    pub status: Option<u16>,
    pub headers: HeaderMap,
}

impl TransportResponse {
    /// A successful response with a JSON body.
    pub fn success(status: u16, data: Value, headers: HeaderMap) -> Self {
        Self {
            data: Some(data),
            error: None,
            status: Some(status),
            headers,
        }
    }

    /// A non-2xx response.
    pub fn failure(status: u16, error: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            data: None,
            error: Some(error.into()),
            status: Some(status),
            headers,
        }
    }

    /// Header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Deserialize the body, turning an error response or a missing body into
    /// [`StorefrontError::Transport`].
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        if let Some(error) = &self.error {
            return Err(StorefrontError::Transport {
                status: self.status.unwrap_or(0),
                message: error.clone(),
            });
        }
        match &self.data {
            Some(data) => Ok(T::deserialize(data)?),
            None => Err(StorefrontError::Transport {
                status: self.status.unwrap_or(0),
                message: "Response had no body".to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a request against `path` (relative to the transport's base URL).
    ///
    /// Returns `Err` only when the server could not be reached or the body
    /// could not be decoded; HTTP error statuses come back as a
    /// [`TransportResponse`] with `error` set.
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<TransportResponse>;

    async fn get(&self, path: &str) -> Result<TransportResponse> {
        self.request(Method::Get, path, None).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<TransportResponse> {
        self.request(Method::Post, path, Some(body)).await
    }
}

// ---------------------------------------------------------------------------
// HttpTransport
// ---------------------------------------------------------------------------

/// JSON-over-HTTP transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    client: Client,
}

impl HttpTransport {
    /// Create a transport for `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self::with_client(base_url, client))
    }

    /// Create a transport around an existing client.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<TransportResponse> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(method = method.as_str(), %url, "Sending request");

        let mut req = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        }
        .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let headers = resp.headers().clone();

        if !status.is_success() {
            let text = status.canonical_reason().unwrap_or("Request failed");
            return Ok(TransportResponse::failure(status.as_u16(), text, headers));
        }

        let bytes = resp.bytes().await?;
        let data = if bytes.is_empty() {
            None
        } else {
            Some(serde_json::from_slice(&bytes)?)
        };
        Ok(TransportResponse {
            data,
            error: None,
            status: Some(status.as_u16()),
            headers,
        })
    }
}

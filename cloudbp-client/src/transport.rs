//! HTTP transport abstraction.
//!
//! The API client only knows how to shape requests and read replies. Sending
//! them, attaching credentials and enforcing timeouts is the transport's job.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};

use crate::config::ApiConfig;
use crate::error::{Error, Result};

/// Raw reply from the server: status plus undecoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiReply {
    pub status: u16,
    pub body: String,
}

impl ApiReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request and returns whatever the server answered.
///
/// `bearer` is sent as `Authorization: Bearer <token>` when present.
/// Non-success statuses are NOT errors at this layer; only failures to get a
/// reply at all are.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        bearer: Option<&str>,
    ) -> Result<ApiReply>;
}

/// reqwest-backed transport.
pub struct HttpTransport {
    http_client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        if config.timeout_secs == 0 {
            return Err(Error::InvalidInput(
                "request timeout must be at least one second".to_string(),
            ));
        }
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
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
        body: Option<serde_json::Value>,
        bearer: Option<&str>,
    ) -> Result<ApiReply> {
        let url = format!("{}{}", self.base_url, path);

        let mut request = self.http_client.request(method.clone(), &url);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(method = %method, path = %path, "Request failed: {}", e);
            Error::Transport(e.to_string())
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        tracing::debug!(method = %method, path = %path, status = status, "API request");

        Ok(ApiReply { status, body })
    }
}

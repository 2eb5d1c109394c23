//! HTTP transport to the generative-text backend.
//!
//! Failures are classified structurally here (timeout, rate limit, capacity,
//! unreachable) so the gateway's failover decision never has to sniff error
//! message text.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

/// The two backend endpoints the gateway speaks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Generate,
    Chat,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Generate => "/api/generate",
            Endpoint::Chat => "/api/chat",
        }
    }
}

/// A classified transport failure.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("rate limited by backend")]
    RateLimit,

    #[error("backend at capacity")]
    Capacity,

    #[error("backend unreachable: {0}")]
    Unreachable(String),

    #[error("backend error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed backend response: {0}")]
    Malformed(String),
}

impl TransportError {
    /// Whether this failure warrants one retry against the fallback model.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout | TransportError::RateLimit | TransportError::Capacity
        )
    }
}

/// The shared request primitive both `generate` and `chat` route through.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn attempt(
        &self,
        endpoint: Endpoint,
        payload: Map<String, Value>,
    ) -> Result<Value, TransportError>;
}

/// Reqwest-backed transport speaking the Ollama wire contract.
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    fn classify_status(status: u16, body: String) -> TransportError {
        match status {
            408 | 504 => TransportError::Timeout,
            429 => TransportError::RateLimit,
            503 | 529 => TransportError::Capacity,
            _ => TransportError::Api { status, body },
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn attempt(
        &self,
        endpoint: Endpoint,
        payload: Map<String, Value>,
    ) -> Result<Value, TransportError> {
        let url = format!("{}{}", self.base_url, endpoint.path());

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else if e.is_connect() {
                    TransportError::Unreachable(e.to_string())
                } else {
                    TransportError::Api {
                        status: 0,
                        body: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(status.as_u16(), body));
        }

        response
            .json()
            .await
            .map_err(|e| TransportError::Malformed(e.to_string()))
    }
}

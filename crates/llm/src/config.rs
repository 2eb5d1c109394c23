//! Gateway configuration.

use crate::gateway::LlmGateway;
use crate::transport::HttpTransport;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the generative-text backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Primary model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// Fallback model, tried once after a retryable primary failure. Defaults
    /// to the primary (which disables failover).
    #[serde(default)]
    pub fallback_model: Option<String>,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:11434".into()
}

fn default_model() -> String {
    "llama3.2".into()
}

fn default_timeout_ms() -> u64 {
    120_000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            fallback_model: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl LlmConfig {
    pub fn fallback(&self) -> &str {
        self.fallback_model.as_deref().unwrap_or(&self.model)
    }
}

/// Build a gateway over an HTTP transport from config.
pub fn build_gateway(config: &LlmConfig) -> Arc<LlmGateway> {
    let transport = Arc::new(HttpTransport::new(
        config.base_url.clone(),
        Duration::from_millis(config.timeout_ms),
    ));
    Arc::new(LlmGateway::new(
        transport,
        config.model.clone(),
        config.fallback().to_string(),
    ))
}

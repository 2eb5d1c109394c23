//! LLM gateway for Vitalis.
//!
//! Wraps an Ollama-style generative-text backend behind `generate` and `chat`
//! with sticky primary/fallback model failover. Transport failures are
//! classified structurally so failover decisions never parse error text.

pub mod config;
pub mod gateway;
pub mod transport;

pub use config::{build_gateway, LlmConfig};
pub use gateway::{ChatMessage, LlmGateway, Role};
pub use transport::{Endpoint, HttpTransport, Transport, TransportError};

//! The LLM gateway: primary/fallback model selection over a shared transport.
//!
//! # Failover state machine
//!
//! The gateway holds one process-wide sticky flag: which model (primary or
//! fallback) last succeeded. Every call starts from that flag. On a retryable
//! transport failure while the active model is not already the fallback, the
//! flag flips and the same request is retried exactly once against the
//! fallback; that outcome is returned as-is. The gateway never switches back
//! to primary on its own — once the fallback is in use it stays the default
//! until it fails in turn. This avoids repeatedly paying the primary's
//! timeout cost while it is degraded, at the price of under-using a
//! since-recovered primary.

use crate::transport::{Endpoint, Transport, TransportError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};
use vitalis_common::{Result, VitalisError};

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message in a chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

pub struct LlmGateway {
    transport: Arc<dyn Transport>,
    primary: String,
    fallback: String,
    /// Sticky failover flag shared by all in-flight calls. Deliberately a
    /// plain atomic rather than a lock: concurrent calls may race on it and
    /// the last writer wins, which is acceptable for a model preference.
    on_fallback: AtomicBool,
}

impl LlmGateway {
    pub fn new(
        transport: Arc<dyn Transport>,
        primary: impl Into<String>,
        fallback: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            primary: primary.into(),
            fallback: fallback.into(),
            on_fallback: AtomicBool::new(false),
        }
    }

    /// The model the next call will be sent to.
    pub fn active_model(&self) -> &str {
        if self.on_fallback.load(Ordering::SeqCst) {
            &self.fallback
        } else {
            &self.primary
        }
    }

    /// Send a request tagged with the active model, failing over once.
    async fn attempt_with_failover(
        &self,
        endpoint: Endpoint,
        mut payload: Map<String, Value>,
    ) -> std::result::Result<Value, TransportError> {
        let model = self.active_model().to_string();
        payload.insert("model".into(), Value::String(model.clone()));

        match self.transport.attempt(endpoint, payload.clone()).await {
            Ok(value) => Ok(value),
            Err(e) if e.is_retryable() && model != self.fallback => {
                warn!(model = %model, error = %e, "Retryable failure, switching to fallback model");
                // Flip before the retry: even if the fallback also fails, the
                // next call starts from the fallback.
                self.on_fallback.store(true, Ordering::SeqCst);
                info!(model = %self.fallback, "Retrying against fallback model");
                payload.insert("model".into(), Value::String(self.fallback.clone()));
                self.transport.attempt(endpoint, payload).await
            }
            Err(e) => Err(e),
        }
    }

    fn generate_payload(
        prompt: &str,
        system: Option<&str>,
        temperature: f32,
        max_tokens: u32,
    ) -> Map<String, Value> {
        let mut payload = Map::new();
        payload.insert("prompt".into(), Value::String(prompt.to_string()));
        payload.insert("stream".into(), Value::Bool(false));
        payload.insert(
            "options".into(),
            json!({ "temperature": temperature, "num_predict": max_tokens }),
        );
        if let Some(system) = system {
            payload.insert("system".into(), Value::String(system.to_string()));
        }
        payload
    }

    fn chat_payload(messages: &[ChatMessage], temperature: f32, max_tokens: u32) -> Map<String, Value> {
        let mut payload = Map::new();
        payload.insert(
            "messages".into(),
            serde_json::to_value(messages).unwrap_or(Value::Array(vec![])),
        );
        payload.insert("stream".into(), Value::Bool(false));
        payload.insert(
            "options".into(),
            json!({ "temperature": temperature, "num_predict": max_tokens }),
        );
        payload
    }

    /// Generate a text completion.
    ///
    /// Degrades to a human-readable error string on upstream failures; only
    /// transport-level unreachability surfaces as a hard error, since callers
    /// always expect text back.
    pub async fn generate(
        &self,
        prompt: &str,
        system: Option<&str>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String> {
        let payload = Self::generate_payload(prompt, system, temperature, max_tokens);
        match self.attempt_with_failover(Endpoint::Generate, payload).await {
            Ok(value) => Ok(value
                .get("response")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()),
            Err(TransportError::Unreachable(detail)) => {
                Err(VitalisError::GatewayUnreachable(detail))
            }
            Err(e) => {
                error!(error = %e, "Generation failed");
                Ok(format!("Error generating response: {e}"))
            }
        }
    }

    /// Chat completion with conversation history. Same degradation contract
    /// as [`generate`](Self::generate).
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String> {
        let payload = Self::chat_payload(messages, temperature, max_tokens);
        match self.attempt_with_failover(Endpoint::Chat, payload).await {
            Ok(value) => Ok(value
                .pointer("/message/content")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()),
            Err(TransportError::Unreachable(detail)) => {
                Err(VitalisError::GatewayUnreachable(detail))
            }
            Err(e) => {
                error!(error = %e, "Chat completion failed");
                Ok(format!("Error in chat completion: {e}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Scripted transport: pops one outcome per attempt and records the model
    /// each attempt was tagged with.
    struct ScriptedTransport {
        outcomes: Mutex<Vec<std::result::Result<Value, TransportError>>>,
        models_seen: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(outcomes: Vec<std::result::Result<Value, TransportError>>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes),
                models_seen: Mutex::new(Vec::new()),
            })
        }

        fn models(&self) -> Vec<String> {
            self.models_seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn attempt(
            &self,
            _endpoint: Endpoint,
            payload: Map<String, Value>,
        ) -> std::result::Result<Value, TransportError> {
            let model = payload
                .get("model")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            self.models_seen.lock().unwrap().push(model);
            self.outcomes.lock().unwrap().remove(0)
        }
    }

    fn ok_response(text: &str) -> std::result::Result<Value, TransportError> {
        Ok(json!({ "response": text }))
    }

    #[tokio::test]
    async fn success_on_primary_keeps_primary_active() {
        let transport = ScriptedTransport::new(vec![ok_response("hello")]);
        let gateway = LlmGateway::new(transport.clone(), "primary-model", "fallback-model");

        let text = gateway.generate("hi", None, 0.7, 100).await.unwrap();
        assert_eq!(text, "hello");
        assert_eq!(gateway.active_model(), "primary-model");
        assert_eq!(transport.models(), vec!["primary-model"]);
    }

    #[tokio::test]
    async fn timeout_fails_over_once_and_sticks() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::Timeout),
            ok_response("from fallback"),
            ok_response("second call"),
        ]);
        let gateway = LlmGateway::new(transport.clone(), "primary-model", "fallback-model");

        let text = gateway.generate("hi", None, 0.7, 100).await.unwrap();
        assert_eq!(text, "from fallback");
        assert_eq!(gateway.active_model(), "fallback-model");

        // A subsequent, independent call starts from the fallback.
        let text = gateway.generate("again", None, 0.7, 100).await.unwrap();
        assert_eq!(text, "second call");
        assert_eq!(
            transport.models(),
            vec!["primary-model", "fallback-model", "fallback-model"]
        );
    }

    #[tokio::test]
    async fn capacity_error_triggers_failover() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::Capacity),
            ok_response("ok"),
        ]);
        let gateway = LlmGateway::new(transport.clone(), "big", "small");

        let text = gateway.generate("hi", None, 0.7, 100).await.unwrap();
        assert_eq!(text, "ok");
        assert_eq!(transport.models(), vec!["big", "small"]);
    }

    #[tokio::test]
    async fn retryable_failure_on_fallback_is_not_retried() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::Timeout),
            Err(TransportError::Timeout),
            Err(TransportError::Timeout),
        ]);
        let gateway = LlmGateway::new(transport.clone(), "primary-model", "fallback-model");

        // Degrades to text, and only two attempts were made.
        let text = gateway.generate("hi", None, 0.7, 100).await.unwrap();
        assert!(text.starts_with("Error generating response"));
        assert_eq!(transport.models().len(), 2);

        // Next call starts on the fallback; a timeout there is final, with no
        // further retry.
        let text = gateway.generate("hi", None, 0.7, 100).await.unwrap();
        assert!(text.starts_with("Error generating response"));
        assert_eq!(
            transport.models(),
            vec!["primary-model", "fallback-model", "fallback-model"]
        );
    }

    #[tokio::test]
    async fn non_retryable_failure_does_not_switch_models() {
        let transport = ScriptedTransport::new(vec![Err(TransportError::Api {
            status: 400,
            body: "bad request".into(),
        })]);
        let gateway = LlmGateway::new(transport.clone(), "primary-model", "fallback-model");

        let text = gateway.generate("hi", None, 0.7, 100).await.unwrap();
        assert!(text.starts_with("Error generating response"));
        assert_eq!(gateway.active_model(), "primary-model");
        assert_eq!(transport.models(), vec!["primary-model"]);
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_hard_error() {
        let transport =
            ScriptedTransport::new(vec![Err(TransportError::Unreachable("refused".into()))]);
        let gateway = LlmGateway::new(transport, "primary-model", "fallback-model");

        let result = gateway.generate("hi", None, 0.7, 100).await;
        assert!(matches!(result, Err(VitalisError::GatewayUnreachable(_))));
    }

    #[tokio::test]
    async fn chat_extracts_message_content() {
        let transport = ScriptedTransport::new(vec![Ok(
            json!({ "message": { "role": "assistant", "content": "hi there" } }),
        )]);
        let gateway = LlmGateway::new(transport, "primary-model", "fallback-model");

        let messages = vec![ChatMessage {
            role: Role::User,
            content: "hello".into(),
        }];
        let text = gateway.chat(&messages, 0.7, 100).await.unwrap();
        assert_eq!(text, "hi there");
    }

    #[test]
    fn generate_payload_matches_wire_contract() {
        let payload = LlmGateway::generate_payload("analyze this", Some("be brief"), 0.6, 500);
        let json = Value::Object(payload);
        assert_eq!(json["prompt"], "analyze this");
        assert_eq!(json["system"], "be brief");
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_predict"], 500);
        let temp = json["options"]["temperature"].as_f64().unwrap();
        assert!((temp - 0.6).abs() < 0.001);
    }

    #[test]
    fn generate_payload_omits_system_when_none() {
        let payload = LlmGateway::generate_payload("p", None, 0.7, 100);
        assert!(!payload.contains_key("system"));
    }

    #[test]
    fn chat_payload_serializes_roles_lowercase() {
        let messages = vec![
            ChatMessage {
                role: Role::System,
                content: "sys".into(),
            },
            ChatMessage {
                role: Role::User,
                content: "hi".into(),
            },
        ];
        let payload = LlmGateway::chat_payload(&messages, 0.7, 100);
        let json = Value::Object(payload);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["stream"], false);
    }
}

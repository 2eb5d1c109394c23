//! Query orchestration: classify, dispatch, synthesize, record.

use crate::dispatch::Dispatcher;
use crate::intent::IntentClassifier;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{error, info};
use vitalis_common::{
    ConversationSink, ConversationTurn, DispatchResult, HistoryEntry, Intent, Result,
};
use vitalis_llm::LlmGateway;

const ANSWER_MAX_TOKENS: u32 = 2000;

/// Ordered keyword table mapping query text to a metric name. First match
/// wins, so broader keywords come after their more specific forms.
const METRIC_KEYWORDS: [(&str, &str); 9] = [
    ("heart rate", "heart_rate"),
    ("hr", "heart_rate"),
    ("pulse", "heart_rate"),
    ("sleep", "sleep_hours"),
    ("steps", "steps"),
    ("activity", "steps"),
    ("hrv", "hrv"),
    ("heart rate variability", "hrv"),
    ("calories", "calories"),
];

fn extract_metric(message: &str) -> &'static str {
    let message = message.to_lowercase();
    METRIC_KEYWORDS
        .iter()
        .find(|(keyword, _)| message.contains(keyword))
        .map(|(_, metric)| *metric)
        .unwrap_or("heart_rate")
}

fn extract_window(message: &str) -> &'static str {
    let message = message.to_lowercase();
    if message.contains("week") || message.contains("7 day") {
        "last_7_days"
    } else if message.contains("90 day") || message.contains("3 month") {
        "last_90_days"
    } else {
        "last_30_days"
    }
}

/// A dispatch outcome flattened to a JSON value for prompt assembly and the
/// response `data` field. Dispatch errors become error-shaped objects.
fn payload_value(result: DispatchResult) -> Value {
    match result {
        Ok(map) => Value::Object(map),
        Err(e) => json!({ "error": e.message }),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".into())
}

/// The answer returned to the API layer.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub agent: String,
    pub response: String,
    pub data: Value,
}

pub struct Orchestrator {
    dispatcher: Dispatcher,
    gateway: Arc<LlmGateway>,
    classifier: IntentClassifier,
    sink: Arc<dyn ConversationSink>,
}

impl Orchestrator {
    pub fn new(
        dispatcher: Dispatcher,
        gateway: Arc<LlmGateway>,
        sink: Arc<dyn ConversationSink>,
    ) -> Self {
        let classifier = IntentClassifier::new(gateway.clone());
        Self {
            dispatcher,
            gateway,
            classifier,
            sink,
        }
    }

    /// Answer one query: classify intent, run the matching branch, record
    /// both turns.
    pub async fn process_query(
        &self,
        caller_id: i64,
        message: &str,
        history: &[HistoryEntry],
    ) -> Result<QueryResponse> {
        let intent = self.classifier.classify(message).await?;

        match intent {
            Intent::DataAnalysis => self.handle_data_analysis(caller_id, message).await,
            Intent::MedicalQuestion => self.handle_medical_question(caller_id, message).await,
            Intent::Coaching => self.handle_coaching(caller_id, message, history).await,
            Intent::MultiAgent => self.handle_multi_agent(caller_id, message).await,
        }
    }

    async fn handle_data_analysis(&self, caller_id: i64, message: &str) -> Result<QueryResponse> {
        info!(caller_id, "Data Science branch processing query");

        let metric = extract_metric(message);
        let window = extract_window(message);

        let mut params = Map::new();
        params.insert("metric".into(), metric.into());
        params.insert("window".into(), window.into());
        let result = payload_value(
            self.dispatcher
                .call("analytics", "trend", params, caller_id)
                .await,
        );

        let response = match result.get("error").and_then(Value::as_str) {
            Some(error) => format!("I couldn't analyze that data: {error}"),
            None => {
                let prompt = format!(
                    r#"You are a data science health assistant. Explain these health trends to the user in a friendly, clear way:

User Query: {message}

Analysis Results:
    {analysis}

Provide:
1. Clear summary of the trend
2. What it means for their health
3. Any notable patterns

Keep it concise (3-4 sentences) and encouraging."#,
                    analysis = pretty(&result),
                );
                self.gateway
                    .generate(&prompt, None, 0.7, ANSWER_MAX_TOKENS)
                    .await?
            }
        };

        self.record(caller_id, message, &response, "ds").await;

        Ok(QueryResponse {
            agent: "Data Science".into(),
            response,
            data: result,
        })
    }

    async fn handle_medical_question(
        &self,
        caller_id: i64,
        message: &str,
    ) -> Result<QueryResponse> {
        info!(caller_id, "Domain Expert branch processing query");

        let concerns = payload_value(
            self.dispatcher
                .call("knowledge", "concern_check", Map::new(), caller_id)
                .await,
        );
        let context = payload_value(
            self.dispatcher
                .call("knowledge", "context", Map::new(), caller_id)
                .await,
        );

        let prompt = format!(
            r#"You are a knowledgeable health expert (not a doctor). Answer this health question:

User Question: {message}

User Context:
    {context}

Recent Health Concerns:
    {concerns}

Provide:
1. Clear, accurate health information
2. Context-aware insights
3. When to consult a healthcare provider

Important:
- This is educational information, not medical advice
- Always recommend consulting healthcare professionals for medical decisions
- Be empathetic and non-alarmist

Keep response clear and helpful (4-6 sentences)."#,
            context = pretty(&context),
            concerns = pretty(&concerns),
        );

        let response = self
            .gateway
            .generate(&prompt, None, 0.6, ANSWER_MAX_TOKENS)
            .await?;

        self.record(caller_id, message, &response, "de").await;

        Ok(QueryResponse {
            agent: "Domain Expert".into(),
            response,
            data: json!({ "concerns": concerns, "context": context }),
        })
    }

    async fn handle_coaching(
        &self,
        caller_id: i64,
        message: &str,
        history: &[HistoryEntry],
    ) -> Result<QueryResponse> {
        info!(caller_id, "Health Coach branch processing query");

        let goals = payload_value(
            self.dispatcher
                .call("coaching", "active_goals", Map::new(), caller_id)
                .await,
        );

        let active_goals = goals
            .get("active_goals")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let insights = json!({
            "note": "No automated coaching insights available; using active goals context.",
            "active_goals_count": active_goals.len(),
        });

        // Last three exchanges of context.
        let recent = &history[history.len().saturating_sub(6)..];
        let history_text = recent
            .iter()
            .map(|entry| format!("{}: {}", entry.role.as_str(), entry.content))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            r#"You are an empathetic health coach using motivational interviewing techniques.

Conversation History:
{history_text}

User Message: {message}

User's Active Goals:
{goals}

Coaching Insights:
{insights}

Respond using motivational interviewing principles:
1. Express empathy and understanding
2. Ask open-ended questions
3. Reflect what the user says
4. Support self-efficacy
5. Roll with resistance (don't argue)

Be warm, supportive, and collaborative. Help them find their own motivation.
Keep response natural and conversational (3-5 sentences)."#,
            goals = pretty(&Value::Array(active_goals)),
            insights = pretty(&insights),
        );

        let response = self
            .gateway
            .generate(&prompt, None, 0.8, ANSWER_MAX_TOKENS)
            .await?;

        self.record(caller_id, message, &response, "hc").await;

        Ok(QueryResponse {
            agent: "Health Coach".into(),
            response,
            data: json!({ "goals": goals, "insights": insights }),
        })
    }

    async fn handle_multi_agent(&self, caller_id: i64, message: &str) -> Result<QueryResponse> {
        info!(caller_id, "Multi-Agent branch processing query");

        // Sequential on purpose: the synthesis prompt is assembled in a
        // fixed order.
        let summary = payload_value(
            self.dispatcher
                .call("analytics", "weekly_summary", Map::new(), caller_id)
                .await,
        );
        let concerns = payload_value(
            self.dispatcher
                .call("knowledge", "concern_check", Map::new(), caller_id)
                .await,
        );
        let goals = payload_value(
            self.dispatcher
                .call("coaching", "active_goals", Map::new(), caller_id)
                .await,
        );

        let prompt = format!(
            r#"You are a comprehensive health assistant. Answer this query using insights from multiple perspectives:

User Query: {message}

Data Science Insights:
{summary}

Medical Expert Insights:
{concerns}

Health Coach Insights:
{goals}

Provide a holistic response that:
1. Addresses the query directly
2. Combines relevant insights from all sources
3. Offers actionable recommendations
4. Maintains an encouraging, supportive tone

Keep it comprehensive but concise (5-7 sentences)."#,
            summary = pretty(&summary),
            concerns = pretty(&concerns),
            goals = pretty(&goals),
        );

        let response = self
            .gateway
            .generate(&prompt, None, 0.7, ANSWER_MAX_TOKENS)
            .await?;

        self.record(caller_id, message, &response, "multi").await;

        Ok(QueryResponse {
            agent: "Multi-Agent".into(),
            response,
            data: json!({
                "data_science": summary,
                "domain_expert": concerns,
                "health_coach": goals,
            }),
        })
    }

    /// Record the exchange. Sink failures are logged and swallowed: losing a
    /// transcript entry must never lose the answer.
    async fn record(&self, caller_id: i64, message: &str, response: &str, tag: &str) {
        for turn in [
            ConversationTurn::user(caller_id, message, tag),
            ConversationTurn::assistant(caller_id, response, tag),
        ] {
            if let Err(e) = self.sink.append(turn).await {
                error!(error = %e, caller_id, "Failed to record conversation turn");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_extraction_first_match_wins() {
        assert_eq!(extract_metric("How is my heart rate trending?"), "heart_rate");
        assert_eq!(extract_metric("Has my sleep improved this month?"), "sleep_hours");
        assert_eq!(extract_metric("Am I getting enough steps?"), "steps");
        assert_eq!(extract_metric("What about my activity level?"), "steps");
        assert_eq!(extract_metric("Calories burned lately?"), "calories");
        assert_eq!(extract_metric("STEPS please"), "steps");
    }

    #[test]
    fn metric_extraction_defaults_to_heart_rate() {
        assert_eq!(extract_metric("How am I doing overall?"), "heart_rate");
    }

    #[test]
    fn window_extraction() {
        assert_eq!(extract_window("over the past week"), "last_7_days");
        assert_eq!(extract_window("show me 7 day trends"), "last_7_days");
        assert_eq!(extract_window("last 90 days"), "last_90_days");
        assert_eq!(extract_window("past 3 months"), "last_90_days");
        assert_eq!(extract_window("how am I sleeping"), "last_30_days");
    }

    #[test]
    fn payload_value_folds_errors_into_objects() {
        let err = vitalis_common::DispatchError::server_not_found("ds2");
        let value = payload_value(Err(err));
        assert!(value["error"].as_str().unwrap().contains("ds2"));

        let mut map = Map::new();
        map.insert("average".into(), json!(7.0));
        assert_eq!(payload_value(Ok(map))["average"], 7.0);
    }
}

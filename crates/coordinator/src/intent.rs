//! LLM-backed intent classification.

use std::sync::Arc;
use tracing::info;
use vitalis_common::{Intent, Result};
use vitalis_llm::LlmGateway;

const CLASSIFY_TEMPERATURE: f32 = 0.1;
const CLASSIFY_MAX_TOKENS: u32 = 2000;

/// Classifies a query into one of the four routing intents.
pub struct IntentClassifier {
    gateway: Arc<LlmGateway>,
}

impl IntentClassifier {
    pub fn new(gateway: Arc<LlmGateway>) -> Self {
        Self { gateway }
    }

    fn prompt(message: &str) -> String {
        format!(
            r#"Classify this health query into ONE category:

Categories:
- data_analysis: Questions about trends, statistics, patterns in health data
- medical_question: Medical interpretation, symptoms, conditions, health concerns
- coaching: Goal-setting, motivation, behavior change, lifestyle advice
- multi_agent: Complex queries requiring multiple perspectives

Query: "{message}"

Respond with ONLY the category name (no explanation)."#
        )
    }

    /// Parse a model answer into an intent, defaulting to `MultiAgent`.
    ///
    /// Case-insensitive substring match so that chatty answers ("The category
    /// is data_analysis.") still resolve.
    pub fn parse(answer: &str) -> Intent {
        let answer = answer.trim().to_lowercase();
        Intent::ALL
            .into_iter()
            .find(|intent| answer.contains(intent.wire_name()))
            .unwrap_or(Intent::MultiAgent)
    }

    pub async fn classify(&self, message: &str) -> Result<Intent> {
        let answer = self
            .gateway
            .generate(
                &Self::prompt(message),
                None,
                CLASSIFY_TEMPERATURE,
                CLASSIFY_MAX_TOKENS,
            )
            .await?;
        let intent = Self::parse(&answer);
        info!(intent = intent.wire_name(), "Classified intent");
        Ok(intent)
    }
}

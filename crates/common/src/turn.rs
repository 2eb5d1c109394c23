//! Conversation turn types and the persistence-layer sink interface.

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Role of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

/// One persisted conversation turn. The core creates two of these per query
/// (user, assistant) and hands them to the sink; it never reads them back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub caller_id: i64,
    pub role: TurnRole,
    pub content: String,
    /// Short tag naming the branch that produced the answer (ds, de, hc, multi).
    pub domain_tag: String,
}

impl ConversationTurn {
    pub fn user(caller_id: i64, content: impl Into<String>, domain_tag: impl Into<String>) -> Self {
        Self {
            caller_id,
            role: TurnRole::User,
            content: content.into(),
            domain_tag: domain_tag.into(),
        }
    }

    pub fn assistant(
        caller_id: i64,
        content: impl Into<String>,
        domain_tag: impl Into<String>,
    ) -> Self {
        Self {
            caller_id,
            role: TurnRole::Assistant,
            content: content.into(),
            domain_tag: domain_tag.into(),
        }
    }
}

/// A prior exchange handed to the orchestrator by the caller, used as
/// conversation context in the coaching branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: TurnRole,
    pub content: String,
}

/// Persistence-layer sink for conversation turns.
///
/// Implemented by the storage layer, called by the core. Failures must never
/// abort answer delivery: the core logs and discards them.
#[async_trait]
pub trait ConversationSink: Send + Sync {
    async fn append(&self, turn: ConversationTurn) -> Result<()>;
}

//! Dispatch types shared between the coordinator and capability crates.
//!
//! A dispatch failure is always data (`DispatchError`), never a panic or a
//! propagated exception: the orchestrator folds these messages directly into
//! user-facing answers.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A fixed capability category grouping related operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Analytics,
    Knowledge,
    Coaching,
}

impl Domain {
    /// All domains, in registration order.
    pub const ALL: [Domain; 3] = [Domain::Analytics, Domain::Knowledge, Domain::Coaching];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Analytics => "analytics",
            Domain::Knowledge => "knowledge",
            Domain::Coaching => "coaching",
        }
    }

    /// Look a domain up by its lowercase name.
    pub fn from_name(name: &str) -> Option<Domain> {
        Domain::ALL.into_iter().find(|d| d.as_str() == name)
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-query intent produced by the classifier. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    DataAnalysis,
    MedicalQuestion,
    Coaching,
    MultiAgent,
}

impl Intent {
    /// All intents, with `MultiAgent` last as the catch-all.
    pub const ALL: [Intent; 4] = [
        Intent::DataAnalysis,
        Intent::MedicalQuestion,
        Intent::Coaching,
        Intent::MultiAgent,
    ];

    /// The identifier the classifier prompt and response parser use.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Intent::DataAnalysis => "data_analysis",
            Intent::MedicalQuestion => "medical_question",
            Intent::Coaching => "coaching",
            Intent::MultiAgent => "multi_agent",
        }
    }
}

/// Failure taxonomy for tool dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchErrorKind {
    /// Unknown domain.
    ServerNotFound,
    /// Unknown operation within a known domain.
    ToolNotFound,
    /// Handle invoked with incompatible parameters.
    ParameterMismatch,
    /// Handle ran but found nothing for the caller.
    NoData,
    /// Gateway-level timeout.
    UpstreamTimeout,
    /// Gateway-level capacity/availability failure.
    UpstreamUnavailable,
    /// Uncaught failure inside a handle.
    Internal,
}

/// A dispatch failure, returned as data across the dispatch boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchError {
    pub kind: DispatchErrorKind,
    pub message: String,
}

impl DispatchError {
    pub fn new(kind: DispatchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn server_not_found(domain: &str) -> Self {
        let available: Vec<&str> = Domain::ALL.iter().map(|d| d.as_str()).collect();
        Self::new(
            DispatchErrorKind::ServerNotFound,
            format!(
                "Domain '{domain}' not found. Available domains: {available:?}"
            ),
        )
    }

    pub fn tool_not_found(domain: Domain, operation: &str, available: &[String]) -> Self {
        Self::new(
            DispatchErrorKind::ToolNotFound,
            format!(
                "Operation '{operation}' not found on domain '{domain}'. Available operations: {available:?}"
            ),
        )
    }

    pub fn parameter_mismatch(operation: &str, detail: impl std::fmt::Display) -> Self {
        Self::new(
            DispatchErrorKind::ParameterMismatch,
            format!("Parameter mismatch for {operation}: {detail}"),
        )
    }

    pub fn internal(operation: &str, detail: impl std::fmt::Display) -> Self {
        Self::new(
            DispatchErrorKind::Internal,
            format!("Error calling operation {operation}: {detail}"),
        )
    }
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Result of a tool dispatch. An `Ok` map that carries an `"error"` key is a
/// recoverable, error-shaped payload from the handle itself (e.g. no data for
/// the caller), not a protocol violation.
pub type DispatchResult = std::result::Result<Map<String, Value>, DispatchError>;

/// Deserialize a tool's parameter mapping into its typed parameter struct.
///
/// A failure here is always `ParameterMismatch`, never a hard error.
pub fn parse_params<T: DeserializeOwned>(
    operation: &str,
    params: Value,
) -> std::result::Result<T, DispatchError> {
    serde_json::from_value(params).map_err(|e| DispatchError::parameter_mismatch(operation, e))
}

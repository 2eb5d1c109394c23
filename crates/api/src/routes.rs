//! HTTP route handlers for the API.

use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use vitalis_common::{Domain, HistoryEntry, VitalisError};
use vitalis_coordinator::QueryResponse;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub active_model: String,
    pub degraded_domains: Vec<String>,
}

/// Health check endpoint.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let degraded: Vec<String> = Domain::ALL
        .iter()
        .filter(|d| state.startup.is_degraded(**d))
        .map(|d| d.to_string())
        .collect();

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.uptime_seconds(),
        active_model: state.gateway.active_model().to_string(),
        degraded_domains: degraded,
    })
}

/// Query request body.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub caller_id: i64,
    pub message: String,
    #[serde(default)]
    pub conversation_history: Vec<HistoryEntry>,
}

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    #[serde(skip)]
    status: StatusCode,
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

impl From<VitalisError> for ErrorResponse {
    fn from(e: VitalisError) -> Self {
        match e {
            VitalisError::GatewayUnreachable(_) => Self {
                error: e.to_string(),
                code: "GATEWAY_UNREACHABLE",
                status: StatusCode::BAD_GATEWAY,
            },
            other => Self {
                error: other.to_string(),
                code: "QUERY_ERROR",
                status: StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

/// Answer a health query.
pub async fn query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ErrorResponse> {
    tracing::info!(
        caller_id = request.caller_id,
        message_preview = %request.message.chars().take(50).collect::<String>(),
        "Received query"
    );

    let response = state
        .orchestrator
        .process_query(
            request.caller_id,
            &request.message,
            &request.conversation_history,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Query processing failed");
            ErrorResponse::from(e)
        })?;

    Ok(Json(response))
}

//! Application state for the API server.

use std::sync::Arc;
use vitalis_coordinator::{Orchestrator, StartupReport};
use vitalis_llm::LlmGateway;

/// Shared application state for the API server.
pub struct AppState {
    /// The orchestrator that answers all queries.
    pub orchestrator: Arc<Orchestrator>,

    /// The gateway, exposed for health reporting.
    pub gateway: Arc<LlmGateway>,

    /// Per-domain registration outcome captured at startup.
    pub startup: StartupReport,

    /// Server start time (for health checks).
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        gateway: Arc<LlmGateway>,
        startup: StartupReport,
    ) -> Self {
        Self {
            orchestrator,
            gateway,
            startup,
            start_time: std::time::Instant::now(),
        }
    }

    /// Get the uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

//! Query coordination for Vitalis.
//!
//! Wires the capability registry, the dispatcher with its demo-identity
//! retry, the LLM-backed intent classifier, and the per-intent orchestration
//! branches.

pub mod config;
pub mod dispatch;
pub mod intent;
pub mod orchestrator;
pub mod registry;

pub use config::CoordinatorConfig;
pub use dispatch::{DemoFallbackPolicy, Dispatcher};
pub use intent::IntentClassifier;
pub use orchestrator::{Orchestrator, QueryResponse};
pub use registry::{CapabilityRegistry, StartupReport};

use std::sync::Arc;
use vitalis_common::Domain;
use vitalis_store::HealthStore;

/// Register the three capability domains over a shared store.
pub fn build_registry(store: Arc<dyn HealthStore>) -> CapabilityRegistry {
    let mut registry = CapabilityRegistry::new();
    let analytics = store.clone();
    registry.register_domain(Domain::Analytics, move || {
        Ok(vitalis_agents::analytics::tools(analytics))
    });
    let knowledge = store.clone();
    registry.register_domain(Domain::Knowledge, move || {
        Ok(vitalis_agents::knowledge::tools(knowledge))
    });
    registry.register_domain(Domain::Coaching, move || {
        Ok(vitalis_agents::coaching::tools(store))
    });
    registry
}

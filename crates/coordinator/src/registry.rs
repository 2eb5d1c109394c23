//! Capability registry.
//!
//! Operations are registered per domain at startup and the registry is
//! immutable afterwards. A domain whose builder fails is left empty rather
//! than aborting startup: the remaining domains stay usable.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};
use vitalis_common::{Domain, Result, Tool};

/// Startup outcome per domain.
#[derive(Debug, Clone, Default)]
pub struct StartupReport {
    pub ready: Vec<Domain>,
    pub degraded: Vec<(Domain, String)>,
}

impl StartupReport {
    pub fn is_degraded(&self, domain: Domain) -> bool {
        self.degraded.iter().any(|(d, _)| *d == domain)
    }

    pub fn all_ready(&self) -> bool {
        self.degraded.is_empty()
    }
}

/// Immutable lookup from (domain, operation) to a registered handle.
#[derive(Default)]
pub struct CapabilityRegistry {
    tools: HashMap<(Domain, String), Arc<dyn Tool>>,
    report: StartupReport,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a domain's operations.
    ///
    /// A builder failure is caught and logged; the domain stays empty and is
    /// recorded as degraded in the startup report.
    pub fn register_domain<F>(&mut self, domain: Domain, builder: F)
    where
        F: FnOnce() -> Result<Vec<Arc<dyn Tool>>>,
    {
        match builder() {
            Ok(tools) => {
                info!(
                    domain = %domain,
                    operations = tools.len(),
                    "Registered capability domain"
                );
                for tool in tools {
                    self.tools.insert((domain, tool.name().to_string()), tool);
                }
                self.report.ready.push(domain);
            }
            Err(e) => {
                error!(domain = %domain, error = %e, "Failed to register capability domain");
                self.report.degraded.push((domain, e.to_string()));
            }
        }
    }

    /// Pure lookup of a registered operation.
    pub fn resolve(&self, domain: Domain, operation: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(&(domain, operation.to_string())).cloned()
    }

    /// Operation names registered under a domain, sorted for stable
    /// diagnostics.
    pub fn operations(&self, domain: Domain) -> Vec<String> {
        let mut names: Vec<String> = self
            .tools
            .keys()
            .filter(|(d, _)| *d == domain)
            .map(|(_, name)| name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn startup_report(&self) -> &StartupReport {
        &self.report
    }
}

//! Tool dispatch with the demo-identity retry.
//!
//! The dispatcher is stateless: resolution against the registry, one invoke,
//! and at most one retry with a demo caller substituted when the handle
//! reports it has no data for the requested caller.

use crate::registry::CapabilityRegistry;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};
use vitalis_common::{DispatchError, DispatchResult, Domain};
use vitalis_store::{HealthStore, DEMO_NAMES};

/// Policy for retrying a no-data result against a demo caller.
#[derive(Debug, Clone)]
pub struct DemoFallbackPolicy {
    pub enabled: bool,
    /// Names resolved first, in order, before falling back to any caller
    /// with metric data.
    pub known_names: Vec<String>,
}

impl Default for DemoFallbackPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            known_names: DEMO_NAMES.iter().map(|n| n.to_string()).collect(),
        }
    }
}

impl DemoFallbackPolicy {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// An `Ok` payload whose error text says the caller has no data.
fn is_no_data_payload(payload: &Map<String, Value>) -> bool {
    payload
        .get("error")
        .and_then(Value::as_str)
        .map(|text| {
            let text = text.to_lowercase();
            text.contains("no data") && text.contains("caller")
        })
        .unwrap_or(false)
}

pub struct Dispatcher {
    registry: Arc<CapabilityRegistry>,
    store: Arc<dyn HealthStore>,
    demo_policy: DemoFallbackPolicy,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<CapabilityRegistry>,
        store: Arc<dyn HealthStore>,
        demo_policy: DemoFallbackPolicy,
    ) -> Self {
        Self {
            registry,
            store,
            demo_policy,
        }
    }

    /// Invoke `operation` on `domain` for `caller_id`.
    ///
    /// Unknown domains and operations come back as data, never as panics or
    /// hard errors. `caller_id` is injected into the parameter mapping under
    /// `"caller_id"`, overriding any value already present.
    pub async fn call(
        &self,
        domain: &str,
        operation: &str,
        mut params: Map<String, Value>,
        caller_id: i64,
    ) -> DispatchResult {
        let domain = match Domain::from_name(domain) {
            Some(d) => d,
            None => {
                warn!(domain, "Dispatch to unknown domain");
                return Err(DispatchError::server_not_found(domain));
            }
        };

        let tool = match self.registry.resolve(domain, operation) {
            Some(t) => t,
            None => {
                warn!(domain = %domain, operation, "Dispatch to unknown operation");
                return Err(DispatchError::tool_not_found(
                    domain,
                    operation,
                    &self.registry.operations(domain),
                ));
            }
        };

        params.insert("caller_id".into(), caller_id.into());
        debug!(domain = %domain, operation, caller_id, "Invoking operation");
        let result = tool.invoke(Value::Object(params.clone())).await?;

        if self.demo_policy.enabled && is_no_data_payload(&result) {
            if let Some(demo_id) = self.demo_caller_id().await {
                if demo_id != caller_id {
                    warn!(
                        caller_id,
                        demo_id, operation, "No data for caller, retrying with demo caller"
                    );
                    params.insert("caller_id".into(), demo_id.into());
                    return tool.invoke(Value::Object(params)).await;
                }
            }
        }

        info!(domain = %domain, operation, "Operation completed");
        Ok(result)
    }

    /// A demo caller with data: known demo names first, then any caller with
    /// metric samples.
    async fn demo_caller_id(&self) -> Option<i64> {
        match self.store.caller_by_name(&self.demo_policy.known_names).await {
            Ok(Some(id)) => return Some(id),
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "Demo caller lookup failed");
                return None;
            }
        }
        self.store.any_caller_with_samples().await.ok().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vitalis_common::{DispatchErrorKind, Tool};
    use vitalis_store::{MemoryStore, MetricSample, UserProfile};

    /// Reports no data unless invoked for `data_caller`, counting invocations.
    struct NoDataTool {
        data_caller: i64,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Tool for NoDataTool {
        fn domain(&self) -> Domain {
            Domain::Analytics
        }

        fn name(&self) -> &str {
            "trend"
        }

        async fn invoke(&self, params: Value) -> DispatchResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let caller = params["caller_id"].as_i64().unwrap();
            if caller == self.data_caller {
                let mut map = Map::new();
                map.insert("average".into(), json!(7.2));
                map.insert("served_caller".into(), json!(caller));
                Ok(map)
            } else {
                let mut map = Map::new();
                map.insert(
                    "error".into(),
                    json!(format!("No data found for caller {caller}")),
                );
                Ok(map)
            }
        }
    }

    async fn demo_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .add_profile(UserProfile {
                id: 1,
                name: "Active Alice".into(),
                age: 32,
                gender: "female".into(),
            })
            .await;
        store
            .add_sample(
                1,
                MetricSample {
                    date: chrono::Utc::now(),
                    heart_rate: Some(58.0),
                    steps: None,
                    sleep_hours: None,
                    hrv: None,
                    calories: None,
                },
            )
            .await;
        store
    }

    fn dispatcher_with(
        tool: Arc<NoDataTool>,
        store: Arc<MemoryStore>,
        policy: DemoFallbackPolicy,
    ) -> Dispatcher {
        let mut registry = CapabilityRegistry::new();
        let registered = tool;
        registry.register_domain(Domain::Analytics, move || {
            Ok(vec![registered as Arc<dyn Tool>])
        });
        Dispatcher::new(Arc::new(registry), store, policy)
    }

    #[tokio::test]
    async fn unknown_domain_is_server_not_found() {
        let store = Arc::new(MemoryStore::new());
        let dispatcher = Dispatcher::new(
            Arc::new(CapabilityRegistry::new()),
            store,
            DemoFallbackPolicy::default(),
        );

        let err = dispatcher
            .call("ds2", "trend", Map::new(), 1)
            .await
            .unwrap_err();
        assert_eq!(err.kind, DispatchErrorKind::ServerNotFound);
        assert!(err.message.contains("analytics"));
        assert!(err.message.contains("coaching"));
    }

    #[tokio::test]
    async fn unknown_operation_is_tool_not_found() {
        let tool = Arc::new(NoDataTool {
            data_caller: 1,
            calls: AtomicUsize::new(0),
        });
        let store = demo_store().await;
        let dispatcher = dispatcher_with(tool, store, DemoFallbackPolicy::default());

        let err = dispatcher
            .call("analytics", "forecast", Map::new(), 1)
            .await
            .unwrap_err();
        assert_eq!(err.kind, DispatchErrorKind::ToolNotFound);
        assert!(err.message.contains("trend"));
    }

    #[tokio::test]
    async fn no_data_retries_once_with_demo_caller() {
        let tool = Arc::new(NoDataTool {
            data_caller: 1,
            calls: AtomicUsize::new(0),
        });
        let store = demo_store().await;
        let dispatcher =
            dispatcher_with(tool.clone(), store, DemoFallbackPolicy::default());

        let result = dispatcher
            .call("analytics", "trend", Map::new(), 42)
            .await
            .unwrap();
        assert_eq!(result["served_caller"], 1);
        assert_eq!(tool.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn no_data_never_retries_when_caller_is_demo() {
        let tool = Arc::new(NoDataTool {
            data_caller: 99,
            calls: AtomicUsize::new(0),
        });
        let store = demo_store().await;
        let dispatcher =
            dispatcher_with(tool.clone(), store, DemoFallbackPolicy::default());

        // Caller 1 resolves as the demo identity, so the no-data payload is
        // returned as-is after a single invoke.
        let result = dispatcher
            .call("analytics", "trend", Map::new(), 1)
            .await
            .unwrap();
        assert!(result.contains_key("error"));
        assert_eq!(tool.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn disabled_policy_suppresses_the_retry() {
        let tool = Arc::new(NoDataTool {
            data_caller: 1,
            calls: AtomicUsize::new(0),
        });
        let store = demo_store().await;
        let dispatcher = dispatcher_with(tool.clone(), store, DemoFallbackPolicy::disabled());

        let result = dispatcher
            .call("analytics", "trend", Map::new(), 42)
            .await
            .unwrap();
        assert!(result.contains_key("error"));
        assert_eq!(tool.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_demo_identity_means_no_retry() {
        let tool = Arc::new(NoDataTool {
            data_caller: 1,
            calls: AtomicUsize::new(0),
        });
        let empty = Arc::new(MemoryStore::new());
        let dispatcher = dispatcher_with(tool.clone(), empty, DemoFallbackPolicy::default());

        let result = dispatcher
            .call("analytics", "trend", Map::new(), 42)
            .await
            .unwrap();
        assert!(result.contains_key("error"));
        assert_eq!(tool.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn no_data_heuristic_requires_both_phrases() {
        let mut payload = Map::new();
        payload.insert("error".into(), json!("No Data Found For Caller 7"));
        assert!(is_no_data_payload(&payload));

        payload.insert("error".into(), json!("no sleep_hours data available"));
        assert!(!is_no_data_payload(&payload));

        payload.insert("error".into(), json!("caller 7 is unknown"));
        assert!(!is_no_data_payload(&payload));

        payload.remove("error");
        assert!(!is_no_data_payload(&payload));
    }
}

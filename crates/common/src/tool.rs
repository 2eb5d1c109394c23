//! The invocable-operation trait.
//!
//! Defined in `vitalis-common` so that both the coordinator and the
//! capability crates can reference it without circular dependencies.

use crate::dispatch::{DispatchResult, Domain};
use async_trait::async_trait;
use serde_json::Value;

/// A registered, invocable operation within a domain.
///
/// Handles are registered once at startup and immutable thereafter. A handle
/// is only ever invoked with a parameter mapping; incompatible parameters are
/// captured as `ParameterMismatch` by the implementation, never panicked on.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The domain this operation belongs to.
    fn domain(&self) -> Domain;

    /// The operation identifier, unique within its domain.
    fn name(&self) -> &str;

    /// Invoke the operation with a parameter mapping.
    ///
    /// Implementations may return an `Ok` map carrying an `"error"` key for
    /// recoverable, handle-level conditions such as "no data for this caller".
    async fn invoke(&self, params: Value) -> DispatchResult;
}

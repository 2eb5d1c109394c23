//! Capability implementations for the Vitalis router.
//!
//! Each domain module exposes a `tools` builder returning the [`Tool`]
//! implementations for that capability set, all backed by a shared
//! [`HealthStore`].
//!
//! [`Tool`]: vitalis_common::Tool
//! [`HealthStore`]: vitalis_store::HealthStore

pub mod analytics;
pub mod coaching;
pub mod knowledge;
pub mod stats;

use serde_json::{Map, Value};

/// Unwrap a `json!({..})` literal into the map tools return.
///
/// Panics on non-object input, which only a malformed literal can produce.
pub(crate) fn obj(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => unreachable!("capability payloads are objects, got {other}"),
    }
}

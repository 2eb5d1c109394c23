//! Health data storage for Vitalis.
//!
//! Defines the `HealthStore` trait the capability tools read through, record
//! types for profiles, wearable samples, medical records, and goals, plus an
//! in-memory implementation with demo seeding for evaluation sessions.

pub mod demo;
pub mod store;
pub mod types;

pub use demo::{seed_demo_data, DEMO_NAMES};
pub use store::{ConversationLog, HealthStore, MemoryStore};
pub use types::{
    GoalStatus, HealthGoal, MedicalRecord, MetricSample, NewGoal, UserProfile, METRICS,
};

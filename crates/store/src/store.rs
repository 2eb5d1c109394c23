//! The health data store interface and its in-memory implementation.

use crate::types::{HealthGoal, GoalStatus, MedicalRecord, MetricSample, NewGoal, UserProfile};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use vitalis_common::{ConversationSink, ConversationTurn, Result};

/// Read/write access to persisted health entities.
///
/// The routing core and the capability tools depend only on this trait; the
/// surrounding service decides what backs it.
#[async_trait]
pub trait HealthStore: Send + Sync {
    async fn profile(&self, caller_id: i64) -> Result<Option<UserProfile>>;

    /// Wearable samples for a caller on or after `since`, ordered by date.
    async fn samples_since(&self, caller_id: i64, since: DateTime<Utc>)
        -> Result<Vec<MetricSample>>;

    async fn medical_records(&self, caller_id: i64) -> Result<Vec<MedicalRecord>>;

    async fn active_goals(&self, caller_id: i64) -> Result<Vec<HealthGoal>>;

    async fn goal(&self, caller_id: i64, goal_id: i64) -> Result<Option<HealthGoal>>;

    async fn create_goal(&self, goal: NewGoal) -> Result<HealthGoal>;

    /// First caller whose name matches any of `names`, in profile order.
    async fn caller_by_name(&self, names: &[String]) -> Result<Option<i64>>;

    /// Any caller with at least one recorded metric sample.
    async fn any_caller_with_samples(&self) -> Result<Option<i64>>;
}

#[derive(Default)]
struct Inner {
    profiles: Vec<UserProfile>,
    samples: HashMap<i64, Vec<MetricSample>>,
    records: HashMap<i64, Vec<MedicalRecord>>,
    goals: Vec<HealthGoal>,
    next_goal_id: i64,
}

/// In-memory `HealthStore`, used for demos and tests.
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                next_goal_id: 1,
                ..Inner::default()
            }),
        }
    }

    pub async fn add_profile(&self, profile: UserProfile) {
        self.inner.write().await.profiles.push(profile);
    }

    pub async fn add_sample(&self, caller_id: i64, sample: MetricSample) {
        self.inner
            .write()
            .await
            .samples
            .entry(caller_id)
            .or_default()
            .push(sample);
    }

    pub async fn add_record(&self, caller_id: i64, record: MedicalRecord) {
        self.inner
            .write()
            .await
            .records
            .entry(caller_id)
            .or_default()
            .push(record);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HealthStore for MemoryStore {
    async fn profile(&self, caller_id: i64) -> Result<Option<UserProfile>> {
        let inner = self.inner.read().await;
        Ok(inner.profiles.iter().find(|p| p.id == caller_id).cloned())
    }

    async fn samples_since(
        &self,
        caller_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<MetricSample>> {
        let inner = self.inner.read().await;
        let mut samples: Vec<MetricSample> = inner
            .samples
            .get(&caller_id)
            .map(|s| s.iter().filter(|sm| sm.date >= since).cloned().collect())
            .unwrap_or_default();
        samples.sort_by_key(|s| s.date);
        Ok(samples)
    }

    async fn medical_records(&self, caller_id: i64) -> Result<Vec<MedicalRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.records.get(&caller_id).cloned().unwrap_or_default())
    }

    async fn active_goals(&self, caller_id: i64) -> Result<Vec<HealthGoal>> {
        let inner = self.inner.read().await;
        Ok(inner
            .goals
            .iter()
            .filter(|g| g.caller_id == caller_id && g.status == GoalStatus::Active)
            .cloned()
            .collect())
    }

    async fn goal(&self, caller_id: i64, goal_id: i64) -> Result<Option<HealthGoal>> {
        let inner = self.inner.read().await;
        Ok(inner
            .goals
            .iter()
            .find(|g| g.id == goal_id && g.caller_id == caller_id)
            .cloned())
    }

    async fn create_goal(&self, goal: NewGoal) -> Result<HealthGoal> {
        let mut inner = self.inner.write().await;
        let id = inner.next_goal_id;
        inner.next_goal_id += 1;
        let created = HealthGoal {
            id,
            caller_id: goal.caller_id,
            goal_type: goal.goal_type,
            description: goal.description,
            target_value: goal.target_value,
            current_value: goal.current_value,
            timeline_days: goal.timeline_days,
            status: GoalStatus::Active,
            created_at: Utc::now(),
        };
        inner.goals.push(created.clone());
        Ok(created)
    }

    async fn caller_by_name(&self, names: &[String]) -> Result<Option<i64>> {
        let inner = self.inner.read().await;
        Ok(inner
            .profiles
            .iter()
            .find(|p| names.iter().any(|n| n == &p.name))
            .map(|p| p.id))
    }

    async fn any_caller_with_samples(&self) -> Result<Option<i64>> {
        let inner = self.inner.read().await;
        Ok(inner
            .profiles
            .iter()
            .find(|p| {
                inner
                    .samples
                    .get(&p.id)
                    .is_some_and(|s| s.iter().any(|sm| sm.has_any_metric()))
            })
            .map(|p| p.id))
    }
}

/// In-memory conversation log. Append-only; the core never reads it back.
#[derive(Default)]
pub struct ConversationLog {
    turns: RwLock<Vec<ConversationTurn>>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn turns(&self) -> Vec<ConversationTurn> {
        self.turns.read().await.clone()
    }
}

#[async_trait]
impl ConversationSink for ConversationLog {
    async fn append(&self, turn: ConversationTurn) -> Result<()> {
        self.turns.write().await.push(turn);
        Ok(())
    }
}

//! Coaching capability - goal creation with milestones, active goal listing,
//! and progress tracking.

use crate::obj;
use crate::stats;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;
use vitalis_common::{parse_params, DispatchError, DispatchResult, Domain, Tool};
use vitalis_store::{HealthStore, NewGoal};

const MILESTONE_STEPS: i64 = 4;

/// Build all coaching tools over the given store.
pub fn tools(store: Arc<dyn HealthStore>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(CreateGoalTool {
            store: store.clone(),
        }),
        Arc::new(ActiveGoalsTool {
            store: store.clone(),
        }),
        Arc::new(ProgressTool { store }),
    ]
}

/// Seven-day average of the metric tracked by a goal type, if any.
async fn baseline(
    store: &Arc<dyn HealthStore>,
    caller_id: i64,
    goal_type: &str,
    since: chrono::DateTime<Utc>,
    op: &str,
) -> Result<Option<f64>, DispatchError> {
    let metric = match goal_type {
        "sleep" => "sleep_hours",
        "exercise" => "steps",
        _ => return Ok(None),
    };
    let samples = store
        .samples_since(caller_id, since)
        .await
        .map_err(|e| DispatchError::internal(op, e))?;
    let values: Vec<f64> = samples.iter().filter_map(|s| s.metric(metric)).collect();
    Ok(if values.is_empty() {
        None
    } else {
        Some(stats::mean(&values))
    })
}

fn milestones(current: Option<f64>, target: Option<f64>, days: i64) -> Vec<Value> {
    let (current, target) = match (current, target) {
        (Some(c), Some(t)) => (c, t),
        _ => return Vec::new(),
    };

    let increment = (target - current) / MILESTONE_STEPS as f64;
    (1..=MILESTONE_STEPS)
        .map(|i| {
            let value = stats::round1(current + increment * i as f64);
            let day = days * i / MILESTONE_STEPS;
            json!({
                "day": day,
                "target_value": value,
                "description": format!("Reach {value} by day {day}"),
            })
        })
        .collect()
}

fn default_timeline() -> i64 {
    30
}

#[derive(Deserialize)]
struct CreateGoalParams {
    caller_id: i64,
    goal_type: String,
    description: String,
    #[serde(default)]
    target_value: Option<f64>,
    #[serde(default = "default_timeline")]
    timeline_days: i64,
}

/// Create a goal, seeding its baseline from the last week of data.
pub struct CreateGoalTool {
    store: Arc<dyn HealthStore>,
}

#[async_trait]
impl Tool for CreateGoalTool {
    fn domain(&self) -> Domain {
        Domain::Coaching
    }

    fn name(&self) -> &str {
        "create_goal"
    }

    async fn invoke(&self, params: Value) -> DispatchResult {
        let params: CreateGoalParams = parse_params(self.name(), params)?;
        let since = Utc::now() - Duration::days(7);

        let current_value = baseline(
            &self.store,
            params.caller_id,
            &params.goal_type,
            since,
            self.name(),
        )
        .await?;

        let goal = self
            .store
            .create_goal(NewGoal {
                caller_id: params.caller_id,
                goal_type: params.goal_type.clone(),
                description: params.description.clone(),
                target_value: params.target_value,
                current_value,
                timeline_days: params.timeline_days,
            })
            .await
            .map_err(|e| DispatchError::internal(self.name(), e))?;

        debug!(goal_id = goal.id, goal_type = %goal.goal_type, "Goal created");

        Ok(obj(json!({
            "goal_id": goal.id,
            "goal_type": goal.goal_type,
            "description": goal.description,
            "current_value": current_value.map(stats::round1),
            "target_value": params.target_value,
            "timeline_days": goal.timeline_days,
            "created_at": goal.created_at.to_rfc3339(),
            "milestones": milestones(current_value, params.target_value, goal.timeline_days),
        })))
    }
}

#[derive(Deserialize)]
struct ActiveGoalsParams {
    caller_id: i64,
}

/// List a caller's active goals with remaining days.
pub struct ActiveGoalsTool {
    store: Arc<dyn HealthStore>,
}

#[async_trait]
impl Tool for ActiveGoalsTool {
    fn domain(&self) -> Domain {
        Domain::Coaching
    }

    fn name(&self) -> &str {
        "active_goals"
    }

    async fn invoke(&self, params: Value) -> DispatchResult {
        let params: ActiveGoalsParams = parse_params(self.name(), params)?;

        let goals = self
            .store
            .active_goals(params.caller_id)
            .await
            .map_err(|e| DispatchError::internal(self.name(), e))?;

        let now = Utc::now();
        let goals: Vec<Value> = goals
            .iter()
            .map(|g| {
                let deadline = g.created_at + Duration::days(g.timeline_days);
                json!({
                    "goal_id": g.id,
                    "goal_type": g.goal_type,
                    "description": g.description,
                    "target_value": g.target_value,
                    "current_value": g.current_value,
                    "days_remaining": (deadline - now).num_days(),
                    "created_at": g.created_at.to_rfc3339(),
                })
            })
            .collect();

        Ok(obj(json!({
            "caller_id": params.caller_id,
            "active_goals": goals,
        })))
    }
}

#[derive(Deserialize)]
struct ProgressParams {
    caller_id: i64,
    goal_id: i64,
}

/// Progress towards a single goal since its creation.
pub struct ProgressTool {
    store: Arc<dyn HealthStore>,
}

#[async_trait]
impl Tool for ProgressTool {
    fn domain(&self) -> Domain {
        Domain::Coaching
    }

    fn name(&self) -> &str {
        "progress"
    }

    async fn invoke(&self, params: Value) -> DispatchResult {
        let params: ProgressParams = parse_params(self.name(), params)?;

        let goal = match self
            .store
            .goal(params.caller_id, params.goal_id)
            .await
            .map_err(|e| DispatchError::internal(self.name(), e))?
        {
            Some(g) => g,
            None => return Ok(obj(json!({ "error": "Goal not found" }))),
        };

        let samples = self
            .store
            .samples_since(params.caller_id, goal.created_at)
            .await
            .map_err(|e| DispatchError::internal(self.name(), e))?;

        if samples.is_empty() {
            return Ok(obj(json!({
                "goal_id": params.goal_id,
                "message": "No data recorded since goal creation",
            })));
        }

        let metric = match goal.goal_type.as_str() {
            "sleep" => Some("sleep_hours"),
            "exercise" => Some("steps"),
            _ => None,
        };
        let current_avg = metric.and_then(|m| {
            let values: Vec<f64> = samples.iter().filter_map(|s| s.metric(m)).collect();
            if values.is_empty() {
                None
            } else {
                Some(stats::mean(&values))
            }
        });

        let progress = match (current_avg, goal.target_value, goal.current_value) {
            (Some(avg), Some(target), Some(initial)) if target != initial => {
                (avg - initial) / (target - initial) * 100.0
            }
            _ => 0.0,
        };

        let now = Utc::now();
        let days_elapsed = (now - goal.created_at).num_days();
        let days_remaining = goal.timeline_days - days_elapsed;
        let expected = if goal.timeline_days > 0 {
            days_elapsed as f64 / goal.timeline_days as f64 * 100.0
        } else {
            0.0
        };

        Ok(obj(json!({
            "goal_id": params.goal_id,
            "goal_type": goal.goal_type,
            "description": goal.description,
            "initial_value": goal.current_value,
            "current_value": current_avg.map(stats::round1),
            "target_value": goal.target_value,
            "progress_percent": stats::round1(progress.min(100.0)),
            "days_elapsed": days_elapsed,
            "days_remaining": days_remaining.max(0),
            "on_track": progress != 0.0 && progress >= expected,
            "data_points": samples.len(),
        })))
    }
}

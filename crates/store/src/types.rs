//! Record types for the health data store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metric identifiers carried by a wearable sample.
pub const METRICS: [&str; 5] = ["heart_rate", "steps", "sleep_hours", "hrv", "calories"];

/// A caller's profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub age: u32,
    pub gender: String,
}

/// One day of wearable data. Any field may be missing for a given day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSample {
    pub date: DateTime<Utc>,
    pub heart_rate: Option<f64>,
    pub steps: Option<f64>,
    pub sleep_hours: Option<f64>,
    pub hrv: Option<f64>,
    pub calories: Option<f64>,
}

impl MetricSample {
    /// Look up a metric by its wire name. Unknown names yield `None`.
    pub fn metric(&self, name: &str) -> Option<f64> {
        match name {
            "heart_rate" => self.heart_rate,
            "steps" => self.steps,
            "sleep_hours" => self.sleep_hours,
            "hrv" => self.hrv,
            "calories" => self.calories,
            _ => None,
        }
    }

    /// True if any metric field is recorded.
    pub fn has_any_metric(&self) -> bool {
        METRICS.iter().any(|m| self.metric(m).is_some())
    }
}

/// A medical record or lab result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalRecord {
    pub record_type: String,
    pub date: DateTime<Utc>,
    pub data: Value,
    pub notes: Option<String>,
}

/// Status of a health goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    Active,
    Completed,
    Abandoned,
}

/// A caller's health goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthGoal {
    pub id: i64,
    pub caller_id: i64,
    /// sleep, exercise, nutrition, weight
    pub goal_type: String,
    pub description: String,
    pub target_value: Option<f64>,
    pub current_value: Option<f64>,
    pub timeline_days: i64,
    pub status: GoalStatus,
    pub created_at: DateTime<Utc>,
}

/// Fields for creating a goal; the store assigns id, status, and timestamp.
#[derive(Debug, Clone)]
pub struct NewGoal {
    pub caller_id: i64,
    pub goal_type: String,
    pub description: String,
    pub target_value: Option<f64>,
    pub current_value: Option<f64>,
    pub timeline_days: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MetricSample {
        MetricSample {
            date: Utc::now(),
            heart_rate: Some(62.0),
            steps: None,
            sleep_hours: Some(7.5),
            hrv: None,
            calories: None,
        }
    }

    #[test]
    fn metric_lookup_by_name() {
        let s = sample();
        assert_eq!(s.metric("heart_rate"), Some(62.0));
        assert_eq!(s.metric("steps"), None);
        assert_eq!(s.metric("sleep_hours"), Some(7.5));
        assert_eq!(s.metric("unknown"), None);
    }

    #[test]
    fn has_any_metric_detects_empty_sample() {
        let mut s = sample();
        assert!(s.has_any_metric());
        s.heart_rate = None;
        s.sleep_hours = None;
        assert!(!s.has_any_metric());
    }
}

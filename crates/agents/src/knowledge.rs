//! Knowledge capability - metric interpretation against reference ranges,
//! concern screening, and medical history context.

use crate::obj;
use crate::stats;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;
use vitalis_common::{parse_params, DispatchError, DispatchResult, Domain, Tool};
use vitalis_store::HealthStore;

const DISCLAIMER: &str = "This is educational information, not medical advice. \
Consult healthcare professionals for medical concerns.";

/// Build all knowledge tools over the given store.
pub fn tools(store: Arc<dyn HealthStore>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(InterpretTool {
            store: store.clone(),
        }),
        Arc::new(ConcernCheckTool {
            store: store.clone(),
        }),
        Arc::new(MedicalContextTool { store }),
    ]
}

#[derive(Deserialize)]
struct InterpretParams {
    caller_id: i64,
    metric: String,
    value: f64,
}

/// Interpret a single metric value in the context of the caller's profile.
pub struct InterpretTool {
    store: Arc<dyn HealthStore>,
}

#[async_trait]
impl Tool for InterpretTool {
    fn domain(&self) -> Domain {
        Domain::Knowledge
    }

    fn name(&self) -> &str {
        "interpret"
    }

    async fn invoke(&self, params: Value) -> DispatchResult {
        let params: InterpretParams = parse_params(self.name(), params)?;

        let profile = match self
            .store
            .profile(params.caller_id)
            .await
            .map_err(|e| DispatchError::internal(self.name(), e))?
        {
            Some(p) => p,
            None => {
                return Ok(obj(json!({
                    "error": format!("Caller {} not found", params.caller_id),
                })))
            }
        };

        debug!(metric = %params.metric, value = params.value, "Interpreting metric");

        let mut out = obj(json!({
            "metric": params.metric,
            "value": params.value,
            "caller_age": profile.age,
            "caller_gender": profile.gender,
        }));

        let v = params.value;
        match params.metric.as_str() {
            "heart_rate" => {
                out.insert(
                    "description".into(),
                    "Resting heart rate in beats per minute".into(),
                );
                // Seniors get a slightly tighter band.
                let (lo, hi) = if profile.age < 60 { (60.0, 100.0) } else { (60.0, 90.0) };
                out.insert("normal_range".into(), json!([lo, hi]));
                let (status, text) = if v >= lo && v <= hi {
                    ("normal", "Your resting heart rate is within normal range.".into())
                } else if v < lo {
                    if v >= 40.0 {
                        (
                            "below_normal",
                            "Lower heart rate, which is common in athletic individuals. \
                             This is generally a positive sign of cardiovascular fitness."
                                .into(),
                        )
                    } else {
                        (
                            "below_normal",
                            "Heart rate is notably low. Consider consulting a healthcare \
                             provider if you experience symptoms."
                                .into(),
                        )
                    }
                } else {
                    (
                        "above_normal",
                        "Heart rate is elevated. This could be due to stress, caffeine, \
                         dehydration, or other factors. Monitor and consult a healthcare \
                         provider if persistent."
                            .into(),
                    )
                };
                out.insert("status".into(), status.into());
                out.insert("interpretation".into(), Value::String(text));
            }
            "hrv" => {
                out.insert(
                    "description".into(),
                    "Heart rate variability in milliseconds".into(),
                );
                let text = if v >= 100.0 {
                    "Excellent HRV - indicates good cardiovascular health and stress resilience"
                } else if v >= 50.0 {
                    "Good HRV - indicates adequate recovery and health"
                } else {
                    "Lower HRV - may indicate stress, fatigue, or need for recovery"
                };
                out.insert("interpretation".into(), text.into());
            }
            "sleep_hours" => {
                out.insert("description".into(), "Recommended sleep duration".into());
                out.insert("normal_range".into(), json!([7.0, 9.0]));
                let (status, text) = if (7.0..=9.0).contains(&v) {
                    ("adequate", "Sleep duration is within recommended range")
                } else if v < 7.0 {
                    (
                        "insufficient",
                        "Sleep duration is below recommended levels - may impact health \
                         and performance",
                    )
                } else {
                    (
                        "excessive",
                        "Sleep duration is above typical range - ensure it's restorative",
                    )
                };
                out.insert("status".into(), status.into());
                out.insert("interpretation".into(), text.into());
            }
            "cholesterol" => {
                out.insert("description".into(), "Total cholesterol in mg/dL".into());
                let (status, text) = if v < 200.0 {
                    ("desirable", "Total cholesterol is in the desirable range")
                } else if v < 239.0 {
                    (
                        "borderline_high",
                        "Total cholesterol is borderline high. Consider lifestyle \
                         modifications and monitoring.",
                    )
                } else {
                    (
                        "high",
                        "Total cholesterol is high. Consult your healthcare provider for \
                         management strategies.",
                    )
                };
                out.insert("status".into(), status.into());
                out.insert("interpretation".into(), text.into());
            }
            other => {
                out.insert(
                    "interpretation".into(),
                    format!("Metric {other} analysis not available").into(),
                );
            }
        }

        Ok(out)
    }
}

#[derive(Deserialize)]
struct ConcernCheckParams {
    caller_id: i64,
}

/// Screen the last week of data for potential concerns.
pub struct ConcernCheckTool {
    store: Arc<dyn HealthStore>,
}

#[async_trait]
impl Tool for ConcernCheckTool {
    fn domain(&self) -> Domain {
        Domain::Knowledge
    }

    fn name(&self) -> &str {
        "concern_check"
    }

    async fn invoke(&self, params: Value) -> DispatchResult {
        let params: ConcernCheckParams = parse_params(self.name(), params)?;
        let since = Utc::now() - Duration::days(7);

        let samples = self
            .store
            .samples_since(params.caller_id, since)
            .await
            .map_err(|e| DispatchError::internal(self.name(), e))?;

        if samples.is_empty() {
            return Ok(obj(json!({
                "message": "Insufficient recent data for analysis",
            })));
        }

        let mut concerns = Vec::new();
        let mut recommendations: Vec<&str> = Vec::new();

        let heart_rates: Vec<f64> = samples.iter().filter_map(|s| s.heart_rate).collect();
        if !heart_rates.is_empty() {
            let avg = stats::mean(&heart_rates);
            if avg > 100.0 {
                concerns.push(json!({
                    "type": "elevated_heart_rate",
                    "severity": "moderate",
                    "detail": format!(
                        "Average resting heart rate is {:.1} bpm, which is above normal \
                         range (60-100 bpm)",
                        avg
                    ),
                }));
                recommendations
                    .push("Monitor heart rate throughout the day and note any patterns or triggers");
                recommendations.push(
                    "Consider consulting a healthcare provider if elevated heart rate persists",
                );
            }
        }

        let sleep: Vec<f64> = samples.iter().filter_map(|s| s.sleep_hours).collect();
        if !sleep.is_empty() {
            let avg = stats::mean(&sleep);
            if avg < 6.0 {
                concerns.push(json!({
                    "type": "insufficient_sleep",
                    "severity": "high",
                    "detail": format!(
                        "Average sleep duration is {:.1} hours, below recommended 7-9 hours",
                        avg
                    ),
                }));
                recommendations.push("Establish a consistent bedtime routine");
                recommendations.push("Limit screen time before bed");
                recommendations.push("Create a sleep-conducive environment (dark, quiet, cool)");
            }
        }

        let steps: Vec<f64> = samples.iter().filter_map(|s| s.steps).collect();
        if !steps.is_empty() {
            let avg = stats::mean(&steps);
            if avg < 5000.0 {
                concerns.push(json!({
                    "type": "low_activity",
                    "severity": "moderate",
                    "detail": format!(
                        "Average daily steps is {:.0}, below minimum recommendation of 5,000",
                        avg
                    ),
                }));
                recommendations.push("Gradually increase daily walking");
                recommendations.push("Take short walking breaks throughout the day");
            }
        }

        // Dedup while keeping first-seen order.
        let mut seen = std::collections::HashSet::new();
        recommendations.retain(|r| seen.insert(*r));

        Ok(obj(json!({
            "concerns": concerns,
            "recommendations": recommendations,
            "analysis_period": "last_7_days",
            "disclaimer": DISCLAIMER,
        })))
    }
}

#[derive(Deserialize)]
struct MedicalContextParams {
    caller_id: i64,
}

/// Caller profile plus recorded medical history.
pub struct MedicalContextTool {
    store: Arc<dyn HealthStore>,
}

#[async_trait]
impl Tool for MedicalContextTool {
    fn domain(&self) -> Domain {
        Domain::Knowledge
    }

    fn name(&self) -> &str {
        "context"
    }

    async fn invoke(&self, params: Value) -> DispatchResult {
        let params: MedicalContextParams = parse_params(self.name(), params)?;

        let profile = match self
            .store
            .profile(params.caller_id)
            .await
            .map_err(|e| DispatchError::internal(self.name(), e))?
        {
            Some(p) => p,
            None => return Ok(obj(json!({ "error": "Caller not found" }))),
        };

        let records = self
            .store
            .medical_records(params.caller_id)
            .await
            .map_err(|e| DispatchError::internal(self.name(), e))?;

        let records: Vec<Value> = records
            .iter()
            .map(|r| {
                json!({
                    "type": r.record_type,
                    "date": r.date.to_rfc3339(),
                    "data": r.data,
                    "notes": r.notes,
                })
            })
            .collect();

        Ok(obj(json!({
            "user_info": {
                "age": profile.age,
                "gender": profile.gender,
            },
            "medical_records": records,
        })))
    }
}

//! Analytics capability - trend detection and statistical summaries.

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

/// Metrics where a rising average is an improvement; for heart rate it is the
/// opposite.
const HIGHER_IS_BETTER: [&str; 4] = ["steps", "sleep_hours", "hrv", "calories"];

pub(crate) fn window_days(window: &str) -> i64 {
    match window {
        "last_7_days" => 7,
        "last_90_days" => 90,
        _ => 30,
    }
}

fn default_window() -> String {
    "last_30_days".into()
}

/// Build all analytics tools over the given store.
pub fn tools(store: Arc<dyn HealthStore>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(TrendTool {
            store: store.clone(),
        }),
        Arc::new(CompareTool {
            store: store.clone(),
        }),
        Arc::new(WeeklySummaryTool { store }),
    ]
}

#[derive(Deserialize)]
struct TrendParams {
    caller_id: i64,
    metric: String,
    #[serde(default = "default_window")]
    window: String,
}

/// Trend analysis of one metric across a time window.
pub struct TrendTool {
    store: Arc<dyn HealthStore>,
}

#[async_trait]
impl Tool for TrendTool {
    fn domain(&self) -> Domain {
        Domain::Analytics
    }

    fn name(&self) -> &str {
        "trend"
    }

    async fn invoke(&self, params: Value) -> DispatchResult {
        let params: TrendParams = parse_params(self.name(), params)?;
        let since = Utc::now() - Duration::days(window_days(&params.window));

        let samples = self
            .store
            .samples_since(params.caller_id, since)
            .await
            .map_err(|e| DispatchError::internal(self.name(), e))?;

        if samples.is_empty() {
            return Ok(obj(json!({
                "error": format!("No data found for caller {}", params.caller_id),
                "metric": params.metric,
                "window": params.window,
            })));
        }

        let values: Vec<f64> = samples.iter().filter_map(|s| s.metric(&params.metric)).collect();
        if values.is_empty() {
            return Ok(obj(json!({
                "error": format!("No {} data available", params.metric),
                "metric": params.metric,
                "window": params.window,
            })));
        }

        debug!(
            metric = %params.metric,
            points = values.len(),
            "Computing trend"
        );

        // Compare the early half against the recent half.
        let mid = values.len() / 2;
        let (early, recent) = values.split_at(mid);

        let trend = if values.len() > 1 {
            let improved = if HIGHER_IS_BETTER.contains(&params.metric.as_str()) {
                stats::mean(recent) > stats::mean(early)
            } else {
                stats::mean(recent) < stats::mean(early)
            };
            if improved { "improving" } else { "stable" }
        } else {
            "insufficient_data"
        };

        let change = stats::mean(recent) - stats::mean(early);
        let percent_change = if early.is_empty() || stats::mean(early) == 0.0 {
            Value::Null
        } else {
            stats::num(change / stats::mean(early) * 100.0)
        };

        Ok(obj(json!({
            "metric": params.metric,
            "window": params.window,
            "total_data_points": values.len(),
            "average": stats::num(stats::mean(&values)),
            "median": stats::num(stats::median(&values)),
            "std_dev": stats::num(stats::std_dev(&values)),
            "min": stats::num(stats::min(&values)),
            "max": stats::num(stats::max(&values)),
            "latest_value": stats::num(*values.last().unwrap_or(&f64::NAN)),
            "trend": trend,
            "early_period_avg": stats::num(stats::mean(early)),
            "recent_period_avg": stats::num(stats::mean(recent)),
            "change": stats::num(change),
            "percent_change": percent_change,
        })))
    }
}

#[derive(Deserialize)]
struct CompareParams {
    caller_id: i64,
    metric1: String,
    metric2: String,
    #[serde(default = "default_window")]
    window: String,
}

/// Correlation between two metrics over a time window.
pub struct CompareTool {
    store: Arc<dyn HealthStore>,
}

fn correlation_bucket(r: f64) -> &'static str {
    if r > 0.7 {
        "strong positive"
    } else if r > 0.3 {
        "moderate positive"
    } else if r > 0.0 {
        "weak positive"
    } else if r > -0.3 {
        "weak negative"
    } else if r > -0.7 {
        "moderate negative"
    } else {
        "strong negative"
    }
}

#[async_trait]
impl Tool for CompareTool {
    fn domain(&self) -> Domain {
        Domain::Analytics
    }

    fn name(&self) -> &str {
        "compare"
    }

    async fn invoke(&self, params: Value) -> DispatchResult {
        let params: CompareParams = parse_params(self.name(), params)?;
        let since = Utc::now() - Duration::days(window_days(&params.window));

        let samples = self
            .store
            .samples_since(params.caller_id, since)
            .await
            .map_err(|e| DispatchError::internal(self.name(), e))?;

        if samples.is_empty() {
            return Ok(obj(json!({
                "error": format!("No data found for caller {}", params.caller_id),
            })));
        }

        // Keep only days where both metrics are recorded.
        let pairs: Vec<(f64, f64)> = samples
            .iter()
            .filter_map(|s| Some((s.metric(&params.metric1)?, s.metric(&params.metric2)?)))
            .collect();

        if pairs.len() < 2 {
            return Ok(obj(json!({ "error": "Insufficient data for correlation" })));
        }

        let xs: Vec<f64> = pairs.iter().map(|p| p.0).collect();
        let ys: Vec<f64> = pairs.iter().map(|p| p.1).collect();
        let r = stats::correlation(&xs, &ys);

        Ok(obj(json!({
            "metric1": params.metric1,
            "metric2": params.metric2,
            "correlation": serde_json::Number::from_f64(stats::round3(r))
                .map_or(Value::Null, Value::Number),
            "interpretation": correlation_bucket(r),
            "data_points": pairs.len(),
        })))
    }
}

#[derive(Deserialize)]
struct WeeklySummaryParams {
    caller_id: i64,
}

/// Per-metric summary over the last seven days.
pub struct WeeklySummaryTool {
    store: Arc<dyn HealthStore>,
}

#[async_trait]
impl Tool for WeeklySummaryTool {
    fn domain(&self) -> Domain {
        Domain::Analytics
    }

    fn name(&self) -> &str {
        "weekly_summary"
    }

    async fn invoke(&self, params: Value) -> DispatchResult {
        let params: WeeklySummaryParams = parse_params(self.name(), params)?;
        let since = Utc::now() - Duration::days(7);

        let samples = self
            .store
            .samples_since(params.caller_id, since)
            .await
            .map_err(|e| DispatchError::internal(self.name(), e))?;

        if samples.is_empty() {
            return Ok(obj(json!({
                "error": format!(
                    "No data found for caller {} in the last week",
                    params.caller_id
                ),
            })));
        }

        let mut summary = serde_json::Map::new();
        for metric in vitalis_store::METRICS {
            let values: Vec<f64> = samples.iter().filter_map(|s| s.metric(metric)).collect();
            if !values.is_empty() {
                summary.insert(
                    metric.to_string(),
                    json!({
                        "average": stats::num(stats::mean(&values)),
                        "min": stats::num(stats::min(&values)),
                        "max": stats::num(stats::max(&values)),
                        "days_recorded": values.len(),
                    }),
                );
            }
        }

        Ok(obj(json!({
            "period": "last_7_days",
            "summary": summary,
            "total_entries": samples.len(),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use vitalis_store::{MemoryStore, MetricSample};

    async fn store_with_sleep(values: &[f64]) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        for (i, v) in values.iter().enumerate() {
            store
                .add_sample(
                    1,
                    MetricSample {
                        date: now - Duration::days((values.len() - i) as i64),
                        heart_rate: None,
                        steps: None,
                        sleep_hours: Some(*v),
                        hrv: None,
                        calories: None,
                    },
                )
                .await;
        }
        store
    }

    fn sample_on(date: DateTime<Utc>, steps: f64, sleep: f64) -> MetricSample {
        MetricSample {
            date,
            heart_rate: None,
            steps: Some(steps),
            sleep_hours: Some(sleep),
            hrv: None,
            calories: None,
        }
    }

    #[test]
    fn window_day_mapping() {
        assert_eq!(window_days("last_7_days"), 7);
        assert_eq!(window_days("last_30_days"), 30);
        assert_eq!(window_days("last_90_days"), 90);
        assert_eq!(window_days("unknown"), 30);
    }

    #[tokio::test]
    async fn trend_reports_improvement_for_rising_sleep() {
        let store = store_with_sleep(&[6.0, 6.0, 6.5, 7.5, 8.0, 8.0]).await;
        let tool = TrendTool { store };

        let result = tool
            .invoke(json!({"caller_id": 1, "metric": "sleep_hours", "window": "last_30_days"}))
            .await
            .unwrap();
        assert_eq!(result["trend"], "improving");
        assert_eq!(result["total_data_points"], 6);
        assert_eq!(result["metric"], "sleep_hours");
        assert!(result["average"].is_number());
        assert!(result.get("error").is_none());
    }

    #[tokio::test]
    async fn trend_without_any_samples_is_error_shaped() {
        let store = Arc::new(MemoryStore::new());
        let tool = TrendTool { store };

        let result = tool
            .invoke(json!({"caller_id": 42, "metric": "steps"}))
            .await
            .unwrap();
        let error = result["error"].as_str().unwrap();
        assert!(error.contains("No data found"));
        assert!(error.contains("caller 42"));
    }

    #[tokio::test]
    async fn trend_with_missing_metric_reports_metric_gap() {
        let store = store_with_sleep(&[7.0, 7.2]).await;
        let tool = TrendTool { store };

        let result = tool
            .invoke(json!({"caller_id": 1, "metric": "hrv"}))
            .await
            .unwrap();
        assert_eq!(result["error"], "No hrv data available");
    }

    #[tokio::test]
    async fn trend_missing_params_is_parameter_mismatch() {
        let store = Arc::new(MemoryStore::new());
        let tool = TrendTool { store };

        let err = tool.invoke(json!({"metric": "steps"})).await.unwrap_err();
        assert_eq!(
            err.kind,
            vitalis_common::DispatchErrorKind::ParameterMismatch
        );
    }

    #[tokio::test]
    async fn compare_finds_positive_correlation() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        for i in 0..10 {
            store
                .add_sample(
                    1,
                    sample_on(
                        now - Duration::days(10 - i),
                        4000.0 + 500.0 * i as f64,
                        6.0 + 0.2 * i as f64,
                    ),
                )
                .await;
        }
        let tool = CompareTool { store };

        let result = tool
            .invoke(json!({"caller_id": 1, "metric1": "steps", "metric2": "sleep_hours"}))
            .await
            .unwrap();
        assert_eq!(result["interpretation"], "strong positive");
        assert_eq!(result["data_points"], 10);
    }

    #[tokio::test]
    async fn compare_with_one_overlapping_day_is_insufficient() {
        let store = Arc::new(MemoryStore::new());
        store.add_sample(1, sample_on(Utc::now(), 5000.0, 7.0)).await;
        let tool = CompareTool { store };

        let result = tool
            .invoke(json!({"caller_id": 1, "metric1": "steps", "metric2": "sleep_hours"}))
            .await
            .unwrap();
        assert_eq!(result["error"], "Insufficient data for correlation");
    }

    #[tokio::test]
    async fn weekly_summary_only_counts_recorded_metrics() {
        let store = store_with_sleep(&[7.0, 7.5, 6.5]).await;
        let tool = WeeklySummaryTool { store };

        let result = tool.invoke(json!({"caller_id": 1})).await.unwrap();
        assert_eq!(result["period"], "last_7_days");
        let summary = result["summary"].as_object().unwrap();
        assert!(summary.contains_key("sleep_hours"));
        assert!(!summary.contains_key("heart_rate"));
        assert_eq!(summary["sleep_hours"]["days_recorded"], 3);
    }

    #[test]
    fn correlation_buckets() {
        assert_eq!(correlation_bucket(0.9), "strong positive");
        assert_eq!(correlation_bucket(0.5), "moderate positive");
        assert_eq!(correlation_bucket(0.1), "weak positive");
        assert_eq!(correlation_bucket(-0.1), "weak negative");
        assert_eq!(correlation_bucket(-0.5), "moderate negative");
        assert_eq!(correlation_bucket(-0.9), "strong negative");
    }
}

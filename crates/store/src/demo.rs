//! Demo data seeding.
//!
//! Populates a `MemoryStore` with three demo callers and 90 days of wearable
//! data each, so the system has meaningful answers during evaluation sessions.
//! Values are deterministic (hash-based jitter, no rand dependency) so tests
//! and demos are reproducible.

use crate::store::{HealthStore, MemoryStore};
use crate::types::{MedicalRecord, MetricSample, NewGoal, UserProfile};
use chrono::{Duration, Utc};
use serde_json::json;
use tracing::info;

/// The demo caller names the dispatcher's fallback policy knows about.
pub const DEMO_NAMES: [&str; 3] = ["Active Alice", "Busy Bob", "Senior Sarah"];

const DEMO_DAYS: i64 = 90;

struct ProfileShape {
    hr_base: f64,
    hr_trend: f64,
    steps_base: f64,
    steps_var: f64,
    sleep_base: f64,
    sleep_var: f64,
    hrv_base: f64,
    hrv_trend: f64,
}

fn shape_for(profile: &str) -> ProfileShape {
    match profile {
        "athletic" => ProfileShape {
            hr_base: 58.0,
            hr_trend: -0.05,
            steps_base: 9500.0,
            steps_var: 1500.0,
            sleep_base: 7.5,
            sleep_var: 0.8,
            hrv_base: 65.0,
            hrv_trend: 0.08,
        },
        "sedentary" => ProfileShape {
            hr_base: 75.0,
            hr_trend: 0.02,
            steps_base: 5500.0,
            steps_var: 1200.0,
            sleep_base: 6.5,
            sleep_var: 1.2,
            hrv_base: 45.0,
            hrv_trend: -0.02,
        },
        _ => ProfileShape {
            hr_base: 70.0,
            hr_trend: 0.0,
            steps_base: 6000.0,
            steps_var: 800.0,
            sleep_base: 7.0,
            sleep_var: 1.0,
            hrv_base: 50.0,
            hrv_trend: 0.0,
        },
    }
}

/// Deterministic jitter in [-1.0, 1.0) derived from a seed pair.
fn jitter(seed: i64, salt: u32) -> f64 {
    let x = (seed as u64)
        .wrapping_mul(2654435761)
        .wrapping_add(u64::from(salt).wrapping_mul(40503));
    ((x % 2000) as f64 / 1000.0) - 1.0
}

/// Seed the store with the three demo callers and their history.
pub async fn seed_demo_data(store: &MemoryStore) {
    let profiles = [
        (1_i64, "Active Alice", 32_u32, "female", "athletic"),
        (2, "Busy Bob", 45, "male", "sedentary"),
        (3, "Senior Sarah", 68, "female", "senior"),
    ];

    for (id, name, age, gender, profile) in profiles {
        store
            .add_profile(UserProfile {
                id,
                name: name.to_string(),
                age,
                gender: gender.to_string(),
            })
            .await;

        let shape = shape_for(profile);
        let now = Utc::now();

        for day in 0..DEMO_DAYS {
            // ~10% of days have no recording, like real wearable data.
            if jitter(id * 1000 + day, 0) > 0.8 {
                continue;
            }

            let date = now - Duration::days(DEMO_DAYS - day);
            let steps = (shape.steps_base + shape.steps_var * jitter(id * 1000 + day, 1)).max(0.0);
            let sleep = (shape.sleep_base + shape.sleep_var * jitter(id * 1000 + day, 2))
                .clamp(4.0, 10.0);

            store
                .add_sample(
                    id,
                    MetricSample {
                        date,
                        heart_rate: Some(
                            shape.hr_base
                                + shape.hr_trend * day as f64
                                + 5.0 * jitter(id * 1000 + day, 3),
                        ),
                        steps: Some(steps.round()),
                        sleep_hours: Some((sleep * 10.0).round() / 10.0),
                        hrv: Some(
                            (shape.hrv_base
                                + shape.hrv_trend * day as f64
                                + 8.0 * jitter(id * 1000 + day, 4))
                            .max(20.0)
                            .round(),
                        ),
                        calories: Some((1800.0 + steps / 10.0).round()),
                    },
                )
                .await;
        }
    }

    store
        .add_record(
            2,
            MedicalRecord {
                record_type: "blood_work".into(),
                date: Utc::now() - Duration::days(45),
                data: json!({"cholesterol": 215, "glucose": 102}),
                notes: Some("Borderline cholesterol, recheck in 6 months".into()),
            },
        )
        .await;

    let _ = store
        .create_goal(NewGoal {
            caller_id: 1,
            goal_type: "sleep".into(),
            description: "Sleep 8 hours per night".into(),
            target_value: Some(8.0),
            current_value: Some(7.4),
            timeline_days: 30,
        })
        .await;
    let _ = store
        .create_goal(NewGoal {
            caller_id: 2,
            goal_type: "exercise".into(),
            description: "Reach 8000 daily steps".into(),
            target_value: Some(8000.0),
            current_value: Some(5500.0),
            timeline_days: 60,
        })
        .await;

    info!(callers = profiles.len(), days = DEMO_DAYS, "Seeded demo data");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::HealthStore;
    use chrono::Duration;

    #[tokio::test]
    async fn seeding_creates_known_demo_callers() {
        let store = MemoryStore::new();
        seed_demo_data(&store).await;

        let names: Vec<String> = DEMO_NAMES.iter().map(|n| n.to_string()).collect();
        assert_eq!(store.caller_by_name(&names).await.unwrap(), Some(1));

        let profile = store.profile(2).await.unwrap().unwrap();
        assert_eq!(profile.name, "Busy Bob");
    }

    #[tokio::test]
    async fn seeding_is_deterministic() {
        let a = MemoryStore::new();
        let b = MemoryStore::new();
        seed_demo_data(&a).await;
        seed_demo_data(&b).await;

        let since = Utc::now() - Duration::days(30);
        let sa = a.samples_since(1, since).await.unwrap();
        let sb = b.samples_since(1, since).await.unwrap();
        assert_eq!(sa.len(), sb.len());
        assert!(!sa.is_empty());
        assert_eq!(sa[0].heart_rate, sb[0].heart_rate);
    }

    #[tokio::test]
    async fn seeded_callers_have_recent_samples_and_goals() {
        let store = MemoryStore::new();
        seed_demo_data(&store).await;

        let since = Utc::now() - Duration::days(7);
        for caller in 1..=3 {
            let samples = store.samples_since(caller, since).await.unwrap();
            assert!(!samples.is_empty(), "caller {caller} has no recent samples");
        }
        assert_eq!(store.active_goals(1).await.unwrap().len(), 1);
        assert_eq!(store.medical_records(2).await.unwrap().len(), 1);
    }
}

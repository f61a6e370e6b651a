use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::round_2dp;

/// Dated rollup of a trainee's training statistics. One per (trainee, date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ProgressSnapshot {
    pub snapshot_id: Uuid,
    pub trainee_id: Uuid,
    pub snapshot_date: NaiveDate,
    pub workouts_completed: i32,
    pub workouts_started: i32,
    pub completion_rate: Decimal,
    pub total_volume: Decimal,
    pub total_duration_minutes: i32,
    pub total_reps: i64,
    pub active_training_plans: i32,
    pub current_streak_days: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Computed values to upsert for a (trainee, date).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotValues {
    pub trainee_id: Uuid,
    pub snapshot_date: NaiveDate,
    pub workouts_completed: i32,
    pub workouts_started: i32,
    pub completion_rate: Decimal,
    pub total_volume: Decimal,
    pub total_duration_minutes: i32,
    pub total_reps: i64,
    pub active_training_plans: i32,
    pub current_streak_days: i32,
}

impl ProgressSnapshot {
    pub fn volume_change_since(&self, previous: Option<&ProgressSnapshot>) -> Option<Decimal> {
        previous.map(|prev| round_2dp(self.total_volume - prev.total_volume))
    }

    pub fn completion_rate_change_since(&self, previous: Option<&ProgressSnapshot>) -> Option<Decimal> {
        previous.map(|prev| round_2dp(self.completion_rate - prev.completion_rate))
    }

    pub fn values(&self) -> SnapshotValues {
        SnapshotValues {
            trainee_id: self.trainee_id,
            snapshot_date: self.snapshot_date,
            workouts_completed: self.workouts_completed,
            workouts_started: self.workouts_started,
            completion_rate: self.completion_rate,
            total_volume: self.total_volume,
            total_duration_minutes: self.total_duration_minutes,
            total_reps: self.total_reps,
            active_training_plans: self.active_training_plans,
            current_streak_days: self.current_streak_days,
        }
    }
}

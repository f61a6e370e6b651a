use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ProgressSnapshot;

/// Snapshot with day-over-day deltas against the previous snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSnapshotResponse {
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
    pub volume_change: Option<Decimal>,
    pub completion_rate_change: Option<Decimal>,
}

impl ProgressSnapshotResponse {
    pub fn new(snapshot: ProgressSnapshot, previous: Option<&ProgressSnapshot>) -> Self {
        Self {
            volume_change: snapshot.volume_change_since(previous),
            completion_rate_change: snapshot.completion_rate_change_since(previous),
            snapshot_id: snapshot.snapshot_id,
            trainee_id: snapshot.trainee_id,
            snapshot_date: snapshot.snapshot_date,
            workouts_completed: snapshot.workouts_completed,
            workouts_started: snapshot.workouts_started,
            completion_rate: snapshot.completion_rate,
            total_volume: snapshot.total_volume,
            total_duration_minutes: snapshot.total_duration_minutes,
            total_reps: snapshot.total_reps,
            active_training_plans: snapshot.active_training_plans,
            current_streak_days: snapshot.current_streak_days,
        }
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Planned,
    InProgress,
    Completed,
    Skipped,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Skipped => "skipped",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "planned" => Ok(Self::Planned),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "skipped" => Ok(Self::Skipped),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(StorageError::ConstraintViolation(format!(
                "unknown session status '{}'",
                other
            ))),
        }
    }
}

/// Row shape of `workout_sessions`.
#[derive(Debug, Clone, FromRow)]
pub struct WorkoutSessionRow {
    pub session_id: Uuid,
    pub trainee_id: Uuid,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub total_volume: Option<Decimal>,
    pub total_duration: Option<i32>,
}

/// A workout session with its exercise and set logs, as read from the
/// session-logging subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub session_id: Uuid,
    pub trainee_id: Uuid,
    pub status: SessionStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Kilograms moved over the whole session.
    pub total_volume: Option<Decimal>,
    /// Seconds.
    pub total_duration: Option<i32>,
    pub exercise_logs: Vec<ExerciseLog>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ExerciseLog {
    pub exercise_log_id: Uuid,
    pub session_id: Uuid,
    pub exercise_id: Uuid,
    #[sqlx(skip)]
    pub set_logs: Vec<SetLog>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SetLog {
    pub set_log_id: Uuid,
    pub exercise_log_id: Uuid,
    pub set_number: i32,
    pub actual_reps: Option<i32>,
    pub actual_weight: Option<Decimal>,
    /// Seconds.
    pub actual_duration: Option<i32>,
    /// Metres.
    pub actual_distance: Option<Decimal>,
    pub is_completed: bool,
}

impl WorkoutSession {
    pub fn from_row(row: WorkoutSessionRow, exercise_logs: Vec<ExerciseLog>) -> Result<Self, StorageError> {
        Ok(Self {
            session_id: row.session_id,
            trainee_id: row.trainee_id,
            status: row.status.parse()?,
            started_at: row.started_at,
            completed_at: row.completed_at,
            total_volume: row.total_volume,
            total_duration: row.total_duration,
            exercise_logs,
        })
    }

    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }

    /// Calendar day (UTC) the session started on.
    pub fn start_date(&self) -> Option<NaiveDate> {
        self.started_at.map(|at| at.date_naive())
    }

    pub fn completion_date(&self) -> Option<NaiveDate> {
        self.completed_at.map(|at| at.date_naive())
    }

    /// Completed with a completion timestamp on or before `date`.
    pub fn completed_on_or_before(&self, date: NaiveDate) -> bool {
        self.is_completed() && self.completion_date().is_some_and(|d| d <= date)
    }

    pub fn started_on_or_before(&self, date: NaiveDate) -> bool {
        self.start_date().is_some_and(|d| d <= date)
    }

    /// Sum of actual reps over every set of every exercise log.
    pub fn total_reps(&self) -> i64 {
        self.exercise_logs
            .iter()
            .flat_map(|log| log.set_logs.iter())
            .map(|set| i64::from(set.actual_reps.unwrap_or(0)))
            .sum()
    }
}

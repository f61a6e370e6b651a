use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{ExerciseLog, SessionStatus, SetLog, WorkoutSession};

pub fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(day: NaiveDate, hour: u32) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_hms_opt(hour, 0, 0).unwrap())
}

/// A session that started at 08:00 on `started` and, if `completed` is given, finished
/// at 09:00 that day with the given volume and duration.
pub fn session(
    trainee_id: Uuid,
    started: NaiveDate,
    completed: Option<NaiveDate>,
    total_volume: Option<&str>,
    total_duration: Option<i32>,
) -> WorkoutSession {
    WorkoutSession {
        session_id: Uuid::new_v4(),
        trainee_id,
        status: if completed.is_some() {
            SessionStatus::Completed
        } else {
            SessionStatus::InProgress
        },
        started_at: Some(at(started, 8)),
        completed_at: completed.map(|d| at(d, 9)),
        total_volume: total_volume.map(dec),
        total_duration,
        exercise_logs: Vec::new(),
    }
}

pub fn exercise_log(session: &WorkoutSession, exercise_id: Uuid, sets: Vec<SetLog>) -> ExerciseLog {
    let exercise_log_id = Uuid::new_v4();
    ExerciseLog {
        exercise_log_id,
        session_id: session.session_id,
        exercise_id,
        set_logs: sets
            .into_iter()
            .map(|mut set| {
                set.exercise_log_id = exercise_log_id;
                set
            })
            .collect(),
    }
}

pub fn set(set_number: i32, reps: Option<i32>, weight: Option<&str>) -> SetLog {
    SetLog {
        set_log_id: Uuid::new_v4(),
        exercise_log_id: Uuid::nil(),
        set_number,
        actual_reps: reps,
        actual_weight: weight.map(dec),
        actual_duration: None,
        actual_distance: None,
        is_completed: true,
    }
}

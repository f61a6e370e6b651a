use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{ExerciseLog, SetLog, WorkoutSession, WorkoutSessionRow};

pub struct WorkoutSessionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WorkoutSessionRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, session_id: Uuid) -> Result<Option<WorkoutSession>> {
        let row = sqlx::query_as::<_, WorkoutSessionRow>(
            r#"
            SELECT session_id, trainee_id, status, started_at, completed_at,
                   total_volume, total_duration
            FROM workout_sessions
            WHERE session_id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.attach_logs(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    pub async fn list_completed_until(
        &self,
        trainee_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<WorkoutSession>> {
        let rows = sqlx::query_as::<_, WorkoutSessionRow>(
            r#"
            SELECT session_id, trainee_id, status, started_at, completed_at,
                   total_volume, total_duration
            FROM workout_sessions
            WHERE trainee_id = $1
              AND status = 'completed'
              AND completed_at IS NOT NULL
              AND (completed_at AT TIME ZONE 'UTC')::date <= $2
            ORDER BY completed_at ASC
            "#,
        )
        .bind(trainee_id)
        .bind(date)
        .fetch_all(self.pool)
        .await?;

        self.attach_logs(rows).await
    }

    pub async fn count_started_until(&self, trainee_id: Uuid, date: NaiveDate) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM workout_sessions
            WHERE trainee_id = $1
              AND started_at IS NOT NULL
              AND (started_at AT TIME ZONE 'UTC')::date <= $2
            "#,
        )
        .bind(trainee_id)
        .bind(date)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    pub async fn list_completed_start_dates(&self, trainee_id: Uuid) -> Result<Vec<NaiveDate>> {
        let dates = sqlx::query_scalar::<_, NaiveDate>(
            r#"
            SELECT DISTINCT (started_at AT TIME ZONE 'UTC')::date AS session_date
            FROM workout_sessions
            WHERE trainee_id = $1
              AND status = 'completed'
              AND started_at IS NOT NULL
            ORDER BY session_date DESC
            "#,
        )
        .bind(trainee_id)
        .fetch_all(self.pool)
        .await?;

        Ok(dates)
    }

    /// Loads exercise and set logs for `rows` in two queries and nests them.
    async fn attach_logs(&self, rows: Vec<WorkoutSessionRow>) -> Result<Vec<WorkoutSession>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let session_ids: Vec<Uuid> = rows.iter().map(|r| r.session_id).collect();

        let exercise_logs = sqlx::query_as::<_, ExerciseLog>(
            r#"
            SELECT exercise_log_id, session_id, exercise_id
            FROM exercise_logs
            WHERE session_id = ANY($1)
            "#,
        )
        .bind(&session_ids)
        .fetch_all(self.pool)
        .await?;

        let exercise_log_ids: Vec<Uuid> = exercise_logs.iter().map(|l| l.exercise_log_id).collect();

        let set_logs = if exercise_log_ids.is_empty() {
            Vec::new()
        } else {
            sqlx::query_as::<_, SetLog>(
                r#"
                SELECT set_log_id, exercise_log_id, set_number, actual_reps, actual_weight,
                       actual_duration, actual_distance, is_completed
                FROM set_logs
                WHERE exercise_log_id = ANY($1)
                ORDER BY set_number ASC
                "#,
            )
            .bind(&exercise_log_ids)
            .fetch_all(self.pool)
            .await?
        };

        let mut sets_by_log: HashMap<Uuid, Vec<SetLog>> = HashMap::new();
        for set in set_logs {
            sets_by_log.entry(set.exercise_log_id).or_default().push(set);
        }

        let mut logs_by_session: HashMap<Uuid, Vec<ExerciseLog>> = HashMap::new();
        for mut log in exercise_logs {
            log.set_logs = sets_by_log.remove(&log.exercise_log_id).unwrap_or_default();
            logs_by_session.entry(log.session_id).or_default().push(log);
        }

        rows.into_iter()
            .map(|row| {
                let logs = logs_by_session.remove(&row.session_id).unwrap_or_default();
                WorkoutSession::from_row(row, logs)
            })
            .collect()
    }
}

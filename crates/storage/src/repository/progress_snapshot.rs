use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{ProgressSnapshot, SnapshotValues};

pub struct ProgressSnapshotRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProgressSnapshotRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn upsert(&self, values: &SnapshotValues) -> Result<ProgressSnapshot> {
        let snapshot = sqlx::query_as::<_, ProgressSnapshot>(
            r#"
            INSERT INTO progress_snapshots (trainee_id, snapshot_date, workouts_completed,
                                            workouts_started, completion_rate, total_volume,
                                            total_duration_minutes, total_reps,
                                            active_training_plans, current_streak_days)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (trainee_id, snapshot_date)
            DO UPDATE SET
                workouts_completed = EXCLUDED.workouts_completed,
                workouts_started = EXCLUDED.workouts_started,
                completion_rate = EXCLUDED.completion_rate,
                total_volume = EXCLUDED.total_volume,
                total_duration_minutes = EXCLUDED.total_duration_minutes,
                total_reps = EXCLUDED.total_reps,
                active_training_plans = EXCLUDED.active_training_plans,
                current_streak_days = EXCLUDED.current_streak_days,
                updated_at = CURRENT_TIMESTAMP
            RETURNING snapshot_id, trainee_id, snapshot_date, workouts_completed, workouts_started,
                      completion_rate, total_volume, total_duration_minutes, total_reps,
                      active_training_plans, current_streak_days, created_at, updated_at
            "#,
        )
        .bind(values.trainee_id)
        .bind(values.snapshot_date)
        .bind(values.workouts_completed)
        .bind(values.workouts_started)
        .bind(values.completion_rate)
        .bind(values.total_volume)
        .bind(values.total_duration_minutes)
        .bind(values.total_reps)
        .bind(values.active_training_plans)
        .bind(values.current_streak_days)
        .fetch_one(self.pool)
        .await
        .map_err(|e| StorageError::from(e).classify_write())?;

        Ok(snapshot)
    }

    pub async fn find_by_date(
        &self,
        trainee_id: Uuid,
        snapshot_date: NaiveDate,
    ) -> Result<Option<ProgressSnapshot>> {
        let snapshot = sqlx::query_as::<_, ProgressSnapshot>(
            r#"
            SELECT snapshot_id, trainee_id, snapshot_date, workouts_completed, workouts_started,
                   completion_rate, total_volume, total_duration_minutes, total_reps,
                   active_training_plans, current_streak_days, created_at, updated_at
            FROM progress_snapshots
            WHERE trainee_id = $1 AND snapshot_date = $2
            "#,
        )
        .bind(trainee_id)
        .bind(snapshot_date)
        .fetch_optional(self.pool)
        .await?;

        Ok(snapshot)
    }

    pub async fn find_before(
        &self,
        trainee_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<ProgressSnapshot>> {
        let snapshot = sqlx::query_as::<_, ProgressSnapshot>(
            r#"
            SELECT snapshot_id, trainee_id, snapshot_date, workouts_completed, workouts_started,
                   completion_rate, total_volume, total_duration_minutes, total_reps,
                   active_training_plans, current_streak_days, created_at, updated_at
            FROM progress_snapshots
            WHERE trainee_id = $1 AND snapshot_date < $2
            ORDER BY snapshot_date DESC
            LIMIT 1
            "#,
        )
        .bind(trainee_id)
        .bind(date)
        .fetch_optional(self.pool)
        .await?;

        Ok(snapshot)
    }

    pub async fn find_after(
        &self,
        trainee_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<ProgressSnapshot>> {
        let snapshot = sqlx::query_as::<_, ProgressSnapshot>(
            r#"
            SELECT snapshot_id, trainee_id, snapshot_date, workouts_completed, workouts_started,
                   completion_rate, total_volume, total_duration_minutes, total_reps,
                   active_training_plans, current_streak_days, created_at, updated_at
            FROM progress_snapshots
            WHERE trainee_id = $1 AND snapshot_date > $2
            ORDER BY snapshot_date ASC
            LIMIT 1
            "#,
        )
        .bind(trainee_id)
        .bind(date)
        .fetch_optional(self.pool)
        .await?;

        Ok(snapshot)
    }

    pub async fn list_for_trainee(
        &self,
        trainee_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<ProgressSnapshot>> {
        let snapshots = sqlx::query_as::<_, ProgressSnapshot>(
            r#"
            SELECT snapshot_id, trainee_id, snapshot_date, workouts_completed, workouts_started,
                   completion_rate, total_volume, total_duration_minutes, total_reps,
                   active_training_plans, current_streak_days, created_at, updated_at
            FROM progress_snapshots
            WHERE trainee_id = $1
              AND ($2::date IS NULL OR snapshot_date >= $2)
              AND ($3::date IS NULL OR snapshot_date <= $3)
            ORDER BY snapshot_date ASC
            "#,
        )
        .bind(trainee_id)
        .bind(from)
        .bind(to)
        .fetch_all(self.pool)
        .await?;

        Ok(snapshots)
    }
}

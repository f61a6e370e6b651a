use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    AppendCondition, NewPersonalRecord, PersonalRecord, ProgressSnapshot, RecordKey,
    SnapshotValues, WorkoutSession,
};
use crate::repository::personal_record::PersonalRecordRepository;
use crate::repository::progress_snapshot::ProgressSnapshotRepository;
use crate::repository::trainee::TraineeRepository;
use crate::repository::training_plan::TrainingPlanRepository;
use crate::repository::workout_session::WorkoutSessionRepository;
use crate::repository::{
    ActivePlanLookup, RecordStore, SessionHistory, SnapshotStore, TraineeDirectory,
};

/// Postgres-backed store.
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        Self::with_max_connections(database_url, 5).await
    }

    pub async fn with_max_connections(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for Database {
    async fn current_record(&self, key: &RecordKey) -> Result<Option<PersonalRecord>> {
        PersonalRecordRepository::new(&self.pool).find_current(key).await
    }

    async fn find_record(&self, record_id: Uuid) -> Result<Option<PersonalRecord>> {
        PersonalRecordRepository::new(&self.pool)
            .find_by_id(record_id)
            .await
    }

    async fn has_successor(&self, record_id: Uuid) -> Result<bool> {
        PersonalRecordRepository::new(&self.pool)
            .has_successor(record_id)
            .await
    }

    async fn append_record(
        &self,
        record: &NewPersonalRecord,
        condition: AppendCondition,
    ) -> Result<Option<PersonalRecord>> {
        PersonalRecordRepository::new(&self.pool)
            .append(record, condition)
            .await
    }

    async fn list_current_records(&self, trainee_id: Uuid) -> Result<Vec<PersonalRecord>> {
        PersonalRecordRepository::new(&self.pool)
            .list_current_for_trainee(trainee_id)
            .await
    }
}

#[async_trait]
impl SnapshotStore for Database {
    async fn upsert_snapshot(&self, values: &SnapshotValues) -> Result<ProgressSnapshot> {
        ProgressSnapshotRepository::new(&self.pool).upsert(values).await
    }

    async fn find_snapshot(
        &self,
        trainee_id: Uuid,
        snapshot_date: NaiveDate,
    ) -> Result<Option<ProgressSnapshot>> {
        ProgressSnapshotRepository::new(&self.pool)
            .find_by_date(trainee_id, snapshot_date)
            .await
    }

    async fn snapshot_before(
        &self,
        trainee_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<ProgressSnapshot>> {
        ProgressSnapshotRepository::new(&self.pool)
            .find_before(trainee_id, date)
            .await
    }

    async fn snapshot_after(
        &self,
        trainee_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<ProgressSnapshot>> {
        ProgressSnapshotRepository::new(&self.pool)
            .find_after(trainee_id, date)
            .await
    }

    async fn list_snapshots(
        &self,
        trainee_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<ProgressSnapshot>> {
        ProgressSnapshotRepository::new(&self.pool)
            .list_for_trainee(trainee_id, from, to)
            .await
    }
}

#[async_trait]
impl SessionHistory for Database {
    async fn trainee_exists(&self, trainee_id: Uuid) -> Result<bool> {
        TraineeRepository::new(&self.pool).exists(trainee_id).await
    }

    async fn find_session(&self, session_id: Uuid) -> Result<Option<WorkoutSession>> {
        WorkoutSessionRepository::new(&self.pool)
            .find_by_id(session_id)
            .await
    }

    async fn completed_sessions_until(
        &self,
        trainee_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<WorkoutSession>> {
        WorkoutSessionRepository::new(&self.pool)
            .list_completed_until(trainee_id, date)
            .await
    }

    async fn started_session_count_until(&self, trainee_id: Uuid, date: NaiveDate) -> Result<i64> {
        WorkoutSessionRepository::new(&self.pool)
            .count_started_until(trainee_id, date)
            .await
    }

    async fn completed_session_dates(&self, trainee_id: Uuid) -> Result<Vec<NaiveDate>> {
        WorkoutSessionRepository::new(&self.pool)
            .list_completed_start_dates(trainee_id)
            .await
    }
}

#[async_trait]
impl ActivePlanLookup for Database {
    async fn has_active_plan(&self, trainee_id: Uuid) -> Result<bool> {
        TrainingPlanRepository::new(&self.pool)
            .has_active_assignment(trainee_id)
            .await
    }
}

#[async_trait]
impl TraineeDirectory for Database {
    async fn list_trainee_ids(&self) -> Result<Vec<Uuid>> {
        TraineeRepository::new(&self.pool).list_ids().await
    }
}

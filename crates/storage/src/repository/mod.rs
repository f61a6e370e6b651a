pub mod memory;
pub mod personal_record;
pub mod progress_snapshot;
pub mod trainee;
pub mod training_plan;
pub mod workout_session;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    AppendCondition, NewPersonalRecord, PersonalRecord, ProgressSnapshot, RecordKey,
    SnapshotValues, WorkoutSession,
};

/// Append-only storage of personal record chains plus their current-record index.
///
/// [`Database`](crate::Database) implements every store trait on Postgres;
/// [`MemoryStore`](memory::MemoryStore) implements them in process.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Record the current-record index points at for `key`.
    async fn current_record(&self, key: &RecordKey) -> Result<Option<PersonalRecord>>;

    async fn find_record(&self, record_id: Uuid) -> Result<Option<PersonalRecord>>;

    /// Whether any record names `record_id` as its previous record.
    async fn has_successor(&self, record_id: Uuid) -> Result<bool>;

    /// Appends `record` to its chain, linking it to the current head and advancing the
    /// head. The read of the head and the write are serialized per key. Returns `None`
    /// when `condition` rejects the value.
    async fn append_record(
        &self,
        record: &NewPersonalRecord,
        condition: AppendCondition,
    ) -> Result<Option<PersonalRecord>>;

    /// Current record of every chain the trainee owns.
    async fn list_current_records(&self, trainee_id: Uuid) -> Result<Vec<PersonalRecord>>;
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Inserts or overwrites the snapshot for `(values.trainee_id, values.snapshot_date)`
    /// in one atomic statement.
    async fn upsert_snapshot(&self, values: &SnapshotValues) -> Result<ProgressSnapshot>;

    async fn find_snapshot(
        &self,
        trainee_id: Uuid,
        snapshot_date: NaiveDate,
    ) -> Result<Option<ProgressSnapshot>>;

    /// Latest snapshot strictly before `date`.
    async fn snapshot_before(
        &self,
        trainee_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<ProgressSnapshot>>;

    /// Earliest snapshot strictly after `date`.
    async fn snapshot_after(
        &self,
        trainee_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<ProgressSnapshot>>;

    /// Snapshots ordered by date, bounds inclusive.
    async fn list_snapshots(
        &self,
        trainee_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<ProgressSnapshot>>;
}

/// Read access to the session/exercise-log history.
#[async_trait]
pub trait SessionHistory: Send + Sync {
    async fn trainee_exists(&self, trainee_id: Uuid) -> Result<bool>;

    async fn find_session(&self, session_id: Uuid) -> Result<Option<WorkoutSession>>;

    /// Completed sessions whose completion day (UTC) is on or before `date`, with logs.
    async fn completed_sessions_until(
        &self,
        trainee_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<WorkoutSession>>;

    /// Sessions of any status whose start day (UTC) is on or before `date`.
    async fn started_session_count_until(&self, trainee_id: Uuid, date: NaiveDate) -> Result<i64>;

    /// Start days (UTC) of every completed session. Order and duplicates unspecified.
    async fn completed_session_dates(&self, trainee_id: Uuid) -> Result<Vec<NaiveDate>>;
}

#[async_trait]
pub trait ActivePlanLookup: Send + Sync {
    async fn has_active_plan(&self, trainee_id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait TraineeDirectory: Send + Sync {
    async fn list_trainee_ids(&self) -> Result<Vec<Uuid>>;
}

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{ActivePlanLookup, RecordStore, SessionHistory, SnapshotStore, TraineeDirectory};
use crate::error::{Result, StorageError};
use crate::models::{
    AppendCondition, NewPersonalRecord, PersonalRecord, ProgressSnapshot, RecordKey,
    SnapshotValues, WorkoutSession,
};

/// In-process store implementing every persistence trait.
///
/// All state sits behind one async mutex, so each trait call, including the
/// read-link-write sequence of [`RecordStore::append_record`], runs atomically.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    trainees: Vec<Uuid>,
    exercises: HashSet<Uuid>,
    active_plans: HashSet<Uuid>,
    sessions: HashMap<Uuid, WorkoutSession>,
    records: HashMap<Uuid, PersonalRecord>,
    heads: HashMap<RecordKey, Uuid>,
    snapshots: BTreeMap<(Uuid, NaiveDate), ProgressSnapshot>,
}

impl MemoryState {
    fn has_trainee(&self, trainee_id: Uuid) -> bool {
        self.trainees.contains(&trainee_id)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_trainee(&self, trainee_id: Uuid) {
        let mut state = self.state.lock().await;
        if !state.has_trainee(trainee_id) {
            state.trainees.push(trainee_id);
        }
    }

    pub async fn add_exercise(&self, exercise_id: Uuid) {
        self.state.lock().await.exercises.insert(exercise_id);
    }

    pub async fn set_active_plan(&self, trainee_id: Uuid, active: bool) {
        let mut state = self.state.lock().await;
        if active {
            state.active_plans.insert(trainee_id);
        } else {
            state.active_plans.remove(&trainee_id);
        }
    }

    /// Stores or replaces a session. Its trainee and every logged exercise must exist.
    pub async fn put_session(&self, session: WorkoutSession) -> Result<()> {
        let mut state = self.state.lock().await;
        if !state.has_trainee(session.trainee_id) {
            return Err(StorageError::NotFound);
        }
        if session
            .exercise_logs
            .iter()
            .any(|log| !state.exercises.contains(&log.exercise_id))
        {
            return Err(StorageError::NotFound);
        }
        state.sessions.insert(session.session_id, session);
        Ok(())
    }

    /// Writes a record verbatim, bypassing chain linking. Used to stage corrupt chains.
    #[cfg(test)]
    pub(crate) async fn insert_unchecked(&self, record: PersonalRecord, make_head: bool) {
        let mut state = self.state.lock().await;
        if make_head {
            if let Some(key) = record.key() {
                state.heads.insert(key, record.record_id);
            }
        }
        state.records.insert(record.record_id, record);
    }

    /// Removes a record and leaves every reference to it dangling.
    #[cfg(test)]
    pub(crate) async fn remove_unchecked(&self, record_id: Uuid) {
        self.state.lock().await.records.remove(&record_id);
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn current_record(&self, key: &RecordKey) -> Result<Option<PersonalRecord>> {
        let state = self.state.lock().await;
        match state.heads.get(key) {
            Some(id) => state.records.get(id).cloned().map(Some).ok_or_else(|| {
                StorageError::DataIntegrity(format!("chain {} points at missing record {}", key, id))
            }),
            None => Ok(None),
        }
    }

    async fn find_record(&self, record_id: Uuid) -> Result<Option<PersonalRecord>> {
        Ok(self.state.lock().await.records.get(&record_id).cloned())
    }

    async fn has_successor(&self, record_id: Uuid) -> Result<bool> {
        Ok(self
            .state
            .lock()
            .await
            .records
            .values()
            .any(|r| r.previous_record_id == Some(record_id)))
    }

    async fn append_record(
        &self,
        record: &NewPersonalRecord,
        condition: AppendCondition,
    ) -> Result<Option<PersonalRecord>> {
        let record = record.normalized();
        let mut state = self.state.lock().await;
        let key = record.key;

        if !state.has_trainee(key.trainee_id) || !state.exercises.contains(&key.exercise_id) {
            return Err(StorageError::NotFound);
        }
        if let Some(session_id) = record.workout_session_id {
            if !state.sessions.contains_key(&session_id) {
                return Err(StorageError::NotFound);
            }
        }

        let current = match state.heads.get(&key) {
            Some(id) => Some(state.records.get(id).cloned().ok_or_else(|| {
                StorageError::DataIntegrity(format!("chain {} points at missing record {}", key, id))
            })?),
            None => None,
        };

        if !condition.admits(record.value, current.as_ref()) {
            return Ok(None);
        }

        let previous_record_id = current.map(|c| c.record_id);
        if let Some(previous) = previous_record_id {
            if state
                .records
                .values()
                .any(|r| r.previous_record_id == Some(previous))
            {
                return Err(StorageError::DataIntegrity(
                    "record already has a successor in its chain".to_string(),
                ));
            }
        }

        let stored = PersonalRecord {
            record_id: Uuid::new_v4(),
            trainee_id: key.trainee_id,
            exercise_id: key.exercise_id,
            record_type: key.record_type.as_str().to_string(),
            value: record.value,
            weight: record.weight,
            reps: record.reps,
            achieved_at: record.achieved_at,
            workout_session_id: record.workout_session_id,
            previous_record_id,
            created_at: Utc::now(),
        };

        state.heads.insert(key, stored.record_id);
        state.records.insert(stored.record_id, stored.clone());

        Ok(Some(stored))
    }

    async fn list_current_records(&self, trainee_id: Uuid) -> Result<Vec<PersonalRecord>> {
        let state = self.state.lock().await;
        let mut heads: Vec<(&RecordKey, &Uuid)> = state
            .heads
            .iter()
            .filter(|(key, _)| key.trainee_id == trainee_id)
            .collect();
        heads.sort_by_key(|(key, _)| (key.exercise_id, key.record_type.as_str()));

        Ok(heads
            .into_iter()
            .filter_map(|(_, id)| state.records.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn upsert_snapshot(&self, values: &SnapshotValues) -> Result<ProgressSnapshot> {
        let mut state = self.state.lock().await;
        if !state.has_trainee(values.trainee_id) {
            return Err(StorageError::NotFound);
        }

        let now = Utc::now();
        let key = (values.trainee_id, values.snapshot_date);
        let (snapshot_id, created_at) = state
            .snapshots
            .get(&key)
            .map(|existing| (existing.snapshot_id, existing.created_at))
            .unwrap_or_else(|| (Uuid::new_v4(), now));

        let snapshot = ProgressSnapshot {
            snapshot_id,
            trainee_id: values.trainee_id,
            snapshot_date: values.snapshot_date,
            workouts_completed: values.workouts_completed,
            workouts_started: values.workouts_started,
            completion_rate: values.completion_rate,
            total_volume: values.total_volume,
            total_duration_minutes: values.total_duration_minutes,
            total_reps: values.total_reps,
            active_training_plans: values.active_training_plans,
            current_streak_days: values.current_streak_days,
            created_at,
            updated_at: now,
        };
        state.snapshots.insert(key, snapshot.clone());

        Ok(snapshot)
    }

    async fn find_snapshot(
        &self,
        trainee_id: Uuid,
        snapshot_date: NaiveDate,
    ) -> Result<Option<ProgressSnapshot>> {
        Ok(self
            .state
            .lock()
            .await
            .snapshots
            .get(&(trainee_id, snapshot_date))
            .cloned())
    }

    async fn snapshot_before(
        &self,
        trainee_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<ProgressSnapshot>> {
        let state = self.state.lock().await;
        Ok(state
            .snapshots
            .range((trainee_id, NaiveDate::MIN)..(trainee_id, date))
            .next_back()
            .map(|(_, s)| s.clone()))
    }

    async fn snapshot_after(
        &self,
        trainee_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<ProgressSnapshot>> {
        let state = self.state.lock().await;
        Ok(state
            .snapshots
            .range((trainee_id, date)..=(trainee_id, NaiveDate::MAX))
            .find(|((_, d), _)| *d > date)
            .map(|(_, s)| s.clone()))
    }

    async fn list_snapshots(
        &self,
        trainee_id: Uuid,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<ProgressSnapshot>> {
        let from = from.unwrap_or(NaiveDate::MIN);
        let to = to.unwrap_or(NaiveDate::MAX);
        if from > to {
            return Ok(Vec::new());
        }

        let state = self.state.lock().await;
        Ok(state
            .snapshots
            .range((trainee_id, from)..=(trainee_id, to))
            .map(|(_, s)| s.clone())
            .collect())
    }
}

#[async_trait]
impl SessionHistory for MemoryStore {
    async fn trainee_exists(&self, trainee_id: Uuid) -> Result<bool> {
        Ok(self.state.lock().await.has_trainee(trainee_id))
    }

    async fn find_session(&self, session_id: Uuid) -> Result<Option<WorkoutSession>> {
        Ok(self.state.lock().await.sessions.get(&session_id).cloned())
    }

    async fn completed_sessions_until(
        &self,
        trainee_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<WorkoutSession>> {
        let state = self.state.lock().await;
        let mut sessions: Vec<WorkoutSession> = state
            .sessions
            .values()
            .filter(|s| s.trainee_id == trainee_id && s.completed_on_or_before(date))
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.completed_at);
        Ok(sessions)
    }

    async fn started_session_count_until(&self, trainee_id: Uuid, date: NaiveDate) -> Result<i64> {
        let state = self.state.lock().await;
        let count = state
            .sessions
            .values()
            .filter(|s| s.trainee_id == trainee_id && s.started_on_or_before(date))
            .count();
        Ok(count as i64)
    }

    async fn completed_session_dates(&self, trainee_id: Uuid) -> Result<Vec<NaiveDate>> {
        let state = self.state.lock().await;
        Ok(state
            .sessions
            .values()
            .filter(|s| s.trainee_id == trainee_id && s.is_completed())
            .filter_map(|s| s.start_date())
            .collect())
    }
}

#[async_trait]
impl ActivePlanLookup for MemoryStore {
    async fn has_active_plan(&self, trainee_id: Uuid) -> Result<bool> {
        Ok(self.state.lock().await.active_plans.contains(&trainee_id))
    }
}

#[async_trait]
impl TraineeDirectory for MemoryStore {
    async fn list_trainee_ids(&self) -> Result<Vec<Uuid>> {
        Ok(self.state.lock().await.trainees.clone())
    }
}

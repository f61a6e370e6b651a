use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use uuid::Uuid;

use crate::dto::progress_snapshot::ProgressSnapshotResponse;
use crate::error::{Result, StorageError};
use crate::models::{ProgressSnapshot, SnapshotValues, WorkoutSession, round_2dp};
use crate::repository::{ActivePlanLookup, SessionHistory, SnapshotStore, TraineeDirectory};

use super::streak;

/// Totals over a set of completed sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTotals {
    pub workouts_completed: i32,
    pub total_volume: Decimal,
    pub total_duration_minutes: i32,
    pub total_reps: i64,
}

pub fn summarize_completed(sessions: &[WorkoutSession]) -> SessionTotals {
    let total_volume: Decimal = sessions
        .iter()
        .map(|s| s.total_volume.unwrap_or(Decimal::ZERO))
        .sum();

    // Fractional minutes are summed exactly and truncated once, never per session.
    let total_seconds: i64 = sessions
        .iter()
        .map(|s| i64::from(s.total_duration.unwrap_or(0)))
        .sum();
    let total_minutes = (Decimal::from(total_seconds) / Decimal::from(60)).trunc();

    SessionTotals {
        workouts_completed: saturating_i32(sessions.len() as i64),
        total_volume,
        total_duration_minutes: total_minutes.to_i32().unwrap_or(i32::MAX),
        total_reps: sessions.iter().map(WorkoutSession::total_reps).sum(),
    }
}

/// `completed / started * 100` to 2 decimals; 0 when nothing was started.
pub fn completion_rate(completed: i64, started: i64) -> Decimal {
    if started == 0 {
        return Decimal::ZERO;
    }
    round_2dp(Decimal::from(completed) / Decimal::from(started) * Decimal::from(100))
}

fn saturating_i32(n: i64) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

/// Recomputes and upserts the snapshot of `trainee_id` for `date`, with the streak
/// measured up to the current UTC day.
pub async fn recompute_snapshot<S>(store: &S, trainee_id: Uuid, date: NaiveDate) -> Result<ProgressSnapshot>
where
    S: SessionHistory + SnapshotStore + ActivePlanLookup + ?Sized,
{
    recompute_snapshot_at(store, trainee_id, date, Utc::now().date_naive()).await
}

/// [`recompute_snapshot`] with an explicit "today" for the streak walk.
pub async fn recompute_snapshot_at<S>(
    store: &S,
    trainee_id: Uuid,
    date: NaiveDate,
    today: NaiveDate,
) -> Result<ProgressSnapshot>
where
    S: SessionHistory + SnapshotStore + ActivePlanLookup + ?Sized,
{
    if !store.trainee_exists(trainee_id).await? {
        return Err(StorageError::NotFound);
    }

    let completed = store.completed_sessions_until(trainee_id, date).await?;
    let started = store.started_session_count_until(trainee_id, date).await?;
    let totals = summarize_completed(&completed);

    let has_active_plan = store.has_active_plan(trainee_id).await?;
    let session_dates = store.completed_session_dates(trainee_id).await?;

    let values = SnapshotValues {
        trainee_id,
        snapshot_date: date,
        workouts_completed: totals.workouts_completed,
        workouts_started: saturating_i32(started),
        completion_rate: completion_rate(i64::from(totals.workouts_completed), started),
        total_volume: totals.total_volume,
        total_duration_minutes: totals.total_duration_minutes,
        total_reps: totals.total_reps,
        active_training_plans: i32::from(has_active_plan),
        current_streak_days: streak::current_streak(session_dates, today),
    };

    let snapshot = store.upsert_snapshot(&values).await?;

    tracing::info!(
        trainee_id = %trainee_id,
        snapshot_date = %date,
        workouts_completed = snapshot.workouts_completed,
        completion_rate = %snapshot.completion_rate,
        streak = snapshot.current_streak_days,
        "Progress snapshot recomputed"
    );

    Ok(snapshot)
}

/// Outcome of a batch recomputation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecomputeSummary {
    pub succeeded: u64,
    pub failed: Vec<Uuid>,
}

/// Recomputes the snapshot for `date` of every known trainee. A failure for one
/// trainee is logged and does not stop the others.
pub async fn recompute_all<S>(store: &S, date: NaiveDate, today: NaiveDate) -> Result<RecomputeSummary>
where
    S: TraineeDirectory + SessionHistory + SnapshotStore + ActivePlanLookup + ?Sized,
{
    let mut summary = RecomputeSummary::default();

    for trainee_id in store.list_trainee_ids().await? {
        match recompute_snapshot_at(store, trainee_id, date, today).await {
            Ok(_) => summary.succeeded += 1,
            Err(e) => {
                tracing::warn!(trainee_id = %trainee_id, error = %e, "Snapshot recomputation failed");
                summary.failed.push(trainee_id);
            }
        }
    }

    Ok(summary)
}

pub async fn find_snapshot<S>(store: &S, trainee_id: Uuid, date: NaiveDate) -> Result<ProgressSnapshot>
where
    S: SnapshotStore + ?Sized,
{
    store
        .find_snapshot(trainee_id, date)
        .await?
        .ok_or(StorageError::NotFound)
}

/// Nearest snapshot of the same trainee strictly before this one.
pub async fn previous_snapshot<S>(store: &S, snapshot: &ProgressSnapshot) -> Result<Option<ProgressSnapshot>>
where
    S: SnapshotStore + ?Sized,
{
    store
        .snapshot_before(snapshot.trainee_id, snapshot.snapshot_date)
        .await
}

/// Nearest snapshot of the same trainee strictly after this one.
pub async fn next_snapshot<S>(store: &S, snapshot: &ProgressSnapshot) -> Result<Option<ProgressSnapshot>>
where
    S: SnapshotStore + ?Sized,
{
    store
        .snapshot_after(snapshot.trainee_id, snapshot.snapshot_date)
        .await
}

pub async fn volume_change<S>(store: &S, snapshot: &ProgressSnapshot) -> Result<Option<Decimal>>
where
    S: SnapshotStore + ?Sized,
{
    let previous = previous_snapshot(store, snapshot).await?;
    Ok(snapshot.volume_change_since(previous.as_ref()))
}

pub async fn completion_rate_change<S>(store: &S, snapshot: &ProgressSnapshot) -> Result<Option<Decimal>>
where
    S: SnapshotStore + ?Sized,
{
    let previous = previous_snapshot(store, snapshot).await?;
    Ok(snapshot.completion_rate_change_since(previous.as_ref()))
}

/// Date-ordered snapshots with deltas against their predecessor.
///
/// The first entry's predecessor is looked up outside the range, so its deltas match
/// what [`volume_change`] reports for it.
pub async fn list_snapshots<S>(
    store: &S,
    trainee_id: Uuid,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Vec<ProgressSnapshotResponse>>
where
    S: SnapshotStore + ?Sized,
{
    let snapshots = store.list_snapshots(trainee_id, from, to).await?;

    let mut previous = match snapshots.first() {
        Some(first) => previous_snapshot(store, first).await?,
        None => None,
    };

    let mut responses = Vec::with_capacity(snapshots.len());
    for snapshot in snapshots {
        responses.push(ProgressSnapshotResponse::new(snapshot.clone(), previous.as_ref()));
        previous = Some(snapshot);
    }

    Ok(responses)
}

use rust_decimal::Decimal;
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

use crate::error::{Result, StorageError};
use crate::models::{ExerciseLog, NewPersonalRecord, PersonalRecord, RecordKey, RecordType, SetLog};
use crate::repository::{RecordStore, SessionHistory};

use super::record_ledger;

/// Best performance of one metric within one exercise log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub record_type: RecordType,
    pub value: Decimal,
    pub weight: Option<Decimal>,
    pub reps: Option<i32>,
}

/// Candidates from the completed sets of `log`. Metrics with no positive value are skipped.
pub fn candidates_for(log: &ExerciseLog) -> Vec<Candidate> {
    let sets: Vec<&SetLog> = log.set_logs.iter().filter(|s| s.is_completed).collect();
    let mut candidates = Vec::new();

    let mut heaviest: Option<&SetLog> = None;
    for set in &sets {
        let Some(weight) = set.actual_weight.filter(|w| *w > Decimal::ZERO) else {
            continue;
        };
        if heaviest.and_then(|h| h.actual_weight).is_none_or(|best| weight > best) {
            heaviest = Some(*set);
        }
    }
    if let Some(set) = heaviest {
        if let Some(weight) = set.actual_weight {
            candidates.push(Candidate {
                record_type: RecordType::MaxWeight,
                value: weight,
                weight: Some(weight),
                reps: set.actual_reps,
            });
        }
    }

    if let Some(reps) = sets.iter().filter_map(|s| s.actual_reps).filter(|r| *r > 0).max() {
        candidates.push(Candidate {
            record_type: RecordType::MaxReps,
            value: Decimal::from(reps),
            weight: None,
            reps: Some(reps),
        });
    }

    if let Some(seconds) = sets.iter().filter_map(|s| s.actual_duration).filter(|d| *d > 0).max() {
        candidates.push(Candidate {
            record_type: RecordType::MaxDuration,
            value: Decimal::from(seconds),
            weight: None,
            reps: None,
        });
    }

    let volume: Decimal = sets
        .iter()
        .filter_map(|s| Some(s.actual_weight? * Decimal::from(s.actual_reps?)))
        .sum();
    if volume > Decimal::ZERO {
        candidates.push(Candidate {
            record_type: RecordType::MaxVolume,
            value: volume,
            weight: None,
            reps: None,
        });
    }

    if let Some(distance) = sets
        .iter()
        .filter_map(|s| s.actual_distance)
        .filter(|d| *d > Decimal::ZERO)
        .max()
    {
        candidates.push(Candidate {
            record_type: RecordType::MaxDistance,
            value: distance,
            weight: None,
            reps: None,
        });
    }

    candidates
}

/// Evaluates every exercise logged in a completed session against the trainee's
/// current records and appends the ones that beat them. Returns the new records.
pub async fn evaluate_completed_session<S>(store: &S, session_id: Uuid) -> Result<Vec<PersonalRecord>>
where
    S: RecordStore + SessionHistory + ?Sized,
{
    let session = store
        .find_session(session_id)
        .await?
        .ok_or(StorageError::NotFound)?;

    if !session.is_completed() {
        let mut errors = ValidationErrors::new();
        let mut error = ValidationError::new("session_not_completed");
        error.message = Some(
            format!("session is {}, expected completed", session.status.as_str()).into(),
        );
        errors.add("status", error);
        return Err(StorageError::Validation(errors));
    }

    let mut created = Vec::new();
    for log in &session.exercise_logs {
        for candidate in candidates_for(log) {
            tracing::debug!(
                session_id = %session.session_id,
                exercise_id = %log.exercise_id,
                record_type = %candidate.record_type,
                value = %candidate.value,
                "Evaluating candidate"
            );

            let key = RecordKey::new(session.trainee_id, log.exercise_id, candidate.record_type);
            let record = NewPersonalRecord::new(key, candidate.value)
                .with_weight(candidate.weight)
                .with_reps(candidate.reps)
                .from_session(Some(session.session_id));

            if let Some(record) = record_ledger::record_if_better(store, record).await? {
                created.push(record);
            }
        }
    }

    tracing::info!(
        session_id = %session.session_id,
        trainee_id = %session.trainee_id,
        new_records = created.len(),
        "Session evaluated"
    );

    Ok(created)
}

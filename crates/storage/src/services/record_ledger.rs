use std::collections::HashSet;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::dto::personal_record::PersonalRecordResponse;
use crate::error::{Result, StorageError};
use crate::models::{AppendCondition, NewPersonalRecord, PersonalRecord, RecordKey, round_2dp};
use crate::repository::RecordStore;

/// True when `value` would beat the current record of `key`, or when the chain is empty.
/// Ties are not records, compared at stored precision.
pub async fn would_be_new_record<S>(store: &S, key: &RecordKey, value: Decimal) -> Result<bool>
where
    S: RecordStore + ?Sized,
{
    let current = get_current_record(store, key).await?;
    Ok(AppendCondition::ExceedsCurrent.admits(round_2dp(value), current.as_ref()))
}

/// The undefeated record of `key`, if the chain has any record.
///
/// Fails with `DataIntegrity` when the indexed head already has a successor, which
/// would mean two records claim to be current.
pub async fn get_current_record<S>(store: &S, key: &RecordKey) -> Result<Option<PersonalRecord>>
where
    S: RecordStore + ?Sized,
{
    let Some(current) = store.current_record(key).await? else {
        return Ok(None);
    };

    if store.has_successor(current.record_id).await? {
        tracing::error!(
            chain = %key,
            record_id = %current.record_id,
            "Current record index points at a superseded record"
        );
        return Err(StorageError::DataIntegrity(format!(
            "chain {} has more than one record without a successor",
            key
        )));
    }

    Ok(Some(current))
}

/// Appends `record` to its chain unconditionally, linking it to the current record.
///
/// Whether the value actually improves on the current record is the caller's call;
/// see [`record_if_better`] for the checked variant.
pub async fn create_new_record<S>(store: &S, record: NewPersonalRecord) -> Result<PersonalRecord>
where
    S: RecordStore + ?Sized,
{
    let created = store
        .append_record(&record, AppendCondition::Always)
        .await?
        .ok_or_else(|| {
            StorageError::DataIntegrity(format!(
                "unconditional append to chain {} was rejected",
                record.key
            ))
        })?;

    tracing::info!(
        chain = %record.key,
        record_id = %created.record_id,
        value = %created.value,
        "Personal record created"
    );

    Ok(created)
}

/// Appends `record` only if it beats the current record, checking and writing under
/// the same per-chain lock. Returns `None` when the value is not a new record.
pub async fn record_if_better<S>(
    store: &S,
    record: NewPersonalRecord,
) -> Result<Option<PersonalRecord>>
where
    S: RecordStore + ?Sized,
{
    let created = store
        .append_record(&record, AppendCondition::ExceedsCurrent)
        .await?;

    match &created {
        Some(created) => tracing::info!(
            chain = %record.key,
            record_id = %created.record_id,
            value = %created.value,
            "New personal record"
        ),
        None => tracing::debug!(
            chain = %record.key,
            value = %record.value,
            "Value does not beat current record"
        ),
    }

    Ok(created)
}

pub async fn find_record<S>(store: &S, record_id: Uuid) -> Result<PersonalRecord>
where
    S: RecordStore + ?Sized,
{
    store
        .find_record(record_id)
        .await?
        .ok_or(StorageError::NotFound)
}

/// The record `record` superseded, if any.
pub async fn previous_record<S>(store: &S, record: &PersonalRecord) -> Result<Option<PersonalRecord>>
where
    S: RecordStore + ?Sized,
{
    let Some(previous_id) = record.previous_record_id else {
        return Ok(None);
    };

    let previous = store.find_record(previous_id).await?.ok_or_else(|| {
        StorageError::DataIntegrity(format!(
            "record {} links to missing record {}",
            record.record_id, previous_id
        ))
    })?;

    Ok(Some(previous))
}

/// `record` and all its ancestors, oldest first.
///
/// Every ancestor must belong to the same chain; a revisited record (cycle), a
/// dangling link, or a record from another chain fails with `DataIntegrity`.
pub async fn get_progression_chain<S>(
    store: &S,
    record: &PersonalRecord,
) -> Result<Vec<PersonalRecord>>
where
    S: RecordStore + ?Sized,
{
    let mut visited = HashSet::from([record.record_id]);
    let mut chain = vec![record.clone()];
    let mut cursor = previous_record(store, record).await?;

    while let Some(ancestor) = cursor {
        if !visited.insert(ancestor.record_id) {
            tracing::error!(
                record_id = %record.record_id,
                revisited = %ancestor.record_id,
                "Cycle detected in personal record chain"
            );
            return Err(StorageError::DataIntegrity(format!(
                "cycle in chain of record {} at {}",
                record.record_id, ancestor.record_id
            )));
        }

        if ancestor.trainee_id != record.trainee_id
            || ancestor.exercise_id != record.exercise_id
            || ancestor.record_type != record.record_type
        {
            return Err(StorageError::DataIntegrity(format!(
                "record {} links across chains to {}",
                record.record_id, ancestor.record_id
            )));
        }

        cursor = previous_record(store, &ancestor).await?;
        chain.push(ancestor);
    }

    chain.reverse();
    Ok(chain)
}

/// The current record of every chain the trainee owns.
pub async fn list_current_records<S>(store: &S, trainee_id: Uuid) -> Result<Vec<PersonalRecord>>
where
    S: RecordStore + ?Sized,
{
    store.list_current_records(trainee_id).await
}

/// Serializable view of `record` with its improvement over the record it superseded.
pub async fn describe_record<S>(store: &S, record: PersonalRecord) -> Result<PersonalRecordResponse>
where
    S: RecordStore + ?Sized,
{
    let previous = previous_record(store, &record).await?;
    Ok(PersonalRecordResponse::new(record, previous.as_ref()))
}

/// Responses for a whole chain, each carrying its improvement over its predecessor.
pub fn describe_chain(chain: Vec<PersonalRecord>) -> Vec<PersonalRecordResponse> {
    let mut responses = Vec::with_capacity(chain.len());
    let mut previous: Option<PersonalRecord> = None;

    for record in chain {
        responses.push(PersonalRecordResponse::new(record.clone(), previous.as_ref()));
        previous = Some(record);
    }

    responses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordType;
    use crate::repository::memory::MemoryStore;
    use crate::test_support::dec;
    use chrono::Utc;

    async fn store_with_chain_owner() -> (MemoryStore, RecordKey) {
        let store = MemoryStore::new();
        let trainee_id = Uuid::new_v4();
        let exercise_id = Uuid::new_v4();
        store.add_trainee(trainee_id).await;
        store.add_exercise(exercise_id).await;
        (
            store,
            RecordKey::new(trainee_id, exercise_id, RecordType::MaxWeight),
        )
    }

    fn orphan(key: &RecordKey, value: &str, previous: Option<Uuid>) -> PersonalRecord {
        PersonalRecord {
            record_id: Uuid::new_v4(),
            trainee_id: key.trainee_id,
            exercise_id: key.exercise_id,
            record_type: key.record_type.as_str().to_string(),
            value: dec(value),
            weight: None,
            reps: None,
            achieved_at: Utc::now(),
            workout_session_id: None,
            previous_record_id: previous,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_first_value_is_always_a_record() {
        let (store, key) = store_with_chain_owner().await;

        assert!(get_current_record(&store, &key).await.unwrap().is_none());
        assert!(would_be_new_record(&store, &key, dec("0.5")).await.unwrap());

        let first = create_new_record(&store, NewPersonalRecord::new(key, dec("60")))
            .await
            .unwrap();

        assert!(first.previous_record_id.is_none());
        assert_eq!(first.kind(), Some(RecordType::MaxWeight));
        assert_eq!(
            get_current_record(&store, &key).await.unwrap(),
            Some(first)
        );
    }

    #[tokio::test]
    async fn test_would_be_new_record_is_strict() {
        let (store, key) = store_with_chain_owner().await;
        create_new_record(&store, NewPersonalRecord::new(key, dec("100")))
            .await
            .unwrap();

        assert!(would_be_new_record(&store, &key, dec("100.01")).await.unwrap());
        assert!(!would_be_new_record(&store, &key, dec("100")).await.unwrap());
        assert!(!would_be_new_record(&store, &key, dec("99")).await.unwrap());
    }

    #[tokio::test]
    async fn test_current_record_is_the_latest_of_n() {
        let (store, key) = store_with_chain_owner().await;

        let mut created = Vec::new();
        for value in ["50", "55", "57.5", "60", "62.5"] {
            created.push(
                create_new_record(&store, NewPersonalRecord::new(key, dec(value)))
                    .await
                    .unwrap(),
            );
        }

        let current = get_current_record(&store, &key).await.unwrap().unwrap();
        assert_eq!(current, *created.last().unwrap());

        let mut without_successor = 0;
        for record in &created {
            if !store.has_successor(record.record_id).await.unwrap() {
                without_successor += 1;
            }
        }
        assert_eq!(without_successor, 1);
    }

    #[tokio::test]
    async fn test_create_does_not_check_for_improvement() {
        let (store, key) = store_with_chain_owner().await;
        let high = create_new_record(&store, NewPersonalRecord::new(key, dec("100")))
            .await
            .unwrap();
        let low = create_new_record(&store, NewPersonalRecord::new(key, dec("80")))
            .await
            .unwrap();

        assert_eq!(low.previous_record_id, Some(high.record_id));
        assert_eq!(
            get_current_record(&store, &key).await.unwrap().unwrap().record_id,
            low.record_id
        );
    }

    #[tokio::test]
    async fn test_record_if_better_rejects_ties_and_regressions() {
        let (store, key) = store_with_chain_owner().await;

        let first = record_if_better(&store, NewPersonalRecord::new(key, dec("100")))
            .await
            .unwrap();
        assert!(first.is_some());

        assert!(record_if_better(&store, NewPersonalRecord::new(key, dec("100")))
            .await
            .unwrap()
            .is_none());
        assert!(record_if_better(&store, NewPersonalRecord::new(key, dec("90")))
            .await
            .unwrap()
            .is_none());

        let better = record_if_better(&store, NewPersonalRecord::new(key, dec("105")))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(better.previous_record_id, first.map(|r| r.record_id));
    }

    #[tokio::test]
    async fn test_sub_cent_gain_is_not_a_new_record() {
        let (store, key) = store_with_chain_owner().await;
        create_new_record(&store, NewPersonalRecord::new(key, dec("100")))
            .await
            .unwrap();

        assert!(!would_be_new_record(&store, &key, dec("100.004")).await.unwrap());
        assert!(record_if_better(&store, NewPersonalRecord::new(key, dec("100.004")))
            .await
            .unwrap()
            .is_none());

        let better = record_if_better(&store, NewPersonalRecord::new(key, dec("100.006")))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(better.value, dec("100.01"));
    }

    #[tokio::test]
    async fn test_progression_chain_is_oldest_first() {
        let (store, key) = store_with_chain_owner().await;
        let values = ["80", "85", "92.5", "100"];

        let mut last = None;
        for value in values {
            last = Some(
                create_new_record(&store, NewPersonalRecord::new(key, dec(value)))
                    .await
                    .unwrap(),
            );
        }

        let chain = get_progression_chain(&store, &last.unwrap()).await.unwrap();
        assert_eq!(chain.len(), values.len());
        assert!(chain[0].previous_record_id.is_none());
        for (record, value) in chain.iter().zip(values) {
            assert_eq!(record.value, dec(value));
        }
        for pair in chain.windows(2) {
            assert_eq!(pair[1].previous_record_id, Some(pair[0].record_id));
        }
    }

    #[tokio::test]
    async fn test_chain_from_a_middle_record_stops_there() {
        let (store, key) = store_with_chain_owner().await;
        let first = create_new_record(&store, NewPersonalRecord::new(key, dec("10")))
            .await
            .unwrap();
        let second = create_new_record(&store, NewPersonalRecord::new(key, dec("20")))
            .await
            .unwrap();
        create_new_record(&store, NewPersonalRecord::new(key, dec("30")))
            .await
            .unwrap();

        let chain = get_progression_chain(&store, &second).await.unwrap();
        assert_eq!(
            chain.iter().map(|r| r.record_id).collect::<Vec<_>>(),
            vec![first.record_id, second.record_id]
        );
    }

    #[tokio::test]
    async fn test_describe_chain_reports_improvements() {
        let (store, key) = store_with_chain_owner().await;
        for value in ["80", "92.5"] {
            create_new_record(&store, NewPersonalRecord::new(key, dec(value)))
                .await
                .unwrap();
        }
        let current = get_current_record(&store, &key).await.unwrap().unwrap();
        let chain = get_progression_chain(&store, &current).await.unwrap();

        let described = describe_chain(chain);
        assert_eq!(described[0].improvement, None);
        assert_eq!(described[0].improvement_percentage, None);
        assert_eq!(described[1].improvement, Some(dec("12.5")));
        assert_eq!(described[1].improvement_percentage, Some(dec("15.63")));

        let single = describe_record(&store, current).await.unwrap();
        assert_eq!(single.improvement, Some(dec("12.5")));
    }

    #[tokio::test]
    async fn test_unknown_trainee_or_exercise_is_not_found() {
        let (store, key) = store_with_chain_owner().await;

        let stranger = RecordKey::new(Uuid::new_v4(), key.exercise_id, key.record_type);
        let err = create_new_record(&store, NewPersonalRecord::new(stranger, dec("1")))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));

        let unknown_exercise = RecordKey::new(key.trainee_id, Uuid::new_v4(), key.record_type);
        let err = create_new_record(&store, NewPersonalRecord::new(unknown_exercise, dec("1")))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));

        let err = find_record(&store, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn test_chains_are_independent_per_metric() {
        let (store, key) = store_with_chain_owner().await;
        let reps_key = RecordKey::new(key.trainee_id, key.exercise_id, RecordType::MaxReps);

        create_new_record(&store, NewPersonalRecord::new(key, dec("100")))
            .await
            .unwrap();
        let reps = create_new_record(&store, NewPersonalRecord::new(reps_key, dec("12")))
            .await
            .unwrap();

        assert!(reps.previous_record_id.is_none());
        let current = list_current_records(&store, key.trainee_id).await.unwrap();
        assert_eq!(current.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_appends_keep_a_single_head() {
        let (store, key) = store_with_chain_owner().await;

        let handles: Vec<_> = (1..=32)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    create_new_record(&store, NewPersonalRecord::new(key, Decimal::from(i)))
                        .await
                        .unwrap()
                })
            })
            .collect();

        let mut created = Vec::new();
        for handle in handles {
            created.push(handle.await.unwrap());
        }

        let previous: HashSet<Option<Uuid>> =
            created.iter().map(|r| r.previous_record_id).collect();
        assert_eq!(previous.len(), created.len());

        let current = get_current_record(&store, &key).await.unwrap().unwrap();
        let chain = get_progression_chain(&store, &current).await.unwrap();
        assert_eq!(chain.len(), 32);
    }

    #[tokio::test]
    async fn test_cycle_is_reported_as_data_integrity() {
        let (store, key) = store_with_chain_owner().await;

        let a_id = Uuid::new_v4();
        let mut b = orphan(&key, "20", Some(a_id));
        let mut a = orphan(&key, "10", Some(b.record_id));
        a.record_id = a_id;
        b.previous_record_id = Some(a.record_id);
        store.insert_unchecked(a, false).await;
        store.insert_unchecked(b.clone(), false).await;

        let err = get_progression_chain(&store, &b).await.unwrap_err();
        assert!(matches!(err, StorageError::DataIntegrity(_)));
    }

    #[tokio::test]
    async fn test_dangling_previous_link_is_reported() {
        let (store, key) = store_with_chain_owner().await;
        let record = orphan(&key, "20", Some(Uuid::new_v4()));
        store.insert_unchecked(record.clone(), true).await;

        let err = get_progression_chain(&store, &record).await.unwrap_err();
        assert!(matches!(err, StorageError::DataIntegrity(_)));
    }

    #[tokio::test]
    async fn test_ambiguous_current_record_is_reported() {
        let (store, key) = store_with_chain_owner().await;
        let older = orphan(&key, "10", None);
        let newer = orphan(&key, "20", Some(older.record_id));
        // Head left on the superseded record.
        store.insert_unchecked(newer, false).await;
        store.insert_unchecked(older, true).await;

        let err = get_current_record(&store, &key).await.unwrap_err();
        assert!(matches!(err, StorageError::DataIntegrity(_)));

        let err = would_be_new_record(&store, &key, dec("50")).await.unwrap_err();
        assert!(matches!(err, StorageError::DataIntegrity(_)));
    }

    #[tokio::test]
    async fn test_head_pointing_at_missing_record_is_reported() {
        let (store, key) = store_with_chain_owner().await;
        let first = create_new_record(&store, NewPersonalRecord::new(key, dec("100")))
            .await
            .unwrap();
        store.remove_unchecked(first.record_id).await;

        let err = would_be_new_record(&store, &key, dec("150")).await.unwrap_err();
        assert!(matches!(err, StorageError::DataIntegrity(_)));

        let err = record_if_better(&store, NewPersonalRecord::new(key, dec("150")))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::DataIntegrity(_)));
    }
}

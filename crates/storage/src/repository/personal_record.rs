use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{AppendCondition, NewPersonalRecord, PersonalRecord, RecordKey};

pub struct PersonalRecordRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PersonalRecordRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, record_id: Uuid) -> Result<Option<PersonalRecord>> {
        fetch_record(self.pool, record_id).await
    }

    /// Record referenced by the chain head, if the chain has one.
    pub async fn find_current(&self, key: &RecordKey) -> Result<Option<PersonalRecord>> {
        let record = sqlx::query_as::<_, PersonalRecord>(
            r#"
            SELECT pr.record_id, pr.trainee_id, pr.exercise_id, pr.record_type, pr.value,
                   pr.weight, pr.reps, pr.achieved_at, pr.workout_session_id,
                   pr.previous_record_id, pr.created_at
            FROM personal_record_heads h
            INNER JOIN personal_records pr ON pr.record_id = h.current_record_id
            WHERE h.trainee_id = $1 AND h.exercise_id = $2 AND h.record_type = $3
            "#,
        )
        .bind(key.trainee_id)
        .bind(key.exercise_id)
        .bind(key.record_type.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(record)
    }

    pub async fn has_successor(&self, record_id: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM personal_records WHERE previous_record_id = $1)",
        )
        .bind(record_id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn list_current_for_trainee(&self, trainee_id: Uuid) -> Result<Vec<PersonalRecord>> {
        let records = sqlx::query_as::<_, PersonalRecord>(
            r#"
            SELECT pr.record_id, pr.trainee_id, pr.exercise_id, pr.record_type, pr.value,
                   pr.weight, pr.reps, pr.achieved_at, pr.workout_session_id,
                   pr.previous_record_id, pr.created_at
            FROM personal_record_heads h
            INNER JOIN personal_records pr ON pr.record_id = h.current_record_id
            WHERE h.trainee_id = $1
            ORDER BY h.exercise_id, h.record_type
            "#,
        )
        .bind(trainee_id)
        .fetch_all(self.pool)
        .await?;

        Ok(records)
    }

    /// Appends to the chain of `record.key` inside one transaction.
    ///
    /// The head row is created on first use and then locked with `FOR UPDATE`, so
    /// concurrent appends to the same chain queue behind each other and each one links
    /// to the record its predecessor just inserted.
    pub async fn append(
        &self,
        record: &NewPersonalRecord,
        condition: AppendCondition,
    ) -> Result<Option<PersonalRecord>> {
        let record = &record.normalized();
        let key = &record.key;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO personal_record_heads (trainee_id, exercise_id, record_type)
            VALUES ($1, $2, $3)
            ON CONFLICT (trainee_id, exercise_id, record_type) DO NOTHING
            "#,
        )
        .bind(key.trainee_id)
        .bind(key.exercise_id)
        .bind(key.record_type.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::from(e).classify_write())?;

        let current_id = sqlx::query_scalar::<_, Option<Uuid>>(
            r#"
            SELECT current_record_id
            FROM personal_record_heads
            WHERE trainee_id = $1 AND exercise_id = $2 AND record_type = $3
            FOR UPDATE
            "#,
        )
        .bind(key.trainee_id)
        .bind(key.exercise_id)
        .bind(key.record_type.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let current = match current_id {
            Some(id) => Some(fetch_record(&mut *tx, id).await?.ok_or_else(|| {
                StorageError::DataIntegrity(format!(
                    "chain {} points at missing record {}",
                    key, id
                ))
            })?),
            None => None,
        };

        if !condition.admits(record.value, current.as_ref()) {
            tx.rollback().await?;
            return Ok(None);
        }

        let inserted = sqlx::query_as::<_, PersonalRecord>(
            r#"
            INSERT INTO personal_records (trainee_id, exercise_id, record_type, value, weight,
                                          reps, achieved_at, workout_session_id, previous_record_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING record_id, trainee_id, exercise_id, record_type, value, weight, reps,
                      achieved_at, workout_session_id, previous_record_id, created_at
            "#,
        )
        .bind(key.trainee_id)
        .bind(key.exercise_id)
        .bind(key.record_type.as_str())
        .bind(record.value)
        .bind(record.weight)
        .bind(record.reps)
        .bind(record.achieved_at)
        .bind(record.workout_session_id)
        .bind(current.as_ref().map(|c| c.record_id))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| StorageError::from(e).classify_write())?;

        sqlx::query(
            r#"
            UPDATE personal_record_heads
            SET current_record_id = $4,
                updated_at = CURRENT_TIMESTAMP
            WHERE trainee_id = $1 AND exercise_id = $2 AND record_type = $3
            "#,
        )
        .bind(key.trainee_id)
        .bind(key.exercise_id)
        .bind(key.record_type.as_str())
        .bind(inserted.record_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(inserted))
    }
}

async fn fetch_record<'e, E>(executor: E, record_id: Uuid) -> Result<Option<PersonalRecord>>
where
    E: PgExecutor<'e>,
{
    let record = sqlx::query_as::<_, PersonalRecord>(
        r#"
        SELECT record_id, trainee_id, exercise_id, record_type, value, weight, reps,
               achieved_at, workout_session_id, previous_record_id, created_at
        FROM personal_records
        WHERE record_id = $1
        "#,
    )
    .bind(record_id)
    .fetch_optional(executor)
    .await?;

    Ok(record)
}

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;

pub struct TraineeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TraineeRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn exists(&self, trainee_id: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM trainees WHERE trainee_id = $1)",
        )
        .bind(trainee_id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn list_ids(&self) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT trainee_id FROM trainees ORDER BY created_at, trainee_id",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(ids)
    }
}

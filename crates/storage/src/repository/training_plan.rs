use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;

pub struct TrainingPlanRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TrainingPlanRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn has_active_assignment(&self, trainee_id: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM training_plan_assignments
                WHERE trainee_id = $1 AND status = 'active'
            )
            "#,
        )
        .bind(trainee_id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }
}

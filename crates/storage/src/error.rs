use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// A record chain or the current-record index is inconsistent. Never resolved silently.
    #[error("Data integrity violation: {0}")]
    DataIntegrity(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Unknown record type: {0}")]
    InvalidRecordType(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23505")
        )
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23503")
        )
    }

    /// Maps write-time constraint failures onto the domain taxonomy: a missing
    /// trainee/exercise/session surfaces as `NotFound`, a second successor for the
    /// same record as `DataIntegrity`.
    pub(crate) fn classify_write(self) -> Self {
        if self.is_foreign_key_violation() {
            StorageError::NotFound
        } else if self.is_unique_violation() {
            StorageError::DataIntegrity(
                "record already has a successor in its chain".to_string(),
            )
        } else {
            self
        }
    }
}

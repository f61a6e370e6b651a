use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{NewPersonalRecord, PersonalRecord, RecordKey, RecordType, round_2dp};

/// Personal record with its display value and improvement over the record it superseded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalRecordResponse {
    pub record_id: Uuid,
    pub trainee_id: Uuid,
    pub exercise_id: Uuid,
    pub record_type: String,
    pub value: Decimal,
    pub weight: Option<Decimal>,
    pub reps: Option<i32>,
    pub formatted_value: String,
    pub achieved_at: DateTime<Utc>,
    pub workout_session_id: Option<Uuid>,
    pub previous_record_id: Option<Uuid>,
    pub improvement: Option<Decimal>,
    pub improvement_percentage: Option<Decimal>,
}

impl PersonalRecordResponse {
    pub fn new(record: PersonalRecord, previous: Option<&PersonalRecord>) -> Self {
        Self {
            formatted_value: record.formatted_value(),
            improvement: record.improvement_over(previous),
            improvement_percentage: record.improvement_percentage_over(previous),
            record_id: record.record_id,
            trainee_id: record.trainee_id,
            exercise_id: record.exercise_id,
            record_type: record.record_type,
            value: record.value,
            weight: record.weight,
            reps: record.reps,
            achieved_at: record.achieved_at,
            workout_session_id: record.workout_session_id,
            previous_record_id: record.previous_record_id,
        }
    }
}

/// Request payload for logging a personal record by hand
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePersonalRecordRequest {
    pub trainee_id: Uuid,
    pub exercise_id: Uuid,

    #[validate(custom(function = "validate_record_type"))]
    pub record_type: String,

    #[validate(custom(
        function = "validate_value",
        message = "Value must be positive and below 10,000,000,000"
    ))]
    pub value: Decimal,

    #[validate(custom(
        function = "validate_weight",
        message = "Weight must be positive and below 1,000,000"
    ))]
    pub weight: Option<Decimal>,

    #[validate(range(min = 1, message = "Reps must be at least 1"))]
    pub reps: Option<i32>,

    pub workout_session_id: Option<Uuid>,
}

impl CreatePersonalRecordRequest {
    /// Builds the ledger input. Call `validate()` first.
    pub fn to_new_record(&self) -> crate::Result<NewPersonalRecord> {
        let record_type: RecordType = self.record_type.parse()?;
        let key = RecordKey::new(self.trainee_id, self.exercise_id, record_type);

        Ok(NewPersonalRecord::new(key, self.value)
            .with_weight(self.weight)
            .with_reps(self.reps)
            .from_session(self.workout_session_id)
            .normalized())
    }
}

fn validate_record_type(record_type: &str) -> Result<(), validator::ValidationError> {
    match record_type.parse::<RecordType>() {
        Ok(_) => Ok(()),
        Err(_) => Err(validator::ValidationError::new("invalid_record_type")),
    }
}

fn validate_value(value: &Decimal) -> Result<(), validator::ValidationError> {
    validate_stored_range(*value, Decimal::from(10_000_000_000_i64))
}

fn validate_weight(weight: &Decimal) -> Result<(), validator::ValidationError> {
    validate_stored_range(*weight, Decimal::from(1_000_000))
}

/// Positive and below `limit` once rounded to the 2 decimals the column keeps.
fn validate_stored_range(value: Decimal, limit: Decimal) -> Result<(), validator::ValidationError> {
    let stored = round_2dp(value);
    if stored <= Decimal::ZERO {
        return Err(validator::ValidationError::new("not_positive"));
    }
    if stored >= limit {
        return Err(validator::ValidationError::new("out_of_range"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::dec;

    fn request() -> CreatePersonalRecordRequest {
        CreatePersonalRecordRequest {
            trainee_id: Uuid::new_v4(),
            exercise_id: Uuid::new_v4(),
            record_type: "max_weight".to_string(),
            value: dec("120"),
            weight: Some(dec("120")),
            reps: Some(3),
            workout_session_id: None,
        }
    }

    #[test]
    fn test_valid_request() {
        let req = request();
        assert!(req.validate().is_ok());

        let record = req.to_new_record().unwrap();
        assert_eq!(record.key.record_type, RecordType::MaxWeight);
        assert_eq!(record.reps, Some(3));
    }

    #[test]
    fn test_rejects_non_positive_values() {
        let mut req = request();
        req.value = Decimal::ZERO;
        req.weight = Some(dec("-5"));
        req.reps = Some(0);

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("value"));
        assert!(fields.contains_key("weight"));
        assert!(fields.contains_key("reps"));
    }

    #[test]
    fn test_rejects_values_the_columns_cannot_hold() {
        let mut req = request();
        req.value = dec("10000000000");
        req.weight = Some(dec("1000000"));

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("value"));
        assert!(fields.contains_key("weight"));

        let mut req = request();
        req.value = dec("0.004");
        assert!(req.validate().is_err());

        req.value = dec("9999999999.99");
        req.weight = Some(dec("999999.99"));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_new_record_is_built_at_stored_precision() {
        let mut req = request();
        req.value = dec("100.004");

        let record = req.to_new_record().unwrap();
        assert_eq!(record.value, dec("100.00"));
    }

    #[test]
    fn test_rejects_unknown_record_type() {
        let mut req = request();
        req.record_type = "fastest_time".to_string();

        assert!(req.validate().is_err());
        assert!(req.to_new_record().is_err());
    }
}

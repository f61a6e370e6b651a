use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{RecordType, round_2dp};

/// Identifies one record chain: a trainee's history for one exercise and metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    pub trainee_id: Uuid,
    pub exercise_id: Uuid,
    pub record_type: RecordType,
}

impl RecordKey {
    pub fn new(trainee_id: Uuid, exercise_id: Uuid, record_type: RecordType) -> Self {
        Self {
            trainee_id,
            exercise_id,
            record_type,
        }
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.trainee_id, self.exercise_id, self.record_type
        )
    }
}

/// A personal-best achievement. Immutable once stored; `previous_record_id`
/// points at the record that was current when this one was appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PersonalRecord {
    pub record_id: Uuid,
    pub trainee_id: Uuid,
    pub exercise_id: Uuid,
    pub record_type: String,
    pub value: Decimal,
    pub weight: Option<Decimal>,
    pub reps: Option<i32>,
    pub achieved_at: DateTime<Utc>,
    pub workout_session_id: Option<Uuid>,
    pub previous_record_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Input for appending to a chain. The store fills in the id and the previous link.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPersonalRecord {
    pub key: RecordKey,
    pub value: Decimal,
    pub weight: Option<Decimal>,
    pub reps: Option<i32>,
    pub workout_session_id: Option<Uuid>,
    pub achieved_at: DateTime<Utc>,
}

impl NewPersonalRecord {
    /// An achievement of `value` on `key`, stamped with the current time.
    pub fn new(key: RecordKey, value: Decimal) -> Self {
        Self {
            key,
            value,
            weight: None,
            reps: None,
            workout_session_id: None,
            achieved_at: Utc::now(),
        }
    }

    pub fn with_weight(mut self, weight: Option<Decimal>) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_reps(mut self, reps: Option<i32>) -> Self {
        self.reps = reps;
        self
    }

    pub fn from_session(mut self, session_id: Option<Uuid>) -> Self {
        self.workout_session_id = session_id;
        self
    }

    /// Value and weight at the 2-decimal precision they are stored with.
    pub fn normalized(&self) -> Self {
        Self {
            value: round_2dp(self.value),
            weight: self.weight.map(round_2dp),
            ..self.clone()
        }
    }
}

/// Whether an append is unconditional or must beat the current record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendCondition {
    Always,
    ExceedsCurrent,
}

impl AppendCondition {
    pub fn admits(&self, value: Decimal, current: Option<&PersonalRecord>) -> bool {
        match (self, current) {
            (Self::Always, _) | (Self::ExceedsCurrent, None) => true,
            (Self::ExceedsCurrent, Some(current)) => value > current.value,
        }
    }
}

impl PersonalRecord {
    /// Parsed metric, `None` for a stored type this build does not know.
    pub fn kind(&self) -> Option<RecordType> {
        self.record_type.parse().ok()
    }

    pub fn key(&self) -> Option<RecordKey> {
        self.kind()
            .map(|record_type| RecordKey::new(self.trainee_id, self.exercise_id, record_type))
    }

    pub fn is_first_in_chain(&self) -> bool {
        self.previous_record_id.is_none()
    }

    /// Human readable, unit-qualified value, e.g. `100kg @ 5 reps`, `1.5km`, `3m 45s`.
    pub fn formatted_value(&self) -> String {
        let value = self.value.normalize();

        match self.kind() {
            Some(RecordType::MaxWeight) => {
                let weight = self.weight.unwrap_or(self.value).normalize();
                match self.reps {
                    Some(reps) => format!("{}kg @ {} reps", weight, reps),
                    None => format!("{}kg", weight),
                }
            }
            Some(RecordType::MaxReps) => format!("{} reps", value),
            Some(RecordType::MaxDuration) => {
                let sixty = Decimal::from(60);
                let minutes = (self.value / sixty).floor();
                let seconds = (self.value % sixty).trunc();
                format!("{}m {}s", minutes.normalize(), seconds.normalize())
            }
            Some(RecordType::MaxVolume) => format!("{}kg", value),
            Some(RecordType::MaxDistance) => {
                if self.value >= Decimal::from(1000) {
                    format!("{}km", (self.value / Decimal::from(1000)).normalize())
                } else {
                    format!("{}m", value)
                }
            }
            None => value.to_string(),
        }
    }

    /// `self.value - previous.value`, rounded to 2 decimals.
    pub fn improvement_over(&self, previous: Option<&PersonalRecord>) -> Option<Decimal> {
        previous.map(|prev| round_2dp(self.value - prev.value))
    }

    /// Improvement relative to the previous value, in percent. `None` when there is no
    /// previous record or its value is zero.
    pub fn improvement_percentage_over(&self, previous: Option<&PersonalRecord>) -> Option<Decimal> {
        let prev = previous?;
        if prev.value.is_zero() {
            return None;
        }
        let improvement = self.value - prev.value;
        Some(round_2dp(improvement / prev.value * Decimal::from(100)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::dec;

    fn record(record_type: &str, value: &str) -> PersonalRecord {
        PersonalRecord {
            record_id: Uuid::new_v4(),
            trainee_id: Uuid::new_v4(),
            exercise_id: Uuid::new_v4(),
            record_type: record_type.to_string(),
            value: dec(value),
            weight: None,
            reps: None,
            achieved_at: Utc::now(),
            workout_session_id: None,
            previous_record_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_formats_duration_as_minutes_and_seconds() {
        assert_eq!(record("max_duration", "225").formatted_value(), "3m 45s");
        assert_eq!(record("max_duration", "60").formatted_value(), "1m 0s");
        assert_eq!(record("max_duration", "59").formatted_value(), "0m 59s");
        assert_eq!(record("max_duration", "225.5").formatted_value(), "3m 45s");
    }

    #[test]
    fn test_formats_distance_in_km_from_1000m() {
        assert_eq!(record("max_distance", "1500").formatted_value(), "1.5km");
        assert_eq!(record("max_distance", "1000").formatted_value(), "1km");
        assert_eq!(record("max_distance", "800").formatted_value(), "800m");
    }

    #[test]
    fn test_formats_weight_with_reps() {
        let mut r = record("max_weight", "100.00");
        r.weight = Some(dec("100.00"));
        r.reps = Some(5);
        assert_eq!(r.formatted_value(), "100kg @ 5 reps");

        r.reps = None;
        assert_eq!(r.formatted_value(), "100kg");
    }

    #[test]
    fn test_formats_reps_and_volume() {
        assert_eq!(record("max_reps", "12").formatted_value(), "12 reps");
        assert_eq!(record("max_volume", "2450.50").formatted_value(), "2450.5kg");
    }

    #[test]
    fn test_unknown_type_falls_back_to_raw_value() {
        assert_eq!(record("fastest_sprint", "12.30").formatted_value(), "12.3");
    }

    #[test]
    fn test_improvement_is_none_without_previous() {
        let first = record("max_weight", "100");
        assert_eq!(first.improvement_over(None), None);
        assert_eq!(first.improvement_percentage_over(None), None);
    }

    #[test]
    fn test_improvement_against_previous() {
        let previous = record("max_weight", "80");
        let current = record("max_weight", "92.5");

        assert_eq!(current.improvement_over(Some(&previous)), Some(dec("12.5")));
        assert_eq!(
            current.improvement_percentage_over(Some(&previous)),
            Some(dec("15.63"))
        );
    }

    #[test]
    fn test_improvement_percentage_guards_zero_previous() {
        let previous = record("max_reps", "0");
        let current = record("max_reps", "10");

        assert_eq!(current.improvement_over(Some(&previous)), Some(dec("10")));
        assert_eq!(current.improvement_percentage_over(Some(&previous)), None);
    }

    #[test]
    fn test_normalized_rounds_to_stored_precision() {
        let key = RecordKey::new(Uuid::new_v4(), Uuid::new_v4(), RecordType::MaxWeight);
        let record = NewPersonalRecord::new(key, dec("100.004"))
            .with_weight(Some(dec("100.005")))
            .normalized();

        assert_eq!(record.value, dec("100.00"));
        assert_eq!(record.weight, Some(dec("100.01")));
    }

    #[test]
    fn test_append_condition() {
        let current = record("max_reps", "10");

        assert!(AppendCondition::Always.admits(dec("5"), Some(&current)));
        assert!(AppendCondition::ExceedsCurrent.admits(dec("5"), None));
        assert!(AppendCondition::ExceedsCurrent.admits(dec("11"), Some(&current)));
        assert!(!AppendCondition::ExceedsCurrent.admits(dec("10"), Some(&current)));
        assert!(!AppendCondition::ExceedsCurrent.admits(dec("9"), Some(&current)));
    }
}

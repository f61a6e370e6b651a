pub mod personal_record;
pub mod progress_snapshot;
pub mod record_type;
pub mod workout_session;

use rust_decimal::{Decimal, RoundingStrategy};

pub use personal_record::{AppendCondition, NewPersonalRecord, PersonalRecord, RecordKey};
pub use progress_snapshot::{ProgressSnapshot, SnapshotValues};
pub use record_type::RecordType;
pub use workout_session::{ExerciseLog, SessionStatus, SetLog, WorkoutSession, WorkoutSessionRow};

/// Rounds half away from zero to 2 decimal places.
pub fn round_2dp(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

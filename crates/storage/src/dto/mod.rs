pub mod personal_record;
pub mod progress_snapshot;

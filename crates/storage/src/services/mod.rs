pub mod progress_aggregator;
pub mod record_evaluation;
pub mod record_ledger;
pub mod streak;

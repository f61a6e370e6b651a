mod config;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use storage::{
    Database,
    dto::{personal_record::CreatePersonalRecordRequest, progress_snapshot::ProgressSnapshotResponse},
    services::{progress_aggregator, record_evaluation, record_ledger},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;
use validator::Validate;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "fittrack-jobs")]
#[command(about = "FitTrack personal record and progress snapshot jobs", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Recompute one trainee's snapshot for a day (defaults to today, UTC)
    RecomputeSnapshot {
        #[arg(long)]
        trainee: Uuid,

        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Recompute the snapshot of every trainee for a day
    RecomputeAll {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Record the personal bests reached in a completed workout session
    EvaluateSession { session_id: Uuid },
    /// Log a personal record by hand
    LogRecord {
        #[arg(long)]
        trainee: Uuid,

        #[arg(long)]
        exercise: Uuid,

        #[arg(long = "type")]
        record_type: String,

        #[arg(long)]
        value: Decimal,

        #[arg(long)]
        weight: Option<Decimal>,

        #[arg(long)]
        reps: Option<i32>,

        #[arg(long)]
        session: Option<Uuid>,

        /// Only store the record if it beats the current one
        #[arg(long)]
        only_if_better: bool,
    },
    /// List a trainee's current records
    Records {
        #[arg(long)]
        trainee: Uuid,
    },
    /// Show the chain of records leading up to a record, oldest first
    Progression { record_id: Uuid },
    /// List a trainee's snapshots with day-over-day changes
    Snapshots {
        #[arg(long)]
        trainee: Uuid,

        #[arg(long)]
        from: Option<NaiveDate>,

        #[arg(long)]
        to: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("fittrack_jobs={},jobs={},storage={}", log_level, log_level, log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env(cli.database_url.clone()).context("Failed to load configuration")?;

    tracing::info!(max_connections = config.max_connections, "Connecting to database...");
    let db = Database::with_max_connections(&config.database_url, config.max_connections)
        .await
        .context("Failed to connect to database")?;

    if matches!(cli.command, Commands::Migrate) || config.run_migrations {
        db.run_migrations().await.context("Failed to run migrations")?;
        tracing::info!("Migrations applied");
    }

    let today = Utc::now().date_naive();

    match cli.command {
        Commands::Migrate => {}
        Commands::RecomputeSnapshot { trainee, date } => {
            handle_recompute_snapshot(&db, trainee, date.unwrap_or(today), today).await?;
        }
        Commands::RecomputeAll { date } => {
            handle_recompute_all(&db, date.unwrap_or(today), today).await?;
        }
        Commands::EvaluateSession { session_id } => {
            handle_evaluate_session(&db, session_id).await?;
        }
        Commands::LogRecord {
            trainee,
            exercise,
            record_type,
            value,
            weight,
            reps,
            session,
            only_if_better,
        } => {
            let request = CreatePersonalRecordRequest {
                trainee_id: trainee,
                exercise_id: exercise,
                record_type,
                value,
                weight,
                reps,
                workout_session_id: session,
            };
            handle_log_record(&db, request, only_if_better).await?;
        }
        Commands::Records { trainee } => {
            let records = record_ledger::list_current_records(&db, trainee).await?;
            let mut responses = Vec::with_capacity(records.len());
            for record in records {
                responses.push(record_ledger::describe_record(&db, record).await?);
            }
            print_json(&responses)?;
        }
        Commands::Progression { record_id } => {
            let record = record_ledger::find_record(&db, record_id)
                .await
                .with_context(|| format!("Record {} not found", record_id))?;
            let chain = record_ledger::get_progression_chain(&db, &record).await?;
            print_json(&record_ledger::describe_chain(chain))?;
        }
        Commands::Snapshots { trainee, from, to } => {
            let snapshots = progress_aggregator::list_snapshots(&db, trainee, from, to).await?;
            print_json(&snapshots)?;
        }
    }

    Ok(())
}

async fn handle_recompute_snapshot(
    db: &Database,
    trainee_id: Uuid,
    date: NaiveDate,
    today: NaiveDate,
) -> Result<()> {
    let snapshot = progress_aggregator::recompute_snapshot_at(db, trainee_id, date, today)
        .await
        .with_context(|| format!("Failed to recompute snapshot for trainee {}", trainee_id))?;
    let previous = progress_aggregator::previous_snapshot(db, &snapshot).await?;

    print_json(&ProgressSnapshotResponse::new(snapshot, previous.as_ref()))
}

async fn handle_recompute_all(db: &Database, date: NaiveDate, today: NaiveDate) -> Result<()> {
    tracing::info!(%date, "Recomputing snapshots for all trainees...");
    let summary = progress_aggregator::recompute_all(db, date, today).await?;

    tracing::info!(
        succeeded = summary.succeeded,
        failed = summary.failed.len(),
        "✓ Recomputation finished"
    );
    print_json(&serde_json::json!({
        "date": date,
        "succeeded": summary.succeeded,
        "failed": summary.failed,
    }))?;

    if !summary.failed.is_empty() {
        anyhow::bail!("{} trainee(s) failed", summary.failed.len());
    }

    Ok(())
}

async fn handle_evaluate_session(db: &Database, session_id: Uuid) -> Result<()> {
    let created = record_evaluation::evaluate_completed_session(db, session_id)
        .await
        .with_context(|| format!("Failed to evaluate session {}", session_id))?;

    let mut responses = Vec::with_capacity(created.len());
    for record in created {
        responses.push(record_ledger::describe_record(db, record).await?);
    }
    print_json(&responses)
}

async fn handle_log_record(
    db: &Database,
    request: CreatePersonalRecordRequest,
    only_if_better: bool,
) -> Result<()> {
    request.validate()?;
    let record = request.to_new_record()?;

    let created = if only_if_better {
        record_ledger::record_if_better(db, record).await?
    } else {
        Some(record_ledger::create_new_record(db, record).await?)
    };

    match created {
        Some(record) => print_json(&record_ledger::describe_record(db, record).await?),
        None => {
            tracing::info!("Value does not beat the current record, nothing stored");
            print_json(&serde_json::Value::Null)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

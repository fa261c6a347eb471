use std::process::ExitCode;

use clap::Parser;
use sql_rowstream::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run a SQL query and print its rows as they stream in")]
struct Args {
    /// Database backend (`sqlite`, `sqlite3`, `postgres`, `postgresql`, `pg`, `pgx`)
    #[arg(long, value_enum)]
    driver: DatabaseType,
    /// `SQLite` file path / `:memory:`, or a `PostgreSQL` connection string
    #[arg(long)]
    dsn: String,
    /// Query to stream
    #[arg(long)]
    query: String,
    /// Label printed in front of every output line
    #[arg(long, default_value = "query")]
    label: String,
    /// Bound on queued rows; unbounded when omitted
    #[arg(long)]
    capacity: Option<usize>,
    /// Statements to run on the same connection before the query
    #[arg(long)]
    setup: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(rows) => {
            tracing::info!(rows, "done");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<usize, SqlStreamError> {
    let credentials = ConnectionCredentials::new(args.driver.to_string(), args.dsn);
    let connection = DbConnection::open(&credentials).await?;
    if let Some(setup) = &args.setup {
        if let Err(err) = connection.execute_batch(setup).await {
            if let Err(close_err) = connection.close().await {
                tracing::warn!(error = %close_err, "closing connection after failed setup");
            }
            return Err(err);
        }
    }

    let (tx, rx) = result_stream(args.capacity);
    let query = args.query;
    let producer = tokio::spawn(async move {
        let outcome = run_on_connection(&connection, &query, tx).await;
        outcome.and(connection.close().await)
    });

    let printed = drain_to_stdout(&args.label, rx).await;
    let produced = producer
        .await
        .map_err(|e| SqlStreamError::ExecutionError(format!("producer task failed: {e}")))?;
    settle(printed, produced)
}

/// Printer errors win: a failed write drops the receiver, which the producer
/// then reports as `StreamClosed`.
fn settle(
    printed: Result<usize, SqlStreamError>,
    produced: Result<(), SqlStreamError>,
) -> Result<usize, SqlStreamError> {
    let rows = printed?;
    produced?;
    Ok(rows)
}

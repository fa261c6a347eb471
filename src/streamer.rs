//! Run a query and stream its rows onto a result stream.
//!
//! Every entry point takes the [`RowSender`] by value, so the stream is closed
//! exactly once when the call returns, whichever way it returns. Rows already sent
//! before a failure stay with the consumer; nothing is retried.
//!
//! ```rust,no_run
//! use sql_rowstream::prelude::*;
//!
//! # async fn demo() -> Result<(), SqlStreamError> {
//! let creds = ConnectionCredentials::new("sqlite3", "app.db");
//! let (tx, rx) = result_stream(Some(16));
//! let producer = tokio::spawn(async move {
//!     run_on_credentials(&creds, "SELECT id, name FROM users", tx).await
//! });
//! let printed = drain_to_stdout("users", rx).await?;
//! producer.await.expect("producer task")?;
//! # let _ = printed;
//! # Ok(())
//! # }
//! ```

use tokio::task::JoinHandle;

use crate::connection::{ConnectionCredentials, DbConnection};
use crate::error::SqlStreamError;
use crate::stream::{RowReceiver, RowSender, result_stream};

/// Run `query` on an already open connection and send each row on `output`.
///
/// # Errors
/// Returns the first preparation, execution, decode, cursor or send error.
pub async fn run_on_connection(
    connection: &DbConnection,
    query: &str,
    output: RowSender,
) -> Result<(), SqlStreamError> {
    let db_type = connection.database_type();
    tracing::debug!(driver = %db_type, query, "streaming query");
    let sent = connection.stream_query(query, output).await?;
    tracing::debug!(driver = %db_type, rows = sent, "query stream finished");
    Ok(())
}

/// Open a connection from `credentials`, run `query` on it, then close it.
///
/// The connection is closed whether or not the query succeeded. An error from the
/// query takes precedence over an error from closing.
///
/// # Errors
/// Returns the connect error, the query error, or the close error, in that order
/// of precedence.
pub async fn run_on_credentials(
    credentials: &ConnectionCredentials,
    query: &str,
    output: RowSender,
) -> Result<(), SqlStreamError> {
    let connection = DbConnection::open(credentials).await?;
    let outcome = run_on_connection(&connection, query, output).await;
    let closed = connection.close().await;
    outcome.and(closed)
}

/// Like [`run_on_connection`], but any error is logged instead of returned.
pub async fn run_and_log(connection: &DbConnection, query: &str, output: RowSender) {
    if let Err(err) = run_on_connection(connection, query, output).await {
        report_error(&err);
    }
}

/// Like [`run_on_credentials`], but any error is logged instead of returned.
pub async fn run_and_log_on_credentials(
    credentials: &ConnectionCredentials,
    query: &str,
    output: RowSender,
) {
    if let Err(err) = run_on_credentials(credentials, query, output).await {
        report_error(&err);
    }
}

/// Create a result stream and run [`run_on_credentials`] on a new tokio task.
///
/// Returns the task handle, which resolves to the query's outcome, and the
/// receiving end of the stream. Must be called from within a tokio runtime.
#[must_use]
pub fn spawn_query(
    credentials: ConnectionCredentials,
    query: impl Into<String>,
    capacity: Option<usize>,
) -> (JoinHandle<Result<(), SqlStreamError>>, RowReceiver) {
    let query = query.into();
    let (tx, rx) = result_stream(capacity);
    let handle =
        tokio::spawn(async move { run_on_credentials(&credentials, &query, tx).await });
    (handle, rx)
}

fn report_error(err: &SqlStreamError) {
    tracing::error!("{err}");
}

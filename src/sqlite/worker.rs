use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use rusqlite::Connection;
use tokio::sync::oneshot;

use crate::error::SqlStreamError;
use crate::stream::RowSender;

use super::query::stream_rows;

/// `SQLite` connection owned by a dedicated worker thread.
///
/// `rusqlite` is synchronous, so every operation is shipped to the worker as a
/// command and answered over a oneshot channel. Streamed rows go straight from the
/// worker to the caller's [`RowSender`].
pub struct SqliteConnection {
    sender: Sender<Command>,
    path: String,
}

impl SqliteConnection {
    /// Open `path` (a file path or `:memory:`) on a new worker thread.
    ///
    /// The database is opened by the worker itself, so the blocking open never runs
    /// on the caller's async thread.
    ///
    /// # Errors
    /// Returns `SqlStreamError::ConnectionError` if the database cannot be opened or
    /// the worker thread cannot be spawned.
    pub async fn open(path: &str) -> Result<Self, SqlStreamError> {
        let (opened_tx, opened_rx) = oneshot::channel();
        let (sender, receiver) = mpsc::channel::<Command>();
        let db_path = path.to_string();
        thread::Builder::new()
            .name("sqlite-rowstream-worker".to_string())
            .spawn(move || match Connection::open(&db_path) {
                Ok(conn) => {
                    let _ = opened_tx.send(Ok(()));
                    run_sqlite_worker(conn, &receiver);
                }
                Err(e) => {
                    let _ = opened_tx.send(Err(SqlStreamError::ConnectionError(format!(
                        "failed to open SQLite database {db_path}: {e}"
                    ))));
                }
            })
            .map_err(|err| {
                SqlStreamError::ConnectionError(format!(
                    "failed to spawn SQLite worker thread: {err}"
                ))
            })?;

        opened_rx.await.map_err(|_| {
            SqlStreamError::ConnectionError("SQLite worker exited while opening".into())
        })??;

        tracing::debug!(path, "opened sqlite connection");
        Ok(Self {
            sender,
            path: path.to_string(),
        })
    }

    /// Execute a batch of SQL statements that return no rows.
    ///
    /// # Errors
    /// Propagates any error raised while running the batch or talking to the worker.
    pub async fn execute_batch(&self, query: String) -> Result<(), SqlStreamError> {
        let (tx, rx) = oneshot::channel();
        self.send_command(Command::ExecuteBatch {
            query,
            respond_to: tx,
        })?;
        rx.await.map_err(|_| {
            SqlStreamError::ConnectionError("SQLite worker dropped while executing batch".into())
        })?
    }

    /// Stream the rows of `query` into `sink`.
    ///
    /// The worker drops `sink` before it reports back, so the stream is closed by the
    /// time this returns. If the worker is already gone the command, and with it
    /// `sink`, is dropped here.
    ///
    /// # Errors
    /// Returns the first error the worker hit while preparing, executing, decoding or
    /// sending, or `ConnectionError` if the worker is unavailable.
    pub async fn stream_query(
        &self,
        query: String,
        sink: RowSender,
    ) -> Result<usize, SqlStreamError> {
        let (tx, rx) = oneshot::channel();
        self.send_command(Command::StreamQuery {
            query,
            sink,
            respond_to: tx,
        })?;
        rx.await.map_err(|_| {
            SqlStreamError::ConnectionError("SQLite worker dropped while streaming query".into())
        })?
    }

    /// Close the underlying connection and stop the worker.
    ///
    /// # Errors
    /// Returns the error `SQLite` reported while closing, or `ConnectionError` if the
    /// worker is unavailable.
    pub async fn close(self) -> Result<(), SqlStreamError> {
        let (tx, rx) = oneshot::channel();
        self.send_command(Command::Close { respond_to: tx })?;
        rx.await.map_err(|_| {
            SqlStreamError::ConnectionError("SQLite worker dropped while closing".into())
        })?
    }

    fn send_command(&self, command: Command) -> Result<(), SqlStreamError> {
        self.sender
            .send(command)
            .map_err(|_| SqlStreamError::ConnectionError("SQLite worker closed".into()))
    }
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("path", &self.path)
            .finish()
    }
}

impl Drop for SqliteConnection {
    fn drop(&mut self) {
        let _ = self.sender.send(Command::Shutdown);
    }
}

enum Command {
    ExecuteBatch {
        query: String,
        respond_to: oneshot::Sender<Result<(), SqlStreamError>>,
    },
    StreamQuery {
        query: String,
        sink: RowSender,
        respond_to: oneshot::Sender<Result<usize, SqlStreamError>>,
    },
    Close {
        respond_to: oneshot::Sender<Result<(), SqlStreamError>>,
    },
    Shutdown,
}

fn run_sqlite_worker(conn: Connection, receiver: &Receiver<Command>) {
    while let Ok(command) = receiver.recv() {
        match command {
            Command::ExecuteBatch { query, respond_to } => {
                let outcome = conn.execute_batch(&query).map_err(SqlStreamError::from);
                let _ = respond_to.send(outcome);
            }
            Command::StreamQuery {
                query,
                sink,
                respond_to,
            } => {
                let outcome = stream_rows(&conn, &query, &sink);
                drop(sink);
                let _ = respond_to.send(outcome);
            }
            Command::Close { respond_to } => {
                let outcome = conn.close().map_err(|(_, e)| {
                    SqlStreamError::ConnectionError(format!("SQLite close error: {e}"))
                });
                let _ = respond_to.send(outcome);
                return;
            }
            Command::Shutdown => break,
        }
    }
}

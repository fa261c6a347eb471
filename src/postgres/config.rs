use std::fmt;

use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls};

use crate::error::SqlStreamError;
use crate::stream::RowSender;

use super::query::stream_rows;

/// An open `PostgreSQL` connection.
///
/// `tokio-postgres` splits a connection into a [`Client`] and a background future
/// that drives the socket; the future runs on its own task for as long as the
/// client lives.
pub struct PostgresConnection {
    client: Client,
    driver: JoinHandle<()>,
}

impl PostgresConnection {
    /// Connect using a libpq-style key/value string or a `postgres://` URL.
    ///
    /// # Errors
    /// Returns `SqlStreamError::ConnectionError` if the string does not parse or the
    /// server cannot be reached.
    pub async fn connect(dsn: &str) -> Result<Self, SqlStreamError> {
        let (client, connection) = tokio_postgres::connect(dsn, NoTls)
            .await
            .map_err(|e| SqlStreamError::ConnectionError(format!("postgres connect error: {e}")))?;

        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::warn!(error = %e, "postgres connection task ended with error");
            }
        });

        tracing::debug!("opened postgres connection");
        Ok(Self { client, driver })
    }

    /// Execute a batch of SQL statements that return no rows.
    ///
    /// # Errors
    /// Returns `SqlStreamError::ExecutionError` if any statement fails.
    pub async fn execute_batch(&self, query: &str) -> Result<(), SqlStreamError> {
        self.client
            .batch_execute(query)
            .await
            .map_err(|e| SqlStreamError::ExecutionError(format!("postgres batch error: {e}")))
    }

    /// Stream the rows of `query` into `sink`, closing it before returning.
    ///
    /// # Errors
    /// See [`stream_rows`].
    pub async fn stream_query(
        &self,
        query: &str,
        sink: RowSender,
    ) -> Result<usize, SqlStreamError> {
        stream_rows(&self.client, query, &sink).await
    }

    /// Drop the client and wait for the connection task to finish.
    ///
    /// # Errors
    /// Returns `SqlStreamError::ConnectionError` if the connection task panicked.
    pub async fn close(self) -> Result<(), SqlStreamError> {
        let Self { client, driver } = self;
        drop(client);
        driver.await.map_err(|e| {
            SqlStreamError::ConnectionError(format!("postgres connection task failed: {e}"))
        })
    }
}

impl fmt::Debug for PostgresConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresConnection")
            .field("closed", &self.client.is_closed())
            .finish()
    }
}

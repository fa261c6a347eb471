use serde::{Deserialize, Serialize};

use crate::error::SqlStreamError;
use crate::stream::RowSender;
use crate::types::DatabaseType;

#[cfg(feature = "postgres")]
use crate::postgres::PostgresConnection;
#[cfg(feature = "sqlite")]
use crate::sqlite::SqliteConnection;

/// Driver identifier and connection string used to open a fresh connection.
///
/// ```rust
/// use sql_rowstream::prelude::*;
///
/// let creds = ConnectionCredentials::new("sqlite3", ":memory:");
/// assert_eq!(creds.database_type().unwrap(), DatabaseType::Sqlite);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionCredentials {
    /// Backend name, e.g. `sqlite3` or `postgres`
    pub driver: String,
    /// File path for `SQLite`; key/value string or URL for `PostgreSQL`
    pub connection_string: String,
}

impl ConnectionCredentials {
    pub fn new(driver: impl Into<String>, connection_string: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            connection_string: connection_string.into(),
        }
    }

    /// Resolve the driver identifier.
    ///
    /// # Errors
    /// Returns `SqlStreamError::ConfigError` for an unknown driver.
    pub fn database_type(&self) -> Result<DatabaseType, SqlStreamError> {
        DatabaseType::from_driver_name(&self.driver)
    }
}

impl From<[String; 2]> for ConnectionCredentials {
    fn from([driver, connection_string]: [String; 2]) -> Self {
        Self {
            driver,
            connection_string,
        }
    }
}

impl From<(&str, &str)> for ConnectionCredentials {
    fn from((driver, connection_string): (&str, &str)) -> Self {
        Self::new(driver, connection_string)
    }
}

/// An open connection to one of the supported backends.
#[derive(Debug)]
pub enum DbConnection {
    /// `PostgreSQL` connection
    #[cfg(feature = "postgres")]
    Postgres(PostgresConnection),
    /// `SQLite` connection
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteConnection),
}

impl DbConnection {
    /// Open a connection from a driver identifier and connection string.
    ///
    /// # Errors
    /// Returns `ConfigError` for an unknown driver, `Unimplemented` if the driver's
    /// feature is compiled out, or `ConnectionError` if connecting fails.
    pub async fn open(credentials: &ConnectionCredentials) -> Result<Self, SqlStreamError> {
        let db_type = credentials.database_type()?;
        match db_type {
            #[cfg(feature = "postgres")]
            DatabaseType::Postgres => Ok(DbConnection::Postgres(
                PostgresConnection::connect(&credentials.connection_string).await?,
            )),
            #[cfg(feature = "sqlite")]
            DatabaseType::Sqlite => Ok(DbConnection::Sqlite(
                SqliteConnection::open(&credentials.connection_string).await?,
            )),
            #[allow(unreachable_patterns)]
            _ => Err(SqlStreamError::Unimplemented(format!(
                "the {db_type} backend is not enabled in the current build"
            ))),
        }
    }

    /// Backend this connection talks to.
    #[must_use]
    pub fn database_type(&self) -> DatabaseType {
        match self {
            #[cfg(feature = "postgres")]
            DbConnection::Postgres(_) => DatabaseType::Postgres,
            #[cfg(feature = "sqlite")]
            DbConnection::Sqlite(_) => DatabaseType::Sqlite,
        }
    }

    /// Execute a batch of SQL statements that return no rows.
    ///
    /// # Errors
    /// Returns the backend's error if any statement fails.
    pub async fn execute_batch(&self, query: &str) -> Result<(), SqlStreamError> {
        match self {
            #[cfg(feature = "postgres")]
            DbConnection::Postgres(conn) => conn.execute_batch(query).await,
            #[cfg(feature = "sqlite")]
            DbConnection::Sqlite(conn) => conn.execute_batch(query.to_string()).await,
        }
    }

    /// Stream the rows of `query` into `sink`; `sink` is dropped before this returns.
    pub(crate) async fn stream_query(
        &self,
        query: &str,
        sink: RowSender,
    ) -> Result<usize, SqlStreamError> {
        match self {
            #[cfg(feature = "postgres")]
            DbConnection::Postgres(conn) => conn.stream_query(query, sink).await,
            #[cfg(feature = "sqlite")]
            DbConnection::Sqlite(conn) => conn.stream_query(query.to_string(), sink).await,
        }
    }

    /// Release the connection.
    ///
    /// # Errors
    /// Returns the backend's error if closing fails.
    pub async fn close(self) -> Result<(), SqlStreamError> {
        match self {
            #[cfg(feature = "postgres")]
            DbConnection::Postgres(conn) => conn.close().await,
            #[cfg(feature = "sqlite")]
            DbConnection::Sqlite(conn) => conn.close().await,
        }
    }
}

#[cfg(feature = "postgres")]
impl From<PostgresConnection> for DbConnection {
    fn from(conn: PostgresConnection) -> Self {
        DbConnection::Postgres(conn)
    }
}

#[cfg(feature = "sqlite")]
impl From<SqliteConnection> for DbConnection {
    fn from(conn: SqliteConnection) -> Self {
        DbConnection::Sqlite(conn)
    }
}

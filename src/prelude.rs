//! Convenient imports for common functionality.

pub use crate::connection::{ConnectionCredentials, DbConnection};
pub use crate::error::SqlStreamError;
pub use crate::printer::{drain, drain_to_stdout};
pub use crate::row::{ColumnNames, Row};
pub use crate::stream::{RowReceiver, RowSender, result_stream};
pub use crate::streamer::{
    run_and_log, run_and_log_on_credentials, run_on_connection, run_on_credentials, spawn_query,
};
pub use crate::types::{DatabaseType, RowValue};

#[cfg(feature = "postgres")]
pub use crate::postgres::PostgresConnection;
#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteConnection;

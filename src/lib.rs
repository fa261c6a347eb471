//! Run a SQL query and stream its result rows, one at a time, through a channel.
//!
//! A producer ([`run_on_connection`], [`run_on_credentials`] and their logging
//! variants) prepares and executes a query, copies each row into a [`Row`] of
//! [`RowValue`]s, and sends it on a [`RowSender`]. A consumer drains the matching
//! [`RowReceiver`], for instance with the [`drain`] printer. The stream closes when
//! the producer returns, on success or failure.
//!
//! Backends are cargo features: `sqlite` (via `rusqlite`) and `postgres` (via
//! `tokio-postgres`), both enabled by default.

#[cfg(not(any(feature = "sqlite", feature = "postgres")))]
compile_error!("enable at least one backend feature: `sqlite` or `postgres`");

pub mod prelude;

pub mod connection;
pub mod error;
pub mod printer;
pub mod row;
pub mod stream;
pub mod streamer;
pub mod types;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use connection::{ConnectionCredentials, DbConnection};
pub use error::SqlStreamError;
pub use printer::{drain, drain_to_stdout};
pub use row::{ColumnNames, Row};
pub use stream::{RowReceiver, RowSender, result_stream};
pub use streamer::{
    run_and_log, run_and_log_on_credentials, run_on_connection, run_on_credentials, spawn_query,
};
pub use types::{DatabaseType, RowValue};

// PostgreSQL backend
//
// - config: connecting and the connection handle
// - query: value extraction and the row-stream loop that feeds a result stream

pub mod config;
pub mod query;

pub use config::PostgresConnection;
pub use query::{postgres_extract_value, stream_rows};

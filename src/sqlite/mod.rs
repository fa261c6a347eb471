// SQLite backend
//
// - query: value extraction and the cursor loop that feeds a result stream
// - worker: connection handle backed by a dedicated worker thread

pub mod query;
pub mod worker;

pub use query::{sqlite_extract_value, stream_rows};
pub use worker::SqliteConnection;

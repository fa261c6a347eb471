use thiserror::Error;

#[cfg(feature = "sqlite")]
use rusqlite;

#[derive(Debug, Error)]
pub enum SqlStreamError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Statement preparation error: {0}")]
    PrepareError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Row decode error: {0}")]
    DecodeError(String),

    #[error("Cursor error: {0}")]
    CursorError(String),

    #[error("Result stream closed by the consumer")]
    StreamClosed,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Unimplemented feature: {0}")]
    Unimplemented(String),
}

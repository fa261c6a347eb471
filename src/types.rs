use std::fmt;

use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde_json::Value as JsonValue;

use crate::error::SqlStreamError;

/// A single column value as decoded from a result row.
///
/// Every backend maps its wire types onto this enum, so consumers never need to
/// branch on driver types:
/// ```rust
/// use sql_rowstream::prelude::*;
///
/// let values = vec![
///     RowValue::Int(1),
///     RowValue::Text("alice".into()),
///     RowValue::Null,
/// ];
/// assert_eq!(values[1].type_name(), "text");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValue {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value
    Json(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl RowValue {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValue::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValue::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<&bool> {
        if let RowValue::Bool(value) = self {
            return Some(value);
        } else if let Some(i) = self.as_int() {
            if *i == 1 {
                return Some(&true);
            } else if *i == 0 {
                return Some(&false);
            }
        }
        None
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let RowValue::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        if let RowValue::Timestamp(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let RowValue::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// Runtime type tag used by the result printer.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            RowValue::Int(_) => "int",
            RowValue::Float(_) => "float",
            RowValue::Text(_) => "text",
            RowValue::Bool(_) => "bool",
            RowValue::Timestamp(_) => "timestamp",
            RowValue::Null => "null",
            RowValue::Json(_) => "json",
            RowValue::Blob(_) => "blob",
        }
    }
}

impl fmt::Display for RowValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowValue::Int(i) => write!(f, "{i}"),
            RowValue::Float(v) => write!(f, "{v}"),
            RowValue::Text(s) => f.write_str(s),
            RowValue::Bool(b) => write!(f, "{b}"),
            RowValue::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%.f")),
            RowValue::Null => f.write_str("NULL"),
            RowValue::Json(js) => write!(f, "{js}"),
            // Blobs print as their raw bytes, lossily decoded.
            RowValue::Blob(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
        }
    }
}

/// The database backends a driver identifier can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum DatabaseType {
    /// `PostgreSQL` database
    #[value(alias = "postgresql", alias = "pg", alias = "pgx")]
    Postgres,
    /// `SQLite` database
    #[value(alias = "sqlite3")]
    Sqlite,
}

impl DatabaseType {
    /// Resolve a driver identifier such as `"sqlite3"` or `"postgres"`.
    ///
    /// # Errors
    ///
    /// Returns `SqlStreamError::ConfigError` if the identifier names no known backend.
    pub fn from_driver_name(driver: &str) -> Result<Self, SqlStreamError> {
        match driver.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" | "pgx" => Ok(DatabaseType::Postgres),
            "sqlite" | "sqlite3" => Ok(DatabaseType::Sqlite),
            other => Err(SqlStreamError::ConfigError(format!(
                "unknown database driver: {other:?}"
            ))),
        }
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseType::Postgres => f.write_str("postgres"),
            DatabaseType::Sqlite => f.write_str("sqlite"),
        }
    }
}

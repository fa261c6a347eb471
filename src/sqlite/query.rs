use std::sync::Arc;

use rusqlite::Connection;
use rusqlite::types::ValueRef;

use crate::error::SqlStreamError;
use crate::row::{ColumnNames, Row};
use crate::stream::RowSender;
use crate::types::RowValue;

/// Extract a `RowValue` from a `SQLite` row.
///
/// Text columns must hold valid UTF-8.
///
/// # Errors
///
/// Returns `SqlStreamError::DecodeError` if the value cannot be read or converted.
pub fn sqlite_extract_value(
    row: &rusqlite::Row<'_>,
    idx: usize,
) -> Result<RowValue, SqlStreamError> {
    let value = row
        .get_ref(idx)
        .map_err(|e| SqlStreamError::DecodeError(format!("sqlite column {idx}: {e}")))?;
    match value {
        ValueRef::Null => Ok(RowValue::Null),
        ValueRef::Integer(i) => Ok(RowValue::Int(i)),
        ValueRef::Real(f) => Ok(RowValue::Float(f)),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map(|s| RowValue::Text(s.to_owned()))
            .map_err(|e| SqlStreamError::DecodeError(format!("sqlite column {idx}: {e}"))),
        ValueRef::Blob(b) => Ok(RowValue::Blob(b.to_vec())),
    }
}

/// Prepare `query`, run it, and send every row on `sink`.
///
/// Stops at the first decode or cursor error; rows sent before it stay sent. The
/// cursor is dropped before the statement on every path. Returns the number of rows
/// sent.
///
/// # Errors
/// Returns `PrepareError`, `ExecutionError`, `DecodeError`, `CursorError` or
/// `StreamClosed`, whichever happens first.
pub fn stream_rows(
    conn: &Connection,
    query: &str,
    sink: &RowSender,
) -> Result<usize, SqlStreamError> {
    let mut stmt = conn
        .prepare(query)
        .map_err(|e| SqlStreamError::PrepareError(format!("sqlite prepare error: {e}")))?;

    let column_names: ColumnNames = Arc::new(
        stmt.column_names()
            .iter()
            .map(std::string::ToString::to_string)
            .collect(),
    );
    let col_count = column_names.len();

    let mut rows = stmt
        .query([])
        .map_err(|e| SqlStreamError::ExecutionError(format!("sqlite query error: {e}")))?;

    let mut sent = 0;
    loop {
        let row = match rows.next() {
            Ok(Some(row)) => row,
            Ok(None) => break,
            Err(e) => {
                return Err(SqlStreamError::CursorError(format!(
                    "sqlite step error after {sent} rows: {e}"
                )));
            }
        };

        let mut values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            values.push(sqlite_extract_value(row, i)?);
        }

        sink.blocking_send(Row::new(Arc::clone(&column_names), values))?;
        sent += 1;
    }

    Ok(sent)
}

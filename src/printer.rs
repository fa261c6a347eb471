use std::io::{self, Write};

use crate::error::SqlStreamError;
use crate::stream::RowReceiver;

/// Drain `input` into `sink` until the producer closes the stream.
///
/// Each row produces a `Result(<label>): [...]` line followed by one
/// `Item(<label>) <type>: <value>` line per column. Returns the number of rows
/// written.
///
/// # Errors
/// Returns `SqlStreamError::Io` if writing to `sink` fails. The remaining rows are
/// left unread; the producer sees `StreamClosed` once the receiver is dropped.
pub async fn drain<W: Write>(
    label: &str,
    mut input: RowReceiver,
    sink: &mut W,
) -> Result<usize, SqlStreamError> {
    let mut printed = 0;
    while let Some(row) = input.recv().await {
        writeln!(sink, "Result({label}): {row}")?;
        for value in row.values() {
            writeln!(sink, "Item({label}) {}: {value}", value.type_name())?;
        }
        printed += 1;
    }
    sink.flush()?;
    Ok(printed)
}

/// [`drain`] to standard output.
///
/// # Errors
/// Returns `SqlStreamError::Io` if writing to stdout fails.
pub async fn drain_to_stdout(label: &str, input: RowReceiver) -> Result<usize, SqlStreamError> {
    let mut out = io::stdout();
    drain(label, input, &mut out).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::row::Row;
    use crate::stream::result_stream;
    use crate::types::RowValue;

    #[tokio::test]
    async fn writes_row_and_item_lines() {
        let cols = Arc::new(vec!["id".to_string(), "name".to_string(), "note".to_string()]);
        let (tx, rx) = result_stream(None);
        tx.send(Row::new(
            Arc::clone(&cols),
            vec![RowValue::Int(1), RowValue::Text("a".into()), RowValue::Null],
        ))
        .await
        .unwrap();
        drop(tx);

        let mut out = Vec::new();
        let printed = drain("q", rx, &mut out).await.unwrap();
        assert_eq!(printed, 1);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Result(q): [1 a NULL]\nItem(q) int: 1\nItem(q) text: a\nItem(q) null: NULL\n"
        );
    }

    #[tokio::test]
    async fn empty_stream_prints_nothing() {
        let (tx, rx) = result_stream(Some(1));
        drop(tx);
        let mut out = Vec::new();
        assert_eq!(drain("empty", rx, &mut out).await.unwrap(), 0);
        assert!(out.is_empty());
    }
}

#![cfg(feature = "sqlite")]

use common::logs::CapturedLogs;
use sql_rowstream::prelude::*;

mod common {
    pub mod logs;
}

async fn fixture(setup: &str) -> Result<DbConnection, SqlStreamError> {
    let conn = DbConnection::open(&ConnectionCredentials::new("sqlite3", ":memory:")).await?;
    conn.execute_batch(setup).await?;
    Ok(conn)
}

fn ints(rows: &[Row], idx: usize) -> Vec<i64> {
    rows.iter()
        .map(|r| *r.get_by_index(idx).and_then(RowValue::as_int).unwrap())
        .collect()
}

#[tokio::test]
async fn two_row_fixture_streams_in_order() -> Result<(), Box<dyn std::error::Error>> {
    let conn = fixture(
        "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
         INSERT INTO t (id, name) VALUES (1, 'a'), (2, 'b');",
    )
    .await?;

    let (tx, rx) = result_stream(None);
    run_on_connection(&conn, "SELECT id, name FROM t", tx).await?;
    let rows = rx.collect().await;

    assert_eq!(rows.len(), 2);
    assert_eq!(
        rows[0].values(),
        &[RowValue::Int(1), RowValue::Text("a".into())]
    );
    assert_eq!(
        rows[1].values(),
        &[RowValue::Int(2), RowValue::Text("b".into())]
    );
    assert_eq!(rows[0].column_names(), &["id".to_string(), "name".to_string()]);
    assert_eq!(rows[1].get("name").and_then(RowValue::as_text), Some("b"));

    conn.close().await?;
    Ok(())
}

#[tokio::test]
async fn zero_rows_closes_empty_stream() -> Result<(), Box<dyn std::error::Error>> {
    let conn = fixture("CREATE TABLE t (id INTEGER, name TEXT);").await?;

    let (tx, mut rx) = result_stream(Some(1));
    run_on_connection(&conn, "SELECT id, name FROM t", tx).await?;
    assert!(rx.recv().await.is_none());
    // Closed stays closed.
    assert!(rx.recv().await.is_none());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn many_rows_through_bounded_stream_keep_cursor_order()
-> Result<(), Box<dyn std::error::Error>> {
    let conn = fixture("CREATE TABLE unused (id INTEGER);").await?;
    let (tx, rx) = result_stream(Some(4));

    let producer = tokio::spawn(async move {
        let outcome = run_on_connection(
            &conn,
            "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 250)
             SELECT x, 'row-' || x, x * 0.5, NULL FROM c",
            tx,
        )
        .await;
        (conn, outcome)
    });

    let rows = rx.collect().await;
    let (conn, outcome) = producer.await?;
    outcome?;
    conn.close().await?;

    assert_eq!(rows.len(), 250);
    assert!(rows.iter().all(|r| r.len() == 4));
    assert_eq!(ints(&rows, 0), (1..=250).collect::<Vec<_>>());
    assert_eq!(rows[9].get_by_index(1).and_then(RowValue::as_text), Some("row-10"));
    assert_eq!(rows[9].get_by_index(2).and_then(RowValue::as_float), Some(5.0));
    assert!(rows[9].get_by_index(3).is_some_and(RowValue::is_null));
    Ok(())
}

#[tokio::test]
async fn invalid_query_is_a_prepare_error_with_no_rows() -> Result<(), Box<dyn std::error::Error>>
{
    let conn = fixture("CREATE TABLE t (id INTEGER);").await?;

    let (tx, rx) = result_stream(None);
    let err = run_on_connection(&conn, "SELEC id FRM t", tx)
        .await
        .unwrap_err();
    assert!(matches!(err, SqlStreamError::PrepareError(_)), "{err:?}");
    assert!(rx.collect().await.is_empty());

    let (tx, rx) = result_stream(None);
    let err = run_on_connection(&conn, "SELECT nope FROM missing_table", tx)
        .await
        .unwrap_err();
    assert!(matches!(err, SqlStreamError::PrepareError(_)), "{err:?}");
    assert!(rx.collect().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn decode_failure_on_row_three_keeps_first_two() -> Result<(), Box<dyn std::error::Error>> {
    let conn = fixture(
        "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT);
         INSERT INTO t (id, name) VALUES (1, 'a'), (2, 'b'), (3, CAST(x'ff' AS TEXT)), (4, 'd');",
    )
    .await?;

    let (tx, rx) = result_stream(None);
    let err = run_on_connection(&conn, "SELECT id, name FROM t ORDER BY id", tx)
        .await
        .unwrap_err();
    assert!(matches!(err, SqlStreamError::DecodeError(_)), "{err:?}");

    let rows = rx.collect().await;
    assert_eq!(ints(&rows, 0), vec![1, 2]);
    Ok(())
}

#[tokio::test]
async fn cursor_error_after_rows_still_fails_the_call() -> Result<(), Box<dyn std::error::Error>>
{
    let conn = fixture(
        "CREATE TABLE nums (id INTEGER PRIMARY KEY, v INTEGER);
         INSERT INTO nums (id, v) VALUES (1, -1), (2, -2), (3, -9223372036854775807 - 1), (4, -4);",
    )
    .await?;

    let (tx, rx) = result_stream(None);
    let err = run_on_connection(&conn, "SELECT id, abs(v) FROM nums", tx)
        .await
        .unwrap_err();
    assert!(matches!(err, SqlStreamError::CursorError(_)), "{err:?}");

    let rows = rx.collect().await;
    assert_eq!(ints(&rows, 1), vec![1, 2]);
    Ok(())
}

#[tokio::test]
async fn dropped_consumer_stops_the_producer() -> Result<(), Box<dyn std::error::Error>> {
    let conn = fixture("CREATE TABLE unused (id INTEGER);").await?;

    let (tx, rx) = result_stream(Some(2));
    drop(rx);
    let err = run_on_connection(
        &conn,
        "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 10)
         SELECT x FROM c",
        tx,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SqlStreamError::StreamClosed), "{err:?}");

    // The connection is still usable afterwards.
    let (tx, rx) = result_stream(None);
    run_on_connection(&conn, "SELECT 42 AS answer", tx).await?;
    let rows = rx.collect().await;
    assert_eq!(rows[0].get("answer"), Some(&RowValue::Int(42)));
    Ok(())
}

#[tokio::test]
async fn column_types_map_to_row_values() -> Result<(), Box<dyn std::error::Error>> {
    let conn = fixture("CREATE TABLE unused (id INTEGER);").await?;

    let (tx, rx) = result_stream(None);
    run_on_connection(
        &conn,
        "SELECT 7 AS i, 2.5 AS f, 'txt' AS s, x'0102' AS b, NULL AS n",
        tx,
    )
    .await?;
    let rows = rx.collect().await;
    let tags: Vec<&str> = rows[0].values().iter().map(RowValue::type_name).collect();
    assert_eq!(tags, vec!["int", "float", "text", "blob", "null"]);
    assert_eq!(rows[0].get("b").and_then(RowValue::as_blob), Some(&[1u8, 2][..]));
    Ok(())
}

#[tokio::test]
async fn run_and_log_swallows_errors_and_closes() -> Result<(), Box<dyn std::error::Error>> {
    let conn = fixture("CREATE TABLE t (id INTEGER); INSERT INTO t VALUES (5);").await?;
    let (logs, _guard) = CapturedLogs::install();

    let (tx, rx) = result_stream(None);
    run_and_log(&conn, "this is not sql", tx).await;
    assert!(rx.collect().await.is_empty());

    let errors = logs.error_lines();
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(errors[0].contains("Statement preparation error"), "{errors:?}");
    assert!(errors[0].contains("sqlite prepare error"), "{errors:?}");

    let (tx, rx) = result_stream(None);
    run_and_log(&conn, "SELECT id FROM t", tx).await;
    assert_eq!(ints(&rx.collect().await, 0), vec![5]);
    // A successful run adds nothing at error level.
    assert_eq!(logs.error_lines().len(), 1);
    Ok(())
}

use std::error::Error;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use futures_util::{TryStreamExt, pin_mut};
use serde_json::Value;
use tokio_postgres::Client;
use tokio_postgres::types::{FromSql, Type};

use crate::error::SqlStreamError;
use crate::row::{ColumnNames, Row};
use crate::stream::RowSender;
use crate::types::RowValue;

/// Extracts a `RowValue` from a `tokio_postgres` Row at the given index.
///
/// Text-like types become `Text`. Any other type without a dedicated mapping is
/// decoded by [`AnyValue`], so no column type aborts the stream.
///
/// # Errors
/// Returns `SqlStreamError::DecodeError` if the column cannot be retrieved.
pub fn postgres_extract_value(
    row: &tokio_postgres::Row,
    idx: usize,
) -> Result<RowValue, SqlStreamError> {
    let decode_err = |e: tokio_postgres::Error| {
        let column = row.columns().get(idx).map_or("?", |c| c.name());
        SqlStreamError::DecodeError(format!("postgres column {idx} ({column}): {e}"))
    };
    let column_type = row
        .columns()
        .get(idx)
        .ok_or_else(|| SqlStreamError::DecodeError(format!("postgres column {idx} out of range")))?
        .type_();

    let value = match column_type.name() {
        "int2" => {
            let val: Option<i16> = row.try_get(idx).map_err(decode_err)?;
            val.map_or(RowValue::Null, |v| RowValue::Int(i64::from(v)))
        }
        "int4" => {
            let val: Option<i32> = row.try_get(idx).map_err(decode_err)?;
            val.map_or(RowValue::Null, |v| RowValue::Int(i64::from(v)))
        }
        "int8" => {
            let val: Option<i64> = row.try_get(idx).map_err(decode_err)?;
            val.map_or(RowValue::Null, RowValue::Int)
        }
        "float4" => {
            let val: Option<f32> = row.try_get(idx).map_err(decode_err)?;
            val.map_or(RowValue::Null, |v| RowValue::Float(f64::from(v)))
        }
        "float8" => {
            let val: Option<f64> = row.try_get(idx).map_err(decode_err)?;
            val.map_or(RowValue::Null, RowValue::Float)
        }
        "bool" => {
            let val: Option<bool> = row.try_get(idx).map_err(decode_err)?;
            val.map_or(RowValue::Null, RowValue::Bool)
        }
        "timestamp" => {
            let val: Option<NaiveDateTime> = row.try_get(idx).map_err(decode_err)?;
            val.map_or(RowValue::Null, RowValue::Timestamp)
        }
        "timestamptz" => {
            let val: Option<DateTime<Utc>> = row.try_get(idx).map_err(decode_err)?;
            val.map_or(RowValue::Null, |v| RowValue::Timestamp(v.naive_utc()))
        }
        "json" | "jsonb" => {
            let val: Option<Value> = row.try_get(idx).map_err(decode_err)?;
            val.map_or(RowValue::Null, RowValue::Json)
        }
        "date" => {
            let val: Option<NaiveDate> = row.try_get(idx).map_err(decode_err)?;
            val.map_or(RowValue::Null, |v| RowValue::Timestamp(v.and_time(NaiveTime::MIN)))
        }
        "time" => {
            let val: Option<NaiveTime> = row.try_get(idx).map_err(decode_err)?;
            val.map_or(RowValue::Null, |v| RowValue::Text(v.to_string()))
        }
        "bytea" => {
            let val: Option<Vec<u8>> = row.try_get(idx).map_err(decode_err)?;
            val.map_or(RowValue::Null, RowValue::Blob)
        }
        _ if <String as FromSql>::accepts(column_type) => {
            let val: Option<String> = row.try_get(idx).map_err(decode_err)?;
            val.map_or(RowValue::Null, RowValue::Text)
        }
        _ => {
            let val: Option<AnyValue> = row.try_get(idx).map_err(decode_err)?;
            val.map_or(RowValue::Null, |v| v.0)
        }
    };
    Ok(value)
}

/// Fallback decoding for column types that have no dedicated `RowValue` mapping.
///
/// `numeric` and `uuid` are rendered as their usual text forms. Any other payload
/// becomes `Text` if it is printable UTF-8 (enum labels, for instance) and `Blob`
/// otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct AnyValue(pub RowValue);

impl<'a> FromSql<'a> for AnyValue {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        let value = match ty.name() {
            "numeric" => RowValue::Text(numeric_to_string(raw)?),
            "uuid" if raw.len() == 16 => RowValue::Text(uuid_to_string(raw)),
            _ => match std::str::from_utf8(raw) {
                Ok(text) if !text.contains(char::is_control) => RowValue::Text(text.to_string()),
                _ => RowValue::Blob(raw.to_vec()),
            },
        };
        Ok(AnyValue(value))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

/// Render a binary `numeric` (base-10000 digit groups) as decimal text.
fn numeric_to_string(raw: &[u8]) -> Result<String, Box<dyn Error + Sync + Send>> {
    let word = |at: usize| raw.get(at..at + 2).map(|b| u16::from_be_bytes([b[0], b[1]]));
    let header = (word(0), word(2), word(4), word(6));
    let (Some(ndigits), Some(weight), Some(sign), Some(dscale)) = header else {
        return Err("numeric value shorter than its header".into());
    };
    let ndigits = usize::from(ndigits);
    let weight = i32::from(i16::from_be_bytes(weight.to_be_bytes()));
    let dscale = usize::from(dscale);
    if raw.len() != 8 + 2 * ndigits {
        return Err(format!("numeric value has {} bytes for {ndigits} digits", raw.len()).into());
    }

    match sign {
        NUMERIC_NAN => return Ok("NaN".to_string()),
        NUMERIC_PINF => return Ok("Infinity".to_string()),
        NUMERIC_NINF => return Ok("-Infinity".to_string()),
        _ => {}
    }

    let digits: Vec<u16> = (0..ndigits).filter_map(|i| word(8 + 2 * i)).collect();
    let group = |i: i32| {
        usize::try_from(i)
            .ok()
            .and_then(|i| digits.get(i).copied())
            .unwrap_or(0)
    };

    let mut out = String::new();
    if sign == NUMERIC_NEG {
        out.push('-');
    }
    if weight < 0 {
        out.push('0');
    } else {
        out.push_str(&group(0).to_string());
        for i in 1..=weight {
            out.push_str(&format!("{:04}", group(i)));
        }
    }

    if dscale > 0 {
        let mut frac = String::with_capacity(dscale + 4);
        let mut i = weight + 1;
        while frac.len() < dscale {
            frac.push_str(&format!("{:04}", group(i)));
            i += 1;
        }
        frac.truncate(dscale);
        out.push('.');
        out.push_str(&frac);
    }
    Ok(out)
}

fn uuid_to_string(raw: &[u8]) -> String {
    let hex: String = raw.iter().map(|b| format!("{b:02x}")).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

/// Prepare `query`, run it, and send every row on `sink` as it arrives.
///
/// Rows are pulled one at a time off the server's result stream. Errors the server
/// reports mid-stream end the loop even though earlier rows were already sent.
/// Returns the number of rows sent.
///
/// # Errors
/// Returns `PrepareError`, `ExecutionError`, `DecodeError`, `CursorError` or
/// `StreamClosed`, whichever happens first.
pub async fn stream_rows(
    client: &Client,
    query: &str,
    sink: &RowSender,
) -> Result<usize, SqlStreamError> {
    let stmt = client
        .prepare(query)
        .await
        .map_err(|e| SqlStreamError::PrepareError(format!("postgres prepare error: {e}")))?;

    let column_names: ColumnNames = Arc::new(
        stmt.columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect(),
    );
    let col_count = column_names.len();

    let rows = client
        .query_raw(&stmt, Vec::<String>::new())
        .await
        .map_err(|e| SqlStreamError::ExecutionError(format!("postgres select error: {e}")))?;
    pin_mut!(rows);

    let mut sent = 0;
    loop {
        let row = match rows.try_next().await {
            Ok(Some(row)) => row,
            Ok(None) => break,
            Err(e) => {
                return Err(SqlStreamError::CursorError(format!(
                    "postgres row stream error after {sent} rows: {e}"
                )));
            }
        };

        let mut values = Vec::with_capacity(col_count);
        for idx in 0..col_count {
            values.push(postgres_extract_value(&row, idx)?);
        }

        sink.send(Row::new(Arc::clone(&column_names), values)).await?;
        sent += 1;
    }

    Ok(sent)
}

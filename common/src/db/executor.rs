use crate::db::classify_sqlx_error;
use crate::db::value::{RawResultSet, RawValue, Temporal};
use crate::error::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::types::Oid;
use sqlx::postgres::PgRow;
use sqlx::{Column, Executor, PgConnection, Row, Statement, TypeInfo, ValueRef};

/// decode strategy picked from the declared postgres type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Bool,
    Int2,
    Int4,
    Int8,
    Oid,
    Float4,
    Float8,
    Numeric,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Bytea,
    Text,
}

impl ColumnKind {
    pub fn from_type_name(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "BOOL" => ColumnKind::Bool,
            "INT2" => ColumnKind::Int2,
            "INT4" => ColumnKind::Int4,
            "INT8" => ColumnKind::Int8,
            "OID" => ColumnKind::Oid,
            "FLOAT4" => ColumnKind::Float4,
            "FLOAT8" => ColumnKind::Float8,
            "NUMERIC" => ColumnKind::Numeric,
            "DATE" => ColumnKind::Date,
            "TIME" => ColumnKind::Time,
            "TIMESTAMP" => ColumnKind::Timestamp,
            "TIMESTAMPTZ" => ColumnKind::TimestampTz,
            "BYTEA" => ColumnKind::Bytea,
            _ => ColumnKind::Text,
        }
    }
}

/// run one statement verbatim and read every row.
///
/// The statement is described first so the column list is known even when
/// no rows come back, then executed over the simple query protocol so every
/// cell arrives in postgres text format and any type can fall back to text.
#[tracing::instrument(skip(conn, sql), fields(sql_len = sql.len()))]
pub async fn execute(conn: &mut PgConnection, sql: &str) -> Result<RawResultSet> {
    let statement = (&mut *conn).prepare(sql).await.map_err(classify_sqlx_error)?;
    let columns: Vec<String> = statement
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();

    let pg_rows = (&mut *conn)
        .fetch_all(sqlx::raw_sql(sql))
        .await
        .map_err(classify_sqlx_error)?;

    let rows = pg_rows.iter().map(decode_row).collect::<Vec<_>>();

    tracing::info!(column_count = columns.len(), row_count = rows.len(), "query executed");
    Ok(RawResultSet { columns, rows })
}

fn decode_row(row: &PgRow) -> Vec<RawValue> {
    (0..row.len()).map(|idx| decode_cell(row, idx)).collect()
}

fn decode_cell(row: &PgRow, idx: usize) -> RawValue {
    let is_null = row.try_get_raw(idx).map(|v| v.is_null()).unwrap_or(false);
    if is_null {
        return RawValue::Null;
    }

    let kind = ColumnKind::from_type_name(row.columns()[idx].type_info().name());
    match decode_typed(row, idx, kind) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(column = idx, ?kind, "typed decode failed, using text: {}", e);
            decode_text(row, idx)
        }
    }
}

fn decode_typed(row: &PgRow, idx: usize, kind: ColumnKind) -> std::result::Result<RawValue, sqlx::Error> {
    let value: RawValue = match kind {
        ColumnKind::Bool => row.try_get::<Option<bool>, _>(idx)?.into(),
        ColumnKind::Int2 => row.try_get::<Option<i16>, _>(idx)?.map(i64::from).into(),
        ColumnKind::Int4 => row.try_get::<Option<i32>, _>(idx)?.map(i64::from).into(),
        ColumnKind::Int8 => row.try_get::<Option<i64>, _>(idx)?.into(),
        ColumnKind::Oid => row.try_get::<Option<Oid>, _>(idx)?.map(|o| i64::from(o.0)).into(),
        ColumnKind::Float4 => match row.try_get_unchecked::<Option<&str>, _>(idx)? {
            Some(text) => parse_float_text(text)?.into(),
            None => RawValue::Null,
        },
        ColumnKind::Float8 => row.try_get::<Option<f64>, _>(idx)?.into(),
        ColumnKind::Numeric => row.try_get::<Option<Decimal>, _>(idx)?.into(),
        ColumnKind::Date => row
            .try_get::<Option<NaiveDate>, _>(idx)?
            .map(Temporal::Date)
            .into(),
        ColumnKind::Time => row
            .try_get::<Option<NaiveTime>, _>(idx)?
            .map(Temporal::Time)
            .into(),
        ColumnKind::Timestamp => row
            .try_get::<Option<NaiveDateTime>, _>(idx)?
            .map(Temporal::Timestamp)
            .into(),
        ColumnKind::TimestampTz => row
            .try_get::<Option<DateTime<Utc>>, _>(idx)?
            .map(Temporal::TimestampTz)
            .into(),
        ColumnKind::Bytea => row.try_get::<Option<Vec<u8>>, _>(idx)?.into(),
        ColumnKind::Text => return Ok(decode_text(row, idx)),
    };
    Ok(value)
}

/// read a float from the server's own text so `0.1::real` stays `0.1`
fn parse_float_text(text: &str) -> std::result::Result<f64, sqlx::Error> {
    text.trim()
        .parse::<f64>()
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

fn decode_text(row: &PgRow, idx: usize) -> RawValue {
    if let Ok(text) = row.try_get_unchecked::<Option<String>, _>(idx) {
        return text.into();
    }
    match row.try_get_unchecked::<Option<Vec<u8>>, _>(idx) {
        Ok(bytes) => bytes.into(),
        Err(_) => RawValue::Null,
    }
}

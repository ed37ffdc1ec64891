use crate::db::value::{Number, RawResultSet, RawValue, Temporal};
use chrono::SecondsFormat;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use serde_json::{Map, Value};

/// one result row: column name to json-safe value, in executor column order
pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

pub fn normalize(raw: RawResultSet) -> ResultSet {
    let rows = raw
        .rows
        .into_iter()
        .map(|values| normalize_row(values, &raw.columns))
        .collect();

    ResultSet {
        columns: raw.columns,
        rows,
    }
}

/// zip positional values with their column names
pub fn normalize_row(values: Vec<RawValue>, columns: &[String]) -> Row {
    columns
        .iter()
        .cloned()
        .zip(values.into_iter().map(normalize_value))
        .collect()
}

pub fn normalize_value(value: RawValue) -> Value {
    match value {
        RawValue::Null => Value::Null,
        RawValue::Bool(b) => Value::Bool(b),
        RawValue::Number(n) => normalize_number(n),
        RawValue::Text(s) => Value::String(s),
        RawValue::Temporal(t) => Value::String(iso8601(&t)),
        RawValue::Binary(bytes) => Value::String(format!("\\x{}", hex::encode(bytes))),
    }
}

fn normalize_number(n: Number) -> Value {
    match n {
        Number::Int(i) => Value::from(i),
        Number::Float(f) => float_value(f),
        Number::Decimal(d) => match d.to_f64() {
            Some(f) => float_value(f),
            None => Value::String(d.to_string()),
        },
    }
}

fn float_value(f: f64) -> Value {
    match serde_json::Number::from_f64(f) {
        Some(n) => Value::Number(n),
        None if f.is_nan() => Value::String("NaN".to_string()),
        None if f.is_sign_positive() => Value::String("Infinity".to_string()),
        None => Value::String("-Infinity".to_string()),
    }
}

pub fn iso8601(t: &Temporal) -> String {
    match t {
        Temporal::Date(d) => d.format("%Y-%m-%d").to_string(),
        Temporal::Time(t) => t.format("%H:%M:%S%.f").to_string(),
        Temporal::Timestamp(ts) => ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
        Temporal::TimestampTz(ts) => ts.to_rfc3339_opts(SecondsFormat::AutoSi, false),
    }
}

impl From<&Value> for RawValue {
    /// map an already normalized value back onto its raw category
    fn from(v: &Value) -> Self {
        match v {
            Value::Null => RawValue::Null,
            Value::Bool(b) => RawValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => RawValue::Number(Number::Int(i)),
                None => RawValue::Number(Number::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            Value::String(s) => RawValue::Text(s.clone()),
            other => RawValue::Text(other.to_string()),
        }
    }
}

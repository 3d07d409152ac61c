use chrono::{DateTime, NaiveDateTime};
use serde::Serializer;
use serde_json::Value;
use sqlx::postgres::PgArguments;
use sqlx::query::{Query, QueryAs};
use sqlx::{FromRow, Postgres};

/// Storage type of a mapped column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Text,
    Boolean,
    Timestamp,
}

/// A typed column value. `None` binds as a NULL of the column's type.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(Option<i32>),
    Text(Option<String>),
    Boolean(Option<bool>),
    Timestamp(Option<NaiveDateTime>),
}

const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

impl FieldValue {
    /// Convert a JSON input value to `kind`, or `None` when it is not compatible.
    pub fn from_json(kind: FieldKind, value: &Value) -> Option<FieldValue> {
        match (kind, value) {
            (FieldKind::Integer, Value::Null) => Some(FieldValue::Integer(None)),
            (FieldKind::Text, Value::Null) => Some(FieldValue::Text(None)),
            (FieldKind::Boolean, Value::Null) => Some(FieldValue::Boolean(None)),
            (FieldKind::Timestamp, Value::Null) => Some(FieldValue::Timestamp(None)),

            (FieldKind::Integer, Value::Number(n)) => n
                .as_i64()
                .or_else(|| integral_f64(n.as_f64()?))
                .and_then(|i| i32::try_from(i).ok())
                .map(|i| FieldValue::Integer(Some(i))),

            (FieldKind::Text, Value::String(s)) => Some(FieldValue::Text(Some(s.clone()))),
            (FieldKind::Text, Value::Number(n)) => Some(FieldValue::Text(Some(n.to_string()))),
            (FieldKind::Text, Value::Bool(b)) => Some(FieldValue::Text(Some(b.to_string()))),

            (FieldKind::Boolean, Value::Bool(b)) => Some(FieldValue::Boolean(Some(*b))),

            (FieldKind::Timestamp, Value::String(s)) => {
                parse_timestamp(s).map(|ts| FieldValue::Timestamp(Some(ts)))
            }

            _ => None,
        }
    }

    /// Parse query-string text as `kind`.
    pub fn parse(kind: FieldKind, text: &str) -> Option<FieldValue> {
        match kind {
            FieldKind::Integer => text.trim().parse().ok().map(|i| FieldValue::Integer(Some(i))),
            FieldKind::Text => Some(FieldValue::Text(Some(text.to_string()))),
            FieldKind::Boolean => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "t" | "1" => Some(FieldValue::Boolean(Some(true))),
                "false" | "f" | "0" => Some(FieldValue::Boolean(Some(false))),
                _ => None,
            },
            FieldKind::Timestamp => parse_timestamp(text).map(|ts| FieldValue::Timestamp(Some(ts))),
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Integer(_) => FieldKind::Integer,
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Boolean(_) => FieldKind::Boolean,
            FieldValue::Timestamp(_) => FieldKind::Timestamp,
        }
    }
}

/// `3.0` counts as an integer, `3.5` does not.
fn integral_f64(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && f >= i32::MIN as f64 && f <= i32::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Accepts `2024-05-01 10:00:00`, `2024-05-01T10:00:00[.ffffff]` and RFC 3339 with offset
/// (converted to UTC).
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.naive_utc()))
}

/// Serde helper rendering timestamps as plain strings.
pub fn serialize_timestamp<S: Serializer>(
    value: &Option<NaiveDateTime>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(ts) => serializer.collect_str(ts),
        None => serializer.serialize_none(),
    }
}

pub(crate) fn bind_value_query<'q>(
    q: Query<'q, Postgres, PgArguments>,
    v: &FieldValue,
) -> Query<'q, Postgres, PgArguments> {
    match v {
        FieldValue::Integer(i) => q.bind(*i),
        FieldValue::Text(s) => q.bind(s.clone()),
        FieldValue::Boolean(b) => q.bind(*b),
        FieldValue::Timestamp(ts) => q.bind(*ts),
    }
}

pub(crate) fn bind_value_query_as<'q, O>(
    q: QueryAs<'q, Postgres, O, PgArguments>,
    v: &FieldValue,
) -> QueryAs<'q, Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, sqlx::postgres::PgRow>,
{
    match v {
        FieldValue::Integer(i) => q.bind(*i),
        FieldValue::Text(s) => q.bind(s.clone()),
        FieldValue::Boolean(b) => q.bind(*b),
        FieldValue::Timestamp(ts) => q.bind(*ts),
    }
}

// ABOUTME: Value bridge between SQLite storage classes and PostgreSQL parameters
// ABOUTME: Wraps fetched source values so they can be bound to typed destination columns

use std::collections::HashMap;

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use tokio_postgres::types::{to_sql_checked, IsNull, ToSql, Type};

/// A value fetched from the SQLite source.
///
/// SQLite has five storage classes and no declared-type enforcement, so this
/// is the complete set of shapes a source value can take. The `ToSql` impl
/// coerces each shape to the destination column's actual type at bind time
/// (integers stored for booleans, ISO-8601 text stored for timestamps, and
/// so on). An unbindable combination fails the row, which fails the run.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<rusqlite::types::ValueRef<'_>> for SqlValue {
    fn from(value: rusqlite::types::ValueRef<'_>) -> Self {
        use rusqlite::types::ValueRef;
        match value {
            ValueRef::Null => SqlValue::Null,
            ValueRef::Integer(i) => SqlValue::Integer(i),
            ValueRef::Real(f) => SqlValue::Real(f),
            ValueRef::Text(t) => SqlValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => SqlValue::Blob(b.to_vec()),
        }
    }
}

type ToSqlError = Box<dyn std::error::Error + Sync + Send>;

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

fn bind_error(value: &SqlValue, ty: &Type) -> ToSqlError {
    format!("cannot bind {:?} to a column of type {}", value, ty).into()
}

impl ToSql for SqlValue {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, ToSqlError> {
        match self {
            SqlValue::Null => Ok(IsNull::Yes),
            SqlValue::Integer(v) => {
                if *ty == Type::BOOL {
                    (*v != 0).to_sql(ty, out)
                } else if *ty == Type::INT2 {
                    i16::try_from(*v)?.to_sql(ty, out)
                } else if *ty == Type::INT4 {
                    i32::try_from(*v)?.to_sql(ty, out)
                } else if *ty == Type::INT8 {
                    v.to_sql(ty, out)
                } else if *ty == Type::FLOAT4 {
                    (*v as f32).to_sql(ty, out)
                } else if *ty == Type::FLOAT8 {
                    (*v as f64).to_sql(ty, out)
                } else {
                    Err(bind_error(self, ty))
                }
            }
            SqlValue::Real(v) => {
                if *ty == Type::FLOAT4 {
                    (*v as f32).to_sql(ty, out)
                } else if *ty == Type::FLOAT8 {
                    v.to_sql(ty, out)
                } else {
                    Err(bind_error(self, ty))
                }
            }
            SqlValue::Text(s) => {
                if *ty == Type::TIMESTAMP {
                    parse_timestamp(s)
                        .ok_or_else(|| bind_error(self, ty))?
                        .to_sql(ty, out)
                } else if *ty == Type::TIMESTAMPTZ {
                    let naive = parse_timestamp(s).ok_or_else(|| bind_error(self, ty))?;
                    DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc).to_sql(ty, out)
                } else if *ty == Type::DATE {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")?.to_sql(ty, out)
                } else if *ty == Type::TIME {
                    NaiveTime::parse_from_str(s, "%H:%M:%S%.f")?.to_sql(ty, out)
                } else if *ty == Type::BOOL {
                    matches!(s.as_str(), "t" | "true" | "1").to_sql(ty, out)
                } else if <String as ToSql>::accepts(ty) {
                    s.to_sql(ty, out)
                } else {
                    Err(bind_error(self, ty))
                }
            }
            SqlValue::Blob(b) => {
                if <Vec<u8> as ToSql>::accepts(ty) {
                    b.to_sql(ty, out)
                } else {
                    Err(bind_error(self, ty))
                }
            }
        }
    }

    fn accepts(ty: &Type) -> bool {
        <bool as ToSql>::accepts(ty)
            || <i16 as ToSql>::accepts(ty)
            || <i32 as ToSql>::accepts(ty)
            || <i64 as ToSql>::accepts(ty)
            || <f32 as ToSql>::accepts(ty)
            || <f64 as ToSql>::accepts(ty)
            || <String as ToSql>::accepts(ty)
            || <Vec<u8> as ToSql>::accepts(ty)
            || <NaiveDateTime as ToSql>::accepts(ty)
            || <DateTime<Utc> as ToSql>::accepts(ty)
            || <NaiveDate as ToSql>::accepts(ty)
            || <NaiveTime as ToSql>::accepts(ty)
    }

    to_sql_checked!();
}

/// One fetched source record: a mapping from column name to value.
///
/// Values are opaque to the migration core; only key presence matters for
/// statement generation. Rows are transient, one per fetched record.
#[derive(Debug, Clone, Default)]
pub struct SourceRow {
    values: HashMap<String, SqlValue>,
}

impl SourceRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: SqlValue) {
        self.values.insert(column.into(), value);
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.values.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Collect bind parameters in the given column order.
    ///
    /// Columns must have been filtered to those present in the row; any
    /// column without a value is silently dropped here, which would shift
    /// the parameter positions.
    pub fn params<'a>(&'a self, columns: &[String]) -> Vec<&'a (dyn ToSql + Sync)> {
        columns
            .iter()
            .filter_map(|column| self.values.get(column))
            .map(|value| value as &(dyn ToSql + Sync))
            .collect()
    }
}

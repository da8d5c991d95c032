//! Declarative row → descriptor binding.
//!
//! Each descriptor type declares a static table of [`FieldBinding`]s. A
//! binding names the target field and, optionally, the source column it is
//! read from. Resolution per field:
//!
//! 1. If the binding declares a source column, that column is used.
//! 2. Otherwise the field's own name is matched case-insensitively.
//!
//! Unmapped row columns are ignored, fields without a matching column keep
//! their default, and a NULL value never overwrites a field.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use super::row::Row;

/// Errors raised while binding rows to descriptors.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum MappingError {
    #[error("{descriptor} row {row}: required field '{field}' has no value (column '{column}')")]
    MissingRequired {
        descriptor: &'static str,
        field: &'static str,
        column: &'static str,
        row: usize,
    },

    #[error("{descriptor} row {row}: column '{column}' cannot be read as {expected} (found {found})")]
    InvalidValue {
        descriptor: &'static str,
        column: &'static str,
        row: usize,
        expected: &'static str,
        found: String,
    },
}

pub type MappingResult<T> = Result<T, MappingError>;

/// One entry of a descriptor's mapping table.
#[derive(Debug, Clone, Copy)]
pub struct FieldBinding {
    /// Target field name on the descriptor.
    pub field: &'static str,
    /// Declared source column; `None` falls back to the field name.
    pub column: Option<&'static str>,
    /// Identity fields must resolve to a non-null value.
    pub required: bool,
}

impl FieldBinding {
    pub const fn field(field: &'static str) -> Self {
        Self {
            field,
            column: None,
            required: false,
        }
    }

    pub const fn mapped(field: &'static str, column: &'static str) -> Self {
        Self {
            field,
            column: Some(column),
            required: false,
        }
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// The column name this binding reads from.
    pub fn source_column(&self) -> &'static str {
        self.column.unwrap_or(self.field)
    }
}

/// Conversion failure for a single value, before row context is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueError {
    pub expected: &'static str,
    pub found: String,
}

impl ValueError {
    fn new(expected: &'static str, found: &Value) -> Self {
        Self {
            expected,
            found: found.to_string(),
        }
    }
}

/// A descriptor that can be constructed from a catalog row.
pub trait FromRow: Default {
    /// Descriptor name used in error messages.
    const DESCRIPTOR: &'static str;

    /// Static mapping table, in assignment order.
    const FIELDS: &'static [FieldBinding];

    /// Assign a non-null value to the named field.
    fn assign(&mut self, field: &str, value: &Value) -> Result<(), ValueError>;
}

/// Bind a single row. `index` is only used for error reporting.
pub fn bind_row<T: FromRow>(row: &Row, index: usize) -> MappingResult<T> {
    let mut target = T::default();

    for binding in T::FIELDS {
        let column = binding.source_column();
        let value = row.get_ignore_case(column).filter(|v| !v.is_null());

        match value {
            Some(value) => {
                target
                    .assign(binding.field, value)
                    .map_err(|err| MappingError::InvalidValue {
                        descriptor: T::DESCRIPTOR,
                        column,
                        row: index,
                        expected: err.expected,
                        found: err.found,
                    })?;
            }
            None if binding.required => {
                return Err(MappingError::MissingRequired {
                    descriptor: T::DESCRIPTOR,
                    field: binding.field,
                    column,
                    row: index,
                });
            }
            None => {}
        }
    }

    Ok(target)
}

/// Bind every row, failing on the first row that cannot be bound.
pub fn bind_rows<T: FromRow>(rows: &[Row]) -> MappingResult<Vec<T>> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| bind_row(row, index))
        .collect()
}

// ============================================================================
// Value conversions
// ============================================================================

/// A whole float that fits in `i64`. `i64::MAX as f64` rounds up to 2^63,
/// hence the strict upper bound.
fn is_whole_i64(f: f64) -> bool {
    f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64
}

pub fn to_i64(value: &Value) -> Result<i64, ValueError> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| is_whole_i64(*f)).map(|f| f as i64))
            .ok_or_else(|| ValueError::new("integer", value)),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| ValueError::new("integer", value)),
        Value::Bool(b) => Ok(i64::from(*b)),
        _ => Err(ValueError::new("integer", value)),
    }
}

pub fn to_i32(value: &Value) -> Result<i32, ValueError> {
    to_i64(value).and_then(|n| i32::try_from(n).map_err(|_| ValueError::new("int32", value)))
}

pub fn to_bool(value: &Value) -> Result<bool, ValueError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(ValueError::new("boolean", value)),
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(ValueError::new("boolean", value)),
        },
        _ => Err(ValueError::new("boolean", value)),
    }
}

pub fn to_string(value: &Value) -> Result<String, ValueError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(ValueError::new("string", value)),
    }
}

/// Accepts RFC 3339 strings and the `YYYY-MM-DD HH:MM:SS[.fff]` form SQL
/// Server emits for `datetime` columns (interpreted as UTC).
pub fn to_datetime(value: &Value) -> Result<DateTime<Utc>, ValueError> {
    let Value::String(s) = value else {
        return Err(ValueError::new("timestamp", value));
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }

    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ValueError::new("timestamp", value))
}

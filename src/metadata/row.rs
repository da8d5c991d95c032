//! Loosely-typed tabular rows as returned by catalog queries.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One catalog result row: column name → JSON value, in source column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(Map<String, Value>);

impl Row {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build a row from positional values and their column names.
    ///
    /// Extra values without a column name are dropped; missing values are
    /// treated as NULL.
    pub fn from_columns(columns: &[String], values: Vec<Value>) -> Self {
        let mut values = values.into_iter();
        let map = columns
            .iter()
            .map(|name| (name.clone(), values.next().unwrap_or(Value::Null)))
            .collect();
        Self(map)
    }

    /// Builder-style insert, mainly for tests and fixtures.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(column.into(), value.into());
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(column.into(), value.into());
    }

    /// Exact-name lookup.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// Case-insensitive lookup. An exact match wins over a folded one.
    pub fn get_ignore_case(&self, column: &str) -> Option<&Value> {
        self.0.get(column).or_else(|| {
            self.0
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(column))
                .map(|(_, value)| value)
        })
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for Row {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

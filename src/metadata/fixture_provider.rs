//! File-backed metadata source for offline runs and tests.
//!
//! The fixture is a single JSON document holding one array of rows per
//! catalog query:
//!
//! ```json
//! {
//!   "schemas": [{"schema_id": 1, "name": "dbo"}],
//!   "procedures": [{"object_id": 10, "schema_id": 1, "name": "UserFind"}],
//!   "inputs": [],
//!   "result_columns": [],
//!   "table_type_columns": []
//! }
//! ```

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::provider::{MetadataSource, SourceError, SourceResult};
use super::row::Row;

/// Raw catalog rows as stored in a fixture file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureCatalog {
    pub schemas: Vec<Row>,
    pub procedures: Vec<Row>,
    pub inputs: Vec<Row>,
    pub result_columns: Vec<Row>,
    pub table_type_columns: Vec<Row>,
}

/// MetadataSource that serves rows from a [`FixtureCatalog`].
#[derive(Debug, Clone)]
pub struct FixtureMetadataSource {
    catalog: FixtureCatalog,
    origin: String,
}

impl FixtureMetadataSource {
    pub fn new(catalog: FixtureCatalog) -> Self {
        Self {
            catalog,
            origin: "in-memory".to_string(),
        }
    }

    /// Load a fixture document from disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> SourceResult<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| SourceError::FixtureRead {
            path: display.clone(),
            source,
        })?;
        let catalog = serde_json::from_str(&content).map_err(|source| SourceError::FixtureParse {
            path: display.clone(),
            source,
        })?;
        Ok(Self {
            catalog,
            origin: display,
        })
    }

    pub fn catalog(&self) -> &FixtureCatalog {
        &self.catalog
    }
}

#[async_trait]
impl MetadataSource for FixtureMetadataSource {
    async fn schemas(&self) -> SourceResult<Vec<Row>> {
        Ok(self.catalog.schemas.clone())
    }

    async fn procedures(&self) -> SourceResult<Vec<Row>> {
        Ok(self.catalog.procedures.clone())
    }

    async fn inputs(&self) -> SourceResult<Vec<Row>> {
        Ok(self.catalog.inputs.clone())
    }

    async fn result_columns(&self) -> SourceResult<Vec<Row>> {
        Ok(self.catalog.result_columns.clone())
    }

    async fn table_type_columns(&self) -> SourceResult<Vec<Row>> {
        Ok(self.catalog.table_type_columns.clone())
    }

    fn describe(&self) -> String {
        format!("fixture ({})", self.origin)
    }
}

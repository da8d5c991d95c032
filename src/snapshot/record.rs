use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::SchemaModel;

use super::fingerprint::fingerprint;

/// An immutable capture of a schema model.
///
/// `id` is empty until the record is persisted; the store assigns it from
/// the file name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    #[serde(default)]
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub tool_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_filter: Option<Vec<String>>,
    /// Qualified procedure name to shape fingerprint.
    pub fingerprints: BTreeMap<String, String>,
    pub model: SchemaModel,
}

impl SnapshotRecord {
    /// Build an unpersisted record, fingerprinting every procedure.
    pub fn new(model: SchemaModel, created_at: DateTime<Utc>) -> Result<Self, serde_json::Error> {
        let fingerprints = model
            .procedures()
            .map(|p| Ok((p.qualified_name(), fingerprint(p)?)))
            .collect::<Result<BTreeMap<_, _>, serde_json::Error>>()?;

        Ok(Self {
            id: String::new(),
            created_at,
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            schema_filter: None,
            fingerprints,
            model,
        })
    }

    pub fn with_schema_filter(mut self, filter: Option<Vec<String>>) -> Self {
        self.schema_filter = filter;
        self
    }

    pub fn fingerprint_of(&self, qualified_name: &str) -> Option<&str> {
        self.fingerprints.get(qualified_name).map(String::as_str)
    }
}

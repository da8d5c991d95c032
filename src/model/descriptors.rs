//! Schema descriptor tree.
//!
//! Descriptors are immutable after construction. The whole tree is rebuilt
//! on every metadata read and replaced, never patched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::LangType;

/// The structural model of one database's procedure surface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaModel {
    pub schemas: Vec<SchemaDescriptor>,
}

impl SchemaModel {
    /// All procedures in schema order, then source order.
    pub fn procedures(&self) -> impl Iterator<Item = &StoredProcedureDescriptor> {
        self.schemas.iter().flat_map(|s| s.procedures.iter())
    }

    /// Find a procedure by its `schema.name` qualified name.
    pub fn find(&self, qualified_name: &str) -> Option<&StoredProcedureDescriptor> {
        self.procedures()
            .find(|p| p.qualified_name() == qualified_name)
    }

    pub fn procedure_count(&self) -> usize {
        self.schemas.iter().map(|s| s.procedures.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.procedure_count() == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub id: i64,
    pub name: String,
    pub procedures: Vec<StoredProcedureDescriptor>,
}

/// CRUD convention encoded in a procedure's name suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Create,
    Update,
    Delete,
    Merge,
    Upsert,
    Find,
    List,
    Other,
}

impl OperationKind {
    /// Classify a procedure name such as `UserCreate`, `UserFindById` or
    /// `OrderList`.
    pub fn from_procedure_name(name: &str) -> Self {
        const SUFFIXES: &[(&str, OperationKind)] = &[
            ("Create", OperationKind::Create),
            ("Update", OperationKind::Update),
            ("Delete", OperationKind::Delete),
            ("Merge", OperationKind::Merge),
            ("Upsert", OperationKind::Upsert),
            ("List", OperationKind::List),
        ];

        if let Some(pos) = name.rfind("Find") {
            if pos > 0 {
                return OperationKind::Find;
            }
        }

        SUFFIXES
            .iter()
            .find(|(suffix, _)| name.len() > suffix.len() && name.ends_with(suffix))
            .map(|(_, kind)| *kind)
            .unwrap_or(OperationKind::Other)
    }

    /// Write operations that report a `CrudResult`.
    pub fn is_crud(&self) -> bool {
        matches!(
            self,
            OperationKind::Create
                | OperationKind::Update
                | OperationKind::Delete
                | OperationKind::Merge
                | OperationKind::Upsert
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredProcedureDescriptor {
    pub id: i64,
    pub schema_id: i64,
    pub schema_name: String,
    pub name: String,
    /// Last-modified timestamp reported by the catalog.
    pub modified: Option<DateTime<Utc>>,
    pub inputs: Vec<InputDescriptor>,
    pub result_sets: Vec<ResultSetDescriptor>,
}

impl StoredProcedureDescriptor {
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema_name, self.name)
    }

    pub fn operation_kind(&self) -> OperationKind {
        OperationKind::from_procedure_name(&self.name)
    }

    pub fn returns_json(&self) -> bool {
        self.result_sets.iter().any(|rs| rs.returns_json)
    }

    pub fn output_parameters(&self) -> impl Iterator<Item = &InputDescriptor> {
        self.inputs.iter().filter(|i| i.is_output)
    }

    pub fn table_type_inputs(&self) -> impl Iterator<Item = &InputDescriptor> {
        self.inputs.iter().filter(|i| i.is_table_type)
    }

    /// The first result set that has at least one field.
    pub fn primary_result_set(&self) -> Option<&ResultSetDescriptor> {
        self.result_sets.iter().find(|rs| !rs.fields.is_empty())
    }
}

/// Shared column shape for parameters and table-type columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub is_nullable: bool,
    pub sql_type_name: String,
    pub max_length: i32,
}

impl ColumnDescriptor {
    pub fn lang_type(&self) -> LangType {
        LangType::from_sql(&self.sql_type_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputDescriptor {
    #[serde(flatten)]
    pub column: ColumnDescriptor,
    pub is_output: bool,
    pub is_table_type: bool,
    pub user_type_name: Option<String>,
    pub user_type_id: Option<i64>,
    /// Shape of the table type, in column order. Empty unless `is_table_type`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub table_columns: Vec<ColumnDescriptor>,
}

impl InputDescriptor {
    pub fn name(&self) -> &str {
        &self.column.name
    }

    pub fn lang_type(&self) -> LangType {
        self.column.lang_type()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSetDescriptor {
    pub ordinal: i32,
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
    pub returns_json: bool,
    pub returns_json_array: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub source_name: String,
    pub target_name: String,
    pub lang_type: LangType,
    pub is_nullable: bool,
    pub sql_type_name: String,
    /// Corroborating hints, read only by the JSON shape auditor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collation: Option<String>,
}

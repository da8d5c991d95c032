//! Catalog row descriptors.
//!
//! These are the flat, per-row shapes produced by the catalog queries. The
//! [`model`](crate::model) builder assembles them into the schema tree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::mapping::{to_bool, to_datetime, to_i32, to_i64, to_string, FieldBinding, FromRow, ValueError};

/// A database schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaRow {
    pub id: i64,
    pub name: String,
}

impl FromRow for SchemaRow {
    const DESCRIPTOR: &'static str = "SchemaRow";
    const FIELDS: &'static [FieldBinding] = &[
        FieldBinding::mapped("id", "schema_id").required(),
        FieldBinding::field("name"),
    ];

    fn assign(&mut self, field: &str, value: &Value) -> Result<(), ValueError> {
        match field {
            "id" => self.id = to_i64(value)?,
            "name" => self.name = to_string(value)?,
            _ => {}
        }
        Ok(())
    }
}

/// A stored procedure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcedureRow {
    pub id: i64,
    pub schema_id: i64,
    pub name: String,
    pub modified: Option<DateTime<Utc>>,
}

impl FromRow for ProcedureRow {
    const DESCRIPTOR: &'static str = "ProcedureRow";
    const FIELDS: &'static [FieldBinding] = &[
        FieldBinding::mapped("id", "object_id").required(),
        FieldBinding::mapped("schema_id", "schema_id").required(),
        FieldBinding::field("name"),
        FieldBinding::mapped("modified", "modify_date"),
    ];

    fn assign(&mut self, field: &str, value: &Value) -> Result<(), ValueError> {
        match field {
            "id" => self.id = to_i64(value)?,
            "schema_id" => self.schema_id = to_i64(value)?,
            "name" => self.name = to_string(value)?,
            "modified" => self.modified = Some(to_datetime(value)?),
            _ => {}
        }
        Ok(())
    }
}

/// An input (or output) parameter of a stored procedure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputRow {
    pub procedure_id: i64,
    pub ordinal: i32,
    pub name: String,
    pub is_nullable: bool,
    pub sql_type_name: String,
    pub max_length: i32,
    pub is_output: bool,
    pub is_table_type: bool,
    pub user_type_name: Option<String>,
    pub user_type_id: Option<i64>,
    pub user_type_schema: Option<String>,
}

impl FromRow for InputRow {
    const DESCRIPTOR: &'static str = "InputRow";
    const FIELDS: &'static [FieldBinding] = &[
        FieldBinding::mapped("procedure_id", "object_id").required(),
        FieldBinding::mapped("ordinal", "parameter_id"),
        FieldBinding::field("name"),
        FieldBinding::field("is_nullable"),
        FieldBinding::mapped("sql_type_name", "system_type_name"),
        FieldBinding::field("max_length"),
        FieldBinding::field("is_output"),
        FieldBinding::field("is_table_type"),
        FieldBinding::field("user_type_name"),
        FieldBinding::field("user_type_id"),
        FieldBinding::field("user_type_schema"),
    ];

    fn assign(&mut self, field: &str, value: &Value) -> Result<(), ValueError> {
        match field {
            "procedure_id" => self.procedure_id = to_i64(value)?,
            "ordinal" => self.ordinal = to_i32(value)?,
            "name" => self.name = to_string(value)?,
            "is_nullable" => self.is_nullable = to_bool(value)?,
            "sql_type_name" => self.sql_type_name = to_string(value)?,
            "max_length" => self.max_length = to_i32(value)?,
            "is_output" => self.is_output = to_bool(value)?,
            "is_table_type" => self.is_table_type = to_bool(value)?,
            "user_type_name" => self.user_type_name = Some(to_string(value)?),
            "user_type_id" => self.user_type_id = Some(to_i64(value)?),
            "user_type_schema" => self.user_type_schema = Some(to_string(value)?),
            _ => {}
        }
        Ok(())
    }
}

/// A column of a procedure's result set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultColumnRow {
    pub procedure_id: i64,
    pub result_set: i32,
    pub result_set_name: Option<String>,
    pub ordinal: i32,
    pub name: String,
    pub is_nullable: bool,
    pub sql_type_name: String,
    pub max_length: i32,
    pub returns_json: bool,
    pub returns_json_array: bool,
    /// Explicit inferred type, when the catalog query already resolved one.
    pub inferred_type: Option<String>,
    pub sample_value: Option<String>,
    pub collation: Option<String>,
}

impl FromRow for ResultColumnRow {
    const DESCRIPTOR: &'static str = "ResultColumnRow";
    const FIELDS: &'static [FieldBinding] = &[
        FieldBinding::mapped("procedure_id", "object_id").required(),
        FieldBinding::mapped("result_set", "result_set_ordinal"),
        FieldBinding::field("result_set_name"),
        FieldBinding::mapped("ordinal", "column_ordinal"),
        FieldBinding::field("name"),
        FieldBinding::field("is_nullable"),
        FieldBinding::mapped("sql_type_name", "system_type_name"),
        FieldBinding::field("max_length"),
        FieldBinding::field("returns_json"),
        FieldBinding::field("returns_json_array"),
        FieldBinding::field("inferred_type"),
        FieldBinding::field("sample_value"),
        FieldBinding::mapped("collation", "collation_name"),
    ];

    fn assign(&mut self, field: &str, value: &Value) -> Result<(), ValueError> {
        match field {
            "procedure_id" => self.procedure_id = to_i64(value)?,
            "result_set" => self.result_set = to_i32(value)?,
            "result_set_name" => self.result_set_name = Some(to_string(value)?),
            "ordinal" => self.ordinal = to_i32(value)?,
            "name" => self.name = to_string(value)?,
            "is_nullable" => self.is_nullable = to_bool(value)?,
            "sql_type_name" => self.sql_type_name = to_string(value)?,
            "max_length" => self.max_length = to_i32(value)?,
            "returns_json" => self.returns_json = to_bool(value)?,
            "returns_json_array" => self.returns_json_array = to_bool(value)?,
            "inferred_type" => self.inferred_type = Some(to_string(value)?),
            "sample_value" => self.sample_value = Some(to_string(value)?),
            "collation" => self.collation = Some(to_string(value)?),
            _ => {}
        }
        Ok(())
    }
}

/// A column of a user-defined table type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableTypeColumnRow {
    pub user_type_id: i64,
    pub ordinal: i32,
    pub name: String,
    pub is_nullable: bool,
    pub sql_type_name: String,
    pub max_length: i32,
}

impl FromRow for TableTypeColumnRow {
    const DESCRIPTOR: &'static str = "TableTypeColumnRow";
    const FIELDS: &'static [FieldBinding] = &[
        FieldBinding::field("user_type_id").required(),
        FieldBinding::mapped("ordinal", "column_id"),
        FieldBinding::field("name"),
        FieldBinding::field("is_nullable"),
        FieldBinding::mapped("sql_type_name", "system_type_name"),
        FieldBinding::field("max_length"),
    ];

    fn assign(&mut self, field: &str, value: &Value) -> Result<(), ValueError> {
        match field {
            "user_type_id" => self.user_type_id = to_i64(value)?,
            "ordinal" => self.ordinal = to_i32(value)?,
            "name" => self.name = to_string(value)?,
            "is_nullable" => self.is_nullable = to_bool(value)?,
            "sql_type_name" => self.sql_type_name = to_string(value)?,
            "max_length" => self.max_length = to_i32(value)?,
            _ => {}
        }
        Ok(())
    }
}

/// Every row set needed to assemble a schema model, already bound.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogRows {
    pub schemas: Vec<SchemaRow>,
    pub procedures: Vec<ProcedureRow>,
    pub inputs: Vec<InputRow>,
    pub result_columns: Vec<ResultColumnRow>,
    pub table_type_columns: Vec<TableTypeColumnRow>,
}

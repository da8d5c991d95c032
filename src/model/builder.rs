//! Assemble bound catalog rows into a [`SchemaModel`].
//!
//! The build runs in two passes. The first groups parameters and result
//! columns under their procedures; the second resolves table-type parameters
//! against the table-type column rows by `user_type_id`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

use inflector::Inflector;
use tracing::debug;

use crate::emit::output_path;
use crate::metadata::{CatalogRows, InputRow, ResultColumnRow, TableTypeColumnRow};

use super::descriptors::{
    ColumnDescriptor, FieldDescriptor, InputDescriptor, ResultSetDescriptor, SchemaDescriptor,
    SchemaModel, StoredProcedureDescriptor,
};
use super::types::LangType;

/// Structural defects in the catalog that prevent building a model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaIntegrityError {
    #[error("procedure '{procedure}' references unknown schema id {schema_id}")]
    UnknownSchema { procedure: String, schema_id: i64 },

    #[error("duplicate procedure '{schema}.{procedure}'")]
    DuplicateProcedure { schema: String, procedure: String },

    /// Two distinct procedures would generate the same output file.
    #[error("procedures '{first}' and '{second}' both generate {}", path.display())]
    OutputCollision {
        first: String,
        second: String,
        path: PathBuf,
    },

    #[error("parameter '{parameter}' of '{procedure}' references table type {user_type} with no columns")]
    DanglingTableType {
        procedure: String,
        parameter: String,
        user_type: String,
    },
}

/// Build the schema tree from bound catalog rows.
///
/// Schemas and procedures keep catalog order. Parameters, result sets and
/// fields are ordered by their ordinal.
pub fn build_model(rows: &CatalogRows) -> Result<SchemaModel, SchemaIntegrityError> {
    let mut inputs_by_proc: HashMap<i64, Vec<&InputRow>> = HashMap::new();
    for input in &rows.inputs {
        inputs_by_proc.entry(input.procedure_id).or_default().push(input);
    }

    let mut columns_by_proc: HashMap<i64, BTreeMap<i32, Vec<&ResultColumnRow>>> = HashMap::new();
    for column in &rows.result_columns {
        columns_by_proc
            .entry(column.procedure_id)
            .or_default()
            .entry(column.result_set)
            .or_default()
            .push(column);
    }

    let table_types = group_table_types(&rows.table_type_columns);

    let mut schemas: Vec<SchemaDescriptor> = rows
        .schemas
        .iter()
        .map(|s| SchemaDescriptor {
            id: s.id,
            name: s.name.clone(),
            procedures: Vec::new(),
        })
        .collect();
    let schema_index: HashMap<i64, usize> = schemas
        .iter()
        .enumerate()
        .map(|(i, s)| (s.id, i))
        .collect();

    let mut seen: HashSet<(i64, String)> = HashSet::new();
    let mut paths: HashMap<PathBuf, String> = HashMap::new();

    for proc_row in &rows.procedures {
        let Some(&idx) = schema_index.get(&proc_row.schema_id) else {
            return Err(SchemaIntegrityError::UnknownSchema {
                procedure: proc_row.name.clone(),
                schema_id: proc_row.schema_id,
            });
        };
        let schema_name = schemas[idx].name.clone();

        if !seen.insert((proc_row.schema_id, proc_row.name.to_ascii_lowercase())) {
            return Err(SchemaIntegrityError::DuplicateProcedure {
                schema: schema_name,
                procedure: proc_row.name.clone(),
            });
        }

        let qualified = format!("{}.{}", schema_name, proc_row.name);
        let path = output_path(&schema_name, &proc_row.name);
        if let Some(first) = paths.get(&path) {
            return Err(SchemaIntegrityError::OutputCollision {
                first: first.clone(),
                second: qualified,
                path,
            });
        }
        paths.insert(path, qualified);

        let mut inputs = inputs_by_proc.remove(&proc_row.id).unwrap_or_default();
        inputs.sort_by_key(|i| i.ordinal);

        let inputs = inputs
            .into_iter()
            .map(|row| build_input(row, &proc_row.name, &table_types))
            .collect::<Result<Vec<_>, _>>()?;

        let result_sets = columns_by_proc
            .remove(&proc_row.id)
            .map(build_result_sets)
            .unwrap_or_default();

        schemas[idx].procedures.push(StoredProcedureDescriptor {
            id: proc_row.id,
            schema_id: proc_row.schema_id,
            schema_name,
            name: proc_row.name.clone(),
            modified: proc_row.modified,
            inputs,
            result_sets: if result_sets.is_empty() {
                vec![empty_result_set()]
            } else {
                result_sets
            },
        });
    }

    let model = SchemaModel { schemas };
    debug!(
        schemas = model.schemas.len(),
        procedures = model.procedure_count(),
        "schema model built"
    );
    Ok(model)
}

fn group_table_types(rows: &[TableTypeColumnRow]) -> HashMap<i64, Vec<ColumnDescriptor>> {
    let mut grouped: HashMap<i64, Vec<&TableTypeColumnRow>> = HashMap::new();
    for row in rows {
        grouped.entry(row.user_type_id).or_default().push(row);
    }

    grouped
        .into_iter()
        .map(|(id, mut cols)| {
            cols.sort_by_key(|c| c.ordinal);
            let cols = cols
                .into_iter()
                .map(|c| ColumnDescriptor {
                    name: c.name.clone(),
                    is_nullable: c.is_nullable,
                    sql_type_name: c.sql_type_name.clone(),
                    max_length: c.max_length,
                })
                .collect();
            (id, cols)
        })
        .collect()
}

fn build_input(
    row: &InputRow,
    procedure: &str,
    table_types: &HashMap<i64, Vec<ColumnDescriptor>>,
) -> Result<InputDescriptor, SchemaIntegrityError> {
    let table_columns = if row.is_table_type {
        match row.user_type_id.and_then(|id| table_types.get(&id)) {
            Some(cols) if !cols.is_empty() => cols.clone(),
            _ => {
                return Err(SchemaIntegrityError::DanglingTableType {
                    procedure: procedure.to_string(),
                    parameter: row.name.clone(),
                    user_type: describe_user_type(row),
                })
            }
        }
    } else {
        Vec::new()
    };

    Ok(InputDescriptor {
        column: ColumnDescriptor {
            name: row.name.clone(),
            is_nullable: row.is_nullable,
            sql_type_name: row.sql_type_name.clone(),
            max_length: row.max_length,
        },
        is_output: row.is_output,
        is_table_type: row.is_table_type,
        user_type_name: row.user_type_name.clone(),
        user_type_id: row.user_type_id,
        table_columns,
    })
}

fn describe_user_type(row: &InputRow) -> String {
    match (&row.user_type_schema, &row.user_type_name, row.user_type_id) {
        (Some(schema), Some(name), _) => format!("{}.{}", schema, name),
        (None, Some(name), _) => name.clone(),
        (_, None, Some(id)) => format!("#{}", id),
        (_, None, None) => "<unnamed>".to_string(),
    }
}

fn build_result_sets(sets: BTreeMap<i32, Vec<&ResultColumnRow>>) -> Vec<ResultSetDescriptor> {
    sets.into_iter()
        .map(|(ordinal, mut columns)| {
            columns.sort_by_key(|c| c.ordinal);

            let returns_json = columns.iter().any(|c| c.returns_json);
            let returns_json_array = columns.iter().any(|c| c.returns_json_array);
            let name = columns
                .iter()
                .find_map(|c| c.result_set_name.clone())
                .unwrap_or_else(|| default_result_set_name(ordinal));

            let mut taken = HashSet::new();
            let fields = columns
                .into_iter()
                .map(|c| build_field(c, returns_json, &mut taken))
                .collect();

            ResultSetDescriptor {
                ordinal,
                name,
                fields,
                returns_json,
                returns_json_array,
            }
        })
        .collect()
}

fn build_field(row: &ResultColumnRow, json: bool, taken: &mut HashSet<String>) -> FieldDescriptor {
    let lang_type = match row.inferred_type.as_deref().map(str::parse::<LangType>) {
        Some(Ok(ty)) => ty,
        // JSON members arrive untyped; string unless the catalog said otherwise.
        _ if json => LangType::String,
        _ => LangType::from_sql(&row.sql_type_name),
    };

    FieldDescriptor {
        source_name: row.name.clone(),
        target_name: unique_target_name(&row.name, row.ordinal, taken),
        lang_type,
        is_nullable: row.is_nullable,
        sql_type_name: row.sql_type_name.clone(),
        sample_value: row.sample_value.clone(),
        max_length: (row.max_length != 0).then_some(row.max_length),
        collation: row.collation.clone(),
    }
}

fn unique_target_name(source: &str, ordinal: i32, taken: &mut HashSet<String>) -> String {
    let mut base = source.trim_start_matches('@').to_snake_case();
    if base.is_empty() {
        base = format!("column_{}", ordinal);
    }

    let mut candidate = base.clone();
    let mut n = 2;
    while !taken.insert(candidate.clone()) {
        candidate = format!("{}_{}", base, n);
        n += 1;
    }
    candidate
}

fn default_result_set_name(ordinal: i32) -> String {
    if ordinal <= 1 {
        "Result".to_string()
    } else {
        format!("Result{}", ordinal)
    }
}

fn empty_result_set() -> ResultSetDescriptor {
    ResultSetDescriptor {
        ordinal: 1,
        name: default_result_set_name(1),
        ..Default::default()
    }
}

//! Procedure shape fingerprints.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::model::{LangType, StoredProcedureDescriptor};

/// The parts of a procedure that count as its shape.
///
/// Field order here is the hash input order; reordering it changes every
/// fingerprint.
#[derive(Serialize)]
struct ProcedureShape<'a> {
    name: String,
    parameters: Vec<ParameterShape<'a>>,
    fields: Vec<FieldShape<'a>>,
}

#[derive(Serialize)]
struct ParameterShape<'a> {
    name: &'a str,
    sql_type: &'a str,
    nullable: bool,
    max_length: i32,
    output: bool,
    table_columns: Vec<(&'a str, &'a str, bool, i32)>,
}

#[derive(Serialize)]
struct FieldShape<'a> {
    result_set: i32,
    name: &'a str,
    lang_type: LangType,
    nullable: bool,
}

/// Compute the SHA-256 fingerprint of a procedure's shape.
///
/// Returns a 64-character lowercase hexadecimal string. Timestamps and
/// auditor hints are not part of the shape.
pub fn fingerprint(procedure: &StoredProcedureDescriptor) -> Result<String, serde_json::Error> {
    let shape = ProcedureShape {
        name: procedure.qualified_name(),
        parameters: procedure
            .inputs
            .iter()
            .map(|p| ParameterShape {
                name: &p.column.name,
                sql_type: &p.column.sql_type_name,
                nullable: p.column.is_nullable,
                max_length: p.column.max_length,
                output: p.is_output,
                table_columns: p
                    .table_columns
                    .iter()
                    .map(|c| (c.name.as_str(), c.sql_type_name.as_str(), c.is_nullable, c.max_length))
                    .collect(),
            })
            .collect(),
        fields: procedure
            .result_sets
            .iter()
            .flat_map(|rs| {
                rs.fields.iter().map(move |f| FieldShape {
                    result_set: rs.ordinal,
                    name: &f.source_name,
                    lang_type: f.lang_type,
                    nullable: f.is_nullable,
                })
            })
            .collect(),
    };

    let json = serde_json::to_string(&shape)?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

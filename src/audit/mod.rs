//! JSON result-shape auditor.
//!
//! Result sets returned as raw JSON are opaque to the database's type
//! system, so their members usually arrive typed as `string`. This pass
//! flags members whose underlying SQL type says otherwise. It is read-only
//! and advisory: findings never block generation.

use serde::Serialize;
use tracing::debug;

use crate::model::types::base_type_name;
use crate::model::{FieldDescriptor, LangType, SchemaModel};

/// The family of a suggested replacement type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Numeric,
    Boolean,
}

/// A likely type-inference defect in a JSON result field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// Qualified procedure name.
    pub procedure: String,
    pub result_set: i32,
    pub field: String,
    pub raw_type: String,
    pub current_type: LangType,
    pub suggested_type: LangType,
    pub kind: SuggestionKind,
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: field '{}' is {} but SQL type {} suggests {} ({:?})",
            self.procedure,
            self.field,
            self.current_type,
            self.raw_type,
            self.suggested_type,
            self.kind
        )
    }
}

/// Suggested type for a raw SQL type, if it belongs to a flagged family.
fn suggestion_for(raw_type: &str) -> Option<(LangType, SuggestionKind)> {
    match base_type_name(raw_type).as_str() {
        "int" | "integer" | "smallint" | "tinyint" => Some((LangType::Int, SuggestionKind::Numeric)),
        "bigint" => Some((LangType::Long, SuggestionKind::Numeric)),
        "bit" | "bool" | "boolean" => Some((LangType::Bool, SuggestionKind::Boolean)),
        _ => None,
    }
}

/// A sample value that plainly contradicts the suggestion cancels it.
fn sample_contradicts(sample: &str, kind: SuggestionKind) -> bool {
    let sample = sample.trim().trim_matches('"');
    match kind {
        SuggestionKind::Numeric => sample.parse::<i64>().is_err(),
        SuggestionKind::Boolean => !matches!(
            sample.to_ascii_lowercase().as_str(),
            "0" | "1" | "true" | "false"
        ),
    }
}

fn inspect(field: &FieldDescriptor) -> Option<(LangType, SuggestionKind)> {
    if field.lang_type != LangType::String {
        return None;
    }
    let (suggested, kind) = suggestion_for(&field.sql_type_name)?;
    match field.sample_value.as_deref() {
        Some(sample) if sample_contradicts(sample, kind) => None,
        _ => Some((suggested, kind)),
    }
}

/// Audit every JSON-returning result set in the model.
///
/// Findings are ordered by procedure, then result set, then field.
pub fn audit(model: &SchemaModel) -> Vec<Finding> {
    let mut findings = Vec::new();

    for procedure in model.procedures() {
        for rs in procedure.result_sets.iter().filter(|rs| rs.returns_json) {
            for field in &rs.fields {
                if let Some((suggested_type, kind)) = inspect(field) {
                    findings.push(Finding {
                        procedure: procedure.qualified_name(),
                        result_set: rs.ordinal,
                        field: field.source_name.clone(),
                        raw_type: field.sql_type_name.clone(),
                        current_type: field.lang_type,
                        suggested_type,
                        kind,
                    });
                }
            }
        }
    }

    debug!(findings = findings.len(), "json shape audit complete");
    findings
}

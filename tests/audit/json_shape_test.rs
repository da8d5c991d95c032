//! Integration tests for the JSON result-shape auditor.

use sprocket::audit::{audit, SuggestionKind};
use sprocket::metadata::{CatalogRows, ProcedureRow, ResultColumnRow, SchemaRow};
use sprocket::model::{build_model, LangType};

fn json_column(proc: i64, ordinal: i32, name: &str, sql_type: &str) -> ResultColumnRow {
    ResultColumnRow {
        procedure_id: proc,
        result_set: 1,
        ordinal,
        name: name.into(),
        sql_type_name: sql_type.into(),
        returns_json: true,
        ..Default::default()
    }
}

fn catalog() -> CatalogRows {
    CatalogRows {
        schemas: vec![SchemaRow { id: 1, name: "wf".into() }],
        procedures: vec![
            ProcedureRow { id: 1, schema_id: 1, name: "WorkflowFind".into(), modified: None },
            ProcedureRow { id: 2, schema_id: 1, name: "WorkflowList".into(), modified: None },
        ],
        result_columns: vec![
            json_column(1, 1, "workflowId", "int"),
            json_column(1, 2, "title", "nvarchar(200)"),
            json_column(1, 3, "isActive", "bit"),
            // Plain rowset: typed by the database already.
            ResultColumnRow {
                procedure_id: 2,
                result_set: 1,
                ordinal: 1,
                name: "WorkflowId".into(),
                sql_type_name: "int".into(),
                ..Default::default()
            },
        ],
        ..Default::default()
    }
}

#[test]
fn test_flags_numeric_and_boolean_members() {
    let model = build_model(&catalog()).unwrap();
    let findings = audit(&model);

    assert_eq!(findings.len(), 2);

    let id = &findings[0];
    assert_eq!(id.procedure, "wf.WorkflowFind");
    assert_eq!(id.field, "workflowId");
    assert_eq!(id.current_type, LangType::String);
    assert_eq!(id.suggested_type, LangType::Int);
    assert_eq!(id.kind, SuggestionKind::Numeric);

    let active = &findings[1];
    assert_eq!(active.field, "isActive");
    assert_eq!(active.suggested_type, LangType::Bool);
    assert_eq!(active.kind, SuggestionKind::Boolean);
}

#[test]
fn test_already_typed_member_is_not_flagged() {
    let mut rows = catalog();
    rows.result_columns[0].inferred_type = Some("int".into());

    let findings = audit(&build_model(&rows).unwrap());
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].field, "isActive");
}

#[test]
fn test_bigint_suggests_long() {
    let mut rows = catalog();
    rows.result_columns[0].sql_type_name = "BIGINT".into();

    let findings = audit(&build_model(&rows).unwrap());
    assert_eq!(findings[0].suggested_type, LangType::Long);
}

#[test]
fn test_non_json_result_sets_are_skipped() {
    let mut rows = catalog();
    rows.result_columns.retain(|c| c.procedure_id == 2);

    assert!(audit(&build_model(&rows).unwrap()).is_empty());
}

#[test]
fn test_sample_value_can_cancel_suggestion() {
    let mut rows = catalog();
    rows.result_columns[2].sample_value = Some("maybe".into());

    let findings = audit(&build_model(&rows).unwrap());
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].field, "workflowId");
}

#[test]
fn test_finding_display_names_both_types() {
    let findings = audit(&build_model(&catalog()).unwrap());
    let text = findings[0].to_string();
    assert!(text.contains("wf.WorkflowFind"));
    assert!(text.contains("workflowId"));
    assert!(text.contains("string"));
    assert!(text.contains("int"));
}

#[test]
fn test_audit_does_not_modify_model() {
    let model = build_model(&catalog()).unwrap();
    let before = model.clone();
    let _ = audit(&model);
    assert_eq!(model, before);
}

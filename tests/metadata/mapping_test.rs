//! Integration tests for catalog row binding.

use serde_json::Value;
use sprocket::metadata::{
    bind_row, bind_rows, InputRow, MappingError, ProcedureRow, ResultColumnRow, Row,
    TableTypeColumnRow,
};

#[test]
fn test_input_row_binds_declared_columns() {
    let row = Row::new()
        .with("object_id", 10)
        .with("parameter_id", 2)
        .with("name", "@UserId")
        .with("is_nullable", false)
        .with("system_type_name", "int")
        .with("max_length", 4)
        .with("is_output", 0)
        .with("is_table_type", 0);

    let input: InputRow = bind_row(&row, 0).unwrap();

    assert_eq!(input.procedure_id, 10);
    assert_eq!(input.ordinal, 2);
    assert_eq!(input.name, "@UserId");
    assert_eq!(input.sql_type_name, "int");
    assert_eq!(input.max_length, 4);
    assert!(!input.is_output);
    assert!(input.user_type_id.is_none());
}

#[test]
fn test_column_names_match_case_insensitively() {
    let row = Row::new()
        .with("OBJECT_ID", 7)
        .with("Schema_Id", 1)
        .with("NAME", "UserFind");

    let proc: ProcedureRow = bind_row(&row, 0).unwrap();
    assert_eq!(proc.id, 7);
    assert_eq!(proc.schema_id, 1);
    assert_eq!(proc.name, "UserFind");
}

#[test]
fn test_null_never_overwrites_default() {
    let row = Row::new()
        .with("object_id", 3)
        .with("result_set_ordinal", 1)
        .with("name", Value::Null)
        .with("collation_name", Value::Null)
        .with("max_length", Value::Null);

    let column: ResultColumnRow = bind_row(&row, 0).unwrap();
    assert_eq!(column.name, "");
    assert_eq!(column.max_length, 0);
    assert!(column.collation.is_none());
}

#[test]
fn test_unmapped_columns_are_ignored() {
    let row = Row::new()
        .with("user_type_id", 257)
        .with("column_id", 1)
        .with("name", "Sku")
        .with("precision", 18)
        .with("is_identity", true);

    let column: TableTypeColumnRow = bind_row(&row, 0).unwrap();
    assert_eq!(column.user_type_id, 257);
    assert_eq!(column.name, "Sku");
}

#[test]
fn test_missing_identity_is_mapping_error() {
    let rows = vec![
        Row::new().with("object_id", 1).with("schema_id", 1),
        Row::new().with("schema_id", 1).with("name", "Orphan"),
    ];

    let err = bind_rows::<ProcedureRow>(&rows).unwrap_err();
    assert_eq!(
        err,
        MappingError::MissingRequired {
            descriptor: "ProcedureRow",
            field: "id",
            column: "object_id",
            row: 1,
        }
    );
}

#[test]
fn test_null_identity_is_mapping_error() {
    let row = Row::new().with("object_id", Value::Null).with("schema_id", 1);
    assert!(matches!(
        bind_row::<ProcedureRow>(&row, 0),
        Err(MappingError::MissingRequired { field: "id", .. })
    ));
}

#[test]
fn test_modify_date_accepts_sql_server_format() {
    let row = Row::new()
        .with("object_id", 1)
        .with("schema_id", 1)
        .with("modify_date", "2026-02-14 09:30:00.123");

    let proc: ProcedureRow = bind_row(&row, 0).unwrap();
    let modified = proc.modified.unwrap();
    assert_eq!(modified.to_rfc3339(), "2026-02-14T09:30:00.123+00:00");
}

#[test]
fn test_wrong_value_kind_reports_column() {
    let row = Row::new().with("object_id", 1).with("parameter_id", "first");

    let err = bind_row::<InputRow>(&row, 5).unwrap_err();
    match err {
        MappingError::InvalidValue { column, row, .. } => {
            assert_eq!(column, "parameter_id");
            assert_eq!(row, 5);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

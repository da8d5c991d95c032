//! Integration tests for assembling the schema model from catalog rows.

use std::path::Path;

use sprocket::metadata::{
    CatalogRows, InputRow, ProcedureRow, ResultColumnRow, SchemaRow, TableTypeColumnRow,
};
use sprocket::model::{build_model, LangType, OperationKind, SchemaIntegrityError};

fn input(proc: i64, ordinal: i32, name: &str, sql_type: &str) -> InputRow {
    InputRow {
        procedure_id: proc,
        ordinal,
        name: name.into(),
        sql_type_name: sql_type.into(),
        ..Default::default()
    }
}

fn column(proc: i64, set: i32, ordinal: i32, name: &str, sql_type: &str) -> ResultColumnRow {
    ResultColumnRow {
        procedure_id: proc,
        result_set: set,
        ordinal,
        name: name.into(),
        sql_type_name: sql_type.into(),
        ..Default::default()
    }
}

fn catalog() -> CatalogRows {
    CatalogRows {
        schemas: vec![
            SchemaRow { id: 1, name: "dbo".into() },
            SchemaRow { id: 2, name: "sales".into() },
        ],
        procedures: vec![
            ProcedureRow { id: 10, schema_id: 1, name: "UserFind".into(), modified: None },
            ProcedureRow { id: 20, schema_id: 2, name: "OrderCreate".into(), modified: None },
        ],
        inputs: vec![
            // Deliberately out of ordinal order.
            input(10, 2, "@Email", "nvarchar(200)"),
            input(10, 1, "@UserId", "int"),
            InputRow {
                is_table_type: true,
                user_type_id: Some(300),
                user_type_name: Some("OrderLineType".into()),
                user_type_schema: Some("sales".into()),
                ..input(20, 1, "@Lines", "OrderLineType")
            },
            InputRow {
                is_output: true,
                ..input(20, 2, "@OrderId", "bigint")
            },
        ],
        result_columns: vec![
            column(10, 2, 1, "RoleName", "nvarchar(50)"),
            column(10, 1, 2, "Email", "nvarchar(200)"),
            column(10, 1, 1, "UserId", "int"),
            column(20, 1, 1, "ResultId", "bigint"),
            column(20, 1, 2, "Message", "nvarchar(max)"),
        ],
        table_type_columns: vec![
            TableTypeColumnRow {
                user_type_id: 300,
                ordinal: 2,
                name: "Quantity".into(),
                sql_type_name: "int".into(),
                ..Default::default()
            },
            TableTypeColumnRow {
                user_type_id: 300,
                ordinal: 1,
                name: "Sku".into(),
                sql_type_name: "varchar(32)".into(),
                ..Default::default()
            },
        ],
    }
}

#[test]
fn test_schemas_and_procedures_keep_catalog_order() {
    let model = build_model(&catalog()).unwrap();

    let names: Vec<_> = model.procedures().map(|p| p.qualified_name()).collect();
    assert_eq!(names, vec!["dbo.UserFind", "sales.OrderCreate"]);
    assert_eq!(model.procedure_count(), 2);
    assert!(model.find("sales.OrderCreate").is_some());
    assert!(model.find("sales.Missing").is_none());
}

#[test]
fn test_inputs_ordered_by_ordinal() {
    let model = build_model(&catalog()).unwrap();
    let proc = model.find("dbo.UserFind").unwrap();

    let names: Vec<_> = proc.inputs.iter().map(|i| i.name()).collect();
    assert_eq!(names, vec!["@UserId", "@Email"]);
    assert_eq!(proc.inputs[0].lang_type(), LangType::Int);
    assert_eq!(proc.inputs[1].lang_type(), LangType::String);
}

#[test]
fn test_result_sets_and_fields_ordered_by_ordinal() {
    let model = build_model(&catalog()).unwrap();
    let proc = model.find("dbo.UserFind").unwrap();

    assert_eq!(proc.result_sets.len(), 2);
    let first = &proc.result_sets[0];
    assert_eq!(first.ordinal, 1);
    assert_eq!(first.name, "Result");
    let fields: Vec<_> = first.fields.iter().map(|f| f.target_name.as_str()).collect();
    assert_eq!(fields, vec!["user_id", "email"]);
    assert_eq!(first.fields[0].lang_type, LangType::Int);

    assert_eq!(proc.result_sets[1].name, "Result2");
    assert_eq!(proc.result_sets[1].fields[0].source_name, "RoleName");
}

#[test]
fn test_table_type_columns_nest_under_parameter() {
    let model = build_model(&catalog()).unwrap();
    let proc = model.find("sales.OrderCreate").unwrap();

    let lines = &proc.inputs[0];
    assert!(lines.is_table_type);
    let cols: Vec<_> = lines.table_columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(cols, vec!["Sku", "Quantity"]);
    assert_eq!(proc.table_type_inputs().count(), 1);
    assert_eq!(proc.output_parameters().count(), 1);
}

#[test]
fn test_operation_kind_from_name() {
    let model = build_model(&catalog()).unwrap();
    assert_eq!(
        model.find("dbo.UserFind").unwrap().operation_kind(),
        OperationKind::Find
    );
    assert_eq!(
        model.find("sales.OrderCreate").unwrap().operation_kind(),
        OperationKind::Create
    );
}

#[test]
fn test_dangling_table_type_is_integrity_error() {
    let mut rows = catalog();
    rows.table_type_columns.clear();

    let err = build_model(&rows).unwrap_err();
    assert_eq!(
        err,
        SchemaIntegrityError::DanglingTableType {
            procedure: "OrderCreate".into(),
            parameter: "@Lines".into(),
            user_type: "sales.OrderLineType".into(),
        }
    );
}

#[test]
fn test_duplicate_procedure_is_integrity_error() {
    let mut rows = catalog();
    rows.procedures.push(ProcedureRow {
        id: 11,
        schema_id: 1,
        name: "userfind".into(),
        modified: None,
    });

    assert!(matches!(
        build_model(&rows),
        Err(SchemaIntegrityError::DuplicateProcedure { .. })
    ));
}

#[test]
fn test_procedures_sharing_an_output_file_are_rejected() {
    let mut rows = catalog();
    rows.procedures.push(ProcedureRow {
        id: 11,
        schema_id: 1,
        name: "User_Find".into(),
        modified: None,
    });

    match build_model(&rows) {
        Err(SchemaIntegrityError::OutputCollision { first, second, path }) => {
            assert_eq!(first, "dbo.UserFind");
            assert_eq!(second, "dbo.User_Find");
            assert_eq!(path, Path::new("dbo").join("user_find.rs"));
        }
        other => panic!("expected output collision, got {other:?}"),
    }
}

#[test]
fn test_schemas_sharing_an_output_directory_are_rejected() {
    let mut rows = catalog();
    rows.schemas.push(SchemaRow { id: 3, name: "Sales".into() });
    rows.procedures.push(ProcedureRow {
        id: 30,
        schema_id: 3,
        name: "OrderCreate".into(),
        modified: None,
    });

    assert!(matches!(
        build_model(&rows),
        Err(SchemaIntegrityError::OutputCollision { ref second, .. }) if second == "Sales.OrderCreate"
    ));
}

#[test]
fn test_json_result_fields_default_to_string() {
    let mut rows = catalog();
    for col in rows.result_columns.iter_mut().filter(|c| c.procedure_id == 10) {
        col.returns_json = true;
    }

    let model = build_model(&rows).unwrap();
    let proc = model.find("dbo.UserFind").unwrap();
    assert!(proc.returns_json());
    assert_eq!(proc.result_sets[0].fields[0].lang_type, LangType::String);
}

#[test]
fn test_explicit_inferred_type_wins() {
    let mut rows = catalog();
    rows.result_columns[2].inferred_type = Some("long".into());

    let model = build_model(&rows).unwrap();
    let field = &model.find("dbo.UserFind").unwrap().result_sets[0].fields[0];
    assert_eq!(field.source_name, "UserId");
    assert_eq!(field.lang_type, LangType::Long);
}

#[test]
fn test_empty_catalog_builds_empty_model() {
    let model = build_model(&CatalogRows::default()).unwrap();
    assert!(model.is_empty());
    assert_eq!(model.procedure_count(), 0);
}

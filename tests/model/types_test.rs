//! Integration tests for model types.
//!
//! These tests verify SQL type inference and the utility methods on
//! `LangType` and `OperationKind`.

use sprocket::model::types::base_type_name;
use sprocket::model::{LangType, OperationKind};

#[test]
fn test_from_sql_integer_family() {
    assert_eq!(LangType::from_sql("int"), LangType::Int);
    assert_eq!(LangType::from_sql("BIGINT"), LangType::Long);
    assert_eq!(LangType::from_sql("smallint"), LangType::Short);
    assert_eq!(LangType::from_sql("tinyint"), LangType::Byte);
}

#[test]
fn test_from_sql_ignores_length_suffix() {
    assert_eq!(LangType::from_sql("nvarchar(max)"), LangType::String);
    assert_eq!(LangType::from_sql("varchar(32)"), LangType::String);
    assert_eq!(LangType::from_sql("decimal(18,2)"), LangType::Decimal);
    assert_eq!(LangType::from_sql("varbinary(16)"), LangType::Bytes);
}

#[test]
fn test_from_sql_temporal_and_misc() {
    assert_eq!(LangType::from_sql("datetime2(7)"), LangType::DateTime);
    assert_eq!(LangType::from_sql("date"), LangType::Date);
    assert_eq!(LangType::from_sql("time"), LangType::Time);
    assert_eq!(LangType::from_sql("uniqueidentifier"), LangType::Guid);
    assert_eq!(LangType::from_sql("bit"), LangType::Bool);
    assert_eq!(LangType::from_sql("float"), LangType::Double);
    assert_eq!(LangType::from_sql("real"), LangType::Float);
}

#[test]
fn test_unknown_sql_type_is_object() {
    assert_eq!(LangType::from_sql("geography"), LangType::Object);
    assert_eq!(LangType::from_sql(""), LangType::Object);
    assert_eq!(LangType::default(), LangType::Object);
}

#[test]
fn test_numeric_predicates() {
    assert!(LangType::Decimal.is_numeric());
    assert!(!LangType::Decimal.is_integer());
    assert!(LangType::Byte.is_integer());
    assert!(!LangType::String.is_numeric());
    assert!(!LangType::Bool.is_numeric());
}

#[test]
fn test_display_and_parse() {
    assert_eq!(LangType::Guid.to_string(), "guid");
    assert_eq!("Boolean".parse::<LangType>().unwrap(), LangType::Bool);
    let err = "varchar".parse::<LangType>().unwrap_err();
    assert_eq!(err.0, "varchar");
}

#[test]
fn test_serde_uses_lowercase_names() {
    let json = serde_json::to_string(&LangType::DateTime).unwrap();
    assert_eq!(json, "\"datetime\"");
    let back: LangType = serde_json::from_str("\"long\"").unwrap();
    assert_eq!(back, LangType::Long);
}

#[test]
fn test_base_type_name() {
    assert_eq!(base_type_name("NVarChar(100)"), "nvarchar");
    assert_eq!(base_type_name("int"), "int");
}

#[test]
fn test_operation_kind_suffixes() {
    assert_eq!(OperationKind::from_procedure_name("UserCreate"), OperationKind::Create);
    assert_eq!(OperationKind::from_procedure_name("UserUpdate"), OperationKind::Update);
    assert_eq!(OperationKind::from_procedure_name("UserDelete"), OperationKind::Delete);
    assert_eq!(OperationKind::from_procedure_name("UserFindById"), OperationKind::Find);
    assert_eq!(OperationKind::from_procedure_name("OrderList"), OperationKind::List);
    assert_eq!(OperationKind::from_procedure_name("Create"), OperationKind::Other);
    assert_eq!(OperationKind::from_procedure_name("FindAll"), OperationKind::Other);
    assert_eq!(OperationKind::from_procedure_name("RebuildIndexes"), OperationKind::Other);
}

#[test]
fn test_crud_kinds() {
    assert!(OperationKind::Upsert.is_crud());
    assert!(OperationKind::Merge.is_crud());
    assert!(!OperationKind::Find.is_crud());
    assert!(!OperationKind::List.is_crud());
}

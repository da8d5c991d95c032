//! Integration tests for the fixture metadata source and catalog fetch.

use std::io::Write;
use std::time::Duration;

use async_trait::async_trait;
use sprocket::metadata::{
    fetch_catalog, CancellationFlag, FetchError, FetchOptions, FixtureMetadataSource,
    MetadataSource, Row, SourceError, SourceResult,
};

const CATALOG: &str = r#"{
  "schemas": [
    {"schema_id": 1, "name": "dbo"},
    {"schema_id": 5, "name": "billing"}
  ],
  "procedures": [
    {"object_id": 100, "schema_id": 1, "name": "UserFind", "modify_date": "2026-01-02T03:04:05Z"},
    {"object_id": 200, "schema_id": 5, "name": "InvoiceCreate"}
  ],
  "inputs": [
    {"object_id": 100, "parameter_id": 1, "name": "@UserId", "system_type_name": "int", "max_length": 4},
    {"object_id": 200, "parameter_id": 1, "name": "@Amount", "system_type_name": "decimal(18,2)", "max_length": 9}
  ],
  "result_columns": [
    {"object_id": 100, "result_set_ordinal": 1, "column_ordinal": 1, "name": "UserId", "system_type_name": "int"}
  ]
}"#;

fn write_fixture(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_fixture_file_round_trips_through_fetch() {
    let file = write_fixture(CATALOG);
    let source = FixtureMetadataSource::from_file(file.path()).unwrap();

    let rows = fetch_catalog(&source, &FetchOptions::default()).await.unwrap();

    assert_eq!(rows.schemas.len(), 2);
    assert_eq!(rows.procedures.len(), 2);
    assert_eq!(rows.procedures[0].name, "UserFind");
    assert!(rows.procedures[0].modified.is_some());
    assert!(rows.procedures[1].modified.is_none());
    assert_eq!(rows.inputs[1].sql_type_name, "decimal(18,2)");
    assert_eq!(rows.result_columns.len(), 1);
    // Missing arrays default to empty.
    assert!(rows.table_type_columns.is_empty());
}

#[tokio::test]
async fn test_schema_filter_drops_other_schemas() {
    let file = write_fixture(CATALOG);
    let source = FixtureMetadataSource::from_file(file.path()).unwrap();
    let options = FetchOptions::default().with_schemas(vec!["Billing".to_string()]);

    let rows = fetch_catalog(&source, &options).await.unwrap();

    assert_eq!(rows.schemas.len(), 1);
    assert_eq!(rows.procedures.len(), 1);
    assert_eq!(rows.procedures[0].name, "InvoiceCreate");
    assert_eq!(rows.inputs.len(), 1);
    assert!(rows.result_columns.is_empty());
}

#[test]
fn test_missing_fixture_is_read_error() {
    let err = FixtureMetadataSource::from_file("/nonexistent/catalog.json").unwrap_err();
    assert!(matches!(err, SourceError::FixtureRead { .. }));
}

#[test]
fn test_malformed_fixture_is_parse_error() {
    let file = write_fixture("{ not json");
    let err = FixtureMetadataSource::from_file(file.path()).unwrap_err();
    assert!(matches!(err, SourceError::FixtureParse { .. }));
}

#[tokio::test]
async fn test_row_without_identity_fails_whole_fetch() {
    let file = write_fixture(r#"{"schemas": [{"name": "dbo"}]}"#);
    let source = FixtureMetadataSource::from_file(file.path()).unwrap();

    let err = fetch_catalog(&source, &FetchOptions::default()).await.unwrap_err();
    assert!(matches!(err, FetchError::Mapping(_)));
}

#[tokio::test]
async fn test_cancelled_before_fetch() {
    let file = write_fixture(CATALOG);
    let source = FixtureMetadataSource::from_file(file.path()).unwrap();
    let cancel = CancellationFlag::new();
    cancel.cancel();

    let err = fetch_catalog(&source, &FetchOptions::default().with_cancel(cancel))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Cancelled));
}

/// A source whose procedure query never answers in time.
struct SlowSource;

#[async_trait]
impl MetadataSource for SlowSource {
    async fn schemas(&self) -> SourceResult<Vec<Row>> {
        Ok(Vec::new())
    }

    async fn procedures(&self) -> SourceResult<Vec<Row>> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(Vec::new())
    }

    async fn inputs(&self) -> SourceResult<Vec<Row>> {
        Ok(Vec::new())
    }

    async fn result_columns(&self) -> SourceResult<Vec<Row>> {
        Ok(Vec::new())
    }

    async fn table_type_columns(&self) -> SourceResult<Vec<Row>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_slow_source_times_out() {
    let options = FetchOptions::default().with_timeout(Duration::from_millis(50));
    let err = fetch_catalog(&SlowSource, &options).await.unwrap_err();
    assert!(matches!(err, FetchError::Timeout(_)));
}

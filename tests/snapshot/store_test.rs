//! Integration tests for snapshot capture, listing, diffing and fingerprints.

use chrono::{DateTime, Duration, TimeZone, Utc};
use sprocket::model::{
    FieldDescriptor, LangType, ResultSetDescriptor, SchemaDescriptor, SchemaModel,
    StoredProcedureDescriptor,
};
use sprocket::snapshot::{
    fingerprint, CleanOptions, SnapshotDiff, SnapshotError, SnapshotRecord, SnapshotStore,
};

fn field(name: &str, lang_type: LangType) -> FieldDescriptor {
    FieldDescriptor {
        source_name: name.into(),
        target_name: name.to_lowercase(),
        lang_type,
        sql_type_name: lang_type.as_str().into(),
        ..Default::default()
    }
}

fn procedure(name: &str, fields: Vec<FieldDescriptor>) -> StoredProcedureDescriptor {
    StoredProcedureDescriptor {
        schema_id: 1,
        schema_name: "dbo".into(),
        name: name.into(),
        result_sets: vec![ResultSetDescriptor {
            ordinal: 1,
            name: "Result".into(),
            fields,
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn model(procedures: Vec<StoredProcedureDescriptor>) -> SchemaModel {
    SchemaModel {
        schemas: vec![SchemaDescriptor {
            id: 1,
            name: "dbo".into(),
            procedures,
        }],
    }
}

fn base_model() -> SchemaModel {
    model(vec![
        procedure("UserFind", vec![field("UserId", LangType::Int)]),
        procedure("UserDelete", vec![field("ResultId", LangType::Long)]),
    ])
}

fn at(seconds: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap() + Duration::seconds(seconds)
}

#[test]
fn test_fingerprint_is_deterministic() {
    let a = fingerprint(&base_model().schemas[0].procedures[0]).unwrap();
    let b = fingerprint(&base_model().schemas[0].procedures[0]).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.len(), 64);
}

#[test]
fn test_fingerprint_ignores_modify_date() {
    let plain = procedure("UserFind", vec![field("UserId", LangType::Int)]);
    let touched = StoredProcedureDescriptor {
        modified: Some(at(0)),
        ..plain.clone()
    };
    assert_eq!(fingerprint(&plain).unwrap(), fingerprint(&touched).unwrap());
}

#[test]
fn test_diff_against_nothing_is_all_added() {
    let record = SnapshotRecord::new(base_model(), at(0)).unwrap();
    let diff = SnapshotDiff::between(None, &record);

    assert_eq!(diff.added.len(), 2);
    assert!(diff.removed.is_empty());
    assert!(diff.changed.is_empty());
    assert!(diff.has_drift());
}

#[test]
fn test_diff_reports_added_removed_changed() {
    let older = SnapshotRecord::new(base_model(), at(0)).unwrap();

    let newer_model = model(vec![
        procedure(
            "UserFind",
            vec![field("UserId", LangType::Int), field("Email", LangType::String)],
        ),
        procedure("UserCreate", vec![field("ResultId", LangType::Long)]),
    ]);
    let newer = SnapshotRecord::new(newer_model, at(1)).unwrap();

    let diff = SnapshotDiff::between(Some(&older), &newer);
    assert_eq!(diff.added.iter().collect::<Vec<_>>(), vec!["dbo.UserCreate"]);
    assert_eq!(diff.removed.iter().collect::<Vec<_>>(), vec!["dbo.UserDelete"]);
    assert_eq!(diff.changed.iter().collect::<Vec<_>>(), vec!["dbo.UserFind"]);

    let regen: Vec<_> = diff.regenerate().into_iter().collect();
    assert_eq!(regen, vec!["dbo.UserCreate", "dbo.UserFind"]);
}

#[test]
fn test_identical_models_have_no_drift() {
    let a = SnapshotRecord::new(base_model(), at(0)).unwrap();
    let b = SnapshotRecord::new(base_model(), at(60)).unwrap();
    let diff = SnapshotDiff::between(Some(&a), &b);
    assert!(!diff.has_drift());
    assert!(diff.regenerate().is_empty());
}

#[test]
fn test_capture_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());

    let captured = store.capture_at(base_model(), at(0)).unwrap();
    assert_eq!(captured.id, "20260401T120000.000Z");
    assert!(dir
        .path()
        .join("snapshot-20260401T120000.000Z.json")
        .is_file());

    let loaded = store.load(&captured.id).unwrap();
    assert_eq!(loaded, captured);
    assert_eq!(loaded.model, base_model());
    assert!(loaded.fingerprint_of("dbo.UserFind").is_some());
}

#[test]
fn test_list_is_oldest_first_and_latest_is_newest() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());

    // Captured out of order; listing sorts by creation time.
    store.capture_at(base_model(), at(20)).unwrap();
    store.capture_at(SchemaModel::default(), at(0)).unwrap();
    store.capture_at(base_model(), at(10)).unwrap();

    let created: Vec<_> = store.list().unwrap().into_iter().map(|e| e.created_at).collect();
    assert_eq!(created, vec![at(0), at(10), at(20)]);

    let latest = store.latest().unwrap().unwrap();
    assert_eq!(latest.created_at, at(20));
}

#[test]
fn test_list_ignores_foreign_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());
    store.capture_at(base_model(), at(0)).unwrap();

    std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
    std::fs::write(dir.path().join("snapshot-garbage.json"), "{}").unwrap();

    assert_eq!(store.list().unwrap().len(), 1);
}

#[test]
fn test_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path().join("never-created"));

    assert!(store.list().unwrap().is_empty());
    assert!(store.latest().unwrap().is_none());
    assert!(matches!(
        store.load("20260101T000000.000Z"),
        Err(SnapshotError::NotFound(_))
    ));
}

#[test]
fn test_corrupt_snapshot_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());
    std::fs::write(dir.path().join("snapshot-20260101T000000.000Z.json"), "{ truncated").unwrap();

    assert!(matches!(
        store.load("20260101T000000.000Z"),
        Err(SnapshotError::Parse { .. })
    ));
}

#[test]
fn test_capture_leaves_no_temp_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());
    store.capture_at(base_model(), at(0)).unwrap();

    let mut names: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec![".lock", "snapshot-20260401T120000.000Z.json"]);
}

#[test]
fn test_lock_file_left_by_crashed_writer_does_not_block_capture() {
    let dir = tempfile::tempdir().unwrap();
    // A writer that died mid-capture leaves its lock file behind.
    std::fs::write(dir.path().join(".lock"), "4194303\n").unwrap();
    let store = SnapshotStore::new(dir.path());

    let record = store.capture_at(base_model(), at(0)).unwrap();
    assert_eq!(store.latest().unwrap().map(|r| r.id), Some(record.id));
    store.clean(&CleanOptions::all()).unwrap();
}

#[test]
fn test_held_lock_blocks_other_writers() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());
    let held = store.lock().unwrap();

    assert!(matches!(
        store.capture_at(base_model(), at(0)),
        Err(SnapshotError::Locked(_))
    ));

    let record = SnapshotRecord::new(base_model(), at(1)).unwrap();
    let persisted = store.persist_locked(&held, record).unwrap();
    assert_eq!(persisted.id, "20260401T120001.000Z");

    drop(held);
    store.capture_at(base_model(), at(2)).unwrap();
    assert_eq!(store.list().unwrap().len(), 2);
}

//! Integration tests for snapshot retention.

use chrono::{DateTime, Duration, TimeZone, Utc};
use sprocket::model::SchemaModel;
use sprocket::snapshot::{CleanOptions, SnapshotError, SnapshotLock, SnapshotStore, DEFAULT_KEEP};
use tempfile::TempDir;

fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
}

/// A store holding `count` snapshots one minute apart, oldest first.
fn store_with(count: i64) -> (TempDir, SnapshotStore, Vec<String>) {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());
    let ids = (0..count)
        .map(|i| store.capture_at(SchemaModel::default(), at(i)).unwrap().id)
        .collect();
    (dir, store, ids)
}

fn listed(store: &SnapshotStore) -> Vec<String> {
    store.list().unwrap().into_iter().map(|e| e.id).collect()
}

#[test]
fn test_default_keep_is_five() {
    assert_eq!(DEFAULT_KEEP, 5);
    assert_eq!(CleanOptions::default(), CleanOptions::keep(5));
}

#[test]
fn test_keep_retains_most_recent() {
    let (_dir, store, ids) = store_with(8);

    let summary = store.clean(&CleanOptions::default()).unwrap();

    assert_eq!(summary.removed, ids[..3].to_vec());
    assert_eq!(summary.kept, ids[3..].to_vec());
    assert_eq!(listed(&store), ids[3..].to_vec());
}

#[test]
fn test_clean_all_removes_everything() {
    let (_dir, store, ids) = store_with(4);

    let summary = store.clean(&CleanOptions::all()).unwrap();

    assert_eq!(summary.removed, ids);
    assert!(summary.kept.is_empty());
    assert!(listed(&store).is_empty());
}

#[test]
fn test_keep_at_or_above_count_is_noop() {
    let (_dir, store, ids) = store_with(3);

    let summary = store.clean(&CleanOptions::keep(3)).unwrap();
    assert!(summary.removed.is_empty());
    assert_eq!(summary.kept, ids);

    let summary = store.clean(&CleanOptions::keep(10)).unwrap();
    assert!(summary.removed.is_empty());
    assert_eq!(listed(&store), ids);
}

#[test]
fn test_keep_zero_is_rejected() {
    let (_dir, store, ids) = store_with(2);

    assert!(matches!(
        store.clean(&CleanOptions::keep(0)),
        Err(SnapshotError::InvalidRetention)
    ));
    assert_eq!(listed(&store), ids);
}

#[test]
fn test_clean_on_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path().join("missing"));

    let summary = store.clean(&CleanOptions::all()).unwrap();
    assert!(summary.removed.is_empty());
    assert!(summary.kept.is_empty());
}

#[test]
fn test_clean_refuses_while_locked() {
    let (dir, store, ids) = store_with(3);
    let _held = SnapshotLock::acquire(dir.path()).unwrap();

    assert!(matches!(
        store.clean(&CleanOptions::keep(1)),
        Err(SnapshotError::Locked(_))
    ));
    assert_eq!(listed(&store), ids);
}

#[test]
fn test_partial_failure_reports_removed_and_remaining() {
    let (dir, store, ids) = store_with(4);

    // A directory with a snapshot name sorts between the first and second
    // records and cannot be removed as a file.
    let blocker = "20260501T000030.000Z";
    std::fs::create_dir(dir.path().join(format!("snapshot-{}.json", blocker))).unwrap();

    let err = store.clean(&CleanOptions::keep(2)).unwrap_err();
    match err {
        SnapshotError::PartialClean {
            removed, remaining, ..
        } => {
            assert_eq!(removed, vec![ids[0].clone()]);
            assert_eq!(
                remaining,
                vec![
                    blocker.to_string(),
                    ids[1].clone(),
                    ids[2].clone(),
                    ids[3].clone()
                ]
            );
        }
        other => panic!("expected partial clean, got {other:?}"),
    }

    // The lock was released despite the failure.
    SnapshotLock::acquire(dir.path()).unwrap();
}

//! Integration tests for writing generated files.

use std::path::PathBuf;

use sprocket::emit::{header_locked, OutputWriter, RenderedOutput, TemplateVariant};

fn output(relative: &str, contents: &str) -> RenderedOutput {
    RenderedOutput {
        procedure: "dbo.UserFind".into(),
        variant: TemplateVariant::V3,
        relative_path: PathBuf::from(relative),
        contents: contents.into(),
    }
}

const FRESH: &str = "// @generated by sprocket 0.1.0\n// locked: false\n\npub struct Fresh;\n";

#[test]
fn test_writes_nested_paths() {
    let dir = tempfile::tempdir().unwrap();
    let writer = OutputWriter::new(dir.path());

    let summary = writer
        .write_all(&[output("dbo/user_find.rs", FRESH), output("sales/order_list.rs", FRESH)])
        .unwrap();

    assert_eq!(
        summary.written,
        vec![PathBuf::from("dbo/user_find.rs"), PathBuf::from("sales/order_list.rs")]
    );
    assert!(summary.skipped_locked.is_empty());
    let written = std::fs::read_to_string(dir.path().join("dbo/user_find.rs")).unwrap();
    assert_eq!(written, FRESH);
}

#[test]
fn test_unlocked_file_is_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("dbo/user_find.rs");
    std::fs::create_dir_all(target.parent().unwrap()).unwrap();
    std::fs::write(&target, "// locked: false\nold\n").unwrap();

    let writer = OutputWriter::new(dir.path());
    assert!(writer.write_one(&output("dbo/user_find.rs", FRESH)).unwrap());
    assert_eq!(std::fs::read_to_string(&target).unwrap(), FRESH);
}

#[test]
fn test_locked_file_is_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("dbo/user_find.rs");
    std::fs::create_dir_all(target.parent().unwrap()).unwrap();
    let hand_edited = "// @generated by sprocket 0.1.0\n// locked: true\n\npub struct HandEdited;\n";
    std::fs::write(&target, hand_edited).unwrap();

    let writer = OutputWriter::new(dir.path());
    let summary = writer
        .write_all(&[output("dbo/user_find.rs", FRESH), output("dbo/user_list.rs", FRESH)])
        .unwrap();

    assert_eq!(summary.skipped_locked, vec![PathBuf::from("dbo/user_find.rs")]);
    assert_eq!(summary.written, vec![PathBuf::from("dbo/user_list.rs")]);
    assert_eq!(std::fs::read_to_string(&target).unwrap(), hand_edited);
}

#[test]
fn test_locked_marker_outside_header_is_ignored() {
    let body_mention = "// @generated\n\nconst NOTE: &str = \"x\";\n// locked: true\n";
    assert!(!header_locked(body_mention));
    assert!(header_locked("//   locked:   TRUE\n"));
}

#[test]
fn test_no_temp_files_left_behind() {
    let dir = tempfile::tempdir().unwrap();
    let writer = OutputWriter::new(dir.path());
    writer.write_one(&output("dbo/user_find.rs", FRESH)).unwrap();

    let names: Vec<_> = std::fs::read_dir(dir.path().join("dbo"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["user_find.rs"]);
}

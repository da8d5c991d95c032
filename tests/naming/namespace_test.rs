//! Integration tests for namespace resolution.

use std::fs;
use std::path::Path;

use sprocket::naming::{normalize_identifier, resolve_namespace, NamespaceSource};

fn project(name: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join(name);
    fs::create_dir(&root).unwrap();
    (dir, root)
}

fn sample_crate(root: &Path, pivot: &str, dir: &str, manifest: &str) {
    let path = root.join(pivot).join(dir);
    fs::create_dir_all(&path).unwrap();
    fs::write(path.join("Cargo.toml"), manifest).unwrap();
}

#[test]
fn test_pivot_package_name_wins_over_directory() {
    let (_tmp, root) = project("order-service");
    sample_crate(
        &root,
        "samples",
        "consumer",
        "[package]\nname = \"Acme-Orders\"\nversion = \"0.1.0\"\n",
    );

    let resolved = resolve_namespace(&root, None);
    assert_eq!(resolved.name, "acme_orders");
    assert!(matches!(resolved.source, NamespaceSource::Pivot(ref p) if p.ends_with("consumer")));
}

#[test]
fn test_pivot_without_package_name_uses_crate_directory() {
    let (_tmp, root) = project("order-service");
    sample_crate(&root, "sample", "BillingDemo", "[workspace]\nmembers = []\n");

    let resolved = resolve_namespace(&root, None);
    assert_eq!(resolved.name, "billing_demo");
}

#[test]
fn test_first_sample_crate_in_name_order() {
    let (_tmp, root) = project("svc");
    sample_crate(&root, "samples", "zeta", "[package]\nname = \"zeta\"\n");
    sample_crate(&root, "samples", "alpha", "[package]\nname = \"alpha\"\n");
    // Not a crate: no manifest.
    fs::create_dir_all(root.join("samples").join("aaa-notes")).unwrap();

    assert_eq!(resolve_namespace(&root, None).name, "alpha");
}

#[test]
fn test_falls_back_to_directory_name() {
    let (_tmp, root) = project("Inventory.Api");

    let resolved = resolve_namespace(&root, None);
    assert_eq!(resolved.name, "inventory_api");
    assert_eq!(resolved.source, NamespaceSource::Directory);
}

#[test]
fn test_override_is_used_verbatim() {
    let (_tmp, root) = project("order-service");
    sample_crate(&root, "samples", "consumer", "[package]\nname = \"consumer\"\n");

    let resolved = resolve_namespace(&root, Some("crate::db"));
    assert_eq!(resolved.name, "crate::db");
    assert_eq!(resolved.source, NamespaceSource::Override);
}

#[test]
fn test_blank_override_is_ignored() {
    let (_tmp, root) = project("ledger");
    let resolved = resolve_namespace(&root, Some("   "));
    assert_eq!(resolved.name, "ledger");
    assert_eq!(resolved.source, NamespaceSource::Directory);
}

#[test]
fn test_normalize_identifier() {
    assert_eq!(normalize_identifier("my-app"), "my_app");
    assert_eq!(normalize_identifier("  Data Access  "), "data_access");
    assert!(normalize_identifier("9lives").starts_with('_'));
    assert_eq!(normalize_identifier("---"), "generated");
    assert_eq!(normalize_identifier(""), "generated");
}

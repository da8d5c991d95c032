//! Namespace resolution for generated code.
//!
//! Picks the root module identifier that generated files import their
//! runtime from:
//!
//! 1. an explicit override from configuration, verbatim;
//! 2. otherwise the package name of the first consumer crate found under a
//!    sample directory (`samples/<crate>/Cargo.toml`);
//! 3. otherwise the root directory's own name.
//!
//! Resolution never fails; the worst case is a normalized directory name or
//! `generated`.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use inflector::Inflector;

/// Directories that hold sample consumer crates, in lookup order.
const PIVOT_DIRS: &[&str] = &["samples", "sample"];

const FALLBACK: &str = "generated";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NamespaceSource {
    Override,
    Pivot(PathBuf),
    Directory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedNamespace {
    pub name: String,
    pub source: NamespaceSource,
}

impl fmt::Display for ResolvedNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Deserialize)]
struct Manifest {
    package: Option<Package>,
}

#[derive(Deserialize)]
struct Package {
    name: Option<String>,
}

/// Resolve the namespace for generated code under `root`.
pub fn resolve_namespace(root: &Path, override_name: Option<&str>) -> ResolvedNamespace {
    if let Some(name) = override_name.filter(|n| !n.trim().is_empty()) {
        return ResolvedNamespace {
            name: name.to_string(),
            source: NamespaceSource::Override,
        };
    }

    if let Some((dir, name)) = find_pivot(root) {
        debug!(pivot = %dir.display(), %name, "namespace from sample crate");
        return ResolvedNamespace {
            name: normalize_identifier(&name),
            source: NamespaceSource::Pivot(dir),
        };
    }

    let dir_name = root
        .canonicalize()
        .ok()
        .as_deref()
        .and_then(Path::file_name)
        .or_else(|| root.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    ResolvedNamespace {
        name: normalize_identifier(&dir_name),
        source: NamespaceSource::Directory,
    }
}

/// First crate (by directory name) under a pivot directory, with its
/// conventional name: the manifest's package name, else the directory name.
fn find_pivot(root: &Path) -> Option<(PathBuf, String)> {
    for pivot in PIVOT_DIRS {
        let Ok(read_dir) = std::fs::read_dir(root.join(pivot)) else {
            continue;
        };

        let mut candidates: Vec<PathBuf> = read_dir
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.join("Cargo.toml").is_file())
            .collect();
        candidates.sort();

        if let Some(dir) = candidates.into_iter().next() {
            let name = package_name(&dir.join("Cargo.toml"))
                .or_else(|| dir.file_name().map(|n| n.to_string_lossy().into_owned()))
                .unwrap_or_default();
            return Some((dir, name));
        }
    }
    None
}

fn package_name(manifest: &Path) -> Option<String> {
    let content = std::fs::read_to_string(manifest).ok()?;
    let manifest: Manifest = toml::from_str(&content).ok()?;
    manifest.package?.name
}

/// Normalize to a snake_case Rust identifier: non-alphanumeric runs become
/// `_`, a leading digit gets a `_` prefix, empty input becomes `generated`.
pub fn normalize_identifier(name: &str) -> String {
    let mut cleaned = String::with_capacity(name.len());
    let mut last_sep = false;
    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch);
            last_sep = false;
        } else if !last_sep {
            cleaned.push('_');
            last_sep = true;
        }
    }

    let mut ident = cleaned.trim_matches('_').to_snake_case();
    if ident.is_empty() {
        return FALLBACK.to_string();
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}

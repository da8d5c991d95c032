//! Write rendered outputs to disk.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::template::header_locked;
use super::{EmitError, EmitResult, RenderedOutput};

/// What a write pass did, by relative path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    pub written: Vec<PathBuf>,
    pub skipped_locked: Vec<PathBuf>,
}

/// Writes generated files under an output root, leaving locked files alone.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    root: PathBuf,
}

impl OutputWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write every output. Stops at the first I/O failure; files already
    /// written stay written.
    pub fn write_all(&self, outputs: &[RenderedOutput]) -> EmitResult<WriteSummary> {
        let mut summary = WriteSummary::default();
        for output in outputs {
            if self.write_one(output)? {
                summary.written.push(output.relative_path.clone());
            } else {
                summary.skipped_locked.push(output.relative_path.clone());
            }
        }
        info!(
            written = summary.written.len(),
            skipped_locked = summary.skipped_locked.len(),
            root = %self.root.display(),
            "generated files written"
        );
        Ok(summary)
    }

    /// Returns `false` if the target exists and its header is locked.
    pub fn write_one(&self, output: &RenderedOutput) -> EmitResult<bool> {
        let path = self.root.join(&output.relative_path);

        if self.is_locked(&path)? {
            debug!(path = %path.display(), "skipping locked file");
            return Ok(false);
        }

        let parent = path.parent().unwrap_or(&self.root);
        std::fs::create_dir_all(parent).map_err(|source| EmitError::Write {
            path: parent.to_path_buf(),
            source,
        })?;

        let mut tmp = NamedTempFile::new_in(parent).map_err(|source| EmitError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
        tmp.write_all(output.contents.as_bytes())
            .map_err(|source| EmitError::Write {
                path: tmp.path().to_path_buf(),
                source,
            })?;
        tmp.persist(&path).map_err(|err| EmitError::Write {
            path: path.clone(),
            source: err.error,
        })?;

        debug!(path = %path.display(), "wrote generated file");
        Ok(true)
    }

    fn is_locked(&self, path: &Path) -> EmitResult<bool> {
        match std::fs::read_to_string(path) {
            Ok(existing) => Ok(header_locked(&existing)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(EmitError::Write {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

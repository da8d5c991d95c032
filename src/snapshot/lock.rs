use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::warn;

use super::{SnapshotError, SnapshotResult};

pub(crate) const LOCK_FILE: &str = ".lock";

/// Advisory single-writer lock over a snapshot directory.
///
/// An exclusive OS lock on a long-lived `.lock` file. The file itself is
/// never removed; the lock goes away with the handle, including when the
/// owning process dies.
#[derive(Debug)]
pub struct SnapshotLock {
    file: File,
    path: PathBuf,
}

impl SnapshotLock {
    /// Take the lock without waiting. Fails with [`SnapshotError::Locked`]
    /// if another handle holds it.
    pub fn acquire(dir: &Path) -> SnapshotResult<Self> {
        let path = dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| SnapshotError::Io {
                path: path.clone(),
                source,
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Self { file, path }),
            Err(err) if err.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {
                Err(SnapshotError::Locked(path))
            }
            Err(source) => Err(SnapshotError::Io { path, source }),
        }
    }

    /// Directory this lock guards.
    pub fn dir(&self) -> Option<&Path> {
        self.path.parent()
    }
}

impl Drop for SnapshotLock {
    fn drop(&mut self) {
        if let Err(err) = self.file.unlock() {
            warn!(path = %self.path.display(), error = %err, "failed to release snapshot lock");
        }
    }
}

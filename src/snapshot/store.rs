//! On-disk snapshot history.
//!
//! One pretty-printed JSON file per capture, named by capture timestamp:
//!
//! ```text
//! .sprocket/snapshots/
//!   snapshot-20261019T081500.250Z.json
//!   snapshot-20261019T081500.250Z-1.json   (same-millisecond collision)
//!   .lock                                  (advisory writer lock)
//! ```

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::model::SchemaModel;

use super::lock::SnapshotLock;
use super::record::SnapshotRecord;
use super::{SnapshotError, SnapshotResult};

const FILE_PREFIX: &str = "snapshot-";
const FILE_EXT: &str = "json";
const ID_FORMAT: &str = "%Y%m%dT%H%M%S%.3fZ";
const MAX_COLLISIONS: u32 = 1000;

/// Default number of records kept by [`SnapshotStore::clean`].
pub const DEFAULT_KEEP: usize = 5;

/// A record on disk, known by name only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotEntry {
    pub id: String,
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
    sequence: u32,
}

/// Retention policy for [`SnapshotStore::clean`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanOptions {
    pub all: bool,
    pub keep: usize,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            all: false,
            keep: DEFAULT_KEEP,
        }
    }
}

impl CleanOptions {
    pub fn all() -> Self {
        Self { all: true, keep: 0 }
    }

    pub fn keep(keep: usize) -> Self {
        Self { all: false, keep }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanSummary {
    pub removed: Vec<String>,
    pub kept: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Fingerprint `model` and append it to the history, stamped now.
    pub fn capture(&self, model: SchemaModel) -> SnapshotResult<SnapshotRecord> {
        self.capture_at(model, Utc::now())
    }

    pub fn capture_at(
        &self,
        model: SchemaModel,
        created_at: DateTime<Utc>,
    ) -> SnapshotResult<SnapshotRecord> {
        let record = SnapshotRecord::new(model, created_at).map_err(SnapshotError::Serialize)?;
        self.persist(record)
    }

    /// Take the writer lock for this history, creating the directory if
    /// needed. Hold it across a read-diff-persist sequence so no other
    /// writer can append in between.
    pub fn lock(&self) -> SnapshotResult<SnapshotLock> {
        self.ensure_dir()?;
        SnapshotLock::acquire(&self.dir)
    }

    /// Write an already-built record as a new file and return it with its
    /// assigned id. Existing files are never replaced.
    pub fn persist(&self, record: SnapshotRecord) -> SnapshotResult<SnapshotRecord> {
        let lock = self.lock()?;
        self.persist_locked(&lock, record)
    }

    /// [`persist`](Self::persist) under a lock the caller already holds.
    pub fn persist_locked(
        &self,
        lock: &SnapshotLock,
        mut record: SnapshotRecord,
    ) -> SnapshotResult<SnapshotRecord> {
        debug_assert_eq!(lock.dir(), Some(self.dir.as_path()));

        let base = record.created_at.format(ID_FORMAT).to_string();
        for seq in 0..MAX_COLLISIONS {
            record.id = if seq == 0 {
                base.clone()
            } else {
                format!("{}-{}", base, seq)
            };
            let path = self.path_for(&record.id);
            if path.exists() {
                continue;
            }

            let json = serde_json::to_string_pretty(&record).map_err(SnapshotError::Serialize)?;
            let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|source| SnapshotError::Io {
                path: self.dir.clone(),
                source,
            })?;
            tmp.write_all(json.as_bytes())
                .and_then(|_| tmp.as_file().sync_all())
                .map_err(|source| SnapshotError::Io {
                    path: tmp.path().to_path_buf(),
                    source,
                })?;

            match tmp.persist_noclobber(&path) {
                Ok(_) => {
                    info!(
                        id = %record.id,
                        procedures = record.fingerprints.len(),
                        "snapshot captured"
                    );
                    return Ok(record);
                }
                Err(err) if err.error.kind() == ErrorKind::AlreadyExists => continue,
                Err(err) => {
                    return Err(SnapshotError::Io {
                        path,
                        source: err.error,
                    })
                }
            }
        }

        Err(SnapshotError::Collision(base))
    }

    /// Records on disk, oldest first.
    pub fn list(&self) -> SnapshotResult<Vec<SnapshotEntry>> {
        let read_dir = match std::fs::read_dir(&self.dir) {
            Ok(rd) => rd,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(SnapshotError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut entries = Vec::new();
        for item in read_dir {
            let item = item.map_err(|source| SnapshotError::Io {
                path: self.dir.clone(),
                source,
            })?;
            let path = item.path();
            if path.extension().and_then(|e| e.to_str()) != Some(FILE_EXT) {
                continue;
            }
            let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.strip_prefix(FILE_PREFIX))
                .map(str::to_string)
            else {
                continue;
            };
            match parse_id(&id) {
                Some((created_at, sequence)) => entries.push(SnapshotEntry {
                    id,
                    path,
                    created_at,
                    sequence,
                }),
                None => debug!(path = %path.display(), "ignoring unrecognised snapshot file"),
            }
        }

        entries.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.sequence.cmp(&b.sequence))
        });
        Ok(entries)
    }

    /// The most recently captured record, if any.
    pub fn latest(&self) -> SnapshotResult<Option<SnapshotRecord>> {
        match self.list()?.last() {
            Some(entry) => self.read(&entry.path).map(Some),
            None => Ok(None),
        }
    }

    pub fn load(&self, id: &str) -> SnapshotResult<SnapshotRecord> {
        let path = self.path_for(id);
        if !path.is_file() {
            return Err(SnapshotError::NotFound(id.to_string()));
        }
        self.read(&path)
    }

    /// Delete records outside the retention policy, oldest first.
    ///
    /// With `keep >= count` nothing is removed. A failed deletion stops the
    /// pass and reports what was removed and what remains; earlier deletions
    /// are not rolled back.
    pub fn clean(&self, options: &CleanOptions) -> SnapshotResult<CleanSummary> {
        if !options.all && options.keep == 0 {
            return Err(SnapshotError::InvalidRetention);
        }

        let entries = self.list()?;
        let keep = if options.all { 0 } else { options.keep };
        if entries.len() <= keep {
            debug!(count = entries.len(), keep, "nothing to clean");
            return Ok(CleanSummary {
                removed: Vec::new(),
                kept: entries.into_iter().map(|e| e.id).collect(),
            });
        }

        let _lock = SnapshotLock::acquire(&self.dir)?;
        // Re-read under the lock; a capture may have landed since.
        let entries = self.list()?;
        let cut = entries.len().saturating_sub(keep);
        let (doomed, kept) = entries.split_at(cut);

        let mut removed = Vec::with_capacity(doomed.len());
        for (i, entry) in doomed.iter().enumerate() {
            if let Err(source) = std::fs::remove_file(&entry.path) {
                warn!(id = %entry.id, error = %source, "snapshot deletion failed");
                let remaining = doomed[i..]
                    .iter()
                    .chain(kept.iter())
                    .map(|e| e.id.clone())
                    .collect();
                return Err(SnapshotError::PartialClean {
                    removed,
                    remaining,
                    source,
                });
            }
            removed.push(entry.id.clone());
        }

        info!(removed = removed.len(), kept = kept.len(), "snapshots cleaned");
        Ok(CleanSummary {
            removed,
            kept: kept.iter().map(|e| e.id.clone()).collect(),
        })
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}{}.{}", FILE_PREFIX, id, FILE_EXT))
    }

    fn ensure_dir(&self) -> SnapshotResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(|source| SnapshotError::Io {
            path: self.dir.clone(),
            source,
        })
    }

    fn read(&self, path: &Path) -> SnapshotResult<SnapshotRecord> {
        let content = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| SnapshotError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Split `20261019T081500.250Z-1` into its timestamp and collision sequence.
fn parse_id(id: &str) -> Option<(DateTime<Utc>, u32)> {
    let (stamp, sequence) = match id.split_once('-') {
        Some((stamp, seq)) => (stamp, seq.parse().ok()?),
        None => (id, 0),
    };
    let naive = NaiveDateTime::parse_from_str(stamp, ID_FORMAT).ok()?;
    Some((naive.and_utc(), sequence))
}

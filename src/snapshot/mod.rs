//! Snapshot store: versioned captures of the schema model for drift
//! detection.
//!
//! Capture is append-only and [`SnapshotStore::clean`] is the only
//! operation that removes records. Records are never edited after they are
//! written, so a diff against an old record stays valid after newer ones are
//! cleaned.

mod diff;
mod fingerprint;
mod lock;
mod record;
mod store;

use std::path::PathBuf;

pub use diff::SnapshotDiff;
pub use fingerprint::fingerprint;
pub use lock::SnapshotLock;
pub use record::SnapshotRecord;
pub use store::{CleanOptions, CleanSummary, SnapshotEntry, SnapshotStore, DEFAULT_KEEP};

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to parse snapshot {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("snapshot '{0}' not found")]
    NotFound(String),

    #[error("snapshot directory is locked by another writer ({0})")]
    Locked(PathBuf),

    #[error("could not allocate a unique snapshot name for {0}")]
    Collision(String),

    #[error("retention count must be at least 1 unless cleaning all snapshots")]
    InvalidRetention,

    #[error("snapshot clean stopped after removing {} file(s); {} remain: {source}", removed.len(), remaining.len())]
    PartialClean {
        removed: Vec<String>,
        remaining: Vec<String>,
        #[source]
        source: std::io::Error,
    },
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

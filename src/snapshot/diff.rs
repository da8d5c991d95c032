use std::collections::BTreeSet;

use serde::Serialize;

use super::record::SnapshotRecord;

/// Procedures that differ between two snapshots, by qualified name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotDiff {
    pub added: BTreeSet<String>,
    pub removed: BTreeSet<String>,
    pub changed: BTreeSet<String>,
}

impl SnapshotDiff {
    /// Compare two records. A missing `older` record treats every procedure
    /// in `newer` as added.
    pub fn between(older: Option<&SnapshotRecord>, newer: &SnapshotRecord) -> Self {
        let mut diff = SnapshotDiff::default();

        let Some(older) = older else {
            diff.added = newer.fingerprints.keys().cloned().collect();
            return diff;
        };

        for (name, fp) in &newer.fingerprints {
            match older.fingerprints.get(name) {
                None => {
                    diff.added.insert(name.clone());
                }
                Some(old) if old != fp => {
                    diff.changed.insert(name.clone());
                }
                Some(_) => {}
            }
        }

        diff.removed = older
            .fingerprints
            .keys()
            .filter(|name| !newer.fingerprints.contains_key(*name))
            .cloned()
            .collect();

        diff
    }

    pub fn has_drift(&self) -> bool {
        !(self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty())
    }

    /// Procedures that need regenerating: added or changed.
    pub fn regenerate(&self) -> BTreeSet<String> {
        self.added.union(&self.changed).cloned().collect()
    }
}

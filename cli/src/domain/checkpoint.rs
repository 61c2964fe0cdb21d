//! Checkpoint records and the in-memory shape of the transfer state file.
//!
//! Pure data manipulation: the infra store reads and writes the file.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::identity::WorkIdentity;

/// Which bulk operation a checkpoint belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Import,
    Delete,
}

impl OperationKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of one interrupted or failed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub operation: OperationKind,
    pub identity: WorkIdentity,
    /// Number of chunks the remote side has confirmed, counted from chunk 0.
    pub completed_chunks: usize,
    pub updated_at: DateTime<Utc>,
}

/// Contents of the transfer state file: records keyed by operation, then fingerprint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckpointBook {
    entries: BTreeMap<OperationKind, BTreeMap<String, CheckpointRecord>>,
}

impl CheckpointBook {
    #[must_use]
    pub fn get(&self, kind: OperationKind, fingerprint: &str) -> Option<&CheckpointRecord> {
        self.entries.get(&kind).and_then(|m| m.get(fingerprint))
    }

    /// Insert or overwrite the record for `(kind, identity.fingerprint)`.
    pub fn upsert(
        &mut self,
        kind: OperationKind,
        identity: &WorkIdentity,
        completed_chunks: usize,
        now: DateTime<Utc>,
    ) {
        self.entries.entry(kind).or_default().insert(
            identity.fingerprint.clone(),
            CheckpointRecord {
                operation: kind,
                identity: identity.clone(),
                completed_chunks,
                updated_at: now,
            },
        );
    }

    /// Remove a record. Returns `true` if one existed.
    pub fn remove(&mut self, kind: OperationKind, fingerprint: &str) -> bool {
        let Some(by_fp) = self.entries.get_mut(&kind) else {
            return false;
        };
        let removed = by_fp.remove(fingerprint).is_some();
        if by_fp.is_empty() {
            self.entries.remove(&kind);
        }
        removed
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(BTreeMap::is_empty)
    }

    /// All records, ordered by operation then fingerprint.
    pub fn records(&self) -> impl Iterator<Item = &CheckpointRecord> {
        self.entries.values().flat_map(BTreeMap::values)
    }
}

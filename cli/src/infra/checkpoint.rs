//! Infrastructure implementation of the `CheckpointStore` port.
//!
//! `JsonCheckpointStore` keeps every pending transfer in one JSON file. The
//! file is read whole and rewritten whole through a temp file + rename, so a
//! crash mid-write never leaves a torn file behind.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;

use crate::application::ports::CheckpointStore;
use crate::domain::{CheckpointBook, CheckpointRecord, OperationKind, TransferError, WorkIdentity};

/// Environment variable overriding the state file location.
pub const STATE_FILE_ENV: &str = "ROUTECTL_STATE_FILE";

/// Transfer state file manager. Implements `CheckpointStore` for the infra layer.
#[derive(Debug, Clone)]
pub struct JsonCheckpointStore {
    path: PathBuf,
}

impl JsonCheckpointStore {
    /// Create a store at `$ROUTECTL_STATE_FILE` or `~/.routectl/transfers.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        if let Ok(path) = std::env::var(STATE_FILE_ENV) {
            return Ok(Self::with_path(PathBuf::from(path)));
        }
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        Ok(Self::with_path(home.join(".routectl").join("transfers.json")))
    }

    /// Create a store with an explicit path (used in tests).
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole file. Absent, unreadable or corrupt files read as empty.
    fn read_book(&self) -> CheckpointBook {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return CheckpointBook::default(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "cannot read transfer state; starting fresh");
                return CheckpointBook::default();
            }
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "corrupt transfer state; starting fresh");
            CheckpointBook::default()
        })
    }

    fn write_book(&self, book: &CheckpointBook) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating directory {}", dir.display()))?;
        let content = serde_json::to_vec_pretty(book).context("serializing transfer state")?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("creating temp file in {}", dir.display()))?;
        tmp.write_all(&content).context("writing transfer state")?;
        tmp.as_file().sync_all().context("syncing transfer state")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(tmp.path(), std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("setting permissions on {}", tmp.path().display()))?;
        }

        tmp.persist(&self.path)
            .with_context(|| format!("finalizing transfer state {}", self.path.display()))?;
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut CheckpointBook) -> bool) -> Result<(), TransferError> {
        let mut book = self.read_book();
        if f(&mut book) {
            self.write_book(&book)
                .map_err(|e| TransferError::Checkpoint(format!("{e:#}")))?;
        }
        Ok(())
    }
}

impl CheckpointStore for JsonCheckpointStore {
    fn load(&self, kind: OperationKind, fingerprint: &str) -> Option<CheckpointRecord> {
        self.read_book().get(kind, fingerprint).cloned()
    }

    fn save(
        &self,
        kind: OperationKind,
        identity: &WorkIdentity,
        completed_chunks: usize,
    ) -> Result<(), TransferError> {
        self.update(|book| {
            book.upsert(kind, identity, completed_chunks, Utc::now());
            true
        })
    }

    fn clear(&self, kind: OperationKind, fingerprint: &str) -> Result<(), TransferError> {
        self.update(|book| book.remove(kind, fingerprint))
    }

    fn pending(&self) -> Vec<CheckpointRecord> {
        self.read_book().records().cloned().collect()
    }
}

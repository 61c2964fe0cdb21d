//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use crate::domain::{
    CheckpointRecord, InputError, OperationKind, RawTable, RedirectRecord, RoutectlConfig,
    TransferError, WorkIdentity,
};

// ── Value Types ───────────────────────────────────────────────────────────────

/// One page of the remote route index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPage {
    pub file_name: String,
    pub file_size: Option<u64>,
}

/// Shared state between a running transfer and its interrupt listener.
///
/// Cloning yields a handle to the same run.
#[derive(Debug, Clone)]
pub struct RunControl {
    cancel: CancellationToken,
    confirmed: Arc<AtomicUsize>,
    finished: Arc<Mutex<bool>>,
}

impl RunControl {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            confirmed: Arc::new(AtomicUsize::new(0)),
            finished: Arc::new(Mutex::new(false)),
        }
    }

    /// Ask the run to stop before its next chunk.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }

    /// Chunks confirmed by the remote side so far.
    #[must_use]
    pub fn confirmed(&self) -> usize {
        self.confirmed.load(Ordering::SeqCst)
    }

    /// Record the latest confirmed chunk count.
    pub fn record(&self, completed: usize) {
        self.confirmed.store(completed, Ordering::SeqCst);
    }

    /// Mark the run as fully complete. After this, [`while_active`](Self::while_active)
    /// never runs its callback, so a late signal cannot restore a cleared checkpoint.
    pub fn finish(&self) {
        *self.finished.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = true;
    }

    /// Run `f` with the confirmed count unless the run has finished.
    ///
    /// Holds the completion lock for the duration of `f`.
    pub fn while_active(&self, f: impl FnOnce(usize)) {
        let finished = self
            .finished
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if !*finished {
            f(self.confirmed());
        }
    }
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new()
    }
}

// ── Remote Rule API Port ──────────────────────────────────────────────────────

/// Remote redirect-rule management API.
///
/// Implementations classify failures into [`TransferError::RemotePermanent`]
/// and [`TransferError::RemoteTransient`].
#[allow(async_fn_in_trait)]
pub trait RuleApi {
    /// Create or overwrite one batch of redirects.
    async fn import_chunk(&self, records: &[RedirectRecord]) -> Result<(), TransferError>;
    /// Delete one batch of redirects by source path.
    async fn delete_chunk(&self, paths: &[String]) -> Result<(), TransferError>;
    /// List the pages of the remote route index.
    async fn list_index_pages(&self) -> Result<Vec<IndexPage>, TransferError>;
    /// List the route ids on one index page.
    async fn list_index_page(&self, page: &IndexPage) -> Result<Vec<String>, TransferError>;
}

// ── Checkpoint Port ───────────────────────────────────────────────────────────

/// Persistence for transfer progress, keyed by operation and fingerprint.
///
/// Sync trait: the state file is small and must be writable from a signal path.
pub trait CheckpointStore {
    /// Load progress for a work unit. Any read problem yields `None`.
    fn load(&self, kind: OperationKind, fingerprint: &str) -> Option<CheckpointRecord>;
    /// Insert or overwrite progress; durable before returning.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Checkpoint`] if the state file cannot be written.
    fn save(
        &self,
        kind: OperationKind,
        identity: &WorkIdentity,
        completed_chunks: usize,
    ) -> Result<(), TransferError>;
    /// Remove progress for a completed work unit. Missing records are fine.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Checkpoint`] if the state file cannot be written.
    fn clear(&self, kind: OperationKind, fingerprint: &str) -> Result<(), TransferError>;
    /// All pending records.
    fn pending(&self) -> Vec<CheckpointRecord>;
}

// ── Input File Port ───────────────────────────────────────────────────────────

/// Reads and writes the delimited redirect files.
pub trait RecordFiles {
    /// Read the raw bytes of an input file.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Unreadable`] if the file cannot be read.
    fn read(&self, path: &Path) -> Result<Vec<u8>, InputError>;
    /// Parse file bytes into the header and header-keyed rows.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Malformed`] for rows with the wrong column count
    /// or invalid encoding.
    fn parse(&self, bytes: &[u8]) -> Result<RawTable, InputError>;
    /// Write a single-column (`from`) delete list.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    fn write_delete_list(&self, path: &Path, paths: &[String]) -> Result<()>;
    /// Remove a file written by [`write_delete_list`](Self::write_delete_list).
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    fn remove(&self, path: &Path) -> Result<()>;
}

// ── Progress Reporting Ports ──────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait: no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

/// Per-chunk progress indicator for one transfer.
pub trait TransferProgress {
    /// Begin (or restart after a retry) with `completed` of `total` chunks done.
    fn start(&self, label: &str, total: usize, completed: usize);
    /// One more chunk confirmed.
    fn advance(&self);
    /// The transfer completed.
    fn finish(&self, message: &str);
    /// The transfer stopped early.
    fn abandon(&self, message: &str);
}

// ── Config Port ───────────────────────────────────────────────────────────────

/// Abstracts loading and saving the configuration file.
pub trait ConfigStore {
    /// Load configuration, returning defaults if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    fn load(&self) -> Result<RoutectlConfig>;
    /// Persist configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    fn save(&self, config: &RoutectlConfig) -> Result<()>;
    /// Location of the configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    fn path(&self) -> Result<PathBuf>;
}

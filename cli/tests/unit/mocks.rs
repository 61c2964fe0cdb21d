//! Shared mock infrastructure for unit tests.
//!
//! Hand-written port implementations with interior mutability so tests can
//! script failures and inspect every call afterwards.

#![allow(dead_code, clippy::expect_used)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use routectl::application::ports::{
    CheckpointStore, IndexPage, ProgressReporter, RuleApi, RunControl, TransferProgress,
};
use routectl::application::services::retry::RetryPolicy;
use routectl::application::services::transfer::TransferContext;
use routectl::domain::{
    CheckpointBook, CheckpointRecord, OperationKind, RedirectRecord, RedirectType, TransferError,
    WorkIdentity,
};

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub fn identity() -> WorkIdentity {
    WorkIdentity::new("acme", "master", b"fixture")
}

pub fn records(n: usize) -> Vec<RedirectRecord> {
    (0..n)
        .map(|i| RedirectRecord {
            from: format!("/r{i}"),
            to: format!("/target{i}"),
            end_date: None,
            kind: RedirectType::Permanent,
        })
        .collect()
}

pub fn policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        retry_delay: Duration::from_secs(5),
    }
}

pub fn context<'a>(
    store: &'a MemoryCheckpointStore,
    progress: &'a RecordingProgress,
    reporter: &'a RecordingReporter,
    policy: RetryPolicy,
) -> TransferContext<'a, MemoryCheckpointStore, RecordingProgress, RecordingReporter> {
    TransferContext {
        store,
        progress,
        reporter,
        policy,
    }
}

// ── Mock: remote rule API ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub enum Fail {
    Transient,
    Permanent,
}

impl Fail {
    fn error(self, call: usize) -> TransferError {
        match self {
            Self::Transient => TransferError::RemoteTransient(format!("timeout on call {call}")),
            Self::Permanent => TransferError::RemotePermanent(format!("rejected call {call}")),
        }
    }
}

/// In-memory rule API. Chunk calls are numbered from 0 across import and
/// delete; failures are scripted per call number.
#[derive(Default)]
pub struct ScriptedRuleApi {
    calls: AtomicUsize,
    failures: Mutex<HashMap<usize, Fail>>,
    cancel_after: Mutex<Option<(usize, RunControl)>>,
    pages: Vec<(IndexPage, Vec<String>)>,
    page_failures: Mutex<Vec<Fail>>,
    pub imported: Mutex<Vec<Vec<String>>>,
    pub deleted: Mutex<Vec<Vec<String>>>,
}

impl ScriptedRuleApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail chunk call number `call` once.
    pub fn fail_call(self, call: usize, fail: Fail) -> Self {
        self.failures.lock().expect("lock").insert(call, fail);
        self
    }

    /// Cancel `control` right after the `n`-th successful chunk call.
    pub fn cancel_after(self, n: usize, control: &RunControl) -> Self {
        *self.cancel_after.lock().expect("lock") = Some((n, control.clone()));
        self
    }

    /// Serve a route index made of `pages`, each a list of route ids.
    pub fn with_index(mut self, pages: &[&[&str]]) -> Self {
        self.pages = pages
            .iter()
            .enumerate()
            .map(|(i, ids)| {
                (
                    IndexPage {
                        file_name: format!("routes-{i}.json"),
                        file_size: None,
                    },
                    ids.iter().map(ToString::to_string).collect(),
                )
            })
            .collect();
        self
    }

    /// Fail the next index listing once.
    pub fn fail_index_once(self, fail: Fail) -> Self {
        self.page_failures.lock().expect("lock").push(fail);
        self
    }

    pub fn chunk_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn imported_paths(&self) -> Vec<Vec<String>> {
        self.imported.lock().expect("lock").clone()
    }

    pub fn deleted_paths(&self) -> Vec<Vec<String>> {
        self.deleted.lock().expect("lock").clone()
    }

    fn chunk_call(&self, sink: &Mutex<Vec<Vec<String>>>, paths: Vec<String>) -> Result<(), TransferError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(fail) = self.failures.lock().expect("lock").remove(&call) {
            return Err(fail.error(call));
        }
        sink.lock().expect("lock").push(paths);
        let successes =
            self.imported.lock().expect("lock").len() + self.deleted.lock().expect("lock").len();
        if let Some((n, control)) = &*self.cancel_after.lock().expect("lock") {
            if successes == *n {
                control.cancel();
            }
        }
        Ok(())
    }
}

impl RuleApi for ScriptedRuleApi {
    async fn import_chunk(&self, records: &[RedirectRecord]) -> Result<(), TransferError> {
        let paths = records.iter().map(|r| r.from.clone()).collect();
        self.chunk_call(&self.imported, paths)
    }

    async fn delete_chunk(&self, paths: &[String]) -> Result<(), TransferError> {
        self.chunk_call(&self.deleted, paths.to_vec())
    }

    async fn list_index_pages(&self) -> Result<Vec<IndexPage>, TransferError> {
        if let Some(fail) = self.page_failures.lock().expect("lock").pop() {
            return Err(fail.error(0));
        }
        Ok(self.pages.iter().map(|(p, _)| p.clone()).collect())
    }

    async fn list_index_page(&self, page: &IndexPage) -> Result<Vec<String>, TransferError> {
        Ok(self
            .pages
            .iter()
            .find(|(p, _)| p == page)
            .map(|(_, ids)| ids.clone())
            .unwrap_or_default())
    }
}

// ── Mock: checkpoint store ───────────────────────────────────────────────────

/// In-memory checkpoint store that remembers every saved count.
#[derive(Default)]
pub struct MemoryCheckpointStore {
    book: Mutex<CheckpointBook>,
    pub saves: Mutex<Vec<usize>>,
    fail_saves: AtomicBool,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(kind: OperationKind, identity: &WorkIdentity, completed: usize) -> Self {
        let store = Self::new();
        store.save(kind, identity, completed).expect("seed");
        store.saves.lock().expect("lock").clear();
        store
    }

    pub fn fail_saves(&self) {
        self.fail_saves.store(true, Ordering::SeqCst);
    }

    pub fn completed(&self, kind: OperationKind, identity: &WorkIdentity) -> Option<usize> {
        self.load(kind, &identity.fingerprint)
            .map(|r| r.completed_chunks)
    }

    pub fn save_history(&self) -> Vec<usize> {
        self.saves.lock().expect("lock").clone()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn load(&self, kind: OperationKind, fingerprint: &str) -> Option<CheckpointRecord> {
        self.book.lock().expect("lock").get(kind, fingerprint).cloned()
    }

    fn save(
        &self,
        kind: OperationKind,
        identity: &WorkIdentity,
        completed_chunks: usize,
    ) -> Result<(), TransferError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(TransferError::Checkpoint("disk full".into()));
        }
        self.book
            .lock()
            .expect("lock")
            .upsert(kind, identity, completed_chunks, chrono::Utc::now());
        self.saves.lock().expect("lock").push(completed_chunks);
        Ok(())
    }

    fn clear(&self, kind: OperationKind, fingerprint: &str) -> Result<(), TransferError> {
        self.book.lock().expect("lock").remove(kind, fingerprint);
        Ok(())
    }

    fn pending(&self) -> Vec<CheckpointRecord> {
        self.book.lock().expect("lock").records().cloned().collect()
    }
}

// ── Mock: progress and reporter ──────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingProgress {
    pub starts: Mutex<Vec<(usize, usize)>>,
    pub advances: AtomicUsize,
    pub finished: AtomicBool,
    pub abandoned: AtomicBool,
}

impl TransferProgress for RecordingProgress {
    fn start(&self, _label: &str, total: usize, completed: usize) {
        self.starts.lock().expect("lock").push((total, completed));
    }

    fn advance(&self) {
        self.advances.fetch_add(1, Ordering::SeqCst);
    }

    fn finish(&self, _message: &str) {
        self.finished.store(true, Ordering::SeqCst);
    }

    fn abandon(&self, _message: &str) {
        self.abandoned.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct RecordingReporter {
    pub steps: Mutex<Vec<String>>,
    pub successes: Mutex<Vec<String>>,
    pub warnings: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn steps(&self) -> Vec<String> {
        self.steps.lock().expect("lock").clone()
    }

    pub fn successes(&self) -> Vec<String> {
        self.successes.lock().expect("lock").clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().expect("lock").clone()
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.steps.lock().expect("lock").push(message.to_owned());
    }

    fn success(&self, message: &str) {
        self.successes.lock().expect("lock").push(message.to_owned());
    }

    fn warn(&self, message: &str) {
        self.warnings.lock().expect("lock").push(message.to_owned());
    }
}

//! Transfer executor: resume offsets, checkpoint bookkeeping, interruption.

#![allow(clippy::expect_used)]

use std::sync::atomic::Ordering;

use routectl::application::ports::{CheckpointStore, RuleApi, RunControl};
use routectl::application::services::transfer::{
    ExecutorTarget, TransferOutcome, execute_chunks, transfer,
};
use routectl::domain::{OperationKind, TransferError, split};

use crate::mocks::{
    Fail, MemoryCheckpointStore, RecordingProgress, RecordingReporter, ScriptedRuleApi, context,
    identity, policy, records,
};

#[tokio::test]
async fn test_interrupt_after_two_chunks_then_resume_sends_only_the_rest() {
    let store = MemoryCheckpointStore::new();
    let progress = RecordingProgress::default();
    let reporter = RecordingReporter::default();
    let ctx = context(&store, &progress, &reporter, policy(0));
    let id = identity();
    let chunks = split(records(250), 100);
    assert_eq!(
        chunks.iter().map(|c| c.len()).collect::<Vec<_>>(),
        vec![100, 100, 50]
    );

    let control = RunControl::new();
    let first = ScriptedRuleApi::new().cancel_after(2, &control);
    let err = transfer(&ctx, OperationKind::Import, &id, &chunks, &control, |c| {
        first.import_chunk(&c.records)
    })
    .await
    .expect_err("run should stop");
    assert!(matches!(err, TransferError::Interrupted { completed: 2 }));
    assert_eq!(store.completed(OperationKind::Import, &id), Some(2));
    assert_eq!(first.imported_paths().len(), 2);
    assert!(progress.abandoned.load(Ordering::SeqCst));

    let control = RunControl::new();
    let second = ScriptedRuleApi::new();
    let outcome = transfer(&ctx, OperationKind::Import, &id, &chunks, &control, |c| {
        second.import_chunk(&c.records)
    })
    .await
    .expect("resumed run completes");
    assert_eq!(
        outcome,
        TransferOutcome {
            total_chunks: 3,
            resumed_from: 2
        }
    );
    let sent = second.imported_paths();
    assert_eq!(sent.len(), 1, "only the last chunk is resent");
    assert_eq!(sent[0].len(), 50);
    assert_eq!(sent[0][0], "/r200");
    assert_eq!(store.completed(OperationKind::Import, &id), None);
}

#[tokio::test]
async fn test_resumed_run_reaches_the_same_remote_state_as_an_uncut_run() {
    let id = identity();
    let chunks = split(records(45), 10);

    let uncut_store = MemoryCheckpointStore::new();
    let progress = RecordingProgress::default();
    let reporter = RecordingReporter::default();
    let uncut = ScriptedRuleApi::new();
    transfer(
        &context(&uncut_store, &progress, &reporter, policy(0)),
        OperationKind::Import,
        &id,
        &chunks,
        &RunControl::new(),
        |c| uncut.import_chunk(&c.records),
    )
    .await
    .expect("uncut run");

    let store = MemoryCheckpointStore::new();
    let ctx = context(&store, &progress, &reporter, policy(0));
    let control = RunControl::new();
    let cut = ScriptedRuleApi::new().cancel_after(3, &control);
    let _ = transfer(&ctx, OperationKind::Import, &id, &chunks, &control, |c| {
        cut.import_chunk(&c.records)
    })
    .await;
    let resumed = ScriptedRuleApi::new();
    transfer(&ctx, OperationKind::Import, &id, &chunks, &RunControl::new(), |c| {
        resumed.import_chunk(&c.records)
    })
    .await
    .expect("resumed run");

    let mut combined = cut.imported_paths();
    combined.extend(resumed.imported_paths());
    assert_eq!(combined, uncut.imported_paths());
}

#[tokio::test]
async fn test_permanent_failure_keeps_confirmed_count() {
    let store = MemoryCheckpointStore::new();
    let progress = RecordingProgress::default();
    let reporter = RecordingReporter::default();
    let ctx = context(&store, &progress, &reporter, policy(5));
    let id = identity();
    let chunks = split(records(30), 10);
    let api = ScriptedRuleApi::new().fail_call(1, Fail::Permanent);

    let err = transfer(&ctx, OperationKind::Import, &id, &chunks, &RunControl::new(), |c| {
        api.import_chunk(&c.records)
    })
    .await
    .expect_err("rejected");

    assert!(matches!(err, TransferError::RemotePermanent(_)));
    assert_eq!(api.chunk_calls(), 2, "no retry after a permanent failure");
    assert_eq!(store.completed(OperationKind::Import, &id), Some(1));
    assert!(reporter.warnings().is_empty());
}

#[tokio::test]
async fn test_empty_input_completes_without_remote_calls() {
    let store = MemoryCheckpointStore::new();
    let progress = RecordingProgress::default();
    let reporter = RecordingReporter::default();
    let ctx = context(&store, &progress, &reporter, policy(0));
    let id = identity();
    let chunks = split(Vec::<String>::new(), 10);
    let api = ScriptedRuleApi::new();

    let outcome = transfer(&ctx, OperationKind::Delete, &id, &chunks, &RunControl::new(), |c| {
        api.delete_chunk(&c.records)
    })
    .await
    .expect("empty run completes");

    assert_eq!(outcome.total_chunks, 0);
    assert_eq!(api.chunk_calls(), 0);
    assert!(store.pending().is_empty());
    assert!(progress.finished.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_checkpoint_past_end_is_treated_as_complete() {
    let id = identity();
    let store = MemoryCheckpointStore::seeded(OperationKind::Import, &id, 7);
    let progress = RecordingProgress::default();
    let reporter = RecordingReporter::default();
    let ctx = context(&store, &progress, &reporter, policy(0));
    let chunks = split(records(25), 10);
    let api = ScriptedRuleApi::new();

    let outcome = transfer(&ctx, OperationKind::Import, &id, &chunks, &RunControl::new(), |c| {
        api.import_chunk(&c.records)
    })
    .await
    .expect("nothing left to send");

    assert_eq!(outcome.resumed_from, 3);
    assert_eq!(api.chunk_calls(), 0);
    assert_eq!(store.completed(OperationKind::Import, &id), None);
}

#[tokio::test]
async fn test_checkpoint_write_failure_aborts_without_retry() {
    let store = MemoryCheckpointStore::new();
    store.fail_saves();
    let progress = RecordingProgress::default();
    let reporter = RecordingReporter::default();
    let ctx = context(&store, &progress, &reporter, policy(5));
    let id = identity();
    let chunks = split(records(30), 10);
    let api = ScriptedRuleApi::new();

    let err = transfer(&ctx, OperationKind::Import, &id, &chunks, &RunControl::new(), |c| {
        api.import_chunk(&c.records)
    })
    .await
    .expect_err("cannot persist");

    assert!(matches!(err, TransferError::Checkpoint(_)));
    assert_eq!(api.chunk_calls(), 1);
}

#[tokio::test]
async fn test_execute_chunks_persists_after_every_confirmed_chunk() {
    let store = MemoryCheckpointStore::new();
    let progress = RecordingProgress::default();
    let id = identity();
    let target = ExecutorTarget {
        kind: OperationKind::Delete,
        identity: &id,
        store: &store,
    };
    let chunks = split((0..40).map(|i| format!("/p{i}")).collect(), 10);
    let control = RunControl::new();
    let api = ScriptedRuleApi::new();
    execute_chunks(&target, &progress, &control, &chunks, 1, &|c| {
        api.delete_chunk(&c.records)
    })
    .await
    .expect("all chunks confirmed");

    assert_eq!(store.save_history(), vec![2, 3, 4]);
    assert_eq!(control.confirmed(), 4);
    assert_eq!(progress.advances.load(Ordering::SeqCst), 3);
    assert_eq!(api.deleted_paths()[0][0], "/p10");
}

#[tokio::test]
async fn test_cancel_before_start_sends_nothing() {
    let store = MemoryCheckpointStore::new();
    let progress = RecordingProgress::default();
    let reporter = RecordingReporter::default();
    let ctx = context(&store, &progress, &reporter, policy(3));
    let id = identity();
    let chunks = split(records(5), 10);
    let control = RunControl::new();
    control.cancel();
    let api = ScriptedRuleApi::new();

    let err = transfer(&ctx, OperationKind::Import, &id, &chunks, &control, |c| {
        api.import_chunk(&c.records)
    })
    .await
    .expect_err("cancelled");

    assert!(matches!(err, TransferError::Interrupted { completed: 0 }));
    assert_eq!(api.chunk_calls(), 0);
    assert_eq!(store.completed(OperationKind::Import, &id), Some(0));
}

#[tokio::test]
async fn test_finished_run_ignores_late_forced_save() {
    let store = MemoryCheckpointStore::new();
    let progress = RecordingProgress::default();
    let reporter = RecordingReporter::default();
    let ctx = context(&store, &progress, &reporter, policy(0));
    let id = identity();
    let chunks = split(records(3), 10);
    let control = RunControl::new();
    let api = ScriptedRuleApi::new();

    transfer(&ctx, OperationKind::Import, &id, &chunks, &control, |c| {
        api.import_chunk(&c.records)
    })
    .await
    .expect("complete");

    let mut called = false;
    control.while_active(|_| called = true);
    assert!(!called, "a completed run must not be re-checkpointed");
}

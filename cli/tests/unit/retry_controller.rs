//! Retry controller: bounded whole-run retries that resume from the checkpoint.
//!
//! Time is paused so the fixed retry delay elapses instantly.

#![allow(clippy::expect_used)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use routectl::application::ports::{RuleApi, RunControl};
use routectl::application::services::retry::supervise;
use routectl::application::services::transfer::transfer;
use routectl::domain::{OperationKind, TransferError, split};

use crate::mocks::{
    Fail, MemoryCheckpointStore, RecordingProgress, RecordingReporter, ScriptedRuleApi, context,
    identity, policy, records,
};

#[tokio::test(start_paused = true)]
async fn test_transient_failure_resumes_without_resending_confirmed_chunks() {
    let store = MemoryCheckpointStore::new();
    let progress = RecordingProgress::default();
    let reporter = RecordingReporter::default();
    let ctx = context(&store, &progress, &reporter, policy(2));
    let id = identity();
    let chunks = split(records(30), 10);
    // Call 0 is chunk 0, call 1 is the first try of chunk 1.
    let api = ScriptedRuleApi::new().fail_call(1, Fail::Transient);

    transfer(&ctx, OperationKind::Import, &id, &chunks, &RunControl::new(), |c| {
        api.import_chunk(&c.records)
    })
    .await
    .expect("second attempt completes");

    let sent = api.imported_paths();
    assert_eq!(sent.len(), 3);
    assert_eq!(
        sent.iter().filter(|chunk| chunk[0] == "/r0").count(),
        1,
        "chunk 0 is never resent"
    );
    assert_eq!(api.chunk_calls(), 4);
    assert_eq!(*progress.starts.lock().expect("lock"), vec![(3, 0), (3, 1)]);

    let warnings = reporter.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("Retrying in 5s (1/2)"), "{}", warnings[0]);
    assert_eq!(store.completed(OperationKind::Import, &id), None);
}

#[tokio::test(start_paused = true)]
async fn test_each_retry_resumes_from_the_previous_attempts_checkpoint() {
    let store = MemoryCheckpointStore::new();
    let progress = RecordingProgress::default();
    let reporter = RecordingReporter::default();
    let ctx = context(&store, &progress, &reporter, policy(2));
    let id = identity();
    let chunks = split(records(30), 10);
    // Attempt 1: call 0 confirms chunk 0, call 1 times out on chunk 1.
    // Attempt 2: call 2 confirms chunk 1, call 3 times out on chunk 2.
    // Attempt 3: call 4 confirms chunk 2.
    let api = ScriptedRuleApi::new()
        .fail_call(1, Fail::Transient)
        .fail_call(3, Fail::Transient);

    let outcome = transfer(&ctx, OperationKind::Import, &id, &chunks, &RunControl::new(), |c| {
        api.import_chunk(&c.records)
    })
    .await
    .expect("third attempt completes");

    assert_eq!(outcome.total_chunks, 3);
    assert_eq!(
        *progress.starts.lock().expect("lock"),
        vec![(3, 0), (3, 1), (3, 2)]
    );
    let firsts: Vec<String> = api
        .imported_paths()
        .iter()
        .map(|chunk| chunk[0].clone())
        .collect();
    assert_eq!(firsts, vec!["/r0", "/r10", "/r20"], "no chunk is sent twice");
    assert_eq!(api.chunk_calls(), 5);
    assert_eq!(store.save_history(), vec![1, 1, 2, 2, 3]);
    assert_eq!(store.completed(OperationKind::Import, &id), None);

    let warnings = reporter.warnings();
    assert_eq!(warnings.len(), 2);
    assert!(warnings[1].contains("(2/2)"), "{}", warnings[1]);
}

#[tokio::test(start_paused = true)]
async fn test_retries_exhausted_surfaces_last_error() {
    let store = MemoryCheckpointStore::new();
    let progress = RecordingProgress::default();
    let reporter = RecordingReporter::default();
    let ctx = context(&store, &progress, &reporter, policy(2));
    let id = identity();
    let chunks = split(records(20), 10);
    let api = ScriptedRuleApi::new()
        .fail_call(0, Fail::Transient)
        .fail_call(1, Fail::Transient)
        .fail_call(2, Fail::Transient);

    let err = transfer(&ctx, OperationKind::Import, &id, &chunks, &RunControl::new(), |c| {
        api.import_chunk(&c.records)
    })
    .await
    .expect_err("out of retries");

    assert!(matches!(err, TransferError::RemoteTransient(_)));
    assert_eq!(api.chunk_calls(), 3, "one attempt plus two retries");
    assert_eq!(store.completed(OperationKind::Import, &id), Some(0));
    assert_eq!(reporter.warnings().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_retry_waits_the_configured_delay() {
    let control = RunControl::new();
    let reporter = RecordingReporter::default();
    let attempts = AtomicU32::new(0);
    let started = tokio::time::Instant::now();

    let value = supervise(&policy(3), &control, &reporter, |n| {
        attempts.fetch_add(1, Ordering::SeqCst);
        async move {
            if n < 2 {
                Err(TransferError::RemoteTransient("timeout".into()))
            } else {
                Ok(n)
            }
        }
    })
    .await
    .expect("third attempt succeeds");

    assert_eq!(value, 2);
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert!(started.elapsed() >= Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_retry_wait_stops_the_run() {
    let store = MemoryCheckpointStore::new();
    let progress = RecordingProgress::default();
    let reporter = RecordingReporter::default();
    let ctx = context(&store, &progress, &reporter, policy(5));
    let id = identity();
    let chunks = split(records(20), 10);
    let api = ScriptedRuleApi::new().fail_call(1, Fail::Transient);
    let control = RunControl::new();

    let run = transfer(&ctx, OperationKind::Import, &id, &chunks, &control, |c| {
        api.import_chunk(&c.records)
    });
    let interrupt = async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        control.cancel();
    };
    let (result, ()) = tokio::join!(run, interrupt);

    let err = result.expect_err("cancelled while waiting");
    assert!(matches!(err, TransferError::Interrupted { completed: 1 }));
    assert_eq!(api.chunk_calls(), 2, "no attempt after the cancellation");
    assert_eq!(store.completed(OperationKind::Import, &id), Some(1));
}

#[tokio::test]
async fn test_input_errors_are_never_retried() {
    let control = RunControl::new();
    let reporter = RecordingReporter::default();
    let attempts = AtomicU32::new(0);

    let err = supervise(&policy(10), &control, &reporter, |_| {
        attempts.fetch_add(1, Ordering::SeqCst);
        async {
            Err::<(), _>(TransferError::Input(
                routectl::domain::InputError::MissingField {
                    line: 2,
                    field: "from".into(),
                },
            ))
        }
    })
    .await
    .expect_err("input error");

    assert!(matches!(err, TransferError::Input(_)));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert!(reporter.warnings().is_empty());
}

//! Application service: resumable chunked transfer.
//!
//! [`execute_chunks`] sends chunks one at a time from a resume offset and
//! checkpoints after each confirmed chunk. [`transfer`] wraps it in the retry
//! controller and clears the checkpoint once every chunk is confirmed.
//!
//! Imports only from `crate::domain` and `crate::application`.

use std::future::Future;

use crate::application::ports::{CheckpointStore, ProgressReporter, RunControl, TransferProgress};
use crate::application::services::retry::{RetryPolicy, supervise};
use crate::domain::{Chunk, OperationKind, TransferError, WorkIdentity};

/// Result of a completed transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOutcome {
    /// Chunks in the input.
    pub total_chunks: usize,
    /// Chunks skipped because an earlier run had confirmed them.
    pub resumed_from: usize,
}

/// Collaborators shared by every transfer in one command.
pub struct TransferContext<'a, S, P, R> {
    pub store: &'a S,
    pub progress: &'a P,
    pub reporter: &'a R,
    pub policy: RetryPolicy,
}

/// Where a single executor pass writes its checkpoints.
pub struct ExecutorTarget<'a, S> {
    pub kind: OperationKind,
    pub identity: &'a WorkIdentity,
    pub store: &'a S,
}

impl<S: CheckpointStore> ExecutorTarget<'_, S> {
    fn persist(&self, completed: usize) -> Result<(), TransferError> {
        self.store.save(self.kind, self.identity, completed)
    }
}

/// Send `chunks[resume_from..]` in order, one at a time.
///
/// After each confirmed chunk the checkpoint is advanced to `index + 1`
/// before the next chunk is sent. On the first failure, or when `control`
/// is cancelled between chunks, the checkpoint is left at the last
/// confirmed chunk and the error is returned.
///
/// # Errors
///
/// Returns the failing chunk's error, [`TransferError::Interrupted`] on
/// cancellation, or [`TransferError::Checkpoint`] if progress cannot be saved.
pub async fn execute_chunks<'c, T, S, P, F, Fut>(
    target: &ExecutorTarget<'_, S>,
    progress: &P,
    control: &RunControl,
    chunks: &'c [Chunk<T>],
    resume_from: usize,
    send: &F,
) -> Result<(), TransferError>
where
    S: CheckpointStore,
    P: TransferProgress,
    F: Fn(&'c Chunk<T>) -> Fut,
    Fut: Future<Output = Result<(), TransferError>>,
{
    let mut completed = resume_from.min(chunks.len());
    control.record(completed);

    for chunk in &chunks[completed..] {
        if control.is_cancelled() {
            target.persist(completed)?;
            return Err(TransferError::Interrupted { completed });
        }

        if let Err(err) = send(chunk).await {
            tracing::debug!(chunk = chunk.index, error = %err, "chunk failed");
            if let Err(save_err) = target.persist(completed) {
                tracing::warn!(error = %save_err, "cannot record progress after failure");
            }
            return Err(err);
        }

        completed = chunk.index + 1;
        target.persist(completed)?;
        control.record(completed);
        progress.advance();
        tracing::debug!(chunk = chunk.index, records = chunk.len(), completed, "chunk confirmed");
    }
    Ok(())
}

/// Transfer `chunks` for `identity`, resuming and retrying as needed.
///
/// Every attempt reloads the checkpoint, so a retry after a transient failure
/// resumes at the first unconfirmed chunk. When all chunks are confirmed the
/// run is marked finished on `control` and its checkpoint is removed.
///
/// # Errors
///
/// Returns the error that aborted the run. The checkpoint then holds exactly
/// the number of confirmed chunks.
pub async fn transfer<'c, T, S, P, R, F, Fut>(
    ctx: &TransferContext<'_, S, P, R>,
    kind: OperationKind,
    identity: &WorkIdentity,
    chunks: &'c [Chunk<T>],
    control: &RunControl,
    send: F,
) -> Result<TransferOutcome, TransferError>
where
    S: CheckpointStore,
    P: TransferProgress,
    R: ProgressReporter,
    F: Fn(&'c Chunk<T>) -> Fut,
    Fut: Future<Output = Result<(), TransferError>>,
{
    let target = ExecutorTarget {
        kind,
        identity,
        store: ctx.store,
    };
    let label = match kind {
        OperationKind::Import => "Importing redirects",
        OperationKind::Delete => "Deleting redirects",
    };
    let send = &send;
    let target = &target;
    let mut first_resume = None;

    let result = supervise(&ctx.policy, control, ctx.reporter, |attempt| {
        let resume_from = ctx
            .store
            .load(kind, &identity.fingerprint)
            .map_or(0, |rec| rec.completed_chunks);
        first_resume.get_or_insert(resume_from);
        if resume_from > chunks.len() {
            tracing::warn!(
                resume_from,
                total = chunks.len(),
                "checkpoint is past the end of the input; treating as complete"
            );
        }
        tracing::info!(
            operation = %kind,
            fingerprint = %identity.fingerprint,
            attempt,
            resume_from,
            total = chunks.len(),
            "starting transfer"
        );
        ctx.progress.start(label, chunks.len(), resume_from.min(chunks.len()));
        execute_chunks(target, ctx.progress, control, chunks, resume_from, send)
    })
    .await;

    match result {
        Ok(()) => {
            control.finish();
            if let Err(err) = ctx.store.clear(kind, &identity.fingerprint) {
                tracing::warn!(error = %err, "transfer finished but its checkpoint could not be removed");
                ctx.reporter.warn(&format!("could not remove finished checkpoint: {err}"));
            }
            ctx.progress.finish(&format!("{label}: done"));
            tracing::info!(operation = %kind, total = chunks.len(), "transfer complete");
            Ok(TransferOutcome {
                total_chunks: chunks.len(),
                resumed_from: first_resume.unwrap_or(0).min(chunks.len()),
            })
        }
        Err(err) => {
            let completed = control.confirmed();
            ctx.progress
                .abandon(&format!("{label}: stopped after {completed} of {} chunks", chunks.len()));
            Err(err)
        }
    }
}

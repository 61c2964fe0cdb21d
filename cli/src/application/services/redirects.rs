//! Application service: redirect import, delete and reset use-cases.
//!
//! Imports only from `crate::domain` and `crate::application`.
//! All I/O is routed through injected port traits.

use std::path::{Path, PathBuf};

use crate::application::ports::{
    CheckpointStore, ProgressReporter, RecordFiles, RuleApi, RunControl, TransferProgress,
};
use crate::application::services::retry::supervise;
use crate::application::services::transfer::{TransferContext, TransferOutcome, transfer};
use crate::domain::{
    MAX_CHUNK_SIZE, OperationKind, RawTable, RedirectRecord, TransferError, WorkIdentity, split,
    validate_delete, validate_import,
};

/// A validated input file, ready to transfer.
#[derive(Debug, Clone)]
pub struct Prepared<T> {
    pub identity: WorkIdentity,
    pub records: Vec<T>,
}

/// Who the transfer is for.
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    pub account: &'a str,
    pub workspace: &'a str,
}

fn load_rows(
    files: &impl RecordFiles,
    path: &Path,
    target: Target<'_>,
) -> Result<(WorkIdentity, RawTable), TransferError> {
    let bytes = files.read(path)?;
    let identity = WorkIdentity::new(target.account, target.workspace, &bytes);
    let table = files.parse(&bytes)?;
    tracing::debug!(
        path = %path.display(),
        fingerprint = %identity.fingerprint,
        rows = table.rows.len(),
        "input loaded"
    );
    Ok((identity, table))
}

/// Read and validate an import file.
///
/// # Errors
///
/// Returns [`TransferError::Input`] if the file is unreadable or any row is malformed.
pub fn prepare_import(
    files: &impl RecordFiles,
    path: &Path,
    target: Target<'_>,
) -> Result<Prepared<RedirectRecord>, TransferError> {
    let (identity, table) = load_rows(files, path, target)?;
    let records = validate_import(&table)?;
    Ok(Prepared { identity, records })
}

/// Read and validate a delete file.
///
/// # Errors
///
/// Returns [`TransferError::Input`] if the file is unreadable or any row lacks `from`.
pub fn prepare_delete(
    files: &impl RecordFiles,
    path: &Path,
    target: Target<'_>,
) -> Result<Prepared<String>, TransferError> {
    let (identity, table) = load_rows(files, path, target)?;
    let records = validate_delete(&table)?;
    Ok(Prepared { identity, records })
}

/// Import validated redirects in fixed-size chunks.
///
/// # Errors
///
/// Returns the error that aborted the transfer.
pub async fn import_redirects<S, P, R>(
    api: &impl RuleApi,
    ctx: &TransferContext<'_, S, P, R>,
    prepared: Prepared<RedirectRecord>,
    control: &RunControl,
) -> Result<TransferOutcome, TransferError>
where
    S: CheckpointStore,
    P: TransferProgress,
    R: ProgressReporter,
{
    let Prepared { identity, records } = prepared;
    let chunks = split(records, MAX_CHUNK_SIZE);
    transfer(ctx, OperationKind::Import, &identity, &chunks, control, move |chunk| {
        api.import_chunk(&chunk.records)
    })
    .await
}

/// Delete redirects by source path in fixed-size chunks.
///
/// # Errors
///
/// Returns the error that aborted the transfer.
pub async fn delete_redirects<S, P, R>(
    api: &impl RuleApi,
    ctx: &TransferContext<'_, S, P, R>,
    prepared: Prepared<String>,
    control: &RunControl,
) -> Result<TransferOutcome, TransferError>
where
    S: CheckpointStore,
    P: TransferProgress,
    R: ProgressReporter,
{
    let Prepared { identity, records } = prepared;
    let chunks = split(records, MAX_CHUNK_SIZE);
    transfer(ctx, OperationKind::Delete, &identity, &chunks, control, move |chunk| {
        api.delete_chunk(&chunk.records)
    })
    .await
}

/// Enumerate every route id in the remote index, page by page.
///
/// # Errors
///
/// Returns the error that aborted the enumeration after retries.
pub async fn list_remote_routes<S, P, R>(
    api: &impl RuleApi,
    ctx: &TransferContext<'_, S, P, R>,
    control: &RunControl,
) -> Result<Vec<String>, TransferError>
where
    R: ProgressReporter,
{
    ctx.reporter.step("Reading remote route index");
    let ids = supervise(&ctx.policy, control, ctx.reporter, move |_| async move {
        let pages = api.list_index_pages().await?;
        let mut ids = Vec::new();
        for page in &pages {
            if control.is_cancelled() {
                return Err(TransferError::Interrupted { completed: 0 });
            }
            let mut page_ids = api.list_index_page(page).await?;
            tracing::debug!(page = %page.file_name, routes = page_ids.len(), "index page listed");
            ids.append(&mut page_ids);
        }
        Ok(ids)
    })
    .await?;
    ctx.reporter.success(&format!("Found {} remote redirect(s)", ids.len()));
    Ok(ids)
}

/// Name of the intermediate delete list written by a reset.
#[must_use]
pub fn reset_file_name(now_millis: i64) -> String {
    format!(".routectl_redirects_to_delete_{now_millis}.csv")
}

/// Location of the reset delete list inside `dir`.
///
/// Pass an absolute `dir` so the path printed in resume hints works from
/// any directory.
#[must_use]
pub fn reset_list_path(dir: &Path, now_millis: i64) -> PathBuf {
    dir.join(reset_file_name(now_millis))
}

//! `routectl redirects`: bulk import, delete and pending-transfer listing.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Subcommand};

use crate::app::{AppContext, ResolvedTarget};
use crate::application::ports::{CheckpointStore, ProgressReporter, RecordFiles, RunControl};
use crate::application::services::redirects::{
    Prepared, Target, delete_redirects, import_redirects, list_remote_routes, prepare_delete,
    prepare_import, reset_list_path,
};
use crate::application::services::retry::RetryPolicy;
use crate::application::services::transfer::{TransferContext, TransferOutcome};
use crate::domain::reset::routes_to_delete;
use crate::domain::{CheckpointRecord, OperationKind, TransferError, WorkIdentity};
use crate::infra::checkpoint::JsonCheckpointStore;
use crate::infra::csv_files::CsvRecordFiles;
use crate::infra::interrupt::InterruptGuard;
use crate::infra::rewriter::GraphqlRuleClient;
use crate::output::progress::ChunkProgress;
use crate::output::{OutputContext, TerminalReporter};

/// Redirects subcommands.
#[derive(Subcommand)]
pub enum RedirectsCommand {
    /// Import redirects from a `;`-delimited file (columns: from;to;type[;endDate])
    Import(ImportArgs),
    /// Delete the redirects whose `from` paths are listed in a `;`-delimited file
    Delete(DeleteArgs),
    /// List unfinished transfers that can be resumed
    Pending,
}

/// Arguments for `redirects import`.
#[derive(Args)]
pub struct ImportArgs {
    /// Redirects file
    pub file: PathBuf,
    /// After importing, delete every remote redirect not present in the file
    #[arg(long)]
    pub reset: bool,
}

/// Arguments for `redirects delete`.
#[derive(Args)]
pub struct DeleteArgs {
    /// File with a `from` column
    pub file: PathBuf,
}

/// Run the redirects command.
///
/// # Errors
///
/// Returns an error if the input is invalid, the target or endpoint is not
/// configured, or the transfer fails after retries.
pub async fn run(app: &AppContext, cmd: RedirectsCommand) -> Result<ExitCode> {
    match cmd {
        RedirectsCommand::Import(args) => import(app, &args).await,
        RedirectsCommand::Delete(args) => delete(app, &args.file).await,
        RedirectsCommand::Pending => pending(app),
    }
}

fn announce_stop() {
    eprintln!("\nStopping after the current batch... press Ctrl+C again to quit now.");
}

/// Per-invocation collaborators shared by the import, reset and delete phases.
struct Session<'a> {
    app: &'a AppContext,
    target: ResolvedTarget,
    store: JsonCheckpointStore,
    files: CsvRecordFiles,
    reporter: TerminalReporter<'a>,
    policy: RetryPolicy,
}

impl<'a> Session<'a> {
    fn open(app: &'a AppContext) -> Result<Self> {
        Ok(Self {
            app,
            target: app.target()?,
            store: JsonCheckpointStore::new()?,
            files: CsvRecordFiles,
            reporter: TerminalReporter::new(&app.output),
            policy: RetryPolicy::from(&app.config.transfer),
        })
    }

    fn input_target(&self) -> Target<'_> {
        Target {
            account: &self.target.account,
            workspace: &self.target.workspace,
        }
    }

    fn client(&self) -> Result<GraphqlRuleClient> {
        let endpoint = self
            .app
            .config
            .endpoint_for(&self.target.account, &self.target.workspace)?;
        tracing::debug!(%endpoint, "using rule API endpoint");
        GraphqlRuleClient::new(endpoint)
    }

    /// Arm Ctrl+C handling for one transfer. A forced exit saves `identity`'s
    /// confirmed count.
    fn arm(
        &self,
        control: &RunControl,
        kind: OperationKind,
        identity: &WorkIdentity,
    ) -> InterruptGuard {
        let store = self.store.clone();
        let identity = identity.clone();
        InterruptGuard::arm(control.clone(), announce_stop, move |completed| {
            if let Err(e) = store.save(kind, &identity, completed) {
                eprintln!("Error: {e}");
            }
        })
    }

    fn resume_command(&self, kind: OperationKind, file: &Path) -> String {
        format!(
            "routectl --account {} --workspace {} redirects {kind} {}",
            self.target.account,
            self.target.workspace,
            file.display()
        )
    }

    /// Turn a transfer result into an exit code, printing the outcome.
    fn conclude(
        &self,
        kind: OperationKind,
        file: &Path,
        records: usize,
        result: Result<TransferOutcome, TransferError>,
    ) -> Result<Option<TransferOutcome>> {
        let out = &self.app.output;
        match result {
            Ok(outcome) => {
                let verb = match kind {
                    OperationKind::Import => "Imported",
                    OperationKind::Delete => "Deleted",
                };
                let mut msg = format!(
                    "{verb} {records} redirect(s) in {} batch(es)",
                    outcome.total_chunks
                );
                if outcome.resumed_from > 0 {
                    msg.push_str(&format!(
                        " (resumed after batch {})",
                        outcome.resumed_from
                    ));
                }
                out.success(&msg);
                Ok(Some(outcome))
            }
            Err(TransferError::Interrupted { completed }) => {
                out.warn(&format!(
                    "Interrupted after {completed} confirmed batch(es). Progress saved."
                ));
                out.info(&format!("Resume with: {}", self.resume_command(kind, file)));
                Ok(None)
            }
            Err(err @ TransferError::Input(_)) => Err(err.into()),
            Err(err) => {
                out.info(&format!(
                    "Fix the cause and resume with: {}",
                    self.resume_command(kind, file)
                ));
                Err(err).with_context(|| format!("{kind} of {} failed", file.display()))
            }
        }
    }
}

async fn import(app: &AppContext, args: &ImportArgs) -> Result<ExitCode> {
    let session = Session::open(app)?;
    let prepared = prepare_import(&session.files, &args.file, session.input_target())?;
    if prepared.records.is_empty() && !args.reset {
        app.output
            .info(&format!("No redirects in {}; nothing to import", args.file.display()));
        return Ok(ExitCode::SUCCESS);
    }

    let api = session.client()?;
    let bar = ChunkProgress::new(&app.output);
    let ctx = TransferContext {
        store: &session.store,
        progress: &bar,
        reporter: &session.reporter,
        policy: session.policy,
    };

    let remote = if args.reset {
        let control = RunControl::new();
        let _guard = InterruptGuard::arm(control.clone(), announce_stop, |_| {});
        match list_remote_routes(&api, &ctx, &control).await {
            Ok(ids) => Some(ids),
            Err(err) => {
                if err.is_interrupted() {
                    app.output.warn("Interrupted before the import started; nothing was sent.");
                    return Ok(ExitCode::SUCCESS);
                }
                return Err(err).context("cannot read the remote route index");
            }
        }
    } else {
        None
    };

    let imported: Vec<String> = prepared.records.iter().map(|r| r.from.clone()).collect();
    let records = prepared.records.len();
    let control = RunControl::new();
    let guard = session.arm(&control, OperationKind::Import, &prepared.identity);
    let result = import_redirects(&api, &ctx, prepared, &control).await;
    drop(guard);
    if session
        .conclude(OperationKind::Import, &args.file, records, result)?
        .is_none()
    {
        return Ok(ExitCode::SUCCESS);
    }

    match remote {
        Some(remote) => reset(&session, &api, &ctx, &remote, &imported).await,
        None => Ok(ExitCode::SUCCESS),
    }
}

/// Delete every remote redirect the import did not mention.
async fn reset(
    session: &Session<'_>,
    api: &GraphqlRuleClient,
    ctx: &TransferContext<'_, JsonCheckpointStore, ChunkProgress, TerminalReporter<'_>>,
    remote: &[String],
    imported: &[String],
) -> Result<ExitCode> {
    let out = &session.app.output;
    let stale = routes_to_delete(remote, imported);
    if stale.is_empty() {
        out.success("Remote redirects already match the file; nothing to reset");
        return Ok(ExitCode::SUCCESS);
    }
    if !session.app.confirm(
        &format!("Delete {} remote redirect(s) that are not in the file?", stale.len()),
        true,
    )? {
        out.info("Reset skipped; no redirects deleted");
        return Ok(ExitCode::SUCCESS);
    }

    let cwd = std::env::current_dir().context("cannot resolve the working directory")?;
    let path = reset_list_path(&cwd, Utc::now().timestamp_millis());
    session
        .files
        .write_delete_list(&path, &stale)
        .context("cannot write the reset delete list")?;
    tracing::info!(path = %path.display(), routes = stale.len(), "reset delete list written");

    ctx.reporter.step(&format!(
        "Deleting {} stale redirect(s) listed in {}",
        stale.len(),
        path.display()
    ));
    let prepared = prepare_delete(&session.files, &path, session.input_target())?;
    match run_delete(session, api, ctx, &path, prepared).await {
        Ok(Some(_)) => {
            session.files.remove(&path)?;
            Ok(ExitCode::SUCCESS)
        }
        Ok(None) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            out.info(&format!("Delete list kept at {}", path.display()));
            Err(e)
        }
    }
}

async fn delete(app: &AppContext, file: &Path) -> Result<ExitCode> {
    let session = Session::open(app)?;
    let prepared = prepare_delete(&session.files, file, session.input_target())?;
    if prepared.records.is_empty() {
        app.output
            .info(&format!("No redirects in {}; nothing to delete", file.display()));
        return Ok(ExitCode::SUCCESS);
    }

    let api = session.client()?;
    let bar = ChunkProgress::new(&app.output);
    let ctx = TransferContext {
        store: &session.store,
        progress: &bar,
        reporter: &session.reporter,
        policy: session.policy,
    };
    run_delete(&session, &api, &ctx, file, prepared).await?;
    Ok(ExitCode::SUCCESS)
}

async fn run_delete(
    session: &Session<'_>,
    api: &GraphqlRuleClient,
    ctx: &TransferContext<'_, JsonCheckpointStore, ChunkProgress, TerminalReporter<'_>>,
    file: &Path,
    prepared: Prepared<String>,
) -> Result<Option<TransferOutcome>> {
    let records = prepared.records.len();
    let control = RunControl::new();
    let guard = session.arm(&control, OperationKind::Delete, &prepared.identity);
    let result = delete_redirects(api, ctx, prepared, &control).await;
    drop(guard);
    session.conclude(OperationKind::Delete, file, records, result)
}

fn pending(app: &AppContext) -> Result<ExitCode> {
    let store = JsonCheckpointStore::new()?;
    let records = store.pending();
    if records.is_empty() {
        app.output.info("No unfinished transfers");
        return Ok(ExitCode::SUCCESS);
    }
    print_pending(&app.output, &records);
    Ok(ExitCode::SUCCESS)
}

fn print_pending(out: &OutputContext, records: &[CheckpointRecord]) {
    out.header(&format!("Unfinished transfers ({})", records.len()));
    for rec in records {
        let short = rec
            .identity
            .fingerprint
            .get(..12)
            .unwrap_or(&rec.identity.fingerprint);
        out.kv(
            &format!("{:<6}", rec.operation.as_str()),
            &format!(
                "{}/{}  {short}  {} batch(es) confirmed  updated {}",
                rec.identity.account,
                rec.identity.workspace,
                rec.completed_chunks,
                rec.updated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            ),
        );
    }
}

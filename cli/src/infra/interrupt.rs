//! Ctrl+C handling for a running transfer.
//!
//! The first interrupt cancels the run cooperatively: the executor stops
//! before its next chunk and records what it has confirmed. A second
//! interrupt while a chunk is still in flight saves the confirmed count
//! immediately and exits with status 130.

use tokio::task::JoinHandle;

use crate::application::ports::RunControl;

/// Exit status used when a second interrupt forces the process down.
pub const FORCED_EXIT_CODE: i32 = 130;

/// Listens for Ctrl+C for as long as it is alive.
///
/// Dropping the guard stops listening.
pub struct InterruptGuard {
    task: JoinHandle<()>,
}

impl InterruptGuard {
    /// Start listening. `on_cancel` runs on the first interrupt. `on_force`
    /// receives the confirmed chunk count on a second interrupt and must
    /// persist it synchronously.
    #[must_use]
    pub fn arm<C, F>(control: RunControl, on_cancel: C, on_force: F) -> Self
    where
        C: FnOnce() + Send + 'static,
        F: FnOnce(usize) + Send + 'static,
    {
        let task = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            tracing::info!(
                confirmed = control.confirmed(),
                "interrupt received; stopping after the current chunk"
            );
            control.cancel();
            on_cancel();

            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            control.while_active(|completed| {
                tracing::warn!(completed, "second interrupt; saving progress and exiting");
                on_force(completed);
                std::process::exit(FORCED_EXIT_CODE);
            });
        });
        Self { task }
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        self.task.abort();
    }
}

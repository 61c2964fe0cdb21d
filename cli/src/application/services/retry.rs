//! Retry controller: bounded whole-run retries with a fixed delay.
//!
//! Each retry re-runs the entire attempt. Attempts resume from the latest
//! checkpoint, so a retry only resends what was never confirmed.

use std::future::Future;
use std::time::Duration;

use crate::application::ports::{ProgressReporter, RunControl};
use crate::domain::{TransferConfig, TransferError};

/// How often and how patiently to re-run a failed transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Re-attempts allowed after the first attempt fails.
    pub max_retries: u32,
    /// Fixed wait before each re-attempt.
    pub retry_delay: Duration,
}

impl From<&TransferConfig> for RetryPolicy {
    fn from(cfg: &TransferConfig) -> Self {
        Self {
            max_retries: cfg.max_retries,
            retry_delay: Duration::from_secs(cfg.retry_interval_secs),
        }
    }
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait `retry_delay`, then attempt again.
    Retry,
    /// Stop and surface the error.
    Abort,
}

impl RetryPolicy {
    /// Decide the next state after `error`, given how many retries were already used.
    #[must_use]
    pub fn decide(&self, error: &TransferError, retries_used: u32) -> RetryDecision {
        if error.is_interrupted() || error.is_permanent() || retries_used >= self.max_retries {
            RetryDecision::Abort
        } else {
            RetryDecision::Retry
        }
    }
}

/// Run `attempt` until it succeeds, fails permanently, or retries run out.
///
/// `attempt` receives the zero-based attempt number. A cancellation during
/// the wait between attempts ends the run as [`TransferError::Interrupted`]
/// with the last confirmed chunk count.
///
/// # Errors
///
/// Returns the last attempt's error when the run is aborted.
pub async fn supervise<T, F, Fut>(
    policy: &RetryPolicy,
    control: &RunControl,
    reporter: &impl ProgressReporter,
    mut attempt: F,
) -> Result<T, TransferError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, TransferError>>,
{
    let mut retries_used = 0;
    loop {
        let err = match attempt(retries_used).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        match policy.decide(&err, retries_used) {
            RetryDecision::Abort => {
                if !err.is_interrupted() {
                    tracing::error!(attempts = retries_used + 1, error = %err, "giving up");
                }
                return Err(err);
            }
            RetryDecision::Retry => {
                retries_used += 1;
                tracing::warn!(
                    retry = retries_used,
                    max_retries = policy.max_retries,
                    error = %err,
                    "attempt failed"
                );
                reporter.warn(&format!(
                    "{err}. Retrying in {}s ({retries_used}/{})... Press Ctrl+C to abort",
                    policy.retry_delay.as_secs(),
                    policy.max_retries
                ));
                tokio::select! {
                    () = tokio::time::sleep(policy.retry_delay) => {}
                    () = control.cancelled() => {
                        return Err(TransferError::Interrupted {
                            completed: control.confirmed(),
                        });
                    }
                }
            }
        }
    }
}

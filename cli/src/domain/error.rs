//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Input errors ──────────────────────────────────────────────────────────────

/// The input file could not be read or did not match the declared record shape.
///
/// Any input error rejects the whole file before a single remote call is made.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("cannot read {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("line {line}: {reason}")]
    Malformed { line: u64, reason: String },

    #[error("line {line}: missing required field '{field}'")]
    MissingField { line: u64, field: String },

    #[error("line {line}: unexpected column '{column}'")]
    UnexpectedColumn { line: u64, column: String },

    #[error("line {line}: invalid type '{value}' (expected one of: {valid})")]
    InvalidType {
        line: u64,
        value: String,
        valid: String,
    },
}

// ── Transfer errors ───────────────────────────────────────────────────────────

/// Outcome of a failed bulk transfer run.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("invalid input: {0}")]
    Input(#[from] InputError),

    /// The remote service rejected the request; retrying will not help.
    #[error("remote rejected the request: {0}")]
    RemotePermanent(String),

    /// Network, timeout, or unclassified remote failure.
    #[error("remote call failed: {0}")]
    RemoteTransient(String),

    #[error("cannot persist transfer progress: {0}")]
    Checkpoint(String),

    /// Cancelled by the user after `completed` chunks were confirmed.
    #[error("interrupted after {completed} confirmed chunk(s)")]
    Interrupted { completed: usize },
}

impl TransferError {
    /// Errors that must abort the run immediately, bypassing any remaining retries.
    ///
    /// Anything not positively identified as permanent is retried.
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::Input(_) | Self::RemotePermanent(_) | Self::Checkpoint(_)
        )
    }

    /// Whether this is a user cancellation rather than a failure.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted { .. })
    }
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration key/value validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Invalid value for {key}: {value}\n\nExpected: {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: String,
    },

    #[error("No {0} selected. Pass --{0} or run: routectl config set {0} <name>")]
    MissingTarget(&'static str),

    #[error("No API endpoint configured. Run: routectl config set endpoint <url>")]
    MissingEndpoint,
}

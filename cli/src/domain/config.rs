//! Domain types and validators for routectl configuration.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

pub const VALID_CONFIG_KEYS: &[&str] = &[
    "account",
    "workspace",
    "endpoint",
    "transfer.max_retries",
    "transfer.retry_interval_secs",
];

pub const DEFAULT_MAX_RETRIES: u32 = 10;
pub const DEFAULT_RETRY_INTERVAL_SECS: u64 = 5;

/// Account and workspace names: lowercase alphanumerics and inner hyphens.
pub static TARGET_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?$").expect("valid regex")
});

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.routectl/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RoutectlConfig {
    /// Default account, overridden by `--account`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    /// Default workspace, overridden by `--workspace`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
    /// Rule API URL. `{account}` and `{workspace}` are substituted per call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Bulk transfer retry settings.
    pub transfer: TransferConfig,
}

/// Retry settings for bulk redirect transfers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TransferConfig {
    /// Re-attempts after the first failed run.
    pub max_retries: u32,
    /// Fixed wait between attempts, in seconds.
    pub retry_interval_secs: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_interval_secs: DEFAULT_RETRY_INTERVAL_SECS,
        }
    }
}

impl RoutectlConfig {
    /// Set `key` to `value` after validating both.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value is invalid for it.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        validate_config_key(key)?;
        validate_config_value(key, value)?;
        match key {
            "account" => self.account = Some(value.to_owned()),
            "workspace" => self.workspace = Some(value.to_owned()),
            "endpoint" => self.endpoint = Some(value.to_owned()),
            "transfer.max_retries" => self.transfer.max_retries = value.parse()?,
            "transfer.retry_interval_secs" => self.transfer.retry_interval_secs = value.parse()?,
            _ => anyhow::bail!("Unknown setting: {key}"),
        }
        Ok(())
    }

    /// Resolve the endpoint template for a target.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEndpoint`] if no endpoint is configured.
    pub fn endpoint_for(&self, account: &str, workspace: &str) -> Result<String> {
        let template = self.endpoint.as_deref().ok_or(ConfigError::MissingEndpoint)?;
        Ok(template
            .replace("{account}", account)
            .replace("{workspace}", workspace))
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns an error if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<()> {
    if !VALID_CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
            valid: VALID_CONFIG_KEYS.join(", "),
        }
        .into());
    }
    Ok(())
}

/// Validates a configuration value for the given key.
///
/// # Errors
///
/// Returns an error if the value is not valid for the key.
pub fn validate_config_value(key: &str, value: &str) -> Result<()> {
    let expected = match key {
        "account" | "workspace" if !TARGET_NAME_RE.is_match(value) => {
            "lowercase letters, digits and inner hyphens"
        }
        "endpoint" if !(value.starts_with("https://") || value.starts_with("http://")) => {
            "an http:// or https:// URL"
        }
        "transfer.max_retries" if value.parse::<u32>().is_err() => "a non-negative integer",
        "transfer.retry_interval_secs" if value.parse::<u64>().is_err() => {
            "a non-negative number of seconds"
        }
        _ => return Ok(()),
    };
    Err(ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected: expected.to_string(),
    }
    .into())
}

/// Validates an account or workspace name.
///
/// # Errors
///
/// Returns an error if `name` is not a valid target name.
pub fn validate_target_name(field: &str, name: &str) -> Result<()> {
    validate_config_value(field, name)
}

// ── Unit tests ───────────────────────────────────────────────────────────────

//! `routectl config`: show and set configuration values.

use anyhow::Result;
use std::process::ExitCode;

use crate::app::AppContext;
use crate::application::ports::ConfigStore;
use crate::application::services::config_service;

use clap::Subcommand;

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Set configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
}

/// Run the config command.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or written, or the
/// key or value is invalid.
pub fn run(app: &AppContext, cmd: ConfigCommand) -> Result<ExitCode> {
    match cmd {
        ConfigCommand::Show => show_config(app),
        ConfigCommand::Set { key, value } => set_config(app, &key, &value),
    }
}

fn show_config(app: &AppContext) -> Result<ExitCode> {
    let config = config_service::load_config(&app.config_store)?;
    let path = app.config_store.path()?;
    let unset = "(not set)";

    app.output.header(&format!("Configuration ({})", path.display()));
    app.output
        .kv("account", config.account.as_deref().unwrap_or(unset));
    app.output
        .kv("workspace", config.workspace.as_deref().unwrap_or(unset));
    app.output
        .kv("endpoint", config.endpoint.as_deref().unwrap_or(unset));
    app.output.kv(
        "transfer.max_retries",
        &config.transfer.max_retries.to_string(),
    );
    app.output.kv(
        "transfer.retry_interval_secs",
        &config.transfer.retry_interval_secs.to_string(),
    );
    Ok(ExitCode::SUCCESS)
}

fn set_config(app: &AppContext, key: &str, value: &str) -> Result<ExitCode> {
    config_service::set_value(&app.config_store, key, value)?;
    app.output.success(&format!("Set {key} = {value}"));
    Ok(ExitCode::SUCCESS)
}

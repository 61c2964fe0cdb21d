//! Application context: unified state passed to every command handler.
//!
//! Built once in `Cli::run()` from the global flags and the config file.

use anyhow::Result;

use crate::application::ports::ConfigStore as _;
use crate::domain::config::{RoutectlConfig, validate_target_name};
use crate::domain::error::ConfigError;
use crate::infra::config::YamlConfigStore;
use crate::output::OutputContext;

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

/// Account/workspace overrides from the command line.
#[derive(Default)]
pub struct TargetFlags {
    pub account: Option<String>,
    pub workspace: Option<String>,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Output rendering options.
    pub output: OutputFlags,
    /// Target selection.
    pub target: TargetFlags,
    /// Skip interactive prompts (also set by `CI` / `ROUTECTL_YES` env vars).
    pub yes: bool,
}

/// The account and workspace a command operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub account: String,
    pub workspace: String,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Configuration file store.
    pub config_store: YamlConfigStore,
    /// Configuration loaded at startup.
    pub config: RoutectlConfig,
    /// When `true`, skip interactive prompts and use defaults.
    pub non_interactive: bool,
    target: TargetFlags,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn new(flags: AppFlags) -> Result<Self> {
        let ci_env = std::env::var("CI").is_ok() || std::env::var("ROUTECTL_YES").is_ok();
        let config_store = YamlConfigStore::new();
        let config = config_store.load()?;

        Ok(Self {
            output: OutputContext::new(flags.output.no_color, flags.output.quiet),
            config_store,
            config,
            non_interactive: flags.yes || ci_env,
            target: flags.target,
        })
    }

    /// Resolve account and workspace: command-line flags first, then config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingTarget`] if either is unset, or a
    /// validation error if a name is malformed.
    pub fn target(&self) -> Result<ResolvedTarget> {
        let account = self
            .target
            .account
            .clone()
            .or_else(|| self.config.account.clone())
            .ok_or(ConfigError::MissingTarget("account"))?;
        let workspace = self
            .target
            .workspace
            .clone()
            .or_else(|| self.config.workspace.clone())
            .ok_or(ConfigError::MissingTarget("workspace"))?;
        validate_target_name("account", &account)?;
        validate_target_name("workspace", &workspace)?;
        Ok(ResolvedTarget { account, workspace })
    }

    /// Ask the user for confirmation.
    ///
    /// When `non_interactive` is `true` (CI, `--yes` flag, or `ROUTECTL_YES`
    /// env), returns `default` immediately without prompting.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails (e.g. no TTY available).
    pub fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.non_interactive {
            return Ok(default);
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?;
        Ok(confirmed)
    }
}

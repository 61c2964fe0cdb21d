//! CLI argument parsing with clap derive

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags, OutputFlags, TargetFlags};
use crate::commands;

/// Bulk redirect import and delete with resumable, checkpointed transfers
#[derive(Parser)]
#[command(
    name = "routectl",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Show debug logs on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Skip confirmation prompts
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Account to operate on (overrides config)
    #[arg(long, global = true, env = "ROUTECTL_ACCOUNT")]
    pub account: Option<String>,

    /// Workspace to operate on (overrides config)
    #[arg(long, global = true, env = "ROUTECTL_WORKSPACE")]
    pub workspace: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Import, delete and resume bulk redirect transfers
    #[command(subcommand)]
    Redirects(commands::redirects::RedirectsCommand),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            quiet,
            no_color,
            verbose,
            yes,
            account,
            workspace,
            command,
        } = self;
        crate::logging::init(verbose);

        let flags = AppFlags {
            output: OutputFlags { no_color, quiet },
            target: TargetFlags { account, workspace },
            yes,
        };
        match command {
            Command::Redirects(cmd) => {
                let app = AppContext::new(flags)?;
                commands::redirects::run(&app, cmd).await
            }
            Command::Config(cmd) => {
                let app = AppContext::new(flags)?;
                commands::config::run(&app, cmd)
            }
            Command::Version => {
                commands::version::run();
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

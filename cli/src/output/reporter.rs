//! `TerminalReporter`: Presentation-layer implementation of `ProgressReporter`.
//!
//! Lets application services announce steps, successes and retry warnings
//! without depending on any presentation type directly.

use owo_colors::OwoColorize as _;

use crate::application::ports::ProgressReporter;
use crate::output::OutputContext;

/// Terminal progress reporter that wraps an `OutputContext`.
///
/// Steps and successes go to stdout and are hidden by `--quiet`. Warnings
/// go to stderr and are always shown, since a retry wait must stay visible.
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
}

impl<'a> TerminalReporter<'a> {
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        if !self.ctx.quiet {
            println!("  {} {message}", "→".style(self.ctx.styles.step));
        }
    }

    fn success(&self, message: &str) {
        self.ctx.success(message);
    }

    fn warn(&self, message: &str) {
        eprintln!("  {} {message}", "!".style(self.ctx.styles.warning));
    }
}

//! Chunk progress bar using indicatif

#![allow(clippy::expect_used)] // Templates are compile-time constants

use indicatif::{ProgressBar, ProgressStyle};

use crate::application::ports::TransferProgress;
use crate::output::OutputContext;

/// Chunk-level progress bar for one transfer. Hidden when stdout is not a
/// terminal or output is quiet.
pub struct ChunkProgress {
    pb: ProgressBar,
}

impl ChunkProgress {
    #[must_use]
    pub fn new(ctx: &OutputContext) -> Self {
        let pb = if ctx.show_progress() {
            ProgressBar::new(0)
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {msg}\n    {bar:40.cyan/dim} {pos}/{len} batches  {elapsed}")
                .expect("valid template")
                .progress_chars("━━─"),
        );
        Self { pb }
    }
}

impl TransferProgress for ChunkProgress {
    fn start(&self, label: &str, total: usize, completed: usize) {
        self.pb.set_length(total as u64);
        self.pb.set_position(completed as u64);
        self.pb.set_message(label.to_string());
    }

    fn advance(&self) {
        self.pb.inc(1);
    }

    fn finish(&self, message: &str) {
        self.pb.finish_with_message(format!("✓ {message}"));
    }

    fn abandon(&self, message: &str) {
        self.pb.abandon_with_message(format!("✗ {message}"));
    }
}

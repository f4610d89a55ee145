//! Progress indicator utilities for long-running operations.
//!
//! Bars are drawn only when stderr is an interactive terminal, so piped
//! output and test runs stay clean.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{IsTerminal, stderr};

/// Batches smaller than this finish too fast for a bar to be useful.
pub const PROGRESS_THRESHOLD: u64 = 100;

/// Check if we should show progress indicators.
#[must_use]
pub fn should_show_progress() -> bool {
    stderr().is_terminal()
}

/// Create a determinate progress bar for operations with known total count.
///
/// # Panics
/// Panics if the progress bar template string is invalid.
#[must_use]
pub fn create_progress_bar(total: u64, message: &str, show: bool) -> ProgressBar {
    let pb = ProgressBar::new(total);

    if show {
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .expect("valid template")
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
    } else {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }

    pb
}

/// Progress bar wrapper that tracks whether we're showing output.
pub struct ProgressTracker {
    bar: ProgressBar,
    showing: bool,
}

impl ProgressTracker {
    /// Create a tracker that draws only on a terminal and for batches of at
    /// least [`PROGRESS_THRESHOLD`] items.
    #[must_use]
    pub fn new(total: u64, message: &str) -> Self {
        let showing = total >= PROGRESS_THRESHOLD && should_show_progress();
        Self {
            bar: create_progress_bar(total, message, showing),
            showing,
        }
    }

    /// A tracker that never draws.
    #[must_use]
    pub fn hidden(total: u64) -> Self {
        Self {
            bar: create_progress_bar(total, "", false),
            showing: false,
        }
    }

    pub fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    pub fn set_message(&self, message: impl Into<String>) {
        self.bar.set_message(message.into());
    }

    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }

    #[must_use]
    pub const fn is_showing(&self) -> bool {
        self.showing
    }

    #[must_use]
    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

//! Shared utilities for `issuedb`.
//!
//! - Progress indicators (for long-running operations)

pub mod progress;

pub use progress::{ProgressTracker, create_progress_bar, should_show_progress};

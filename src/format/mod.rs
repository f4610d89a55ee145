//! Output formatting for `issuedb`.
//!
//! Supports human-readable text output and machine-parseable JSON.
//!
//! # Output Types
//!
//! - [`IssueDetails`] - Issue with its comments (show)
//! - [`AssigneeStats`] - One row of the top-assignees report
//! - [`ResolutionStats`] - Mean resolution time, overall and per priority
//! - [`Dashboard`] - Totals by status and priority plus recent issues

mod output;
mod text;

pub use output::{
    AssigneeStats, Dashboard, IssueDetails, PriorityCounts, PriorityHours, ResolutionStats,
    StatusCounts,
};
pub use text::{
    TextFormatOptions, format_history_entry, format_issue_line, format_issue_line_with,
    format_priority_badge, format_priority_label, format_status_icon,
    format_status_icon_colored, format_status_label, terminal_width, truncate_title,
};

//! Text formatting functions for `issuedb`.
//!
//! Provides terminal formatting for human output:
//! - Status icons (○ ◐ ● ✓)
//! - Priority badges
//! - Issue and history line formatting

use crate::model::{ChangeType, HistoryEntry, Issue, Priority, Status};
use crossterm::style::Stylize;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Status icon characters.
pub mod icons {
    /// Open issue (hollow circle).
    pub const OPEN: &str = "○";
    /// In progress (half-filled).
    pub const IN_PROGRESS: &str = "◐";
    /// Resolved, awaiting close (filled circle).
    pub const RESOLVED: &str = "●";
    /// Closed (checkmark).
    pub const CLOSED: &str = "✓";
}

/// Formatting options for text output.
#[derive(Debug, Clone, Copy)]
pub struct TextFormatOptions {
    pub use_color: bool,
    pub max_width: Option<usize>,
}

impl TextFormatOptions {
    #[must_use]
    pub const fn plain() -> Self {
        Self {
            use_color: false,
            max_width: None,
        }
    }
}

/// Return the icon character for a status.
#[must_use]
pub const fn format_status_icon(status: Status) -> &'static str {
    match status {
        Status::Open => icons::OPEN,
        Status::InProgress => icons::IN_PROGRESS,
        Status::Resolved => icons::RESOLVED,
        Status::Closed => icons::CLOSED,
    }
}

/// Format status label with optional color.
#[must_use]
pub fn format_status_label(status: Status, use_color: bool) -> String {
    let label = status.as_str();
    if !use_color {
        return label.to_string();
    }

    match status {
        Status::Open => label.green().to_string(),
        Status::InProgress => label.yellow().to_string(),
        Status::Resolved => label.blue().to_string(),
        Status::Closed => label.dark_grey().to_string(),
    }
}

/// Format status icon with optional color.
#[must_use]
pub fn format_status_icon_colored(status: Status, use_color: bool) -> String {
    let icon = format_status_icon(status);
    if !use_color {
        return icon.to_string();
    }

    match status {
        Status::Open => icon.green().to_string(),
        Status::InProgress => icon.yellow().to_string(),
        Status::Resolved => icon.blue().to_string(),
        Status::Closed => icon.dark_grey().to_string(),
    }
}

/// Format priority label with optional color.
#[must_use]
pub fn format_priority_label(priority: Priority, use_color: bool) -> String {
    let label = priority.as_str();
    if !use_color {
        return label.to_string();
    }

    match priority {
        Priority::Critical => label.red().bold().to_string(),
        Priority::High => label.red().to_string(),
        Priority::Medium => label.yellow().to_string(),
        Priority::Low => label.dark_grey().to_string(),
    }
}

/// Format priority badge with optional color.
#[must_use]
pub fn format_priority_badge(priority: Priority, use_color: bool) -> String {
    format!("[{}]", format_priority_label(priority, use_color))
}

/// Determine terminal width (falls back to `COLUMNS`, then 80).
#[must_use]
pub fn terminal_width() -> usize {
    if let Ok((columns, _)) = crossterm::terminal::size() {
        if columns > 0 {
            return usize::from(columns);
        }
    }
    if let Ok(columns) = std::env::var("COLUMNS") {
        if let Ok(value) = columns.trim().parse::<usize>() {
            if value > 0 {
                return value;
            }
        }
    }
    80
}

/// Truncate a title to fit within `max_len` visible columns.
///
/// Handles wide characters (emojis, CJK) correctly using `unicode-width`.
#[must_use]
pub fn truncate_title(title: &str, max_len: usize) -> String {
    if max_len == 0 {
        return String::new();
    }

    if UnicodeWidthStr::width(title) <= max_len {
        return title.to_string();
    }

    let (target_len, ellipsis) = if max_len <= 3 {
        (max_len, "")
    } else {
        (max_len - 3, "...")
    };

    let mut w = 0;
    let mut s = String::new();
    for c in title.chars() {
        let cw = UnicodeWidthChar::width(c).unwrap_or(0);
        if w + cw > target_len {
            break;
        }
        w += cw;
        s.push(c);
    }
    s.push_str(ellipsis);
    s
}

/// Format a single-line issue summary with options.
///
/// Format: `{icon} #{id} [{priority}] {title} (v{version})`
#[must_use]
pub fn format_issue_line_with(issue: &Issue, options: TextFormatOptions) -> String {
    let id = format!("#{}", issue.id);
    let version = format!("(v{})", issue.version);
    let priority_plain = format!("[{}]", issue.priority.as_str());

    let prefix_len = UnicodeWidthStr::width(format_status_icon(issue.status))
        + 1
        + id.len()
        + 1
        + priority_plain.len()
        + 1;
    let suffix_len = 1 + version.len();

    let title = options.max_width.map_or_else(
        || issue.title.clone(),
        |width| truncate_title(&issue.title, width.saturating_sub(prefix_len + suffix_len)),
    );

    let status_icon = format_status_icon_colored(issue.status, options.use_color);
    let priority_badge = format_priority_badge(issue.priority, options.use_color);
    let version = if options.use_color {
        version.dark_grey().to_string()
    } else {
        version
    };

    format!("{status_icon} {id} {priority_badge} {title} {version}")
}

/// Format a single-line issue summary.
#[must_use]
pub fn format_issue_line(issue: &Issue) -> String {
    format_issue_line_with(issue, TextFormatOptions::plain())
}

/// Describe one audit record in a sentence.
#[must_use]
pub fn format_history_entry(entry: &HistoryEntry) -> String {
    let when = entry.created_at.format("%Y-%m-%d %H:%M:%S");
    let actor = entry
        .actor_id
        .map_or_else(|| "unknown".to_string(), |id| format!("user {id}"));
    let old = entry.old_value.as_deref().unwrap_or("(none)");
    let new = entry.new_value.as_deref().unwrap_or("(none)");

    let what = match (entry.change_type, entry.field_name.as_deref()) {
        (ChangeType::Created | ChangeType::CommentAdded, _) | (_, None) => {
            format!("{}: {new}", entry.change_type)
        }
        (_, Some(field)) => format!("{} {field}: {old} -> {new}", entry.change_type),
    };

    format!("{when}  {actor}  {what}")
}

use crate::config;
use crate::error::Result;
use crate::format::{
    Dashboard, TextFormatOptions, format_issue_line_with, format_priority_label,
    format_status_label,
};
use crate::model::{Priority, Status};

use super::CommandContext;

/// Execute the dashboard command.
///
/// # Errors
///
/// Returns an error if authentication or a query fails.
pub fn execute(json: bool, cli: &config::CliOverrides) -> Result<()> {
    let ctx = CommandContext::open(json, cli)?;
    ctx.authenticate()?;

    let dashboard = ctx.storage.dashboard()?;
    if ctx.json {
        return super::print_json(&dashboard);
    }
    print!("{}", render_dashboard(&dashboard, ctx.text_options()));
    Ok(())
}

fn render_dashboard(dashboard: &Dashboard, options: TextFormatOptions) -> String {
    let mut out = format!("Total issues: {}\n\nBy status:\n", dashboard.total_issues);
    for status in Status::ALL {
        out.push_str(&format!(
            "  {:<12} {}\n",
            format_status_label(status, options.use_color),
            dashboard.by_status.get(status)
        ));
    }
    out.push_str("\nBy priority:\n");
    for priority in Priority::ALL {
        out.push_str(&format!(
            "  {:<12} {}\n",
            format_priority_label(priority, options.use_color),
            dashboard.by_priority.get(priority)
        ));
    }
    if !dashboard.recent_issues.is_empty() {
        out.push_str("\nRecent:\n");
        for issue in &dashboard.recent_issues {
            out.push_str(&format!("  {}\n", format_issue_line_with(issue, options)));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{NewIssue, SqliteStorage};

    #[test]
    fn test_render_dashboard_counts_every_bucket() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        storage.create_issue(&NewIssue::titled("One"), None).unwrap();
        let dashboard = storage.dashboard().unwrap();

        let text = render_dashboard(&dashboard, TextFormatOptions::plain());
        assert!(text.starts_with("Total issues: 1\n"));
        assert!(text.contains("  open         1\n"));
        assert!(text.contains("  closed       0\n"));
        assert!(text.contains("  critical     0\n"));
        assert!(text.contains("○ #1 [medium] One (v1)"));
    }
}

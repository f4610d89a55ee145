use crate::cli::ReportCommands;
use crate::config;
use crate::error::Result;
use crate::format::{AssigneeStats, ResolutionStats};
use crate::model::Priority;

use super::CommandContext;

/// Execute a report subcommand.
///
/// # Errors
///
/// Returns an error if authentication fails, the limit is out of range, or
/// the query fails.
pub fn execute(command: &ReportCommands, json: bool, cli: &config::CliOverrides) -> Result<()> {
    let ctx = CommandContext::open(json, cli)?;
    ctx.authenticate()?;

    match command {
        ReportCommands::TopAssignees { limit } => {
            let stats = ctx.storage.top_assignees(*limit)?;
            if ctx.json {
                return super::print_json(&stats);
            }
            print!("{}", render_top_assignees(&stats));
        }
        ReportCommands::ResolutionTime => {
            let stats = ctx.storage.resolution_stats()?;
            if ctx.json {
                return super::print_json(&stats);
            }
            print!("{}", render_resolution(&stats));
        }
    }
    Ok(())
}

fn render_top_assignees(stats: &[AssigneeStats]) -> String {
    if stats.is_empty() {
        return "No assigned issues.\n".to_string();
    }
    let mut out = format!(
        "{:<20} {:>6} {:>6} {:>12} {:>9} {:>7}\n",
        "assignee", "total", "open", "in_progress", "resolved", "closed"
    );
    for entry in stats {
        let counts = &entry.by_status;
        out.push_str(&format!(
            "{:<20} {:>6} {:>6} {:>12} {:>9} {:>7}\n",
            entry.assignee.username,
            entry.issue_count,
            counts.open,
            counts.in_progress,
            counts.resolved,
            counts.closed
        ));
    }
    out
}

fn render_resolution(stats: &ResolutionStats) -> String {
    let mut out = format!(
        "Resolved issues: {}\nAverage resolution: {:.2} h\n",
        stats.total_resolved, stats.average_resolution_hours
    );
    for priority in Priority::ALL {
        out.push_str(&format!(
            "  {:<9} {:.2} h\n",
            priority.as_str(),
            stats.by_priority.get(priority)
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::PriorityHours;

    #[test]
    fn test_render_resolution_lists_every_priority() {
        let stats = ResolutionStats {
            total_resolved: 2,
            average_resolution_hours: 1.5,
            by_priority: PriorityHours {
                high: 1.5,
                ..PriorityHours::default()
            },
        };
        let text = render_resolution(&stats);
        assert!(text.contains("Average resolution: 1.50 h"));
        assert!(text.contains("  low       0.00 h"));
        assert!(text.contains("  high      1.50 h"));
        assert!(text.contains("critical"));
    }

    #[test]
    fn test_render_top_assignees_empty() {
        assert_eq!(render_top_assignees(&[]), "No assigned issues.\n");
    }
}

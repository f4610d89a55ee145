use crate::config;
use crate::error::{IssueDbError, Result};
use crate::format::{
    IssueDetails, format_priority_label, format_status_icon_colored, format_status_label,
};
use crate::storage::SqliteStorage;

use super::CommandContext;

/// Execute the show command.
///
/// # Errors
///
/// Returns an error if authentication fails or the issue does not exist.
pub fn execute(id: i64, json: bool, cli: &config::CliOverrides) -> Result<()> {
    let ctx = CommandContext::open(json, cli)?;
    ctx.authenticate()?;

    let details = ctx
        .storage
        .get_issue_details(id)?
        .ok_or(IssueDbError::IssueNotFound { id })?;

    if ctx.json {
        return super::print_json(&details);
    }

    print!("{}", render_details(&ctx.storage, &details, ctx.text_options().use_color)?);
    Ok(())
}

fn user_name(storage: &SqliteStorage, id: Option<i64>) -> Result<String> {
    let Some(id) = id else {
        return Ok("(none)".to_string());
    };
    Ok(storage
        .get_user(id)?
        .map_or_else(|| format!("user {id}"), |user| user.username))
}

fn render_details(
    storage: &SqliteStorage,
    details: &IssueDetails,
    use_color: bool,
) -> Result<String> {
    let issue = &details.issue;
    let mut out = format!(
        "{} #{} {}\n",
        format_status_icon_colored(issue.status, use_color),
        issue.id,
        issue.title
    );
    out.push_str(&format!(
        "Status: {}  Priority: {}  Version: {}\n",
        format_status_label(issue.status, use_color),
        format_priority_label(issue.priority, use_color),
        issue.version
    ));
    out.push_str(&format!(
        "Creator: {}  Assignee: {}\n",
        user_name(storage, issue.creator_id)?,
        user_name(storage, issue.assignee_id)?
    ));
    out.push_str(&format!(
        "Created: {}  Updated: {}\n",
        issue.created_at.format("%Y-%m-%d %H:%M:%S"),
        issue.updated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    if let Some(resolved_at) = issue.resolved_at {
        out.push_str(&format!(
            "Resolved: {}\n",
            resolved_at.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    if !issue.labels.is_empty() {
        let names: Vec<&str> = issue.labels.iter().map(|l| l.name.as_str()).collect();
        out.push_str(&format!("Labels: {}\n", names.join(", ")));
    }
    if let Some(description) = &issue.description {
        out.push_str(&format!("\n{description}\n"));
    }

    if !details.comments.is_empty() {
        out.push_str(&format!("\nComments ({}):\n", details.comments.len()));
        for comment in &details.comments {
            out.push_str(&format!(
                "  [{}] {}: {}\n",
                comment.created_at.format("%Y-%m-%d %H:%M"),
                user_name(storage, comment.author_id)?,
                comment.body
            ));
        }
    }
    Ok(out)
}

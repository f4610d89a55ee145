use crate::cli::ListArgs;
use crate::config;
use crate::error::Result;
use crate::format::format_issue_line_with;
use crate::storage::ListFilters;
use tracing::debug;

use super::CommandContext;

/// Execute the list command.
///
/// # Errors
///
/// Returns an error if authentication fails, the page size is out of range,
/// or the query fails.
pub fn execute(args: &ListArgs, json: bool, cli: &config::CliOverrides) -> Result<()> {
    let ctx = CommandContext::open(json, cli)?;
    ctx.authenticate()?;

    let limit = match args.limit {
        Some(limit) => limit,
        None => config::list_limit_from_layer(&ctx.config)?,
    };
    let assignee_id = match args.assignee.as_deref() {
        Some(reference) => Some(ctx.storage.require_user(reference)?.id),
        None => None,
    };

    let filters = ListFilters {
        status: args.status.map(Into::into),
        priority: args.priority.map(Into::into),
        assignee_id,
        offset: args.offset,
        limit,
    };
    debug!(?filters, "Listing issues");
    let issues = ctx.storage.list_issues(&filters)?;

    if ctx.json {
        return super::print_json(&issues);
    }

    if issues.is_empty() {
        println!("No issues found.");
        return Ok(());
    }
    let options = ctx.text_options();
    for issue in &issues {
        let mut line = format_issue_line_with(issue, options);
        if !issue.labels.is_empty() {
            let names: Vec<&str> = issue.labels.iter().map(|l| l.name.as_str()).collect();
            line.push_str(&format!("  {{{}}}", names.join(", ")));
        }
        println!("{line}");
    }
    Ok(())
}

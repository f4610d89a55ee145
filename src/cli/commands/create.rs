use crate::cli::CreateArgs;
use crate::config;
use crate::error::Result;
use crate::format::format_issue_line_with;
use crate::model::Status;
use crate::storage::NewIssue;
use tracing::info;

use super::CommandContext;

/// Execute the create command.
///
/// # Errors
///
/// Returns an error if authentication or validation fails, the assignee or a
/// label does not exist, or the issue cannot be stored.
pub fn execute(args: &CreateArgs, json: bool, cli: &config::CliOverrides) -> Result<()> {
    let mut ctx = CommandContext::open(json, cli)?;
    let actor = ctx.authenticate()?;
    let default_priority = config::default_priority_from_layer(&ctx.config)?;

    let assignee_id = match args.assignee.as_deref() {
        Some(reference) => Some(ctx.storage.require_user(reference)?.id),
        None => None,
    };

    let new_issue = NewIssue {
        title: args.title.clone(),
        description: args.description.clone(),
        status: args.status.map_or(Status::Open, Into::into),
        priority: args.priority.map_or(default_priority, Into::into),
        assignee_id,
        label_ids: args.labels.clone(),
    };

    let issue = ctx.storage.create_issue(&new_issue, Some(actor.id))?;
    info!(id = issue.id, actor = actor.id, "Created issue");

    if ctx.json {
        super::print_json(&issue)?;
    } else {
        println!(
            "Created {}",
            format_issue_line_with(&issue, ctx.text_options())
        );
    }
    Ok(())
}

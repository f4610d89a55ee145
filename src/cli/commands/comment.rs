use crate::cli::CommentCommands;
use crate::config;
use crate::error::Result;
use crate::model::Comment;
use crate::storage::SqliteStorage;
use tracing::info;

use super::CommandContext;

/// Execute a comment subcommand.
///
/// # Errors
///
/// Returns an error if authentication fails, the issue does not exist, or the
/// body is blank.
pub fn execute(command: &CommentCommands, json: bool, cli: &config::CliOverrides) -> Result<()> {
    let mut ctx = CommandContext::open(json, cli)?;
    let actor = ctx.authenticate()?;

    match command {
        CommentCommands::Add { id, body } => {
            let comment = ctx.storage.add_comment(*id, Some(actor.id), body)?;
            info!(issue_id = id, comment_id = comment.id, "Added comment");
            if ctx.json {
                super::print_json(&comment)?;
            } else {
                println!("Added comment {} to #{id}", comment.id);
            }
        }
        CommentCommands::List { id } => {
            ctx.storage.require_issue(*id)?;
            let comments = ctx.storage.get_comments(*id)?;
            if ctx.json {
                return super::print_json(&comments);
            }
            if comments.is_empty() {
                println!("No comments on #{id}.");
            }
            for comment in &comments {
                println!("{}", format_comment(&ctx.storage, comment)?);
            }
        }
    }
    Ok(())
}

fn format_comment(storage: &SqliteStorage, comment: &Comment) -> Result<String> {
    let author = match comment.author_id {
        Some(id) => storage
            .get_user(id)?
            .map_or_else(|| format!("user {id}"), |user| user.username),
        None => "unknown".to_string(),
    };
    Ok(format!(
        "[{}] {author}: {}",
        comment.created_at.format("%Y-%m-%d %H:%M"),
        comment.body
    ))
}

//! Bulk status command implementation.
//!
//! Moves every listed issue to one status in a single transaction.

use crate::cli::BulkStatusArgs;
use crate::config;
use crate::error::Result;
use crate::model::Status;
use tracing::info;

use super::CommandContext;

/// Execute the bulk-status command.
///
/// # Errors
///
/// Returns an error if authentication fails or any id does not resolve, in
/// which case no issue is changed.
pub fn execute(args: &BulkStatusArgs, json: bool, cli: &config::CliOverrides) -> Result<()> {
    let mut ctx = CommandContext::open(json, cli)?;
    let actor = ctx.authenticate()?;

    let status = Status::from(args.status);
    let result = ctx
        .storage
        .bulk_update_status(&args.ids, status, Some(actor.id))?;
    info!(updated = result.updated, %status, "Bulk status update");

    if ctx.json {
        super::print_json(&result)?;
    } else {
        println!("Updated {} issue(s) to {}", result.updated, result.status);
    }
    Ok(())
}

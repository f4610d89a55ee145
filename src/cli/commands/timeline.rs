use crate::config;
use crate::error::Result;
use crate::format::format_history_entry;

use super::CommandContext;

/// Execute the timeline command.
///
/// # Errors
///
/// Returns an error if authentication fails or the issue does not exist.
pub fn execute(id: i64, json: bool, cli: &config::CliOverrides) -> Result<()> {
    let ctx = CommandContext::open(json, cli)?;
    ctx.authenticate()?;

    let entries = ctx.storage.timeline(id)?;
    if ctx.json {
        return super::print_json(&entries);
    }

    println!("History for #{id} ({} entries):", entries.len());
    for entry in &entries {
        println!("  {}", format_history_entry(entry));
    }
    Ok(())
}

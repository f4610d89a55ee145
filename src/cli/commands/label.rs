//! Label command implementation.
//!
//! Provides label management: create, list, seed, and set on an issue.

use crate::cli::LabelCommands;
use crate::config;
use crate::error::Result;
use crate::model::Label;
use crate::storage::{DEFAULT_LABEL_COLOR, NewLabel};
use serde::Serialize;
use tracing::info;

use super::CommandContext;

/// JSON output for `label set`.
#[derive(Serialize)]
struct LabelSetResult<'a> {
    issue_id: i64,
    labels: &'a [Label],
}

/// Execute a label subcommand.
///
/// # Errors
///
/// Returns an error if authentication fails, a label name is taken, or any
/// label id does not resolve.
pub fn execute(command: &LabelCommands, json: bool, cli: &config::CliOverrides) -> Result<()> {
    let mut ctx = CommandContext::open(json, cli)?;
    let actor = ctx.authenticate()?;

    match command {
        LabelCommands::Create { name, color } => {
            let label = ctx.storage.create_label(&NewLabel {
                name: name.clone(),
                color: color
                    .clone()
                    .unwrap_or_else(|| DEFAULT_LABEL_COLOR.to_string()),
            })?;
            if ctx.json {
                super::print_json(&label)?;
            } else {
                println!("Created label {} ({}) #{}", label.name, label.color, label.id);
            }
        }
        LabelCommands::List => {
            let labels = ctx.storage.list_labels()?;
            if ctx.json {
                return super::print_json(&labels);
            }
            if labels.is_empty() {
                println!("No labels. Run: idb label seed");
            }
            for label in &labels {
                println!("{:>4}  {:<16} {}", label.id, label.name, label.color);
            }
        }
        LabelCommands::Seed => {
            let created = ctx.storage.seed_labels()?;
            info!(created = created.len(), "Seeded standard labels");
            if ctx.json {
                return super::print_json(&created);
            }
            println!("Created {} standard label(s)", created.len());
        }
        LabelCommands::Set { id, label_ids } => {
            let labels = ctx.storage.replace_labels(*id, label_ids, Some(actor.id))?;
            if ctx.json {
                return super::print_json(&LabelSetResult {
                    issue_id: *id,
                    labels: &labels,
                });
            }
            if labels.is_empty() {
                println!("Cleared labels on #{id}");
            } else {
                let names: Vec<&str> = labels.iter().map(|l| l.name.as_str()).collect();
                println!("Labels on #{id}: {}", names.join(", "));
            }
        }
    }
    Ok(())
}

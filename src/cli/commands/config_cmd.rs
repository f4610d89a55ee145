//! Configuration management command.
//!
//! `list` and `get` read the merged layers; `set` writes runtime keys to the
//! database `config` table.

use crate::cli::ConfigCommands;
use crate::config::{self, CliOverrides, ConfigLayer, normalize_key, validate_runtime_value};
use crate::error::{IssueDbError, Result};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::info;

use super::CommandContext;

/// Execute a config subcommand.
///
/// # Errors
///
/// Returns a config error for unknown keys, startup keys on `set`, or values
/// the key cannot hold.
pub fn execute(command: &ConfigCommands, json: bool, cli: &CliOverrides) -> Result<()> {
    let mut ctx = CommandContext::open(json, cli)?;

    match command {
        ConfigCommands::List => {
            if ctx.json {
                return super::print_json(&as_map(&ctx.config));
            }
            for (key, value) in ctx.config.entries() {
                println!("{key} = {value}");
            }
        }
        ConfigCommands::Get { key } => {
            let key = normalize_key(key);
            let value = ctx
                .config
                .get(&key)
                .ok_or_else(|| IssueDbError::Config(format!("'{key}' is not set")))?;
            if ctx.json {
                return super::print_json(&json!({ "key": key, "value": value }));
            }
            println!("{value}");
        }
        ConfigCommands::Set { key, value } => {
            let key = normalize_key(key);
            let value = value.trim();
            validate_runtime_value(&key, value)?;
            ctx.storage.set_config(&key, value)?;
            info!(%key, %value, "Stored config value");

            // Higher layers may still shadow the stored value.
            let merged = config::load_config(&ctx.issuedb_dir, Some(&ctx.storage), cli)?;
            let effective = merged.get(&key).cloned();
            if ctx.json {
                return super::print_json(&json!({
                    "key": key,
                    "value": value,
                    "effective": effective,
                }));
            }
            println!("{key} = {value}");
            if effective.as_deref() != Some(value) {
                println!(
                    "note: overridden by a higher layer (effective: {})",
                    effective.unwrap_or_default()
                );
            }
        }
    }
    Ok(())
}

fn as_map(layer: &ConfigLayer) -> BTreeMap<&str, &str> {
    layer
        .entries()
        .into_iter()
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect()
}

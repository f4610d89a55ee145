//! Import command implementation.
//!
//! Reads a `.csv` file and reports per-row failures alongside the totals.

use crate::cli::ImportArgs;
use crate::config;
use crate::error::Result;
use crate::import::{ImportResult, import_csv_file};

use super::CommandContext;

/// Execute the import command.
///
/// # Errors
///
/// Returns an error if authentication fails, the file is not a readable CSV,
/// or the batch transaction fails. Row-level failures are reported in the
/// result instead.
pub fn execute(args: &ImportArgs, json: bool, cli: &config::CliOverrides) -> Result<()> {
    let mut ctx = CommandContext::open(json, cli)?;
    let actor = ctx.authenticate()?;

    let result = import_csv_file(&mut ctx.storage, &args.file, Some(actor.id))?;

    if ctx.json {
        super::print_json(&result)?;
    } else {
        print!("{}", render_result(&result));
    }
    Ok(())
}

fn render_result(result: &ImportResult) -> String {
    let mut out = format!(
        "Imported {} of {} row(s), {} failed\n",
        result.successful, result.total_rows, result.failed
    );
    for error in &result.errors {
        out.push_str(&format!("  row {}: {}\n", error.row, error.error));
    }
    if result.successful == 0 && result.total_rows > 0 {
        out.push_str("Nothing was imported.\n");
    }
    out
}

//! CSV import pipeline.
//!
//! Parsing and per-row validation live here; staging and the final
//! commit/rollback decision live in the storage layer
//! ([`SqliteStorage::import_rows`]).
//!
//! Expected columns: `title`, `description`, `status`, `priority`,
//! `assignee_email`. Unknown columns are ignored, missing ones count as
//! absent, and so do blank cells. Cells are kept as read so failed rows
//! report their raw data; [`CsvRow::field`] trims on access.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{IssueDbError, Result};
use crate::model::{Priority, Status};
use crate::storage::{ImportDraft, ImportRowOutcome, SqliteStorage};
use crate::util::ProgressTracker;
use crate::validation::MAX_TITLE_LEN;

/// Line number of the first data row; the header is line 1.
pub const FIRST_DATA_ROW: usize = 2;

/// One parsed data row, keyed by header name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    pub row: usize,
    pub data: BTreeMap<String, String>,
}

impl CsvRow {
    /// A trimmed, non-empty cell value.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.data
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }
}

/// A row that failed, with its raw data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RowError {
    pub row: usize,
    pub data: BTreeMap<String, String>,
    pub error: String,
}

/// Summary of one import batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ImportResult {
    pub total_rows: usize,
    pub successful: usize,
    pub failed: usize,
    pub errors: Vec<RowError>,
}

/// Reject anything not named `*.csv` before reading it.
///
/// # Errors
///
/// Returns `NotCsv` for any other file name.
pub fn check_csv_name(path: &Path) -> Result<()> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        Ok(())
    } else {
        Err(IssueDbError::NotCsv {
            path: path.to_path_buf(),
        })
    }
}

/// Parse CSV text with a header row into keyed rows numbered from 2.
///
/// # Errors
///
/// Returns a CSV error if the header or a record cannot be decoded.
pub fn parse_csv(input: &str) -> Result<Vec<CsvRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::Headers)
        .flexible(true)
        .from_reader(input.as_bytes());

    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();

    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let data = headers
            .iter()
            .zip(record.iter())
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        rows.push(CsvRow {
            row: index + FIRST_DATA_ROW,
            data,
        });
    }

    Ok(rows)
}

/// Validate one row independently of every other row.
///
/// Blank `status` and `priority` cells are treated as absent and take the
/// defaults (`open`, `medium`).
///
/// # Errors
///
/// Returns the row's error message.
pub fn validate_row(row: &CsvRow) -> std::result::Result<ImportDraft, String> {
    let title = row
        .field("title")
        .ok_or_else(|| "Title is required".to_string())?;
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(format!("Title exceeds {MAX_TITLE_LEN} characters"));
    }

    let status = match row.field("status") {
        Some(value) => value.parse::<Status>().map_err(|e| e.to_string())?,
        None => Status::Open,
    };
    let priority = match row.field("priority") {
        Some(value) => value.parse::<Priority>().map_err(|e| e.to_string())?,
        None => Priority::Medium,
    };

    Ok(ImportDraft {
        row: row.row,
        title: title.to_string(),
        description: row.field("description").map(str::to_string),
        status,
        priority,
        assignee_email: row.field("assignee_email").map(str::to_string),
    })
}

/// Import parsed rows as one batch.
///
/// # Errors
///
/// Returns an error only if the batch transaction fails as a whole.
pub fn import_rows(
    storage: &mut SqliteStorage,
    rows: &[CsvRow],
    actor_id: Option<i64>,
    progress: &ProgressTracker,
) -> Result<ImportResult> {
    let drafts = rows
        .iter()
        .map(|row| validate_row(row).map_err(|error| (row.row, error)));

    let outcomes = storage.import_rows(drafts, actor_id, |outcome| {
        progress.inc(1);
        if let ImportRowOutcome::Failed { row, error } = outcome {
            debug!(row, %error, "Import row rejected");
        }
    })?;
    progress.finish_and_clear();

    let by_row: BTreeMap<usize, &CsvRow> = rows.iter().map(|row| (row.row, row)).collect();
    let mut result = ImportResult {
        total_rows: rows.len(),
        ..ImportResult::default()
    };
    for outcome in outcomes {
        match outcome {
            ImportRowOutcome::Staged { .. } => result.successful += 1,
            ImportRowOutcome::Failed { row, error } => {
                result.failed += 1;
                result.errors.push(RowError {
                    row,
                    data: by_row.get(&row).map(|r| r.data.clone()).unwrap_or_default(),
                    error,
                });
            }
        }
    }

    info!(
        total = result.total_rows,
        successful = result.successful,
        failed = result.failed,
        "CSV import finished"
    );
    Ok(result)
}

/// Import CSV text that is already in memory.
///
/// # Errors
///
/// Returns a CSV error for undecodable input, or a database error.
pub fn import_csv_str(
    storage: &mut SqliteStorage,
    input: &str,
    actor_id: Option<i64>,
) -> Result<ImportResult> {
    let rows = parse_csv(input)?;
    let progress = ProgressTracker::hidden(rows.len() as u64);
    import_rows(storage, &rows, actor_id, &progress)
}

/// Import a `.csv` file, drawing a progress bar for large batches.
///
/// # Errors
///
/// Returns `NotCsv` for other file names (checked before reading), an I/O
/// error if the file cannot be read as UTF-8, a CSV error for undecodable
/// input, or a database error.
pub fn import_csv_file(
    storage: &mut SqliteStorage,
    path: &Path,
    actor_id: Option<i64>,
) -> Result<ImportResult> {
    check_csv_name(path)?;
    let input = fs::read_to_string(path)?;
    let rows = parse_csv(&input)?;
    debug!(path = %path.display(), rows = rows.len(), "Parsed CSV");

    let progress = ProgressTracker::new(rows.len() as u64, "Importing issues");
    import_rows(storage, &rows, actor_id, &progress)
}

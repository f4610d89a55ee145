//! Audit trail storage for `issuedb`.
//!
//! - Entry insertion, always inside the transaction of the mutation it records
//! - Entry retrieval, newest first (`created_at DESC, id DESC`)
//!
//! Entries are never updated or deleted directly; they disappear only when
//! their issue is deleted (foreign key cascade).

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};

use crate::error::Result;
use crate::model::{ChangeType, HistoryEntry};
use crate::storage::sqlite::{format_datetime, parse_datetime};

/// Context for a mutation operation, collecting the history it produces.
///
/// Entries are written by [`crate::storage::SqliteStorage::mutate`] in the
/// same transaction right before commit, so a failed mutation leaves no
/// trace in the audit trail.
pub struct MutationContext {
    pub op_name: String,
    pub actor_id: Option<i64>,
    pub now: DateTime<Utc>,
    pub entries: Vec<HistoryEntry>,
}

impl MutationContext {
    #[must_use]
    pub fn new(op_name: &str, actor_id: Option<i64>) -> Self {
        Self {
            op_name: op_name.to_string(),
            actor_id,
            now: Utc::now(),
            entries: Vec::new(),
        }
    }

    /// Record an entry without a field name (creation, comments).
    pub fn record(&mut self, issue_id: i64, change_type: ChangeType, new_value: Option<String>) {
        self.record_field_change(issue_id, change_type, None, None, new_value);
    }

    /// Record a field change with stringified old and new values.
    pub fn record_field_change(
        &mut self,
        issue_id: i64,
        change_type: ChangeType,
        field_name: Option<&str>,
        old_value: Option<String>,
        new_value: Option<String>,
    ) {
        self.entries.push(HistoryEntry {
            id: 0, // Placeholder, DB assigns auto-inc ID
            issue_id,
            change_type,
            field_name: field_name.map(str::to_string),
            old_value,
            new_value,
            actor_id: self.actor_id,
            created_at: self.now,
        });
    }
}

/// Insert one history entry.
///
/// Call this on the connection or transaction that performs the mutation.
///
/// # Errors
///
/// Returns an error if the database insert fails.
pub fn insert_history_entry(conn: &Connection, entry: &HistoryEntry) -> Result<i64> {
    conn.execute(
        r"
        INSERT INTO issue_history
            (issue_id, actor_id, change_type, field_name, old_value, new_value, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ",
        params![
            entry.issue_id,
            entry.actor_id,
            entry.change_type.as_str(),
            entry.field_name,
            entry.old_value,
            entry.new_value,
            format_datetime(entry.created_at),
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

/// Get the history of an issue, newest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_history(conn: &Connection, issue_id: i64) -> Result<Vec<HistoryEntry>> {
    let mut stmt = conn.prepare(
        r"
        SELECT id, issue_id, change_type, field_name, old_value, new_value, actor_id, created_at
        FROM issue_history
        WHERE issue_id = ?1
        ORDER BY created_at DESC, id DESC
        ",
    )?;

    let entries = stmt
        .query_map([issue_id], history_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(entries)
}

/// Count history rows for an issue.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_history(conn: &Connection, issue_id: i64) -> Result<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM issue_history WHERE issue_id = ?1",
        [issue_id],
        |row| row.get(0),
    )?;
    Ok(usize::try_from(count).unwrap_or(0))
}

fn history_from_row(row: &rusqlite::Row) -> rusqlite::Result<HistoryEntry> {
    let change_type: String = row.get(2)?;
    Ok(HistoryEntry {
        id: row.get(0)?,
        issue_id: row.get(1)?,
        change_type: change_type.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?,
        field_name: row.get(3)?,
        old_value: row.get(4)?,
        new_value: row.get(5)?,
        actor_id: row.get(6)?,
        created_at: parse_datetime(&row.get::<_, String>(7)?),
    })
}

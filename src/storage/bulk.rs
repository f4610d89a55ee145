//! Bulk status transitions.

use std::collections::BTreeMap;

use rusqlite::Connection;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{IssueDbError, Result};
use crate::model::{ChangeType, Issue, Status};
use crate::storage::patch::stamp_resolution;
use crate::storage::sqlite::{
    ISSUE_COLUMNS, SQLITE_VAR_LIMIT, SqliteStorage, format_datetime, issue_from_row,
};

/// Outcome of a bulk status update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BulkStatusResult {
    pub updated: usize,
    pub status: Status,
}

impl SqliteStorage {
    /// Move a set of issues to one status as a single atomic unit.
    ///
    /// Every id must resolve before anything is written; a duplicated id
    /// counts as unresolved. Each issue gets its version bumped, a fresh
    /// `updated_at`, `resolved_at` on its first terminal status, and one
    /// `bulk_status_update` history entry.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIssueIds` when the id list does not fully resolve, or a
    /// database error. Either way no issue changes.
    pub fn bulk_update_status(
        &mut self,
        issue_ids: &[i64],
        status: Status,
        actor_id: Option<i64>,
    ) -> Result<BulkStatusResult> {
        if issue_ids.is_empty() {
            return Ok(BulkStatusResult { updated: 0, status });
        }

        let updated = self.mutate("bulk_update_status", actor_id, |tx, ctx| {
            let issues = fetch_issues_by_ids(tx, issue_ids)?;
            if issues.len() != issue_ids.len() {
                return Err(IssueDbError::InvalidIssueIds {
                    requested: issue_ids.len(),
                    resolved: issues.len(),
                });
            }

            for mut issue in issues {
                let old_status = issue.status;
                issue.status = status;
                issue.version += 1;
                issue.updated_at = ctx.now;
                stamp_resolution(&mut issue, ctx.now);

                tx.execute(
                    "UPDATE issues
                     SET status = ?1, version = ?2, updated_at = ?3, resolved_at = ?4
                     WHERE id = ?5",
                    rusqlite::params![
                        issue.status.as_str(),
                        issue.version,
                        format_datetime(issue.updated_at),
                        issue.resolved_at.map(format_datetime),
                        issue.id,
                    ],
                )?;

                ctx.record_field_change(
                    issue.id,
                    ChangeType::BulkStatusUpdate,
                    Some("status"),
                    Some(old_status.as_str().to_string()),
                    Some(status.as_str().to_string()),
                );
            }

            Ok(ctx.entries.len())
        })?;

        info!(count = updated, status = %status, "Bulk status update");
        Ok(BulkStatusResult { updated, status })
    }
}

/// Load issues by id, once per distinct id, in id order.
fn fetch_issues_by_ids(conn: &Connection, ids: &[i64]) -> Result<Vec<Issue>> {
    let mut found: BTreeMap<i64, Issue> = BTreeMap::new();

    for chunk in ids.chunks(SQLITE_VAR_LIMIT) {
        let placeholders: Vec<&str> = chunk.iter().map(|_| "?").collect();
        let sql = format!(
            "SELECT {ISSUE_COLUMNS} FROM issues WHERE id IN ({})",
            placeholders.join(",")
        );
        let params: Vec<&dyn rusqlite::ToSql> =
            chunk.iter().map(|id| id as &dyn rusqlite::ToSql).collect();

        let mut stmt = conn.prepare(&sql)?;
        for issue in stmt.query_map(params.as_slice(), issue_from_row)? {
            let issue = issue?;
            found.insert(issue.id, issue);
        }
    }

    Ok(found.into_values().collect())
}

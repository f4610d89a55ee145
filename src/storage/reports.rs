//! Read-only aggregates over committed issue state.

use chrono::{DateTime, Utc};

use crate::error::{IssueDbError, Result};
use crate::format::{
    AssigneeStats, Dashboard, PriorityCounts, PriorityHours, ResolutionStats, StatusCounts,
};
use crate::model::Priority;
use crate::storage::sqlite::{
    ISSUE_COLUMNS, SqliteStorage, issue_from_row, parse_datetime, user_from_row,
};

/// Default number of entries in the top-assignees report.
pub const DEFAULT_TOP_ASSIGNEES: usize = 10;
/// Largest accepted top-assignees limit.
pub const MAX_TOP_ASSIGNEES: usize = 50;
/// Issues shown in the dashboard's recent list.
pub const DASHBOARD_RECENT: usize = 5;

impl SqliteStorage {
    /// Group assigned issues by assignee with a per-status breakdown.
    ///
    /// Ordered by issue count descending, ties by user id ascending.
    ///
    /// # Errors
    ///
    /// Returns a validation error when `limit` is outside 1..=50.
    pub fn top_assignees(&self, limit: usize) -> Result<Vec<AssigneeStats>> {
        if !(1..=MAX_TOP_ASSIGNEES).contains(&limit) {
            return Err(IssueDbError::validation(
                "limit",
                format!("must be between 1 and {MAX_TOP_ASSIGNEES}"),
            ));
        }

        let mut stmt = self.conn.prepare(
            "SELECT u.id, u.email, u.username, u.full_name, u.created_at,
                    COUNT(i.id),
                    SUM(CASE WHEN i.status = 'open' THEN 1 ELSE 0 END),
                    SUM(CASE WHEN i.status = 'in_progress' THEN 1 ELSE 0 END),
                    SUM(CASE WHEN i.status = 'resolved' THEN 1 ELSE 0 END),
                    SUM(CASE WHEN i.status = 'closed' THEN 1 ELSE 0 END)
             FROM issues i JOIN users u ON u.id = i.assignee_id
             GROUP BY u.id
             ORDER BY COUNT(i.id) DESC, u.id ASC
             LIMIT ?1",
        )?;

        let count = |row: &rusqlite::Row, idx: usize| -> rusqlite::Result<usize> {
            let value: i64 = row.get(idx)?;
            Ok(usize::try_from(value).unwrap_or(0))
        };

        let stats = stmt
            .query_map([i64::try_from(limit).unwrap_or(i64::MAX)], |row| {
                Ok(AssigneeStats {
                    assignee: user_from_row(row)?,
                    issue_count: count(row, 5)?,
                    by_status: StatusCounts {
                        open: count(row, 6)?,
                        in_progress: count(row, 7)?,
                        resolved: count(row, 8)?,
                        closed: count(row, 9)?,
                    },
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(stats)
    }

    /// Mean time from creation to resolution, overall and per priority.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn resolution_stats(&self) -> Result<ResolutionStats> {
        let mut stmt = self.conn.prepare(
            "SELECT priority, created_at, resolved_at FROM issues WHERE resolved_at IS NOT NULL",
        )?;
        let rows = stmt
            .query_map([], |row| {
                let priority: String = row.get(0)?;
                Ok((
                    priority,
                    parse_datetime(&row.get::<_, String>(1)?),
                    parse_datetime(&row.get::<_, String>(2)?),
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut resolved = Vec::with_capacity(rows.len());
        for (priority, created_at, resolved_at) in rows {
            resolved.push((priority.parse::<Priority>()?, created_at, resolved_at));
        }

        Ok(summarize_resolutions(&resolved))
    }

    /// Totals by status and priority plus the newest issues.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn dashboard(&self) -> Result<Dashboard> {
        let mut by_status = StatusCounts::default();
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM issues GROUP BY status")?;
        for row in stmt.query_map([], grouped_count)? {
            let (status, count) = row?;
            by_status.add(status.parse()?, count);
        }

        let mut by_priority = PriorityCounts::default();
        let mut stmt = self
            .conn
            .prepare("SELECT priority, COUNT(*) FROM issues GROUP BY priority")?;
        for row in stmt.query_map([], grouped_count)? {
            let (priority, count) = row?;
            by_priority.add(priority.parse()?, count);
        }

        let sql = format!(
            "SELECT {ISSUE_COLUMNS} FROM issues
             ORDER BY created_at DESC, id DESC
             LIMIT {DASHBOARD_RECENT}"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let recent_issues = stmt
            .query_map([], issue_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Dashboard {
            total_issues: by_status.total(),
            by_status,
            by_priority,
            recent_issues,
        })
    }
}

/// Average resolution hours, rounded to two decimals.
///
/// Buckets without resolved issues report 0.
#[must_use]
pub fn summarize_resolutions(
    resolved: &[(Priority, DateTime<Utc>, DateTime<Utc>)],
) -> ResolutionStats {
    let mut total_hours = 0.0;
    let mut sums = [0.0_f64; 4];
    let mut counts = [0_usize; 4];

    for (priority, created_at, resolved_at) in resolved {
        let hours = (*resolved_at - *created_at).num_milliseconds() as f64 / 3_600_000.0;
        total_hours += hours;
        let bucket = priority_index(*priority);
        sums[bucket] += hours;
        counts[bucket] += 1;
    }

    let average = |sum: f64, count: usize| {
        if count == 0 {
            0.0
        } else {
            round2(sum / count as f64)
        }
    };

    ResolutionStats {
        total_resolved: resolved.len(),
        average_resolution_hours: average(total_hours, resolved.len()),
        by_priority: PriorityHours {
            low: average(sums[0], counts[0]),
            medium: average(sums[1], counts[1]),
            high: average(sums[2], counts[2]),
            critical: average(sums[3], counts[3]),
        },
    }
}

fn grouped_count(row: &rusqlite::Row) -> rusqlite::Result<(String, usize)> {
    let count: i64 = row.get(1)?;
    Ok((row.get(0)?, usize::try_from(count).unwrap_or(0)))
}

const fn priority_index(priority: Priority) -> usize {
    match priority {
        Priority::Low => 0,
        Priority::Medium => 1,
        Priority::High => 2,
        Priority::Critical => 3,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

//! Staged batch creation for CSV import.
//!
//! The whole batch runs in one IMMEDIATE transaction. Each row gets its own
//! savepoint, so a row that fails halfway leaves nothing behind while its
//! siblings stay staged. The batch commits only if at least one row staged.

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::model::{ChangeType, Priority, Status};
use crate::storage::history::{MutationContext, insert_history_entry};
use crate::storage::sqlite::{NewIssue, SqliteStorage, insert_issue_row};

/// A row that passed validation and is ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDraft {
    /// 1-based line number in the source file (the header is line 1).
    pub row: usize,
    pub title: String,
    pub description: Option<String>,
    pub status: Status,
    pub priority: Priority,
    pub assignee_email: Option<String>,
}

/// What happened to one row of the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportRowOutcome {
    Staged { row: usize, issue_id: i64 },
    Failed { row: usize, error: String },
}

impl ImportRowOutcome {
    #[must_use]
    pub const fn row(&self) -> usize {
        match self {
            Self::Staged { row, .. } | Self::Failed { row, .. } => *row,
        }
    }

    #[must_use]
    pub const fn is_staged(&self) -> bool {
        matches!(self, Self::Staged { .. })
    }
}

impl SqliteStorage {
    /// Insert a batch of import rows with per-row isolation.
    ///
    /// `rows` carries each row's validation result; rows that already failed
    /// validation are reported unchanged. Assignee emails that match no user
    /// leave the issue unassigned. `on_row` is called once per row, after it
    /// is handled.
    ///
    /// # Errors
    ///
    /// Returns an error only when the batch transaction itself cannot be
    /// opened, committed, or rolled back. Row failures are outcomes.
    pub fn import_rows<I, F>(
        &mut self,
        rows: I,
        actor_id: Option<i64>,
        mut on_row: F,
    ) -> Result<Vec<ImportRowOutcome>>
    where
        I: IntoIterator<Item = std::result::Result<ImportDraft, (usize, String)>>,
        F: FnMut(&ImportRowOutcome),
    {
        let mut tx = self
            .conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        let mut outcomes = Vec::new();

        for row in rows {
            let outcome = match row {
                Err((row, error)) => ImportRowOutcome::Failed { row, error },
                Ok(draft) => {
                    let row = draft.row;
                    match stage_row(&mut tx, &draft, actor_id) {
                        Ok(issue_id) => ImportRowOutcome::Staged { row, issue_id },
                        Err(err) => {
                            warn!(row, error = %err, "Import row failed to stage");
                            ImportRowOutcome::Failed {
                                row,
                                error: err.to_string(),
                            }
                        }
                    }
                }
            };
            on_row(&outcome);
            outcomes.push(outcome);
        }

        let staged = outcomes.iter().filter(|o| o.is_staged()).count();
        if staged > 0 {
            tx.commit()?;
            info!(
                staged,
                failed = outcomes.len() - staged,
                "Import batch committed"
            );
        } else {
            tx.rollback()?;
            info!(rows = outcomes.len(), "Import batch rolled back, no valid rows");
        }

        Ok(outcomes)
    }
}

fn stage_row(
    tx: &mut rusqlite::Transaction<'_>,
    draft: &ImportDraft,
    actor_id: Option<i64>,
) -> Result<i64> {
    let sp = tx.savepoint()?;
    let mut ctx = MutationContext::new("import_row", actor_id);

    let assignee_id = match draft.assignee_email.as_deref() {
        Some(email) => {
            let found: Option<i64> = rusqlite::OptionalExtension::optional(sp.query_row(
                "SELECT id FROM users WHERE email = ?1",
                [email],
                |row| row.get(0),
            ))?;
            if found.is_none() {
                debug!(row = draft.row, email, "Unknown assignee email, leaving unassigned");
            }
            found
        }
        None => None,
    };

    let issue = NewIssue {
        title: draft.title.clone(),
        description: draft.description.clone(),
        status: draft.status,
        priority: draft.priority,
        assignee_id,
        label_ids: vec![],
    };
    let id = insert_issue_row(&sp, &issue, actor_id, ctx.now)?;
    ctx.record(
        id,
        ChangeType::Created,
        Some("Issue created via CSV import".to_string()),
    );
    for entry in &ctx.entries {
        insert_history_entry(&sp, entry)?;
    }

    sp.commit()?;
    Ok(id)
}

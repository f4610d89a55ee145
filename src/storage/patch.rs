//! Partial updates for the version-guarded mutator.
//!
//! An [`IssuePatch`] names every mutable issue field explicitly. `None` means
//! "not supplied" and leaves the field alone; for nullable fields the inner
//! `Option` carries the new value, so `Some(None)` clears it.

use chrono::{DateTime, Utc};

use crate::model::{Issue, Priority, Status};

/// Fields to update on an issue, plus the version the caller last read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssuePatch {
    pub expected_version: i64,
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub assignee_id: Option<Option<i64>>,
}

/// One field whose value actually changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: &'static str,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl IssuePatch {
    #[must_use]
    pub fn new(expected_version: i64) -> Self {
        Self {
            expected_version,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.assignee_id.is_none()
    }

    /// Apply the supplied fields to `issue` and return the ones that changed.
    ///
    /// Also stamps `resolved_at` when the resulting status is terminal and no
    /// resolution time exists yet. Version and `updated_at` are left to the
    /// caller.
    pub fn apply(&self, issue: &mut Issue, now: DateTime<Utc>) -> Vec<FieldChange> {
        let mut changes = Vec::new();

        if let Some(title) = self.title.as_deref().map(str::trim) {
            if title != issue.title {
                changes.push(FieldChange {
                    field: "title",
                    old_value: Some(issue.title.clone()),
                    new_value: Some(title.to_string()),
                });
                issue.title = title.to_string();
            }
        }

        if let Some(description) = &self.description {
            let description = normalize_description(description.as_deref());
            if description != issue.description {
                changes.push(FieldChange {
                    field: "description",
                    old_value: issue.description.clone(),
                    new_value: description.clone(),
                });
                issue.description = description;
            }
        }

        if let Some(status) = self.status {
            if status != issue.status {
                changes.push(FieldChange {
                    field: "status",
                    old_value: Some(issue.status.as_str().to_string()),
                    new_value: Some(status.as_str().to_string()),
                });
                issue.status = status;
            }
        }

        if let Some(priority) = self.priority {
            if priority != issue.priority {
                changes.push(FieldChange {
                    field: "priority",
                    old_value: Some(issue.priority.as_str().to_string()),
                    new_value: Some(priority.as_str().to_string()),
                });
                issue.priority = priority;
            }
        }

        if let Some(assignee_id) = self.assignee_id {
            if assignee_id != issue.assignee_id {
                changes.push(FieldChange {
                    field: "assignee_id",
                    old_value: issue.assignee_id.map(|id| id.to_string()),
                    new_value: assignee_id.map(|id| id.to_string()),
                });
                issue.assignee_id = assignee_id;
            }
        }

        stamp_resolution(issue, now);

        changes
    }
}

/// Trimmed description; blank text is stored as no description.
#[must_use]
pub fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

/// Set `resolved_at` the first time an issue is seen in a terminal status.
pub fn stamp_resolution(issue: &mut Issue, now: DateTime<Utc>) {
    if issue.status.is_terminal() && issue.resolved_at.is_none() {
        issue.resolved_at = Some(now);
    }
}

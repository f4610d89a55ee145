//! `SQLite` storage implementation.

use crate::error::{IssueDbError, Result};
use crate::format::IssueDetails;
use crate::model::{ChangeType, Comment, HistoryEntry, Issue, Label, Priority, Status, User};
use crate::storage::history::{MutationContext, get_history, insert_history_entry};
use crate::storage::patch::{IssuePatch, normalize_description, stamp_resolution};
use crate::storage::schema::apply_schema;
use crate::validation::{CommentValidator, IssueValidator, LabelValidator, UserValidator};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use rusqlite::{Connection, OptionalExtension, Transaction};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// `SQLite` has a finite variable limit (default 999). Chunk id lists below it.
pub(super) const SQLITE_VAR_LIMIT: usize = 900;

/// Default page size for issue listings.
pub const DEFAULT_PAGE_SIZE: usize = 50;
/// Largest page size a listing accepts.
pub const MAX_PAGE_SIZE: usize = 100;

/// Default color for labels created without one.
pub const DEFAULT_LABEL_COLOR: &str = "#6b7280";

/// The standard label set installed by `idb label seed`.
pub const STANDARD_LABELS: &[(&str, &str)] = &[
    ("bug", "#d32f2f"),
    ("enhancement", "#1976d2"),
    ("documentation", "#388e3c"),
    ("question", "#fbc02d"),
    ("help wanted", "#f57c00"),
    ("urgent", "#c2185b"),
];

pub(super) const ISSUE_COLUMNS: &str = "id, title, description, status, priority, version, \
     creator_id, assignee_id, created_at, updated_at, resolved_at";

/// SQLite-based storage backend.
#[derive(Debug)]
pub struct SqliteStorage {
    pub(super) conn: Connection,
}

impl SqliteStorage {
    /// Open a new connection to the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema application fails.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_timeout(path, None)
    }

    /// Open a new connection with an optional busy timeout (ms).
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established or schema application fails.
    pub fn open_with_timeout(path: &Path, lock_timeout_ms: Option<u64>) -> Result<Self> {
        let conn = Connection::open(path)?;
        if let Some(timeout) = lock_timeout_ms {
            conn.busy_timeout(Duration::from_millis(timeout))?;
        }
        apply_schema(&conn)?;
        debug!(path = %path.display(), "Opened issue database");
        Ok(Self { conn })
    }

    /// Open an in-memory database for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        apply_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Run a mutation inside one IMMEDIATE transaction.
    ///
    /// The closure performs its writes and records history in the
    /// [`MutationContext`]; the recorded entries are inserted in the same
    /// transaction right before commit. Returning an error drops the
    /// transaction, which rolls back every write.
    ///
    /// # Errors
    ///
    /// Returns the closure's error, or a database error from commit.
    pub fn mutate<F, R>(&mut self, op: &str, actor_id: Option<i64>, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction, &mut MutationContext) -> Result<R>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        let mut ctx = MutationContext::new(op, actor_id);

        let result = f(&tx, &mut ctx)?;

        for entry in &ctx.entries {
            insert_history_entry(&tx, entry)?;
        }

        tx.commit()?;
        debug!(op, history = ctx.entries.len(), "Mutation committed");

        Ok(result)
    }

    // ========================================================================
    // Users
    // ========================================================================

    /// Register a user.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed input or when the email or
    /// username is already registered.
    pub fn create_user(&mut self, user: &NewUser) -> Result<User> {
        UserValidator::validate(user).map_err(IssueDbError::from_validation_errors)?;
        let email = user.email.trim().to_string();
        let username = user.username.trim().to_string();
        let full_name = user
            .full_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        let tx = self.conn.transaction()?;
        if exists(&tx, "SELECT 1 FROM users WHERE email = ?1", &email)? {
            return Err(IssueDbError::EmailTaken { email });
        }
        if exists(&tx, "SELECT 1 FROM users WHERE username = ?1", &username)? {
            return Err(IssueDbError::UsernameTaken { username });
        }

        let now = Utc::now();
        tx.execute(
            "INSERT INTO users (email, username, full_name, created_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![email, username, full_name, format_datetime(now)],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        info!(user_id = id, %username, "Registered user");

        Ok(User {
            id,
            email,
            username,
            full_name,
            created_at: parse_datetime(&format_datetime(now)),
        })
    }

    /// Get a user by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        fetch_user(&self.conn, "id = ?1", &id)
    }

    /// Find a user by numeric id, email, or username.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn find_user(&self, reference: &str) -> Result<Option<User>> {
        let reference = reference.trim();
        if let Ok(id) = reference.parse::<i64>() {
            return self.get_user(id);
        }
        if reference.contains('@') {
            return fetch_user(&self.conn, "email = ?1", &reference);
        }
        fetch_user(&self.conn, "username = ?1", &reference)
    }

    /// Resolve a user reference or fail with `UserNotFound`.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` when nothing matches.
    pub fn require_user(&self, reference: &str) -> Result<User> {
        self.find_user(reference)?
            .ok_or_else(|| IssueDbError::UserNotFound {
                reference: reference.to_string(),
            })
    }

    /// List all users ordered by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, email, username, full_name, created_at FROM users ORDER BY id",
        )?;
        let users = stmt
            .query_map([], user_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(users)
    }

    /// Delete a user. Issue, comment and history references fall back to NULL.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` if the user does not exist.
    pub fn delete_user(&mut self, id: i64) -> Result<()> {
        let deleted = self.conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
        if deleted == 0 {
            return Err(IssueDbError::UserNotFound {
                reference: id.to_string(),
            });
        }
        info!(user_id = id, "Deleted user");
        Ok(())
    }

    // ========================================================================
    // Labels
    // ========================================================================

    /// Create a label.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed input or a duplicate name.
    pub fn create_label(&mut self, label: &NewLabel) -> Result<Label> {
        LabelValidator::validate(label).map_err(IssueDbError::from_validation_errors)?;
        let name = label.name.trim().to_string();
        if exists(&self.conn, "SELECT 1 FROM labels WHERE name = ?1", &name)? {
            return Err(IssueDbError::LabelExists { name });
        }

        let now = format_datetime(Utc::now());
        self.conn.execute(
            "INSERT INTO labels (name, color, created_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![name, label.color, now],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(label_id = id, %name, "Created label");

        Ok(Label {
            id,
            name,
            color: label.color.clone(),
            created_at: parse_datetime(&now),
        })
    }

    /// Install the standard label set, skipping names that already exist.
    ///
    /// Returns the labels that were created.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub fn seed_labels(&mut self) -> Result<Vec<Label>> {
        let mut created = Vec::new();
        for (name, color) in STANDARD_LABELS {
            match self.create_label(&NewLabel {
                name: (*name).to_string(),
                color: (*color).to_string(),
            }) {
                Ok(label) => created.push(label),
                Err(IssueDbError::LabelExists { .. }) => {
                    debug!(name, "Label already present, skipping");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(created)
    }

    /// List all labels ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_labels(&self) -> Result<Vec<Label>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, color, created_at FROM labels ORDER BY name")?;
        let labels = stmt
            .query_map([], label_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(labels)
    }

    /// Get the labels attached to an issue, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_labels(&self, issue_id: i64) -> Result<Vec<Label>> {
        fetch_issue_labels(&self.conn, issue_id)
    }

    /// Get labels for multiple issues efficiently.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_labels_for_issues(&self, issue_ids: &[i64]) -> Result<HashMap<i64, Vec<Label>>> {
        let mut map: HashMap<i64, Vec<Label>> = HashMap::new();

        for chunk in issue_ids.chunks(SQLITE_VAR_LIMIT) {
            let placeholders: Vec<&str> = chunk.iter().map(|_| "?").collect();
            let sql = format!(
                "SELECT il.issue_id, l.id, l.name, l.color, l.created_at
                 FROM issue_labels il JOIN labels l ON l.id = il.label_id
                 WHERE il.issue_id IN ({})
                 ORDER BY il.issue_id, l.name",
                placeholders.join(",")
            );
            let params: Vec<&dyn rusqlite::ToSql> =
                chunk.iter().map(|id| id as &dyn rusqlite::ToSql).collect();

            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map(params.as_slice(), |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    Label {
                        id: row.get(1)?,
                        name: row.get(2)?,
                        color: row.get(3)?,
                        created_at: parse_datetime(&row.get::<_, String>(4)?),
                    },
                ))
            })?;

            for row in rows {
                let (issue_id, label) = row?;
                map.entry(issue_id).or_default().push(label);
            }
        }

        Ok(map)
    }

    /// Replace the full label set of an issue.
    ///
    /// Every id must resolve; a partial match is rejected before anything
    /// changes. Appends one `labels_updated` history entry recording the old
    /// and new label names.
    ///
    /// # Errors
    ///
    /// Returns `IssueNotFound` if the issue is absent and `InvalidLabelIds`
    /// if any label id does not resolve.
    pub fn replace_labels(
        &mut self,
        issue_id: i64,
        label_ids: &[i64],
        actor_id: Option<i64>,
    ) -> Result<Vec<Label>> {
        self.mutate("replace_labels", actor_id, |tx, ctx| {
            if !issue_exists(tx, issue_id)? {
                return Err(IssueDbError::IssueNotFound { id: issue_id });
            }

            let new_labels = fetch_labels_by_ids(tx, label_ids)?;
            if new_labels.len() != label_ids.len() {
                return Err(IssueDbError::InvalidLabelIds {
                    requested: label_ids.len(),
                    resolved: new_labels.len(),
                });
            }

            let old_labels = fetch_issue_labels(tx, issue_id)?;

            tx.execute("DELETE FROM issue_labels WHERE issue_id = ?1", [issue_id])?;
            for label in &new_labels {
                tx.execute(
                    "INSERT INTO issue_labels (issue_id, label_id) VALUES (?1, ?2)",
                    rusqlite::params![issue_id, label.id],
                )?;
            }

            ctx.record_field_change(
                issue_id,
                ChangeType::LabelsUpdated,
                Some("labels"),
                Some(join_label_names(&old_labels)),
                Some(join_label_names(&new_labels)),
            );

            fetch_issue_labels(tx, issue_id)
        })
    }

    // ========================================================================
    // Issues
    // ========================================================================

    /// Create a new issue at version 1 with one `created` history entry.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed input, `UserNotFound` for an
    /// unknown assignee, and `InvalidLabelIds` if any label id does not resolve.
    pub fn create_issue(&mut self, issue: &NewIssue, actor_id: Option<i64>) -> Result<Issue> {
        IssueValidator::validate_new(issue).map_err(IssueDbError::from_validation_errors)?;

        let id = self.mutate("create_issue", actor_id, |tx, ctx| {
            if let Some(assignee_id) = issue.assignee_id {
                ensure_user_exists(tx, assignee_id)?;
            }
            let labels = fetch_labels_by_ids(tx, &issue.label_ids)?;
            if labels.len() != issue.label_ids.len() {
                return Err(IssueDbError::InvalidLabelIds {
                    requested: issue.label_ids.len(),
                    resolved: labels.len(),
                });
            }

            let id = insert_issue_row(tx, issue, actor_id, ctx.now)?;
            for label in &labels {
                tx.execute(
                    "INSERT INTO issue_labels (issue_id, label_id) VALUES (?1, ?2)",
                    rusqlite::params![id, label.id],
                )?;
            }
            ctx.record(id, ChangeType::Created, Some("Issue created".to_string()));
            Ok(id)
        })?;

        info!(issue_id = id, "Created issue");
        self.get_issue(id)?
            .ok_or(IssueDbError::IssueNotFound { id })
    }

    /// Apply a version-guarded partial update.
    ///
    /// The expected version is compared with the stored one inside the write
    /// transaction. On a match every supplied field that differs is written
    /// and historied, the version grows by exactly one and `updated_at` is
    /// refreshed, even when no field changed value.
    ///
    /// # Errors
    ///
    /// Returns `IssueNotFound` if the issue is absent, `VersionConflict` if
    /// the expected version is stale, `UserNotFound` for an unknown assignee,
    /// or a validation error for malformed input. No write happens on error.
    pub fn update_issue(
        &mut self,
        id: i64,
        patch: &IssuePatch,
        actor_id: Option<i64>,
    ) -> Result<Issue> {
        IssueValidator::validate_patch(patch).map_err(IssueDbError::from_validation_errors)?;

        let mut updated = self.mutate("update_issue", actor_id, |tx, ctx| {
            let mut issue = fetch_issue(tx, id)?.ok_or(IssueDbError::IssueNotFound { id })?;
            if issue.version != patch.expected_version {
                return Err(IssueDbError::VersionConflict {
                    current: issue.version,
                    supplied: patch.expected_version,
                });
            }
            if let Some(Some(assignee_id)) = patch.assignee_id {
                ensure_user_exists(tx, assignee_id)?;
            }

            let changes = patch.apply(&mut issue, ctx.now);
            issue.version += 1;
            issue.updated_at = ctx.now;

            let written = tx.execute(
                "UPDATE issues
                 SET title = ?1, description = ?2, status = ?3, priority = ?4,
                     assignee_id = ?5, resolved_at = ?6, version = ?7, updated_at = ?8
                 WHERE id = ?9 AND version = ?10",
                rusqlite::params![
                    issue.title,
                    issue.description,
                    issue.status.as_str(),
                    issue.priority.as_str(),
                    issue.assignee_id,
                    issue.resolved_at.map(format_datetime),
                    issue.version,
                    format_datetime(issue.updated_at),
                    id,
                    patch.expected_version,
                ],
            )?;
            if written != 1 {
                return Err(IssueDbError::VersionConflict {
                    current: current_version(tx, id)?,
                    supplied: patch.expected_version,
                });
            }

            for change in changes {
                ctx.record_field_change(
                    id,
                    ChangeType::Updated,
                    Some(change.field),
                    change.old_value,
                    change.new_value,
                );
            }

            Ok(issue)
        })?;

        updated.labels = self.get_labels(id)?;
        info!(issue_id = id, version = updated.version, "Updated issue");
        Ok(updated)
    }

    /// Get an issue by id, labels included.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_issue(&self, id: i64) -> Result<Option<Issue>> {
        let Some(mut issue) = fetch_issue(&self.conn, id)? else {
            return Ok(None);
        };
        issue.labels = fetch_issue_labels(&self.conn, id)?;
        Ok(Some(issue))
    }

    /// Get an issue or fail with `IssueNotFound`.
    ///
    /// # Errors
    ///
    /// Returns `IssueNotFound` if the issue is absent.
    pub fn require_issue(&self, id: i64) -> Result<Issue> {
        self.get_issue(id)?.ok_or(IssueDbError::IssueNotFound { id })
    }

    /// List issues with optional filters, newest first.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an out-of-range page size, or a
    /// database error.
    pub fn list_issues(&self, filters: &ListFilters) -> Result<Vec<Issue>> {
        filters.validate()?;

        let mut sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE 1=1");
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(status) = filters.status {
            sql.push_str(" AND status = ?");
            params.push(Box::new(status.as_str()));
        }
        if let Some(priority) = filters.priority {
            sql.push_str(" AND priority = ?");
            params.push(Box::new(priority.as_str()));
        }
        if let Some(assignee_id) = filters.assignee_id {
            sql.push_str(" AND assignee_id = ?");
            params.push(Box::new(assignee_id));
        }

        sql.push_str(" ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?");
        params.push(Box::new(i64::try_from(filters.limit).unwrap_or(i64::MAX)));
        params.push(Box::new(i64::try_from(filters.offset).unwrap_or(i64::MAX)));

        let mut stmt = self.conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(AsRef::as_ref).collect();
        let mut issues = stmt
            .query_map(params_refs.as_slice(), issue_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let ids: Vec<i64> = issues.iter().map(|issue| issue.id).collect();
        let mut labels = self.get_labels_for_issues(&ids)?;
        for issue in &mut issues {
            issue.labels = labels.remove(&issue.id).unwrap_or_default();
        }

        Ok(issues)
    }

    /// Count all issues.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn count_issues(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM issues", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Delete an issue. Comments, history and label links cascade.
    ///
    /// # Errors
    ///
    /// Returns `IssueNotFound` if the issue does not exist.
    pub fn delete_issue(&mut self, id: i64) -> Result<()> {
        let deleted = self.conn.execute("DELETE FROM issues WHERE id = ?1", [id])?;
        if deleted == 0 {
            return Err(IssueDbError::IssueNotFound { id });
        }
        info!(issue_id = id, "Deleted issue");
        Ok(())
    }

    /// Get an issue with its comments.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_issue_details(&self, id: i64) -> Result<Option<IssueDetails>> {
        let Some(issue) = self.get_issue(id)? else {
            return Ok(None);
        };
        let comments = self.get_comments(id)?;
        Ok(Some(IssueDetails { issue, comments }))
    }

    /// Get the audit trail of an issue, newest first.
    ///
    /// # Errors
    ///
    /// Returns `IssueNotFound` if the issue is absent.
    pub fn timeline(&self, issue_id: i64) -> Result<Vec<HistoryEntry>> {
        if !issue_exists(&self.conn, issue_id)? {
            return Err(IssueDbError::IssueNotFound { id: issue_id });
        }
        get_history(&self.conn, issue_id)
    }

    // ========================================================================
    // Comments
    // ========================================================================

    /// Get comments for an issue, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_comments(&self, issue_id: i64) -> Result<Vec<Comment>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, issue_id, author_id, body, created_at, updated_at
             FROM comments
             WHERE issue_id = ?1
             ORDER BY created_at ASC, id ASC",
        )?;

        let comments = stmt
            .query_map([issue_id], comment_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(comments)
    }

    /// Add a comment and a `comment_added` history entry in one transaction.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank body and `IssueNotFound` if the
    /// issue is absent.
    pub fn add_comment(
        &mut self,
        issue_id: i64,
        author_id: Option<i64>,
        body: &str,
    ) -> Result<Comment> {
        CommentValidator::validate_body(body).map_err(IssueDbError::from_validation_errors)?;

        self.mutate("add_comment", author_id, |tx, ctx| {
            if !issue_exists(tx, issue_id)? {
                return Err(IssueDbError::IssueNotFound { id: issue_id });
            }

            let now = format_datetime(ctx.now);
            tx.execute(
                "INSERT INTO comments (issue_id, author_id, body, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                rusqlite::params![issue_id, author_id, body, now],
            )?;
            let comment_id = tx.last_insert_rowid();

            ctx.record(
                issue_id,
                ChangeType::CommentAdded,
                Some("Added comment".to_string()),
            );

            let comment = tx.query_row(
                "SELECT id, issue_id, author_id, body, created_at, updated_at
                 FROM comments WHERE id = ?1",
                [comment_id],
                comment_from_row,
            )?;
            Ok(comment)
        })
    }

    // ========================================================================
    // Config
    // ========================================================================

    /// Get a config value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_config(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM config WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Get all config values.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_all_config(&self) -> Result<BTreeMap<String, String>> {
        let mut stmt = self.conn.prepare("SELECT key, value FROM config")?;
        let map = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<BTreeMap<_, _>, _>>()?;
        Ok(map)
    }

    /// Set a config value.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub fn set_config(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO config (key, value) VALUES (?1, ?2)",
            [key, value],
        )?;
        Ok(())
    }
}

/// Input for creating an issue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewIssue {
    pub title: String,
    pub description: Option<String>,
    pub status: Status,
    pub priority: Priority,
    pub assignee_id: Option<i64>,
    pub label_ids: Vec<i64>,
}

impl NewIssue {
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Input for registering a user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
}

/// Input for creating a label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLabel {
    pub name: String,
    pub color: String,
}

impl NewLabel {
    /// A label with the default color.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: DEFAULT_LABEL_COLOR.to_string(),
        }
    }
}

/// Filter options for listing issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilters {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub assignee_id: Option<i64>,
    pub offset: usize,
    pub limit: usize,
}

impl Default for ListFilters {
    fn default() -> Self {
        Self {
            status: None,
            priority: None,
            assignee_id: None,
            offset: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListFilters {
    /// # Errors
    ///
    /// Returns a validation error when the page size is outside 1..=100.
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 || self.limit > MAX_PAGE_SIZE {
            return Err(IssueDbError::validation(
                "limit",
                format!("must be between 1 and {MAX_PAGE_SIZE}"),
            ));
        }
        Ok(())
    }
}

/// Format a timestamp for storage. Fixed precision keeps text order equal to
/// time order.
pub(crate) fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Utc.from_utc_datetime(&naive);
    }

    Utc::now()
}

fn conversion_error(index: usize, err: IssueDbError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(err))
}

pub(super) fn issue_from_row(row: &rusqlite::Row) -> rusqlite::Result<Issue> {
    let status: String = row.get(3)?;
    let priority: String = row.get(4)?;
    Ok(Issue {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: status.parse().map_err(|e| conversion_error(3, e))?,
        priority: priority.parse().map_err(|e| conversion_error(4, e))?,
        version: row.get(5)?,
        creator_id: row.get(6)?,
        assignee_id: row.get(7)?,
        created_at: parse_datetime(&row.get::<_, String>(8)?),
        updated_at: parse_datetime(&row.get::<_, String>(9)?),
        resolved_at: row
            .get::<_, Option<String>>(10)?
            .as_deref()
            .map(parse_datetime),
        labels: vec![], // Loaded separately
    })
}

pub(super) fn user_from_row(row: &rusqlite::Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        full_name: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

fn label_from_row(row: &rusqlite::Row) -> rusqlite::Result<Label> {
    Ok(Label {
        id: row.get(0)?,
        name: row.get(1)?,
        color: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
    })
}

fn comment_from_row(row: &rusqlite::Row) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        issue_id: row.get(1)?,
        author_id: row.get(2)?,
        body: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
        updated_at: parse_datetime(&row.get::<_, String>(5)?),
    })
}

fn exists(conn: &Connection, sql: &str, param: &dyn rusqlite::ToSql) -> Result<bool> {
    Ok(conn.prepare(sql)?.exists([param])?)
}

pub(super) fn issue_exists(conn: &Connection, id: i64) -> Result<bool> {
    exists(conn, "SELECT 1 FROM issues WHERE id = ?1", &id)
}

fn ensure_user_exists(conn: &Connection, id: i64) -> Result<()> {
    if exists(conn, "SELECT 1 FROM users WHERE id = ?1", &id)? {
        Ok(())
    } else {
        Err(IssueDbError::UserNotFound {
            reference: id.to_string(),
        })
    }
}

fn fetch_user(
    conn: &Connection,
    predicate: &str,
    param: &dyn rusqlite::ToSql,
) -> Result<Option<User>> {
    let sql =
        format!("SELECT id, email, username, full_name, created_at FROM users WHERE {predicate}");
    let user = conn.query_row(&sql, [param], user_from_row).optional()?;
    Ok(user)
}

pub(super) fn fetch_issue(conn: &Connection, id: i64) -> Result<Option<Issue>> {
    let sql = format!("SELECT {ISSUE_COLUMNS} FROM issues WHERE id = ?1");
    let issue = conn.query_row(&sql, [id], issue_from_row).optional()?;
    Ok(issue)
}

fn current_version(conn: &Connection, id: i64) -> Result<i64> {
    let version = conn.query_row("SELECT version FROM issues WHERE id = ?1", [id], |row| {
        row.get(0)
    })?;
    Ok(version)
}

/// Insert the issue row itself. Terminal statuses get `resolved_at = now`.
pub(super) fn insert_issue_row(
    conn: &Connection,
    issue: &NewIssue,
    creator_id: Option<i64>,
    now: DateTime<Utc>,
) -> Result<i64> {
    let mut row = Issue {
        id: 0,
        title: issue.title.trim().to_string(),
        description: normalize_description(issue.description.as_deref()),
        status: issue.status,
        priority: issue.priority,
        version: 1,
        creator_id,
        assignee_id: issue.assignee_id,
        created_at: now,
        updated_at: now,
        resolved_at: None,
        labels: vec![],
    };
    stamp_resolution(&mut row, now);

    conn.execute(
        "INSERT INTO issues (
            title, description, status, priority, version, creator_id, assignee_id,
            created_at, updated_at, resolved_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        rusqlite::params![
            row.title,
            row.description,
            row.status.as_str(),
            row.priority.as_str(),
            row.version,
            row.creator_id,
            row.assignee_id,
            format_datetime(row.created_at),
            format_datetime(row.updated_at),
            row.resolved_at.map(format_datetime),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn fetch_issue_labels(conn: &Connection, issue_id: i64) -> Result<Vec<Label>> {
    let mut stmt = conn.prepare(
        "SELECT l.id, l.name, l.color, l.created_at
         FROM issue_labels il JOIN labels l ON l.id = il.label_id
         WHERE il.issue_id = ?1
         ORDER BY l.name",
    )?;
    let labels = stmt
        .query_map([issue_id], label_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(labels)
}

/// Resolve label ids. Missing ids are simply absent from the result; duplicate
/// ids resolve once.
fn fetch_labels_by_ids(conn: &Connection, ids: &[i64]) -> Result<Vec<Label>> {
    let mut found: BTreeMap<i64, Label> = BTreeMap::new();
    for chunk in ids.chunks(SQLITE_VAR_LIMIT) {
        let placeholders: Vec<&str> = chunk.iter().map(|_| "?").collect();
        let sql = format!(
            "SELECT id, name, color, created_at FROM labels WHERE id IN ({})",
            placeholders.join(",")
        );
        let params: Vec<&dyn rusqlite::ToSql> =
            chunk.iter().map(|id| id as &dyn rusqlite::ToSql).collect();
        let mut stmt = conn.prepare(&sql)?;
        for label in stmt.query_map(params.as_slice(), label_from_row)? {
            let label = label?;
            found.insert(label.id, label);
        }
    }
    let mut labels: Vec<Label> = found.into_values().collect();
    labels.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(labels)
}

fn join_label_names(labels: &[Label]) -> String {
    if labels.is_empty() {
        return "none".to_string();
    }
    labels
        .iter()
        .map(|label| label.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

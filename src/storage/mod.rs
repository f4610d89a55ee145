//! `SQLite` storage layer for `issuedb`.
//!
//! Every write goes through [`SqliteStorage::mutate`], which wraps the
//! closure in an IMMEDIATE transaction and appends the history entries it
//! collected before committing.

mod bulk;
pub mod history;
mod import;
pub mod patch;
mod reports;
pub mod schema;
pub mod sqlite;

pub use bulk::BulkStatusResult;
pub use history::MutationContext;
pub use import::{ImportDraft, ImportRowOutcome};
pub use patch::{FieldChange, IssuePatch};
pub use reports::{
    DASHBOARD_RECENT, DEFAULT_TOP_ASSIGNEES, MAX_TOP_ASSIGNEES, summarize_resolutions,
};
pub use sqlite::{
    DEFAULT_LABEL_COLOR, DEFAULT_PAGE_SIZE, ListFilters, MAX_PAGE_SIZE, NewIssue, NewLabel,
    NewUser, STANDARD_LABELS, SqliteStorage,
};

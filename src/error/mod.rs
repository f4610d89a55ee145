//! Error types and handling for `issuedb`.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Keeps an `anyhow` escape hatch for ad-hoc failures
//! - Provides recovery hints for user-facing errors
//! - Groups every variant into one of five categories: not found,
//!   validation, version conflict, authentication, internal
//! - Provides structured JSON output for scripted callers

mod structured;

pub use structured::{ErrorCode, StructuredError};

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for `issuedb` operations.
#[derive(Error, Debug)]
pub enum IssueDbError {
    // === Storage Errors ===
    /// `SQLite` database error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Workspace not initialized.
    #[error("Issue database not initialized: run 'idb init' first")]
    NotInitialized,

    /// Already initialized.
    #[error("Already initialized at '{path}'")]
    AlreadyInitialized { path: PathBuf },

    // === Lookup Errors ===
    /// Issue with the specified ID was not found.
    #[error("Issue not found: {id}")]
    IssueNotFound { id: i64 },

    /// No user matches the given id, email or username.
    #[error("User not found: {reference}")]
    UserNotFound { reference: String },

    // === Concurrency Errors ===
    /// The caller's expected version is stale.
    #[error("Version conflict. Current version is {current}, but you provided {supplied}")]
    VersionConflict { current: i64, supplied: i64 },

    // === Validation Errors ===
    /// Field validation failed.
    #[error("Validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Multiple validation errors occurred.
    #[error("Validation errors: {}", format_validation_errors(errors))]
    ValidationErrors { errors: Vec<ValidationError> },

    /// Invalid status value.
    #[error("Invalid status '{status}'. Must be one of: open, in_progress, resolved, closed")]
    InvalidStatus { status: String },

    /// Invalid priority value.
    #[error("Invalid priority '{priority}'. Must be one of: low, medium, high, critical")]
    InvalidPriority { priority: String },

    /// A label id list did not fully resolve.
    #[error("One or more label IDs are invalid")]
    InvalidLabelIds { requested: usize, resolved: usize },

    /// A bulk issue id list did not fully resolve.
    #[error("One or more issue IDs are invalid")]
    InvalidIssueIds { requested: usize, resolved: usize },

    /// Email is already registered to another user.
    #[error("Email already registered")]
    EmailTaken { email: String },

    /// Username is already registered to another user.
    #[error("Username already taken")]
    UsernameTaken { username: String },

    /// A label with the same name exists.
    #[error("Label already exists")]
    LabelExists { name: String },

    /// Import input is not a CSV upload.
    #[error("File must be a CSV")]
    NotCsv { path: PathBuf },

    // === Authentication Errors ===
    /// Credential missing or not recognised.
    #[error("Authentication failed: {reason}")]
    Auth { reason: String },

    // === Configuration Errors ===
    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// CSV decoding error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Wrapped anyhow error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A single field validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field that failed validation.
    pub field: String,
    /// The reason for the validation failure.
    pub message: String,
}

impl ValidationError {
    /// Create a new validation error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl IssueDbError {
    /// Can the user fix this without code changes?
    #[must_use]
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotInitialized
                | Self::AlreadyInitialized { .. }
                | Self::IssueNotFound { .. }
                | Self::UserNotFound { .. }
                | Self::VersionConflict { .. }
                | Self::Validation { .. }
                | Self::ValidationErrors { .. }
                | Self::InvalidStatus { .. }
                | Self::InvalidPriority { .. }
                | Self::InvalidLabelIds { .. }
                | Self::InvalidIssueIds { .. }
                | Self::EmailTaken { .. }
                | Self::UsernameTaken { .. }
                | Self::LabelExists { .. }
                | Self::NotCsv { .. }
                | Self::Auth { .. }
        )
    }

    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run: idb init"),
            Self::AlreadyInitialized { .. } => Some("Use --force to reinitialize"),
            Self::VersionConflict { .. } => {
                Some("Re-fetch the issue with 'idb show' and retry with the current version")
            }
            Self::InvalidStatus { .. } => {
                Some("Valid statuses: open, in_progress, resolved, closed")
            }
            Self::InvalidPriority { .. } => Some("Valid priorities: low, medium, high, critical"),
            Self::InvalidLabelIds { .. } => Some("Run 'idb label list' to see label ids"),
            Self::InvalidIssueIds { .. } => Some("Run 'idb list' to see issue ids"),
            Self::Auth { .. } => {
                Some("Pass --actor <email|username> or set IDB_ACTOR to a registered user")
            }
            Self::NotCsv { .. } => Some("Rename the file with a .csv extension"),
            _ => None,
        }
    }

    /// Get the process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        StructuredError::from_error(self).code.exit_code()
    }

    /// Create a validation error for a specific field.
    #[must_use]
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create from multiple validation errors.
    #[must_use]
    pub fn from_validation_errors(errors: Vec<ValidationError>) -> Self {
        if errors.len() == 1 {
            let err = &errors[0];
            Self::Validation {
                field: err.field.clone(),
                reason: err.message.clone(),
            }
        } else {
            Self::ValidationErrors { errors }
        }
    }
}

/// Result type using `IssueDbError`.
pub type Result<T> = std::result::Result<T, IssueDbError>;

//! Structured error output for scripted callers.
//!
//! Provides machine-parseable error information with:
//! - Error codes for categorization
//! - Hints for self-correction
//! - Retryability flags
//! - Context for debugging
//!
//! Every code also carries the HTTP status the equivalent request would
//! produce, so a thin HTTP layer can expose the operations verbatim.

#![allow(clippy::option_if_let_else)]

use crate::error::IssueDbError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Machine-readable error codes.
///
/// These codes are stable and can be used for programmatic error handling.
/// Format: `SCREAMING_SNAKE_CASE` for easy parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // === Database Errors (exit code 2) ===
    /// Database operation failed
    DatabaseError,
    /// Workspace not initialized
    NotInitialized,
    /// Already initialized
    AlreadyInitialized,

    // === Lookup Errors (exit code 3) ===
    /// Issue with specified ID not found
    IssueNotFound,
    /// User reference did not resolve
    UserNotFound,

    // === Validation Errors (exit code 4) ===
    /// Generic validation failure
    ValidationFailed,
    /// Invalid status value
    InvalidStatus,
    /// Invalid priority value
    InvalidPriority,
    /// Id list did not fully resolve
    InvalidReference,
    /// Unique value already in use
    AlreadyExists,
    /// Import upload is not a CSV file
    UnsupportedFile,

    // === Concurrency Errors (exit code 5) ===
    /// Expected version is stale
    VersionConflict,

    // === Authentication Errors (exit code 6) ===
    /// Credential missing or unknown
    AuthFailed,

    // === Config Errors (exit code 7) ===
    /// Configuration error
    ConfigError,

    // === I/O Errors (exit code 8) ===
    /// File system error
    IoError,
    /// JSON error
    JsonError,
    /// YAML error
    YamlError,
    /// CSV decoding error
    CsvError,

    // === Internal (exit code 1) ===
    /// Unexpected failure
    InternalError,
}

impl ErrorCode {
    /// Get the string representation of this error code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DatabaseError => "DATABASE_ERROR",
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::IssueNotFound => "ISSUE_NOT_FOUND",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::InvalidStatus => "INVALID_STATUS",
            Self::InvalidPriority => "INVALID_PRIORITY",
            Self::InvalidReference => "INVALID_REFERENCE",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::UnsupportedFile => "UNSUPPORTED_FILE",
            Self::VersionConflict => "VERSION_CONFLICT",
            Self::AuthFailed => "AUTH_FAILED",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::YamlError => "YAML_ERROR",
            Self::CsvError => "CSV_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether this error is potentially retryable.
    ///
    /// A version conflict is retryable after re-reading the issue; validation
    /// failures are retryable once the input is fixed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::VersionConflict
                | Self::ValidationFailed
                | Self::InvalidStatus
                | Self::InvalidPriority
                | Self::InvalidReference
        )
    }

    /// Get the exit code for this error category.
    ///
    /// - 1: Internal/unknown errors
    /// - 2: Database errors
    /// - 3: Lookup errors
    /// - 4: Validation errors
    /// - 5: Version conflicts
    /// - 6: Authentication errors
    /// - 7: Config errors
    /// - 8: I/O errors
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::DatabaseError | Self::NotInitialized | Self::AlreadyInitialized => 2,
            Self::IssueNotFound | Self::UserNotFound => 3,
            Self::ValidationFailed
            | Self::InvalidStatus
            | Self::InvalidPriority
            | Self::InvalidReference
            | Self::AlreadyExists
            | Self::UnsupportedFile => 4,
            Self::VersionConflict => 5,
            Self::AuthFailed => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError | Self::YamlError | Self::CsvError => 8,
            Self::InternalError => 1,
        }
    }

    /// HTTP status an equivalent API request would answer with.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::IssueNotFound | Self::UserNotFound => 404,
            Self::ValidationFailed
            | Self::InvalidStatus
            | Self::InvalidPriority
            | Self::InvalidReference
            | Self::AlreadyExists
            | Self::UnsupportedFile
            | Self::CsvError => 400,
            Self::VersionConflict => 409,
            Self::AuthFailed => 401,
            Self::DatabaseError
            | Self::NotInitialized
            | Self::AlreadyInitialized
            | Self::ConfigError
            | Self::IoError
            | Self::JsonError
            | Self::YamlError
            | Self::InternalError => 500,
        }
    }
}

/// Structured error for machine-parseable output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional hint for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether the operation can be retried
    pub retryable: bool,
    /// Additional context data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl StructuredError {
    /// Create a new structured error from an `IssueDbError`.
    #[must_use]
    pub fn from_error(err: &IssueDbError) -> Self {
        let (code, context) = Self::extract_code_and_context(err);
        let hint = Self::generate_hint(err);

        Self {
            code,
            message: err.to_string(),
            hint,
            retryable: code.is_retryable(),
            context,
        }
    }

    /// Serialize to JSON value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "error": {
                "code": self.code.as_str(),
                "status": self.code.http_status(),
                "message": self.message,
                "hint": self.hint,
                "retryable": self.retryable,
                "context": self.context,
            }
        })
    }

    /// Format for human-readable output.
    #[must_use]
    pub fn to_human(&self, color: bool) -> String {
        let mut output = String::new();

        if color {
            output.push_str("\x1b[31mError:\x1b[0m ");
        } else {
            output.push_str("Error: ");
        }

        output.push_str(&self.message);

        if let Some(hint) = &self.hint {
            output.push('\n');
            if color {
                output.push_str("\x1b[33mHint:\x1b[0m ");
            } else {
                output.push_str("Hint: ");
            }
            output.push_str(hint);
        }

        output
    }

    fn extract_code_and_context(err: &IssueDbError) -> (ErrorCode, Option<Value>) {
        match err {
            IssueDbError::Database(_) => (ErrorCode::DatabaseError, None),
            IssueDbError::NotInitialized => (ErrorCode::NotInitialized, None),
            IssueDbError::AlreadyInitialized { path } => (
                ErrorCode::AlreadyInitialized,
                Some(json!({"path": path.display().to_string()})),
            ),
            IssueDbError::IssueNotFound { id } => {
                (ErrorCode::IssueNotFound, Some(json!({"issue_id": id})))
            }
            IssueDbError::UserNotFound { reference } => {
                (ErrorCode::UserNotFound, Some(json!({"user": reference})))
            }
            IssueDbError::VersionConflict { current, supplied } => (
                ErrorCode::VersionConflict,
                Some(json!({"current_version": current, "supplied_version": supplied})),
            ),
            IssueDbError::Validation { field, reason } => (
                ErrorCode::ValidationFailed,
                Some(json!({"field": field, "reason": reason})),
            ),
            IssueDbError::ValidationErrors { errors } => (
                ErrorCode::ValidationFailed,
                Some(json!({
                    "errors": errors.iter()
                        .map(|e| json!({"field": e.field, "message": e.message}))
                        .collect::<Vec<_>>()
                })),
            ),
            IssueDbError::InvalidStatus { status } => {
                (ErrorCode::InvalidStatus, Some(json!({"status": status})))
            }
            IssueDbError::InvalidPriority { priority } => (
                ErrorCode::InvalidPriority,
                Some(json!({"priority": priority})),
            ),
            IssueDbError::InvalidLabelIds {
                requested,
                resolved,
            }
            | IssueDbError::InvalidIssueIds {
                requested,
                resolved,
            } => (
                ErrorCode::InvalidReference,
                Some(json!({"requested": requested, "resolved": resolved})),
            ),
            IssueDbError::EmailTaken { email } => {
                (ErrorCode::AlreadyExists, Some(json!({"email": email})))
            }
            IssueDbError::UsernameTaken { username } => (
                ErrorCode::AlreadyExists,
                Some(json!({"username": username})),
            ),
            IssueDbError::LabelExists { name } => {
                (ErrorCode::AlreadyExists, Some(json!({"name": name})))
            }
            IssueDbError::NotCsv { path } => (
                ErrorCode::UnsupportedFile,
                Some(json!({"path": path.display().to_string()})),
            ),
            IssueDbError::Auth { .. } => (ErrorCode::AuthFailed, None),
            IssueDbError::Config(_) => (ErrorCode::ConfigError, None),
            IssueDbError::Io(_) => (ErrorCode::IoError, None),
            IssueDbError::Json(_) => (ErrorCode::JsonError, None),
            IssueDbError::Yaml(_) => (ErrorCode::YamlError, None),
            IssueDbError::Csv(_) => (ErrorCode::CsvError, None),
            IssueDbError::Other(_) => (ErrorCode::InternalError, None),
        }
    }

    fn generate_hint(err: &IssueDbError) -> Option<String> {
        match err {
            IssueDbError::InvalidStatus { status } => detect_status_intent(status)
                .map(|detected| format!("Did you mean --status {detected}?"))
                .or_else(|| err.suggestion().map(str::to_string)),
            IssueDbError::InvalidPriority { priority } => detect_priority_intent(priority)
                .map(|detected| format!("Did you mean --priority {detected}?"))
                .or_else(|| err.suggestion().map(str::to_string)),
            IssueDbError::IssueNotFound { .. } => {
                Some("Run 'idb list' to see available issues.".to_string())
            }
            IssueDbError::UserNotFound { .. } => {
                Some("Run 'idb user list' to see registered users.".to_string())
            }
            _ => err.suggestion().map(str::to_string),
        }
    }
}

/// Status synonyms for intent detection.
static STATUS_SYNONYMS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    [
        ("done", "resolved"),
        ("fixed", "resolved"),
        ("complete", "resolved"),
        ("completed", "resolved"),
        ("finished", "resolved"),
        ("wontfix", "closed"),
        ("archived", "closed"),
        ("wip", "in_progress"),
        ("working", "in_progress"),
        ("active", "in_progress"),
        ("started", "in_progress"),
        ("in-progress", "in_progress"),
        ("new", "open"),
        ("todo", "open"),
        ("reopened", "open"),
    ]
    .into_iter()
    .collect()
});

/// Priority synonyms for intent detection.
static PRIORITY_SYNONYMS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    [
        ("urgent", "critical"),
        ("blocker", "critical"),
        ("p0", "critical"),
        ("p1", "high"),
        ("important", "high"),
        ("p2", "medium"),
        ("normal", "medium"),
        ("p3", "low"),
        ("minor", "low"),
        ("trivial", "low"),
    ]
    .into_iter()
    .collect()
});

/// Map a mistyped status onto a valid one, if the intent is obvious.
#[must_use]
pub fn detect_status_intent(input: &str) -> Option<&'static str> {
    STATUS_SYNONYMS
        .get(input.trim().to_lowercase().as_str())
        .copied()
}

/// Map a mistyped priority onto a valid one, if the intent is obvious.
#[must_use]
pub fn detect_priority_intent(input: &str) -> Option<&'static str> {
    PRIORITY_SYNONYMS
        .get(input.trim().to_lowercase().as_str())
        .copied()
}

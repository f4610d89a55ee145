//! Validation helpers for `issuedb`.
//!
//! These routines enforce data constraints on caller input and return
//! structured validation errors without touching storage.

use crate::error::ValidationError;
use crate::storage::{IssuePatch, NewIssue, NewLabel, NewUser};
use regex::Regex;
use std::sync::LazyLock;

/// Maximum title length in characters.
pub const MAX_TITLE_LEN: usize = 500;
/// Maximum description size in bytes.
pub const MAX_DESCRIPTION_BYTES: usize = 102_400;
/// Maximum label name length.
pub const MAX_LABEL_NAME_LEN: usize = 50;
/// Maximum username length.
pub const MAX_USERNAME_LEN: usize = 50;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex"));

static COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("color regex"));

fn check_title(title: &str, errors: &mut Vec<ValidationError>) {
    if title.trim().is_empty() {
        errors.push(ValidationError::new("title", "cannot be empty"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        errors.push(ValidationError::new(
            "title",
            format!("exceeds {MAX_TITLE_LEN} characters"),
        ));
    }
}

fn check_description(description: Option<&str>, errors: &mut Vec<ValidationError>) {
    if description.is_some_and(|d| d.len() > MAX_DESCRIPTION_BYTES) {
        errors.push(ValidationError::new("description", "exceeds 100KB"));
    }
}

fn finish(errors: Vec<ValidationError>) -> Result<(), Vec<ValidationError>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates issue creation and patch input.
pub struct IssueValidator;

impl IssueValidator {
    /// Validate a new issue.
    ///
    /// # Errors
    ///
    /// Returns every rule the input violates.
    pub fn validate_new(issue: &NewIssue) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        check_title(&issue.title, &mut errors);
        check_description(issue.description.as_deref(), &mut errors);
        finish(errors)
    }

    /// Validate the supplied fields of a patch.
    ///
    /// # Errors
    ///
    /// Returns every rule the input violates.
    pub fn validate_patch(patch: &IssuePatch) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if let Some(title) = &patch.title {
            check_title(title, &mut errors);
        }
        if let Some(description) = &patch.description {
            check_description(description.as_deref(), &mut errors);
        }
        if patch.expected_version < 1 {
            errors.push(ValidationError::new("version", "must be a positive integer"));
        }
        finish(errors)
    }
}

/// Validates user registration input.
pub struct UserValidator;

impl UserValidator {
    /// # Errors
    ///
    /// Returns every rule the input violates.
    pub fn validate(user: &NewUser) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if !EMAIL_RE.is_match(user.email.trim()) {
            errors.push(ValidationError::new("email", "is not a valid email address"));
        }
        let username = user.username.trim();
        if username.is_empty() {
            errors.push(ValidationError::new("username", "cannot be empty"));
        } else if username.chars().any(char::is_whitespace) {
            errors.push(ValidationError::new("username", "cannot contain whitespace"));
        }
        if username.chars().count() > MAX_USERNAME_LEN {
            errors.push(ValidationError::new(
                "username",
                format!("exceeds {MAX_USERNAME_LEN} characters"),
            ));
        }
        finish(errors)
    }
}

/// Validates label input.
pub struct LabelValidator;

impl LabelValidator {
    /// # Errors
    ///
    /// Returns every rule the input violates.
    pub fn validate(label: &NewLabel) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let name = label.name.trim();
        if name.is_empty() {
            errors.push(ValidationError::new("name", "cannot be empty"));
        }
        if name.chars().count() > MAX_LABEL_NAME_LEN {
            errors.push(ValidationError::new(
                "name",
                format!("exceeds {MAX_LABEL_NAME_LEN} characters"),
            ));
        }
        if !COLOR_RE.is_match(&label.color) {
            errors.push(ValidationError::new("color", "must be a hex color like #6b7280"));
        }
        finish(errors)
    }
}

/// Validates comment bodies.
pub struct CommentValidator;

impl CommentValidator {
    /// # Errors
    ///
    /// Returns an error when the body is blank.
    pub fn validate_body(body: &str) -> Result<(), Vec<ValidationError>> {
        if body.trim().is_empty() {
            return Err(vec![ValidationError::new("body", "cannot be empty")]);
        }
        Ok(())
    }
}

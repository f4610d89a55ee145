//! CSV import: per-row isolation and the batch commit decision.

mod common;

use common::fixtures;
use common::{test_db, test_db_with_actor, test_log};
use issuedb::error::IssueDbError;
use issuedb::import::{import_csv_file, import_csv_str};
use issuedb::model::{ChangeType, Priority, Status};
use issuedb::storage::ListFilters;
use std::fs;
use tempfile::TempDir;

const MIXED: &str = "\
title,description,status,priority,assignee_email
Login page 500s,Seen after deploy,open,high,tester@example.com
Update dependencies,,in_progress,low,
Dark mode,,open,extreme,
,Nobody wrote a title,open,low,
";

#[test]
fn overlong_title_fails_its_row_with_a_plain_message() {
    let _log = test_log("overlong_title_fails_its_row_with_a_plain_message");
    let (mut storage, actor) = test_db_with_actor();
    let input = format!("title\n{}\nShort enough\n", "a".repeat(600));

    let result = import_csv_str(&mut storage, &input, Some(actor.id)).unwrap();
    assert_eq!(result.successful, 1);
    assert_eq!(result.failed, 1);
    assert_eq!(result.errors[0].row, 2);
    assert_eq!(result.errors[0].error, "Title exceeds 500 characters");
    assert_eq!(storage.count_issues().unwrap(), 1);
}

#[test]
fn failed_rows_report_untrimmed_cells() {
    let _log = test_log("failed_rows_report_untrimmed_cells");
    let (mut storage, actor) = test_db_with_actor();
    let input = "title,priority\n  Padded  , extreme \n";

    let result = import_csv_str(&mut storage, input, Some(actor.id)).unwrap();
    assert_eq!(result.failed, 1);
    assert_eq!(
        result.errors[0].data.get("title").map(String::as_str),
        Some("  Padded  ")
    );
    assert_eq!(
        result.errors[0].error,
        "Invalid priority 'extreme'. Must be one of: low, medium, high, critical"
    );
}

#[test]
fn mixed_batch_commits_valid_rows_only() {
    let _log = test_log("mixed_batch_commits_valid_rows_only");
    let (mut storage, actor) = test_db_with_actor();

    let result = import_csv_str(&mut storage, MIXED, Some(actor.id)).unwrap();
    assert_eq!(result.total_rows, 4);
    assert_eq!(result.successful, 2);
    assert_eq!(result.failed, 2);

    let rows: Vec<usize> = result.errors.iter().map(|e| e.row).collect();
    assert_eq!(rows, vec![4, 5]);
    assert_eq!(
        result.errors[0].error,
        "Invalid priority 'extreme'. Must be one of: low, medium, high, critical"
    );
    assert_eq!(result.errors[1].error, "Title is required");
    assert_eq!(
        result.errors[1].data.get("description").map(String::as_str),
        Some("Nobody wrote a title")
    );

    let issues = storage.list_issues(&ListFilters::default()).unwrap();
    assert_eq!(issues.len(), 2);
    let login = issues.iter().find(|i| i.title == "Login page 500s").unwrap();
    assert_eq!(login.priority, Priority::High);
    assert_eq!(login.assignee_id, Some(actor.id));
    assert_eq!(login.creator_id, Some(actor.id));
    assert_eq!(login.version, 1);

    let history = storage.timeline(login.id).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].change_type, ChangeType::Created);
    assert_eq!(
        history[0].new_value.as_deref(),
        Some("Issue created via CSV import")
    );
}

#[test]
fn all_invalid_batch_persists_nothing() {
    let _log = test_log("all_invalid_batch_persists_nothing");
    let mut storage = test_db();
    let input = "title,status\n,open\nBroken,done\n";

    let result = import_csv_str(&mut storage, input, None).unwrap();
    assert_eq!(result.total_rows, 2);
    assert_eq!(result.successful, 0);
    assert_eq!(result.failed, 2);
    assert_eq!(
        result.errors[1].error,
        "Invalid status 'done'. Must be one of: open, in_progress, resolved, closed"
    );
    assert_eq!(storage.count_issues().unwrap(), 0);
}

#[test]
fn unknown_assignee_email_leaves_issue_unassigned() {
    let _log = test_log("unknown_assignee_email_leaves_issue_unassigned");
    let mut storage = test_db();
    let input = "title,assignee_email\nOrphan,ghost@example.com\n";

    let result = import_csv_str(&mut storage, input, None).unwrap();
    assert_eq!(result.successful, 1);
    let issue = storage.require_issue(1).unwrap();
    assert_eq!(issue.assignee_id, None);
}

#[test]
fn defaults_and_terminal_rows() {
    let _log = test_log("defaults_and_terminal_rows");
    let (mut storage, actor) = test_db_with_actor();
    let input = "title,status\nPlain,\nAlready done,closed\n";

    import_csv_str(&mut storage, input, Some(actor.id)).unwrap();
    let issues = storage.list_issues(&ListFilters::default()).unwrap();

    let plain = issues.iter().find(|i| i.title == "Plain").unwrap();
    assert_eq!(plain.status, Status::Open);
    assert_eq!(plain.priority, Priority::Medium);
    assert!(plain.resolved_at.is_none());

    let done = issues.iter().find(|i| i.title == "Already done").unwrap();
    assert_eq!(done.status, Status::Closed);
    assert_eq!(done.resolved_at, Some(done.created_at));
}

#[test]
fn header_only_file_imports_nothing() {
    let _log = test_log("header_only_file_imports_nothing");
    let mut storage = test_db();
    let result = import_csv_str(&mut storage, "title,priority\n", None).unwrap();
    assert_eq!(result.total_rows, 0);
    assert_eq!(result.successful, 0);
    assert!(result.errors.is_empty());
}

#[test]
fn non_csv_name_is_rejected_before_reading() {
    let _log = test_log("non_csv_name_is_rejected_before_reading");
    let mut storage = test_db();
    let dir = TempDir::new().unwrap();

    // The file does not exist: the name check must fire first.
    let err = import_csv_file(&mut storage, &dir.path().join("issues.txt"), None).unwrap_err();
    assert!(matches!(err, IssueDbError::NotCsv { .. }));
    assert_eq!(err.to_string(), "File must be a CSV");

    let err = import_csv_file(&mut storage, &dir.path().join("missing.csv"), None).unwrap_err();
    assert!(matches!(err, IssueDbError::Io(_)));
}

#[test]
fn import_from_file_matches_in_memory_import() {
    let _log = test_log("import_from_file_matches_in_memory_import");
    let (mut storage, actor) = test_db_with_actor();
    let bob = fixtures::user(&mut storage, "bob");
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("backlog.CSV");
    fs::write(
        &path,
        "title,priority,assignee_email\nOne,critical,bob@example.com\nTwo,,\n",
    )
    .unwrap();

    let result = import_csv_file(&mut storage, &path, Some(actor.id)).unwrap();
    assert_eq!(result.successful, 2);
    let filters = ListFilters {
        assignee_id: Some(bob.id),
        ..ListFilters::default()
    };
    let assigned = storage.list_issues(&filters).unwrap();
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].priority, Priority::Critical);
}

#[test]
fn non_utf8_file_aborts_whole_import() {
    let _log = test_log("non_utf8_file_aborts_whole_import");
    let mut storage = test_db();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("latin1.csv");
    fs::write(&path, b"title\nCaf\xe9\n").unwrap();

    assert!(import_csv_file(&mut storage, &path, None).is_err());
    assert_eq!(storage.count_issues().unwrap(), 0);
}

//! Comment, label and cascade behaviour with real `SQLite`.

mod common;

use common::fixtures::{self, IssueBuilder};
use common::{test_db_with_actor, test_log};
use issuedb::error::IssueDbError;
use issuedb::model::ChangeType;
use issuedb::storage::{NewLabel, STANDARD_LABELS};

#[test]
fn replace_labels_records_old_and_new_names() {
    let _log = test_log("replace_labels_records_old_and_new_names");
    let (mut storage, actor) = test_db_with_actor();
    let bug = fixtures::label(&mut storage, "bug");
    let urgent = fixtures::label(&mut storage, "urgent");
    let docs = fixtures::label(&mut storage, "documentation");
    let issue = fixtures::issue(&mut storage, "Broken link in README", &actor);

    let labels = storage
        .replace_labels(issue.id, &[bug.id, urgent.id], Some(actor.id))
        .unwrap();
    assert_eq!(labels.len(), 2);

    storage
        .replace_labels(issue.id, &[docs.id], Some(actor.id))
        .unwrap();
    storage.replace_labels(issue.id, &[], Some(actor.id)).unwrap();

    let history = storage.timeline(issue.id).unwrap();
    let label_entries: Vec<_> = history
        .iter()
        .filter(|e| e.change_type == ChangeType::LabelsUpdated)
        .collect();
    assert_eq!(label_entries.len(), 3);

    // Newest first.
    assert_eq!(label_entries[0].old_value.as_deref(), Some("documentation"));
    assert_eq!(label_entries[0].new_value.as_deref(), Some("none"));
    assert_eq!(label_entries[1].old_value.as_deref(), Some("bug, urgent"));
    assert_eq!(label_entries[1].new_value.as_deref(), Some("documentation"));
    assert_eq!(label_entries[2].old_value.as_deref(), Some("none"));
    assert_eq!(label_entries[2].field_name.as_deref(), Some("labels"));

    // Labels do not touch the version token.
    assert_eq!(storage.require_issue(issue.id).unwrap().version, 1);
}

#[test]
fn replace_labels_with_invalid_id_changes_nothing() {
    let _log = test_log("replace_labels_with_invalid_id_changes_nothing");
    let (mut storage, actor) = test_db_with_actor();
    let bug = fixtures::label(&mut storage, "bug");
    let issue = IssueBuilder::new("Labelled")
        .with_labels(&[&bug])
        .create(&mut storage, &actor);

    let err = storage
        .replace_labels(issue.id, &[bug.id, 999], Some(actor.id))
        .unwrap_err();
    assert!(matches!(
        err,
        IssueDbError::InvalidLabelIds {
            requested: 2,
            resolved: 1
        }
    ));
    assert_eq!(err.to_string(), "One or more label IDs are invalid");

    let labels = storage.get_labels(issue.id).unwrap();
    assert_eq!(labels.len(), 1);
    assert_eq!(labels[0].name, "bug");
    assert_eq!(storage.timeline(issue.id).unwrap().len(), 1);
}

#[test]
fn replace_labels_on_missing_issue_is_not_found() {
    let _log = test_log("replace_labels_on_missing_issue_is_not_found");
    let (mut storage, actor) = test_db_with_actor();
    let err = storage.replace_labels(77, &[], Some(actor.id)).unwrap_err();
    assert!(matches!(err, IssueDbError::IssueNotFound { id: 77 }));
}

#[test]
fn label_names_are_unique_and_colors_checked() {
    let _log = test_log("label_names_are_unique_and_colors_checked");
    let (mut storage, _actor) = test_db_with_actor();
    let label = fixtures::label(&mut storage, "bug");
    assert_eq!(label.color, "#6b7280");

    let err = storage.create_label(&NewLabel::named("bug")).unwrap_err();
    assert_eq!(err.to_string(), "Label already exists");

    let err = storage
        .create_label(&NewLabel {
            name: "pink".to_string(),
            color: "pink".to_string(),
        })
        .unwrap_err();
    assert!(err.to_string().contains("color"));
}

#[test]
fn seeding_skips_existing_labels() {
    let _log = test_log("seeding_skips_existing_labels");
    let (mut storage, _actor) = test_db_with_actor();
    fixtures::label(&mut storage, "bug");

    let created = storage.seed_labels().unwrap();
    assert_eq!(created.len(), STANDARD_LABELS.len() - 1);
    assert!(created.iter().all(|l| l.name != "bug"));

    let names: Vec<String> = storage
        .list_labels()
        .unwrap()
        .into_iter()
        .map(|l| l.name)
        .collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted, "labels are listed by name");
}

#[test]
fn comment_adds_history_in_same_transaction() {
    let _log = test_log("comment_adds_history_in_same_transaction");
    let (mut storage, actor) = test_db_with_actor();
    let issue = fixtures::issue(&mut storage, "Needs triage", &actor);

    let first = storage
        .add_comment(issue.id, Some(actor.id), "Reproduced on main")
        .unwrap();
    let second = storage
        .add_comment(issue.id, Some(actor.id), "Bisected to 4f2c")
        .unwrap();
    assert_eq!(first.author_id, Some(actor.id));
    assert_eq!(first.created_at, first.updated_at);

    let comments = storage.get_comments(issue.id).unwrap();
    assert_eq!(
        comments.iter().map(|c| c.id).collect::<Vec<_>>(),
        vec![first.id, second.id],
        "comments are listed oldest first"
    );

    let history = storage.timeline(issue.id).unwrap();
    let added: Vec<_> = history
        .iter()
        .filter(|e| e.change_type == ChangeType::CommentAdded)
        .collect();
    assert_eq!(added.len(), 2);
    assert_eq!(added[0].new_value.as_deref(), Some("Added comment"));
    assert_eq!(storage.require_issue(issue.id).unwrap().version, 1);
}

#[test]
fn blank_comment_and_missing_issue_fail() {
    let _log = test_log("blank_comment_and_missing_issue_fail");
    let (mut storage, actor) = test_db_with_actor();
    let issue = fixtures::issue(&mut storage, "Quiet issue", &actor);

    let err = storage
        .add_comment(issue.id, Some(actor.id), "   ")
        .unwrap_err();
    assert_eq!(err.to_string(), "Validation failed: body: cannot be empty");

    let err = storage
        .add_comment(999, Some(actor.id), "hello")
        .unwrap_err();
    assert!(matches!(err, IssueDbError::IssueNotFound { id: 999 }));
    assert!(storage.get_comments(issue.id).unwrap().is_empty());
}

#[test]
fn deleting_issue_cascades_to_comments_history_and_labels() {
    let _log = test_log("deleting_issue_cascades_to_comments_history_and_labels");
    let (mut storage, actor) = test_db_with_actor();
    let bug = fixtures::label(&mut storage, "bug");
    let issue = IssueBuilder::new("Doomed")
        .with_labels(&[&bug])
        .create(&mut storage, &actor);
    storage
        .add_comment(issue.id, Some(actor.id), "bye")
        .unwrap();

    storage.delete_issue(issue.id).unwrap();

    assert!(storage.get_issue(issue.id).unwrap().is_none());
    assert!(storage.get_comments(issue.id).unwrap().is_empty());
    assert!(storage.get_labels(issue.id).unwrap().is_empty());
    assert!(matches!(
        storage.timeline(issue.id).unwrap_err(),
        IssueDbError::IssueNotFound { .. }
    ));
    // The label itself survives.
    assert_eq!(storage.list_labels().unwrap().len(), 1);
}

#[test]
fn deleting_user_nulls_references() {
    let _log = test_log("deleting_user_nulls_references");
    let (mut storage, actor) = test_db_with_actor();
    let bob = fixtures::user(&mut storage, "bob");
    let issue = IssueBuilder::new("Owned by bob")
        .with_assignee(&bob)
        .create(&mut storage, &bob);
    storage.add_comment(issue.id, Some(bob.id), "mine").unwrap();
    storage.add_comment(issue.id, Some(actor.id), "ok").unwrap();

    storage.delete_user(bob.id).unwrap();

    let stored = storage.require_issue(issue.id).unwrap();
    assert_eq!(stored.creator_id, None);
    assert_eq!(stored.assignee_id, None);

    let comments = storage.get_comments(issue.id).unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].author_id, None);
    assert_eq!(comments[1].author_id, Some(actor.id));

    let history = storage.timeline(issue.id).unwrap();
    assert_eq!(history.len(), 3, "history survives the actor");
    let created = history
        .iter()
        .find(|e| e.change_type == ChangeType::Created)
        .unwrap();
    assert_eq!(created.actor_id, None);

    assert!(matches!(
        storage.delete_user(bob.id).unwrap_err(),
        IssueDbError::UserNotFound { .. }
    ));
}

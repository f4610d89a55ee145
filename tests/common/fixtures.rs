#![allow(dead_code)]

use issuedb::model::{Issue, Label, Priority, Status, User};
use issuedb::storage::{NewIssue, NewLabel, NewUser, SqliteStorage};

/// Register `name` as `name@example.com`.
pub fn user(storage: &mut SqliteStorage, name: &str) -> User {
    storage
        .create_user(&NewUser {
            email: format!("{name}@example.com"),
            username: name.to_string(),
            full_name: None,
        })
        .expect("create user")
}

pub fn label(storage: &mut SqliteStorage, name: &str) -> Label {
    storage
        .create_label(&NewLabel::named(name))
        .expect("create label")
}

pub fn issue(storage: &mut SqliteStorage, title: &str, actor: &User) -> Issue {
    storage
        .create_issue(&NewIssue::titled(title), Some(actor.id))
        .expect("create issue")
}

pub struct IssueBuilder {
    issue: NewIssue,
}

impl IssueBuilder {
    pub fn new(title: &str) -> Self {
        Self {
            issue: NewIssue::titled(title),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.issue.description = Some(description.to_string());
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.issue.status = status;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.issue.priority = priority;
        self
    }

    pub fn with_assignee(mut self, user: &User) -> Self {
        self.issue.assignee_id = Some(user.id);
        self
    }

    pub fn with_labels(mut self, labels: &[&Label]) -> Self {
        self.issue.label_ids = labels.iter().map(|l| l.id).collect();
        self
    }

    pub fn build(self) -> NewIssue {
        self.issue
    }

    pub fn create(self, storage: &mut SqliteStorage, actor: &User) -> Issue {
        storage
            .create_issue(&self.issue, Some(actor.id))
            .expect("create issue")
    }
}

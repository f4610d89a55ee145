use crate::model::{Comment, Issue, Priority, Status, User};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Issue with its comments for the show view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IssueDetails {
    #[serde(flatten)]
    pub issue: Issue,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// Issue counts per status. Every status is always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StatusCounts {
    pub open: usize,
    pub in_progress: usize,
    pub resolved: usize,
    pub closed: usize,
}

impl StatusCounts {
    pub fn add(&mut self, status: Status, count: usize) {
        match status {
            Status::Open => self.open += count,
            Status::InProgress => self.in_progress += count,
            Status::Resolved => self.resolved += count,
            Status::Closed => self.closed += count,
        }
    }

    #[must_use]
    pub const fn get(&self, status: Status) -> usize {
        match status {
            Status::Open => self.open,
            Status::InProgress => self.in_progress,
            Status::Resolved => self.resolved,
            Status::Closed => self.closed,
        }
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.open + self.in_progress + self.resolved + self.closed
    }
}

/// Issue counts per priority. Every priority is always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PriorityCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub critical: usize,
}

impl PriorityCounts {
    pub fn add(&mut self, priority: Priority, count: usize) {
        match priority {
            Priority::Low => self.low += count,
            Priority::Medium => self.medium += count,
            Priority::High => self.high += count,
            Priority::Critical => self.critical += count,
        }
    }

    #[must_use]
    pub const fn get(&self, priority: Priority) -> usize {
        match priority {
            Priority::Low => self.low,
            Priority::Medium => self.medium,
            Priority::High => self.high,
            Priority::Critical => self.critical,
        }
    }
}

/// Mean resolution hours per priority; 0 for buckets with no data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PriorityHours {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl PriorityHours {
    #[must_use]
    pub const fn get(&self, priority: Priority) -> f64 {
        match priority {
            Priority::Low => self.low,
            Priority::Medium => self.medium,
            Priority::High => self.high,
            Priority::Critical => self.critical,
        }
    }
}

/// One row of the top-assignees report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AssigneeStats {
    pub assignee: User,
    pub issue_count: usize,
    pub by_status: StatusCounts,
}

/// Resolution time report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ResolutionStats {
    pub total_resolved: usize,
    pub average_resolution_hours: f64,
    pub by_priority: PriorityHours,
}

/// Dashboard summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Dashboard {
    pub total_issues: usize,
    pub by_status: StatusCounts,
    pub by_priority: PriorityCounts,
    pub recent_issues: Vec<Issue>,
}

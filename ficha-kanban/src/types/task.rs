//! Delegated tasks

use super::ids::{CardId, CommentId, TaskId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Completed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Completed => f.write_str("completed"),
        }
    }
}

/// A task delegated to a collaborator, with creator and assignee names
/// resolved from the identity directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub card_id: CardId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_title: Option<String>,
    pub created_by: UserId,
    pub assigned_to: UserId,
    pub description: String,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    /// The comment that announced this task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<CommentId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set exactly when `status` is `Completed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_by_name: String,
    pub assigned_to_name: String,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Change status, keeping `completed_at` in step with it
    pub fn set_status(&mut self, status: TaskStatus, now: DateTime<Utc>) {
        self.status = status;
        self.completed_at = match status {
            TaskStatus::Completed => Some(now),
            TaskStatus::Pending => None,
        };
        self.updated_at = now;
    }

    /// Apply a partial update locally.
    ///
    /// A changed assignee gets `placeholder_name` until the directory join
    /// supplies the real name.
    pub fn apply(&mut self, patch: &TaskPatch, now: DateTime<Utc>, placeholder_name: &str) {
        if let Some(status) = patch.status {
            self.set_status(status, now);
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(assigned_to) = &patch.assigned_to {
            if assigned_to != &self.assigned_to {
                self.assigned_to = assigned_to.clone();
                self.assigned_to_name = placeholder_name.to_string();
            }
        }
        if let Some(deadline) = patch.deadline {
            self.deadline = deadline;
        }
        self.updated_at = now;
    }
}

/// Fields of a task that can be edited after creation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<UserId>,
    /// `Some(None)` clears the deadline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<Option<DateTime<Utc>>>,
}

impl TaskPatch {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_assignee(mut self, assigned_to: impl Into<UserId>) -> Self {
        self.assigned_to = Some(assigned_to.into());
        self
    }

    pub fn with_deadline(mut self, deadline: Option<DateTime<Utc>>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

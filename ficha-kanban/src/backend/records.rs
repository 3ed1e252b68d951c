//! Row shapes exchanged with the repositories

use crate::body::CommentBody;
use crate::types::{
    CardId, Comment, CommentId, Task, TaskId, TaskPatch, TaskStatus, ThreadId, UserId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored comment row.
///
/// Older rows may lack `level`, `thread_id` and the structured `body`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: CommentId,
    pub card_id: CardId,
    pub author_id: UserId,
    pub author_name: String,
    #[serde(default)]
    pub author_role: Option<String>,
    pub content: String,
    #[serde(default)]
    pub body: Option<CommentBody>,
    #[serde(default)]
    pub parent_id: Option<CommentId>,
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default)]
    pub thread_id: Option<ThreadId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CommentRecord> for Comment {
    fn from(record: CommentRecord) -> Self {
        let thread_id = record
            .thread_id
            .unwrap_or_else(|| ThreadId::from(&record.id));
        let body = record
            .body
            .unwrap_or_else(|| CommentBody::from_legacy_text(&record.content));
        Self {
            id: record.id,
            card_id: record.card_id,
            author_id: record.author_id,
            author_name: record.author_name,
            author_role: record.author_role,
            content: record.content,
            body,
            parent_id: record.parent_id,
            level: record.level.unwrap_or(0),
            thread_id,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// A comment to insert; the backend assigns id and timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCommentRecord {
    pub card_id: CardId,
    pub author_id: UserId,
    pub author_name: String,
    pub author_role: Option<String>,
    pub content: String,
    pub body: CommentBody,
    pub parent_id: Option<CommentId>,
    pub level: u32,
    /// `None` when the thread column is absent or the comment starts a thread
    pub thread_id: Option<ThreadId>,
}

/// A stored task row with joined display names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub card_id: CardId,
    #[serde(default)]
    pub card_title: Option<String>,
    pub created_by: UserId,
    pub assigned_to: UserId,
    pub description: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub comment_id: Option<CommentId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deleted_by: Option<UserId>,
    #[serde(default)]
    pub created_by_name: Option<String>,
    #[serde(default)]
    pub assigned_to_name: Option<String>,
}

impl TaskRecord {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Convert into a task, filling unresolved names with `fallback_name`
    pub fn into_task(self, fallback_name: &str) -> Task {
        Task {
            id: self.id,
            card_id: self.card_id,
            card_title: self.card_title,
            created_by: self.created_by,
            assigned_to: self.assigned_to,
            description: self.description,
            status: self.status,
            deadline: self.deadline,
            comment_id: self.comment_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            completed_at: self.completed_at,
            created_by_name: self
                .created_by_name
                .unwrap_or_else(|| fallback_name.to_string()),
            assigned_to_name: self
                .assigned_to_name
                .unwrap_or_else(|| fallback_name.to_string()),
        }
    }
}

/// A task to insert; always starts pending
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTaskRecord {
    pub card_id: CardId,
    pub created_by: UserId,
    pub assigned_to: UserId,
    pub description: String,
    pub deadline: Option<DateTime<Utc>>,
    pub comment_id: Option<CommentId>,
}

/// Column changes sent for a task update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskChanges {
    pub patch: TaskPatch,
    /// Present whenever the patch changes status
    pub completed_at: Option<Option<DateTime<Utc>>>,
    pub updated_at: DateTime<Utc>,
}

impl TaskChanges {
    pub fn new(patch: TaskPatch, now: DateTime<Utc>) -> Self {
        let completed_at = patch.status.map(|status| match status {
            TaskStatus::Completed => Some(now),
            TaskStatus::Pending => None,
        });
        Self {
            patch,
            completed_at,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CommentRecord {
        let now = Utc::now();
        CommentRecord {
            id: CommentId::from_string("c1"),
            card_id: CardId::from_string("card"),
            author_id: UserId::from_string("u1"),
            author_name: "Ana".into(),
            author_role: None,
            content: "📎 Anexo adicionado: report.pdf".into(),
            body: None,
            parent_id: None,
            level: None,
            thread_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_legacy_row_defaults() {
        let comment = Comment::from(record());
        assert_eq!(comment.level, 0);
        assert_eq!(comment.thread_id.as_str(), "c1");
        assert!(matches!(comment.body, CommentBody::AttachmentAnnouncement(_)));
    }

    #[test]
    fn test_stored_body_wins_over_text() {
        let mut row = record();
        row.body = Some(CommentBody::PlainText);
        row.thread_id = Some(ThreadId::from_string("t1"));
        let comment = Comment::from(row);
        assert_eq!(comment.body, CommentBody::PlainText);
        assert_eq!(comment.thread_id.as_str(), "t1");
    }

    #[test]
    fn test_changes_stamp_completion() {
        let now = Utc::now();
        let done = TaskChanges::new(TaskPatch::status(TaskStatus::Completed), now);
        assert_eq!(done.completed_at, Some(Some(now)));
        let reopened = TaskChanges::new(TaskPatch::status(TaskStatus::Pending), now);
        assert_eq!(reopened.completed_at, Some(None));
        let edit = TaskChanges::new(TaskPatch::default().with_description("x"), now);
        assert_eq!(edit.completed_at, None);
    }
}

//! Card comments

use super::ids::{CardId, CommentId, ThreadId, UserId};
use crate::body::CommentBody;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A comment on a card, possibly a reply within a thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub card_id: CardId,
    pub author_id: UserId,
    pub author_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_role: Option<String>,
    /// Display text
    pub content: String,
    /// Structured interpretation of the comment, decided at write time
    #[serde(default)]
    pub body: CommentBody,
    /// Absent for thread roots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CommentId>,
    /// 0 for roots, parent level + 1 for replies
    pub level: u32,
    pub thread_id: ThreadId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Whether `self` directly replies to `other`
    pub fn is_reply_to(&self, other: &CommentId) -> bool {
        self.parent_id.as_ref() == Some(other)
    }
}

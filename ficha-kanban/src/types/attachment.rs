//! Stored attachment records

use super::ids::{AttachmentId, CardId, CommentId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file uploaded to a card, optionally bound to one comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: AttachmentId,
    pub card_id: CardId,
    pub author_id: UserId,
    pub author_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_role: Option<String>,
    pub file_name: String,
    /// Storage key; not guaranteed to still resolve
    pub file_path: String,
    pub file_size: u64,
    pub file_type: String,
    pub file_extension: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<CommentId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Attachment {
    /// Uploaded to the card itself rather than through a comment
    pub fn is_card_level(&self) -> bool {
        self.comment_id.is_none()
    }

    pub fn belongs_to(&self, comment: &CommentId) -> bool {
        self.comment_id.as_ref() == Some(comment)
    }
}

//! Collaborator interfaces for the hosted backend
//!
//! The core never talks to a database, bucket or auth service directly. It
//! goes through these traits, one per entity table plus blob storage and the
//! identity provider. Implementations must report an absent table as
//! [`BackendError::NotProvisioned`](crate::BackendError::NotProvisioned) so
//! stores can treat the feature as unavailable instead of failing.

mod records;

pub use records::{CommentRecord, NewCommentRecord, NewTaskRecord, TaskChanges, TaskRecord};

use crate::error::BackendResult;
use crate::task::TaskScope;
use crate::types::{Attachment, AttachmentId, CardId, CommentId, Principal, TaskId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Table name for comments, used in diagnostics
pub const COMMENTS_TABLE: &str = "card_comments";
/// Table name for tasks
pub const TASKS_TABLE: &str = "card_tasks";
/// Table name for attachment records
pub const ATTACHMENTS_TABLE: &str = "card_attachments";

/// `card_comments` table
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// All comments of a card, ordered by `created_at` ascending
    async fn select_by_card(&self, card_id: &CardId) -> BackendResult<Vec<CommentRecord>>;

    /// Insert and return the stored row
    async fn insert(&self, comment: NewCommentRecord) -> BackendResult<CommentRecord>;

    async fn update_content(
        &self,
        id: &CommentId,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> BackendResult<()>;

    async fn delete(&self, id: &CommentId) -> BackendResult<()>;
}

/// `card_tasks` table joined with the identity directory for display names
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Tasks in scope, ordered by `created_at` descending. Soft-deleted rows
    /// may be returned; callers filter them.
    async fn select(&self, scope: &TaskScope) -> BackendResult<Vec<TaskRecord>>;

    async fn insert(&self, task: NewTaskRecord) -> BackendResult<TaskRecord>;

    async fn update(&self, id: &TaskId, changes: TaskChanges) -> BackendResult<()>;

    /// Stamp the deletion marker without removing the row
    async fn soft_delete(
        &self,
        id: &TaskId,
        deleted_at: DateTime<Utc>,
        deleted_by: &UserId,
    ) -> BackendResult<()>;
}

/// `card_attachments` table
#[async_trait]
pub trait AttachmentRepository: Send + Sync {
    /// Attachment records of a card, ordered by `created_at` ascending
    async fn select_by_card(&self, card_id: &CardId) -> BackendResult<Vec<Attachment>>;

    async fn delete(&self, id: &AttachmentId) -> BackendResult<()>;
}

/// An object listed in blob storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobEntry {
    /// Key relative to the bucket root
    pub name: String,
    pub size: Option<u64>,
}

/// Attachment file storage
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Store bytes under `path`, returning the stored key
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> BackendResult<String>;

    /// Public URL for a key; computed, never checked
    fn public_url(&self, path: &str) -> String;

    /// Objects under `prefix` (empty prefix lists the bucket root), up to `limit`
    async fn list(&self, prefix: &str, limit: usize) -> BackendResult<Vec<BlobEntry>>;

    /// Whether the object behind `path` answers
    async fn exists(&self, path: &str) -> BackendResult<bool>;

    async fn remove(&self, paths: &[String]) -> BackendResult<()>;
}

/// Authentication service
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The signed-in principal, `None` when nobody is signed in
    async fn current_user(&self) -> BackendResult<Option<Principal>>;
}

//! Error types for the CRM core

use crate::types::{CommentId, TaskId, ThreadId};
use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, FichaError>;

/// Result type for collaborator calls
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Failures reported by the hosted backend (database, storage, identity)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The table behind a feature has not been provisioned
    #[error("table not provisioned: {table}")]
    NotProvisioned { table: String },

    /// A column the client sent does not exist on the table
    #[error("column '{column}' not provisioned on {table}")]
    ColumnMissing { table: String, column: String },

    /// The addressed row does not exist
    #[error("{table} record not found: {id}")]
    NotFound { table: String, id: String },

    /// Network or service failure
    #[error("backend request failed: {message}")]
    Request { message: String },
}

impl BackendError {
    pub fn not_provisioned(table: impl Into<String>) -> Self {
        Self::NotProvisioned {
            table: table.into(),
        }
    }

    pub fn column_missing(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::ColumnMissing {
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn request(message: impl Into<String>) -> Self {
        Self::Request {
            message: message.into(),
        }
    }
}

/// Errors surfaced by the comment, task and attachment stores
#[derive(Debug, Error)]
pub enum FichaError {
    /// Reply target is not in the local comment cache
    #[error("parent comment not found: {id}")]
    ParentNotFound { id: CommentId },

    /// Reply would reach the configured depth ceiling
    #[error("reply depth limit reached: level {level} is not below the maximum of {max}")]
    DepthLimitExceeded { level: u32, max: u32 },

    /// Thread already holds the configured number of messages
    #[error("thread {thread_id} is full: {limit} messages reached")]
    ThreadLimitReached { thread_id: ThreadId, limit: usize },

    /// Comment not found
    #[error("comment not found: {id}")]
    CommentNotFound { id: CommentId },

    /// Task not found
    #[error("task not found: {id}")]
    TaskNotFound { id: TaskId },

    /// Generic resource not found (attachments)
    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    /// Missing required field
    #[error("missing required field: {field}")]
    MissingField { field: String },

    /// No authenticated principal
    #[error("no authenticated user")]
    NotAuthenticated,

    /// The feature's table is absent; treated as "feature unavailable"
    #[error("{feature} are not available: backend table not provisioned")]
    Unavailable { feature: String },

    /// A cascading delete stopped partway through
    #[error("cascade delete of {target} aborted at {failed} after removing {} comments: {source}", .deleted.len())]
    CascadeAborted {
        target: CommentId,
        failed: CommentId,
        deleted: Vec<CommentId>,
        #[source]
        source: BackendError,
    },

    /// Collaborator failure
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl FichaError {
    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create an unavailable-feature error
    pub fn unavailable(feature: impl Into<String>) -> Self {
        Self::Unavailable {
            feature: feature.into(),
        }
    }

    /// Rejected before reaching the backend
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ParentNotFound { .. }
                | Self::DepthLimitExceeded { .. }
                | Self::ThreadLimitReached { .. }
                | Self::MissingField { .. }
                | Self::NotAuthenticated
        )
    }

    /// The backend table is absent
    pub fn is_not_provisioned(&self) -> bool {
        matches!(
            self,
            Self::Unavailable { .. } | Self::Backend(BackendError::NotProvisioned { .. })
        )
    }

    /// Transient backend failures may succeed when retried
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Backend(BackendError::Request { .. })
                | Self::CascadeAborted {
                    source: BackendError::Request { .. },
                    ..
                }
        )
    }
}

//! Core types for the CRM core

mod attachment;
mod comment;
mod ids;
mod principal;
mod task;

pub use attachment::Attachment;
pub use comment::Comment;
pub use ids::{AttachmentId, CardId, CommentId, TaskId, ThreadId, UserId};
pub use principal::Principal;
pub use task::{Task, TaskPatch, TaskStatus};

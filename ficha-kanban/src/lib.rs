//! Threaded comments, delegated tasks and attachments for kanban CRM cards
//!
//! Every card ("ficha") carries a conversation of threaded comments, a list
//! of delegated tasks and uploaded files. Persistence, authentication and
//! file storage belong to a hosted backend reached through the traits in
//! [`backend`]; this crate owns the in-memory caches and the rules around
//! them.
//!
//! ## Overview
//!
//! - **Per-card stores** - [`CommentStore`], [`TaskStore`] and
//!   [`AttachmentStore`] each cache one card (or one assignee) and can be
//!   invalidated explicitly
//! - **Bounded threads** - replies inherit their thread and stop at a
//!   configured depth; [`ThreadView`] groups and orders conversations
//! - **Optimistic tasks** - status and field edits show at once and are
//!   reconciled by reloading when the backend refuses them
//! - **Structured bodies** - comments carry a [`CommentBody`]; text written
//!   by older clients is classified once when loaded
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use ficha_kanban::{Collaborators, CreateComment, FichaContext, CardId};
//!
//! # async fn example(collaborators: Collaborators) -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = FichaContext::new(ficha_config::load_configuration()?, collaborators);
//! let author = ctx.identity().require_user().await?;
//!
//! let mut comments = ctx.comments(CardId::from_string("card-1"));
//! comments.load().await?;
//! let root = comments.create(&author, CreateComment::text("Cliente pediu retorno")).await?;
//! comments.reply(&root.id, "Liguei hoje", &author).await?;
//!
//! for thread in comments.threads().threads {
//!     println!("thread {} has {} messages", thread.index, thread.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod attachment;
pub mod backend;
pub mod body;
pub mod comment;
mod context;
mod error;
mod identity;
pub mod render;
pub mod task;
pub mod types;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use attachment::{AttachmentResolver, AttachmentStore, StorageResolver};
pub use body::CommentBody;
pub use comment::{CommentStore, CreateComment, Notification, ThreadView};
pub use context::{AnnouncedTask, Collaborators, FichaContext};
pub use error::{BackendError, BackendResult, FichaError, Result};
pub use identity::CachedIdentity;
pub use render::{render_comment, RenderContext, RenderedComment};
pub use task::{CreateTask, PendingMutation, SyncState, TaskScope, TaskStore};
pub use types::{
    Attachment, AttachmentId, CardId, Comment, CommentId, Principal, Task, TaskId, TaskPatch,
    TaskStatus, ThreadId, UserId,
};

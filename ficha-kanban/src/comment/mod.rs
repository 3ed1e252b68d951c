//! Threaded card comments
//!
//! [`CommentStore`] owns the per-card cache and the write path. Thread
//! grouping and reply-tree ordering live in [`thread`] as pure functions of
//! that cache.

mod mentions;
mod store;
pub mod thread;

pub use mentions::{extract_mentions, Notification};
pub use store::{CommentStore, CreateComment};
pub use thread::{
    can_reply, conversation_order, ThreadCapacity, ThreadColor, ThreadGroup, ThreadView,
};

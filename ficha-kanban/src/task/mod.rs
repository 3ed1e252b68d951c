//! Delegated tasks
//!
//! A [`TaskStore`] caches the tasks of one [`TaskScope`] and applies edits
//! optimistically, tracking each task's [`SyncState`].

mod scope;
mod store;
mod sync;

pub use scope::TaskScope;
pub use store::{CreateTask, TaskStore};
pub(crate) use store::{find_for_comment, find_legacy};
pub use sync::{PendingMutation, SyncState};

//! Optimistic mutation bookkeeping
//!
//! Each task moves through `Idle -> Pending -> Committed` when the backend
//! accepts a change, or `Pending -> Reconciling -> Idle` when it rejects one
//! and the store reloads the authoritative list.

use crate::types::{TaskId, TaskPatch};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Synchronisation state of one task in a [`TaskStore`](super::TaskStore)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "patch", rename_all = "snake_case")]
pub enum SyncState {
    #[default]
    Idle,
    /// Applied locally, not yet acknowledged
    Pending(TaskPatch),
    Committed,
    /// Persist failed; the cache is being replaced from the backend
    Reconciling,
}

impl SyncState {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

/// A change already visible in the cache that still has to be persisted.
///
/// Returned by `apply_*` and consumed by `persist`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "an applied mutation must be persisted"]
pub struct PendingMutation {
    task_id: TaskId,
    patch: TaskPatch,
    applied_at: DateTime<Utc>,
}

impl PendingMutation {
    pub(crate) fn new(task_id: TaskId, patch: TaskPatch, applied_at: DateTime<Utc>) -> Self {
        Self {
            task_id,
            patch,
            applied_at,
        }
    }

    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    pub fn patch(&self) -> &TaskPatch {
        &self.patch
    }

    pub fn applied_at(&self) -> DateTime<Utc> {
        self.applied_at
    }

    /// The assignee changed, so display names need the directory join
    pub fn changes_assignee(&self) -> bool {
        self.patch.assigned_to.is_some()
    }
}

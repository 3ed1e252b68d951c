//! Per-scope task cache with optimistic updates

use super::scope::TaskScope;
use super::sync::{PendingMutation, SyncState};
use crate::backend::{NewTaskRecord, TaskChanges, TaskRepository};
use crate::error::{BackendError, FichaError, Result};
use crate::identity::CachedIdentity;
use crate::types::{CardId, CommentId, Task, TaskId, TaskPatch, TaskStatus, UserId};
use chrono::{DateTime, Utc};
use ficha_config::TaskSettings;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const FEATURE: &str = "tasks";

pub(crate) fn find_for_comment<'a>(
    tasks: &'a [Task],
    comment_id: &CommentId,
) -> Option<&'a Task> {
    tasks
        .iter()
        .find(|t| t.comment_id.as_ref() == Some(comment_id))
}

/// Description match for announcements written before tasks carried a
/// comment link. Tasks already linked to a comment never match.
pub(crate) fn find_legacy<'a>(
    tasks: &'a [Task],
    card_id: &CardId,
    description: &str,
) -> Option<&'a Task> {
    let description = description.trim();
    tasks
        .iter()
        .find(|t| {
            t.comment_id.is_none()
                && &t.card_id == card_id
                && t.description.trim() == description
        })
}

/// Input for [`TaskStore::create`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTask {
    pub card_id: CardId,
    pub assigned_to: UserId,
    pub description: String,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
}

impl CreateTask {
    pub fn new(
        card_id: impl Into<CardId>,
        assigned_to: impl Into<UserId>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            card_id: card_id.into(),
            assigned_to: assigned_to.into(),
            description: description.into(),
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.card_id.is_empty() {
            return Err(FichaError::missing_field("card_id"));
        }
        if self.assigned_to.is_empty() {
            return Err(FichaError::missing_field("assigned_to"));
        }
        if self.description.trim().is_empty() {
            return Err(FichaError::missing_field("description"));
        }
        Ok(())
    }
}

/// Tasks of one scope (a card, or an assignee across cards), newest first.
///
/// Status and field edits are optimistic: `apply_*` changes the cache at
/// once, [`persist`](Self::persist) sends the change and on failure reloads
/// from the backend instead of undoing the edit by hand.
pub struct TaskStore {
    scope: TaskScope,
    repo: Arc<dyn TaskRepository>,
    identity: Arc<CachedIdentity>,
    settings: TaskSettings,
    tasks: Vec<Task>,
    states: HashMap<TaskId, SyncState>,
    available: bool,
    error: Option<String>,
}

impl TaskStore {
    pub fn new(
        scope: TaskScope,
        repo: Arc<dyn TaskRepository>,
        identity: Arc<CachedIdentity>,
        settings: TaskSettings,
    ) -> Self {
        Self {
            scope,
            repo,
            identity,
            settings,
            tasks: Vec::new(),
            states: HashMap::new(),
            available: true,
            error: None,
        }
    }

    pub fn scope(&self) -> &TaskScope {
        &self.scope
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    /// The task announced by `comment_id`
    pub fn find_for_comment(&self, comment_id: &CommentId) -> Option<&Task> {
        find_for_comment(&self.tasks, comment_id)
    }

    /// Match by card and description, for tasks created before the comment
    /// link existed
    pub fn find_legacy(&self, card_id: &CardId, description: &str) -> Option<&Task> {
        find_legacy(&self.tasks, card_id, description)
    }

    pub fn state(&self, id: &TaskId) -> SyncState {
        self.states.get(id).cloned().unwrap_or_default()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Drop cached tasks and sync states
    pub fn invalidate(&mut self) {
        self.tasks.clear();
        self.states.clear();
        self.error = None;
        self.available = true;
    }

    /// Replace the cache with the backend's view of the scope.
    ///
    /// Soft-deleted tasks are skipped. Tasks that were reconciling return to
    /// idle.
    pub async fn load(&mut self) -> Result<()> {
        self.error = None;
        match self.repo.select(&self.scope).await {
            Ok(records) => {
                let fallback = self.settings.fallback_name.as_str();
                self.tasks = records
                    .into_iter()
                    .filter(|r| !r.is_deleted())
                    .map(|r| r.into_task(fallback))
                    .collect();
                self.available = true;
                self.settle_states();
                debug!("Loaded {} tasks for {}", self.tasks.len(), self.scope);
                Ok(())
            }
            Err(BackendError::NotProvisioned { table }) => {
                warn!("Table {} not provisioned; tasks unavailable", table);
                self.tasks.clear();
                self.states.clear();
                self.available = false;
                Ok(())
            }
            Err(err) => {
                self.tasks.clear();
                Err(self.fail(err.into()))
            }
        }
    }

    /// Create a pending task, optionally linked to the comment announcing it.
    ///
    /// Requires a signed-in user, who becomes the creator.
    pub async fn create(
        &mut self,
        input: CreateTask,
        comment_id: Option<CommentId>,
    ) -> Result<Task> {
        let creator = match self.identity.require_user().await {
            Ok(principal) => principal,
            Err(err) => return Err(self.fail(err)),
        };
        if let Err(err) = input.validate() {
            return Err(self.fail(err));
        }

        let record = NewTaskRecord {
            card_id: input.card_id,
            created_by: creator.id,
            assigned_to: input.assigned_to,
            description: input.description,
            deadline: input.deadline,
            comment_id,
        };
        let task = match self.repo.insert(record).await {
            Ok(stored) => stored.into_task(&self.settings.fallback_name),
            Err(err) => return Err(self.fail(err.into())),
        };

        self.tasks.retain(|t| t.id != task.id);
        self.tasks.insert(0, task.clone());
        info!("Created task {} on card {}", task.id, task.card_id);
        Ok(task)
    }

    /// Set the status in the cache now; `completed_at` follows it
    pub fn apply_status(&mut self, id: &TaskId, status: TaskStatus) -> Result<PendingMutation> {
        self.apply_update(id, TaskPatch::status(status))
    }

    /// Apply a partial edit to the cache now. A new assignee shows the
    /// placeholder name until the next load.
    pub fn apply_update(&mut self, id: &TaskId, patch: TaskPatch) -> Result<PendingMutation> {
        let now = Utc::now();
        let placeholder = self.settings.fallback_name.clone();
        let Some(task) = self.tasks.iter_mut().find(|t| &t.id == id) else {
            return Err(self.fail(FichaError::TaskNotFound { id: id.clone() }));
        };

        task.apply(&patch, now, &placeholder);
        self.states
            .insert(id.clone(), SyncState::Pending(patch.clone()));
        debug!("Applied optimistic change to task {}", id);
        Ok(PendingMutation::new(id.clone(), patch, now))
    }

    /// Send an applied change to the backend.
    ///
    /// On failure the cache is reloaded from the backend, discarding the
    /// optimistic value, and the error is returned.
    pub async fn persist(&mut self, mutation: PendingMutation) -> Result<()> {
        let id = mutation.task_id().clone();
        let reload_names = mutation.changes_assignee();
        let changes = TaskChanges::new(mutation.patch().clone(), mutation.applied_at());

        match self.repo.update(&id, changes).await {
            Ok(()) => {
                self.states.insert(id.clone(), SyncState::Committed);
                debug!("Committed change to task {}", id);
                if reload_names {
                    self.load().await?;
                }
                Ok(())
            }
            Err(err) => {
                warn!("Persisting task {} failed, reconciling: {}", id, err);
                self.states.insert(id.clone(), SyncState::Reconciling);
                if let Err(reload) = self.load().await {
                    error!("Reconciling reload failed: {}", reload);
                }
                Err(self.fail(err.into()))
            }
        }
    }

    /// Optimistically set a task's status and persist it
    pub async fn update_status(&mut self, id: &TaskId, status: TaskStatus) -> Result<()> {
        let mutation = self.apply_status(id, status)?;
        self.persist(mutation).await
    }

    /// Optimistically edit a task and persist it
    pub async fn update(&mut self, id: &TaskId, patch: TaskPatch) -> Result<()> {
        let mutation = self.apply_update(id, patch)?;
        self.persist(mutation).await
    }

    /// Soft-delete a task as the signed-in user, then reload
    pub async fn delete(&mut self, id: &TaskId) -> Result<()> {
        let actor = match self.identity.require_user().await {
            Ok(principal) => principal,
            Err(err) => return Err(self.fail(err)),
        };
        if self.get(id).is_none() {
            return Err(self.fail(FichaError::TaskNotFound { id: id.clone() }));
        }

        if let Err(err) = self.repo.soft_delete(id, Utc::now(), &actor.id).await {
            return Err(self.fail(err.into()));
        }
        info!("Soft-deleted task {} by {}", id, actor.id);
        self.load().await
    }

    fn settle_states(&mut self) {
        let present: Vec<&TaskId> = self.tasks.iter().map(|t| &t.id).collect();
        self.states.retain(|id, state| {
            if *state == SyncState::Reconciling {
                *state = SyncState::Idle;
            }
            present.contains(&id)
        });
    }

    fn fail(&mut self, err: FichaError) -> FichaError {
        if err.is_not_provisioned() {
            warn!("Tasks table not provisioned: {}", err);
            self.available = false;
            return FichaError::unavailable(FEATURE);
        }
        error!("Task operation failed for {}: {}", self.scope, err);
        self.error = Some(err.to_string());
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::TASKS_TABLE;
    use crate::test_support::{FixedIdentity, MemoryBackend};
    use crate::types::Principal;
    use std::time::Duration;

    fn identity(signed_in: bool) -> Arc<CachedIdentity> {
        let provider = if signed_in {
            FixedIdentity::signed_in(Principal::new("u1", "Ana"))
        } else {
            FixedIdentity::signed_out()
        };
        Arc::new(CachedIdentity::new(Arc::new(provider), Duration::from_secs(30)))
    }

    fn store(backend: &Arc<MemoryBackend>, signed_in: bool) -> TaskStore {
        TaskStore::new(
            TaskScope::Card(CardId::from_string("card-1")),
            backend.clone(),
            identity(signed_in),
            TaskSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_create_requires_user() {
        let backend = Arc::new(MemoryBackend::new());
        let mut tasks = store(&backend, false);

        let err = tasks
            .create(CreateTask::new("card-1", "u2", "Ligar"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, FichaError::NotAuthenticated));
        assert_eq!(tasks.error(), Some("no authenticated user"));
    }

    #[tokio::test]
    async fn test_create_rejects_blank_fields() {
        let backend = Arc::new(MemoryBackend::new());
        let mut tasks = store(&backend, true);

        let err = tasks
            .create(CreateTask::new("card-1", "", "Ligar"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, FichaError::MissingField { ref field } if field == "assigned_to"));

        let err = tasks
            .create(CreateTask::new("card-1", "u2", "   "), None)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(tasks.tasks().is_empty());
    }

    #[tokio::test]
    async fn test_create_prepends_and_links_comment() {
        let backend = Arc::new(MemoryBackend::new());
        backend.add_user("u2", "Bruno");
        let mut tasks = store(&backend, true);

        tasks
            .create(CreateTask::new("card-1", "u2", "primeira"), None)
            .await
            .unwrap();
        let second = tasks
            .create(
                CreateTask::new("card-1", "u2", "segunda"),
                Some(CommentId::from_string("c9")),
            )
            .await
            .unwrap();

        assert_eq!(tasks.tasks()[0].id, second.id);
        assert_eq!(second.status, TaskStatus::Pending);
        assert_eq!(second.assigned_to_name, "Bruno");
        assert_eq!(second.created_by_name, "Usuário");
        assert_eq!(
            tasks.find_for_comment(&CommentId::from_string("c9")).map(|t| &t.id),
            Some(&second.id)
        );
        assert!(tasks
            .find_legacy(&CardId::from_string("card-1"), " primeira ")
            .is_some());
    }

    #[tokio::test]
    async fn test_committed_state_after_persist() {
        let backend = Arc::new(MemoryBackend::new());
        let mut tasks = store(&backend, true);
        let task = tasks
            .create(CreateTask::new("card-1", "u2", "Ligar"), None)
            .await
            .unwrap();

        let mutation = tasks.apply_status(&task.id, TaskStatus::Completed).unwrap();
        assert!(tasks.state(&task.id).is_pending());

        tasks.persist(mutation).await.unwrap();
        assert_eq!(tasks.state(&task.id), SyncState::Committed);
        assert!(backend.task(&task.id).unwrap().completed_at.is_some());
    }

    #[tokio::test]
    async fn test_reassignment_resolves_name_after_commit() {
        let backend = Arc::new(MemoryBackend::new());
        backend.add_user("u3", "Carla");
        let mut tasks = store(&backend, true);
        let task = tasks
            .create(CreateTask::new("card-1", "u2", "Ligar"), None)
            .await
            .unwrap();

        let mutation = tasks
            .apply_update(&task.id, TaskPatch::default().with_assignee("u3"))
            .unwrap();
        assert_eq!(tasks.get(&task.id).unwrap().assigned_to_name, "Usuário");

        tasks.persist(mutation).await.unwrap();
        assert_eq!(tasks.get(&task.id).unwrap().assigned_to_name, "Carla");
    }

    #[tokio::test]
    async fn test_unknown_task() {
        let backend = Arc::new(MemoryBackend::new());
        let mut tasks = store(&backend, true);

        let err = tasks
            .update_status(&TaskId::from_string("missing"), TaskStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(err, FichaError::TaskNotFound { .. }));
    }

    #[tokio::test]
    async fn test_soft_delete_hides_task() {
        let backend = Arc::new(MemoryBackend::new());
        let mut tasks = store(&backend, true);
        let task = tasks
            .create(CreateTask::new("card-1", "u2", "Ligar"), None)
            .await
            .unwrap();

        tasks.delete(&task.id).await.unwrap();

        assert!(tasks.get(&task.id).is_none());
        let row = backend.task(&task.id).unwrap();
        assert!(row.deleted_at.is_some());
        assert_eq!(row.deleted_by.as_ref().map(|u| u.as_str()), Some("u1"));
    }

    #[tokio::test]
    async fn test_unprovisioned_table() {
        let backend = Arc::new(MemoryBackend::new().without_table(TASKS_TABLE));
        let mut tasks = store(&backend, true);

        tasks.load().await.unwrap();
        assert!(tasks.tasks().is_empty());
        assert!(!tasks.is_available());

        let err = tasks
            .create(CreateTask::new("card-1", "u2", "Ligar"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, FichaError::Unavailable { .. }));
        assert!(tasks.error().is_none());
    }
}

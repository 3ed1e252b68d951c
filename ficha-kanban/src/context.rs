//! FichaContext - collaborators and configuration shared by the stores
//!
//! The context owns no cached data. It hands out per-card and per-scope
//! stores wired to the same backend, identity cache and settings.

use crate::attachment::{AttachmentStore, StorageResolver};
use crate::backend::{
    AttachmentRepository, BlobStorage, CommentRepository, IdentityProvider, TaskRepository,
};
use crate::body::{CommentBody, TaskAnnouncement};
use crate::comment::{CommentStore, CreateComment};
use crate::error::Result;
use crate::identity::CachedIdentity;
use crate::render::{format_deadline, RenderContext};
use crate::task::{CreateTask, TaskScope, TaskStore};
use crate::types::{Attachment, CardId, Comment, Task, UserId};
use ficha_config::FichaConfig;
use std::sync::Arc;
use tracing::warn;

/// Result of [`FichaContext::announce_task`]
#[derive(Debug, Clone, PartialEq)]
pub struct AnnouncedTask {
    /// `None` when the announcement comment could not be written
    pub comment: Option<Comment>,
    pub task: Task,
}

/// Backend collaborators
#[derive(Clone)]
pub struct Collaborators {
    pub comments: Arc<dyn CommentRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    pub attachments: Arc<dyn AttachmentRepository>,
    pub storage: Arc<dyn BlobStorage>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl Collaborators {
    /// Use one backend for every table
    pub fn from_backend<B>(
        backend: Arc<B>,
        storage: Arc<dyn BlobStorage>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self
    where
        B: CommentRepository + TaskRepository + AttachmentRepository + 'static,
    {
        Self {
            comments: backend.clone(),
            tasks: backend.clone(),
            attachments: backend,
            storage,
            identity,
        }
    }
}

/// Entry point for building stores
pub struct FichaContext {
    config: FichaConfig,
    comments: Arc<dyn CommentRepository>,
    tasks: Arc<dyn TaskRepository>,
    attachments: Arc<dyn AttachmentRepository>,
    storage: Arc<dyn BlobStorage>,
    identity: Arc<CachedIdentity>,
}

impl FichaContext {
    pub fn new(config: FichaConfig, collaborators: Collaborators) -> Self {
        let identity = Arc::new(CachedIdentity::new(
            collaborators.identity,
            config.identity.cache_ttl(),
        ));
        Self {
            config,
            comments: collaborators.comments,
            tasks: collaborators.tasks,
            attachments: collaborators.attachments,
            storage: collaborators.storage,
            identity,
        }
    }

    pub fn config(&self) -> &FichaConfig {
        &self.config
    }

    pub fn identity(&self) -> &Arc<CachedIdentity> {
        &self.identity
    }

    /// Comment store for one card
    pub fn comments(&self, card_id: CardId) -> CommentStore {
        CommentStore::new(
            card_id,
            self.comments.clone(),
            self.config.comments.clone(),
        )
    }

    /// Task store for a filter pair; the card wins when both are set.
    /// `None` when neither is given.
    pub fn tasks(&self, assignee: Option<UserId>, card: Option<CardId>) -> Option<TaskStore> {
        TaskScope::from_filter(assignee, card).map(|scope| self.tasks_in(scope))
    }

    pub fn tasks_in(&self, scope: TaskScope) -> TaskStore {
        TaskStore::new(
            scope,
            self.tasks.clone(),
            self.identity.clone(),
            self.config.tasks.clone(),
        )
    }

    /// Attachment store for one card
    pub fn attachments(&self, card_id: CardId) -> AttachmentStore {
        AttachmentStore::new(
            card_id,
            self.attachments.clone(),
            self.storage.clone(),
            self.identity.clone(),
        )
    }

    pub fn resolver(&self) -> StorageResolver {
        StorageResolver::new(self.storage.clone(), self.config.storage.clone())
    }

    /// Lookup data for rendering comments with the configured path prefix
    pub fn render_context<'a>(
        &'a self,
        tasks: &'a [Task],
        attachments: &'a [Attachment],
    ) -> RenderContext<'a> {
        RenderContext::new(tasks, attachments, &self.config.storage.legacy_prefix)
    }

    /// Post a task announcement comment on the card, then create the task
    /// linked to it.
    ///
    /// The task is still created when the comment cannot be written; it is
    /// then unlinked.
    pub async fn announce_task(
        &self,
        comments: &mut CommentStore,
        tasks: &mut TaskStore,
        mut input: CreateTask,
        assignee_name: &str,
    ) -> Result<AnnouncedTask> {
        let author = self.identity.require_user().await?;
        input.card_id = comments.card_id().clone();
        input.description = input.description.trim().to_string();
        input.validate()?;

        let mut announcement = TaskAnnouncement::new(assignee_name, input.description.clone());
        if let Some(deadline) = input.deadline {
            announcement = announcement.with_deadline(format_deadline(deadline));
        }
        let body = CommentBody::TaskAnnouncement(announcement);

        let comment = match comments
            .create(&author, CreateComment::announcement(body))
            .await
        {
            Ok(comment) => Some(comment),
            Err(err) => {
                warn!("Task announcement comment not written: {}", err);
                None
            }
        };

        let task = tasks
            .create(input, comment.as_ref().map(|c| c.id.clone()))
            .await?;
        Ok(AnnouncedTask { comment, task })
    }
}

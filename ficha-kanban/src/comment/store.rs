//! Per-card comment cache backed by a [`CommentRepository`]

use super::mentions::{extract_mentions, Notification};
use super::thread::{cascade_order, ThreadView};
use crate::backend::{CommentRecord, CommentRepository, NewCommentRecord, COMMENTS_TABLE};
use crate::body::CommentBody;
use crate::error::{BackendError, BackendResult, FichaError, Result};
use crate::types::{CardId, Comment, CommentId, Principal, ThreadId, UserId};
use chrono::Utc;
use ficha_config::CommentSettings;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const FEATURE: &str = "comments";

/// Input for [`CommentStore::create`]
#[derive(Debug, Clone, PartialEq)]
pub struct CreateComment {
    pub content: String,
    pub body: CommentBody,
    pub parent_id: Option<CommentId>,
    pub level: u32,
    /// `None` starts a new thread keyed by the comment's own id
    pub thread_id: Option<ThreadId>,
}

impl CreateComment {
    /// A plain-text root comment
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            body: CommentBody::PlainText,
            parent_id: None,
            level: 0,
            thread_id: None,
        }
    }

    /// A root comment carrying a structured announcement. The display text
    /// is rendered from the body.
    pub fn announcement(body: CommentBody) -> Self {
        let content = body.to_text().unwrap_or_default();
        Self {
            content,
            body,
            parent_id: None,
            level: 0,
            thread_id: None,
        }
    }

    /// Place the comment under `parent` in its thread
    pub fn in_reply_to(mut self, parent: &Comment) -> Self {
        self.parent_id = Some(parent.id.clone());
        self.level = parent.level + 1;
        self.thread_id = Some(parent.thread_id.clone());
        self
    }
}

/// Comments of one card.
///
/// Construct one per card and call [`load`](Self::load). Switching cards
/// means a new store or [`invalidate`](Self::invalidate) plus a reload.
pub struct CommentStore {
    card_id: CardId,
    repo: Arc<dyn CommentRepository>,
    settings: CommentSettings,
    comments: Vec<Comment>,
    available: bool,
    error: Option<String>,
    notifications: Vec<Notification>,
}

impl CommentStore {
    pub fn new(
        card_id: CardId,
        repo: Arc<dyn CommentRepository>,
        settings: CommentSettings,
    ) -> Self {
        Self {
            card_id,
            repo,
            settings,
            comments: Vec::new(),
            available: true,
            error: None,
            notifications: Vec::new(),
        }
    }

    pub fn card_id(&self) -> &CardId {
        &self.card_id
    }

    /// Cached comments in backend order (oldest first)
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn get(&self, id: &CommentId) -> Option<&Comment> {
        self.comments.iter().find(|c| &c.id == id)
    }

    /// Last failure message, for display
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// False once the backend reported the comments table as absent
    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Thread grouping of the current cache
    pub fn threads(&self) -> ThreadView {
        ThreadView::assemble(&self.comments, &self.settings)
    }

    /// Drain notifications queued by successful creates
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Drop cached state so the next [`load`](Self::load) starts clean
    pub fn invalidate(&mut self) {
        self.comments.clear();
        self.notifications.clear();
        self.error = None;
        self.available = true;
    }

    /// Fetch all comments of the card, oldest first.
    ///
    /// An unprovisioned comments table yields an empty list.
    pub async fn load(&mut self) -> Result<()> {
        self.error = None;
        match self.repo.select_by_card(&self.card_id).await {
            Ok(records) => {
                self.comments = records.into_iter().map(Comment::from).collect();
                self.available = true;
                debug!(
                    "Loaded {} comments for card {}",
                    self.comments.len(),
                    self.card_id
                );
                Ok(())
            }
            Err(BackendError::NotProvisioned { table }) => {
                warn!("Table {} not provisioned; comments unavailable", table);
                self.comments.clear();
                self.available = false;
                Ok(())
            }
            Err(err) => {
                self.comments.clear();
                Err(self.fail(err.into()))
            }
        }
    }

    /// Persist a new comment by `author` and merge it into the cache.
    ///
    /// A comment already cached under the returned id is replaced.
    pub async fn create(&mut self, author: &Principal, input: CreateComment) -> Result<Comment> {
        let parent_author = input
            .parent_id
            .as_ref()
            .and_then(|id| self.get(id))
            .map(|parent| parent.author_id.clone());

        let record = NewCommentRecord {
            card_id: self.card_id.clone(),
            author_id: author.id.clone(),
            author_name: author.name.clone(),
            author_role: author.role.clone(),
            content: input.content,
            body: input.body,
            parent_id: input.parent_id,
            level: input.level,
            thread_id: input.thread_id,
        };

        let comment = match self.insert(record).await {
            Ok(stored) => Comment::from(stored),
            Err(err) => return Err(self.fail(err.into())),
        };
        self.merge(comment.clone());
        info!("Created comment {} on card {}", comment.id, self.card_id);

        self.queue_notifications(&comment, author, parent_author);
        Ok(comment)
    }

    /// Answer `parent_id` with a plain-text reply
    pub async fn reply(
        &mut self,
        parent_id: &CommentId,
        content: impl Into<String>,
        author: &Principal,
    ) -> Result<Comment> {
        let Some(parent) = self.get(parent_id) else {
            return Err(self.fail(FichaError::ParentNotFound {
                id: parent_id.clone(),
            }));
        };

        let level = parent.level + 1;
        if level >= self.settings.max_level {
            return Err(self.fail(FichaError::DepthLimitExceeded {
                level,
                max: self.settings.max_level,
            }));
        }

        let limit = self.settings.thread_message_limit;
        let in_thread = self
            .comments
            .iter()
            .filter(|c| c.thread_id == parent.thread_id)
            .count();
        if in_thread >= limit {
            let thread_id = parent.thread_id.clone();
            return Err(self.fail(FichaError::ThreadLimitReached { thread_id, limit }));
        }

        let input = CreateComment::text(content).in_reply_to(parent);
        self.create(author, input).await
    }

    /// Replace a comment's text, stamping `updated_at`
    pub async fn update(&mut self, id: &CommentId, content: impl Into<String>) -> Result<Comment> {
        if self.get(id).is_none() {
            return Err(self.fail(FichaError::CommentNotFound { id: id.clone() }));
        }

        let content = content.into();
        let now = Utc::now();
        if let Err(err) = self.repo.update_content(id, &content, now).await {
            return Err(self.fail(err.into()));
        }

        let comment = self
            .comments
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| FichaError::CommentNotFound { id: id.clone() })?;
        // Edited text no longer matches a structured announcement
        if comment.content != content {
            comment.body = CommentBody::PlainText;
        }
        comment.content = content;
        comment.updated_at = now;
        debug!("Updated comment {}", id);
        Ok(comment.clone())
    }

    /// Delete a comment and all of its descendants, deepest first.
    ///
    /// Returns the removed ids, target last. The cascade stops at the first
    /// failure; comments removed before it stay removed and are listed in
    /// [`FichaError::CascadeAborted`].
    pub async fn delete(&mut self, id: &CommentId) -> Result<Vec<CommentId>> {
        if self.get(id).is_none() {
            return Err(self.fail(FichaError::CommentNotFound { id: id.clone() }));
        }

        let order = cascade_order(&self.comments, id);
        let mut deleted = Vec::with_capacity(order.len());
        for victim in order {
            if let Err(source) = self.repo.delete(&victim).await {
                if deleted.is_empty() && matches!(source, BackendError::NotProvisioned { .. }) {
                    return Err(self.fail(source.into()));
                }
                error!(
                    "Cascade delete of {} stopped at {} after {} removals",
                    id,
                    victim,
                    deleted.len()
                );
                return Err(self.fail(FichaError::CascadeAborted {
                    target: id.clone(),
                    failed: victim,
                    deleted,
                    source,
                }));
            }
            self.comments.retain(|c| c.id != victim);
            deleted.push(victim);
        }

        info!("Deleted {} comments from card {}", deleted.len(), self.card_id);
        Ok(deleted)
    }

    async fn insert(&self, record: NewCommentRecord) -> BackendResult<CommentRecord> {
        let retry = record.thread_id.is_some().then(|| NewCommentRecord {
            thread_id: None,
            ..record.clone()
        });
        match self.repo.insert(record).await {
            Err(BackendError::ColumnMissing { table, column }) if column == "thread_id" => {
                match retry {
                    Some(record) => {
                        warn!(
                            "Column thread_id missing on {}; inserting without it",
                            COMMENTS_TABLE
                        );
                        self.repo.insert(record).await
                    }
                    None => Err(BackendError::ColumnMissing { table, column }),
                }
            }
            other => other,
        }
    }

    fn merge(&mut self, comment: Comment) {
        match self.comments.iter_mut().find(|c| c.id == comment.id) {
            Some(existing) => *existing = comment,
            None => self.comments.push(comment),
        }
    }

    fn queue_notifications(
        &mut self,
        comment: &Comment,
        author: &Principal,
        parent_author: Option<UserId>,
    ) {
        if let Some(recipient) = parent_author.filter(|recipient| recipient != &author.id) {
            self.notifications.push(Notification::Reply {
                card_id: comment.card_id.clone(),
                comment_id: comment.id.clone(),
                recipient,
                author_name: author.name.clone(),
            });
        }
        for handle in extract_mentions(&comment.content) {
            self.notifications.push(Notification::Mention {
                card_id: comment.card_id.clone(),
                comment_id: comment.id.clone(),
                handle,
                author_name: author.name.clone(),
            });
        }
    }

    /// Record a failure for display. Unprovisioned tables become
    /// [`FichaError::Unavailable`] and are only logged.
    fn fail(&mut self, err: FichaError) -> FichaError {
        if err.is_not_provisioned() {
            warn!("Comments table not provisioned: {}", err);
            self.available = false;
            return FichaError::unavailable(FEATURE);
        }
        error!("Comment operation failed on card {}: {}", self.card_id, err);
        self.error = Some(err.to_string());
        err
    }
}

//! In-memory collaborators for tests
//!
//! [`MemoryBackend`] implements every repository over plain maps, joins
//! display names from a small user directory and stamps rows with a
//! deterministic clock (one second per write) so ordering is reproducible.
//! Tables can be marked unprovisioned and individual operations can be made
//! to fail.

use crate::backend::{
    AttachmentRepository, BlobEntry, BlobStorage, CommentRecord, CommentRepository,
    IdentityProvider, NewCommentRecord, NewTaskRecord, TaskChanges, TaskRecord, TaskRepository,
    ATTACHMENTS_TABLE, COMMENTS_TABLE, TASKS_TABLE,
};
use crate::error::{BackendError, BackendResult};
use crate::task::TaskScope;
use crate::types::{
    Attachment, AttachmentId, CardId, CommentId, Principal, TaskId, TaskStatus, ThreadId, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct State {
    comments: Vec<CommentRecord>,
    tasks: Vec<TaskRecord>,
    attachments: Vec<Attachment>,
    users: HashMap<UserId, String>,
    missing_tables: HashSet<String>,
    thread_column: bool,
    failing_comment_deletes: HashSet<CommentId>,
    fail_task_updates: bool,
    ticks: i64,
}

impl State {
    fn now(&mut self) -> DateTime<Utc> {
        self.ticks += 1;
        epoch() + Duration::seconds(self.ticks)
    }

    fn check(&self, table: &str) -> BackendResult<()> {
        if self.missing_tables.contains(table) {
            return Err(BackendError::not_provisioned(table));
        }
        Ok(())
    }

    fn joined(&self, mut record: TaskRecord) -> TaskRecord {
        record.created_by_name = self.users.get(&record.created_by).cloned();
        record.assigned_to_name = self.users.get(&record.assigned_to).cloned();
        record
    }
}

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 6, 9, 0, 0)
        .single()
        .unwrap_or_default()
}

fn not_found(table: &str, id: impl ToString) -> BackendError {
    BackendError::NotFound {
        table: table.to_string(),
        id: id.to_string(),
    }
}

/// Comment, task and attachment tables in memory
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                thread_column: true,
                ..State::default()
            }),
        }
    }

    /// Report `table` as not provisioned on every call
    pub fn without_table(self, table: &str) -> Self {
        self.state().missing_tables.insert(table.to_string());
        self
    }

    /// Reject inserts that carry a thread id, as an older schema would
    pub fn without_thread_column(self) -> Self {
        self.state().thread_column = false;
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a display name for the task joins
    pub fn add_user(&self, id: &str, name: &str) {
        self.state()
            .users
            .insert(UserId::from_string(id), name.to_string());
    }

    /// Store a comment row as-is, e.g. one written before structured bodies
    pub fn seed_comment(&self, record: CommentRecord) {
        self.state().comments.push(record);
    }

    pub fn seed_attachment(&self, attachment: Attachment) {
        self.state().attachments.push(attachment);
    }

    /// Make deleting `id` fail with a request error
    pub fn fail_comment_delete(&self, id: &CommentId) {
        self.state().failing_comment_deletes.insert(id.clone());
    }

    /// Make every task update fail with a request error
    pub fn fail_task_updates(&self, fail: bool) {
        self.state().fail_task_updates = fail;
    }

    pub fn comment_count(&self) -> usize {
        self.state().comments.len()
    }

    pub fn comment(&self, id: &CommentId) -> Option<CommentRecord> {
        self.state().comments.iter().find(|c| &c.id == id).cloned()
    }

    /// Raw task row, including soft-deleted ones
    pub fn task(&self, id: &TaskId) -> Option<TaskRecord> {
        self.state().tasks.iter().find(|t| &t.id == id).cloned()
    }

    pub fn attachment_count(&self) -> usize {
        self.state().attachments.len()
    }

    /// Timestamp the next write would get, without consuming it
    pub fn peek_now(&self) -> DateTime<Utc> {
        epoch() + Duration::seconds(self.state().ticks + 1)
    }
}

#[async_trait]
impl CommentRepository for MemoryBackend {
    async fn select_by_card(&self, card_id: &CardId) -> BackendResult<Vec<CommentRecord>> {
        let state = self.state();
        state.check(COMMENTS_TABLE)?;
        let mut rows: Vec<CommentRecord> = state
            .comments
            .iter()
            .filter(|c| &c.card_id == card_id)
            .cloned()
            .collect();
        rows.sort_by_key(|c| c.created_at);
        Ok(rows)
    }

    async fn insert(&self, comment: NewCommentRecord) -> BackendResult<CommentRecord> {
        let mut state = self.state();
        state.check(COMMENTS_TABLE)?;
        if !state.thread_column && comment.thread_id.is_some() {
            return Err(BackendError::column_missing(COMMENTS_TABLE, "thread_id"));
        }

        let now = state.now();
        let record = CommentRecord {
            id: CommentId::new(),
            card_id: comment.card_id,
            author_id: comment.author_id,
            author_name: comment.author_name,
            author_role: comment.author_role,
            content: comment.content,
            body: Some(comment.body),
            parent_id: comment.parent_id,
            level: Some(comment.level),
            thread_id: comment.thread_id,
            created_at: now,
            updated_at: now,
        };
        state.comments.push(record.clone());
        Ok(record)
    }

    async fn update_content(
        &self,
        id: &CommentId,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> BackendResult<()> {
        let mut state = self.state();
        state.check(COMMENTS_TABLE)?;
        let row = state
            .comments
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| not_found(COMMENTS_TABLE, id))?;
        row.content = content.to_string();
        row.body = None;
        row.updated_at = updated_at;
        Ok(())
    }

    async fn delete(&self, id: &CommentId) -> BackendResult<()> {
        let mut state = self.state();
        state.check(COMMENTS_TABLE)?;
        if state.failing_comment_deletes.contains(id) {
            return Err(BackendError::request(format!("delete of {id} refused")));
        }
        let before = state.comments.len();
        state.comments.retain(|c| &c.id != id);
        if state.comments.len() == before {
            return Err(not_found(COMMENTS_TABLE, id));
        }
        Ok(())
    }
}

#[async_trait]
impl TaskRepository for MemoryBackend {
    async fn select(&self, scope: &TaskScope) -> BackendResult<Vec<TaskRecord>> {
        let state = self.state();
        state.check(TASKS_TABLE)?;
        let mut rows: Vec<TaskRecord> = state
            .tasks
            .iter()
            .filter(|t| match scope {
                TaskScope::Card(card) => &t.card_id == card,
                TaskScope::Assignee(user) => &t.assigned_to == user,
            })
            .map(|t| state.joined(t.clone()))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn insert(&self, task: NewTaskRecord) -> BackendResult<TaskRecord> {
        let mut state = self.state();
        state.check(TASKS_TABLE)?;
        let now = state.now();
        let record = TaskRecord {
            id: TaskId::new(),
            card_id: task.card_id,
            card_title: None,
            created_by: task.created_by,
            assigned_to: task.assigned_to,
            description: task.description,
            status: TaskStatus::Pending,
            deadline: task.deadline,
            comment_id: task.comment_id,
            created_at: now,
            updated_at: now,
            completed_at: None,
            deleted_at: None,
            deleted_by: None,
            created_by_name: None,
            assigned_to_name: None,
        };
        state.tasks.push(record.clone());
        Ok(state.joined(record))
    }

    async fn update(&self, id: &TaskId, changes: TaskChanges) -> BackendResult<()> {
        let mut state = self.state();
        state.check(TASKS_TABLE)?;
        if state.fail_task_updates {
            return Err(BackendError::request(format!("update of {id} refused")));
        }
        let row = state
            .tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| not_found(TASKS_TABLE, id))?;

        let patch = changes.patch;
        if let Some(status) = patch.status {
            row.status = status;
        }
        if let Some(description) = patch.description {
            row.description = description;
        }
        if let Some(assigned_to) = patch.assigned_to {
            row.assigned_to = assigned_to;
        }
        if let Some(deadline) = patch.deadline {
            row.deadline = deadline;
        }
        if let Some(completed_at) = changes.completed_at {
            row.completed_at = completed_at;
        }
        row.updated_at = changes.updated_at;
        Ok(())
    }

    async fn soft_delete(
        &self,
        id: &TaskId,
        deleted_at: DateTime<Utc>,
        deleted_by: &UserId,
    ) -> BackendResult<()> {
        let mut state = self.state();
        state.check(TASKS_TABLE)?;
        let row = state
            .tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| not_found(TASKS_TABLE, id))?;
        row.deleted_at = Some(deleted_at);
        row.deleted_by = Some(deleted_by.clone());
        Ok(())
    }
}

#[async_trait]
impl AttachmentRepository for MemoryBackend {
    async fn select_by_card(&self, card_id: &CardId) -> BackendResult<Vec<Attachment>> {
        let state = self.state();
        state.check(ATTACHMENTS_TABLE)?;
        let mut rows: Vec<Attachment> = state
            .attachments
            .iter()
            .filter(|a| &a.card_id == card_id)
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.created_at);
        Ok(rows)
    }

    async fn delete(&self, id: &AttachmentId) -> BackendResult<()> {
        let mut state = self.state();
        state.check(ATTACHMENTS_TABLE)?;
        let before = state.attachments.len();
        state.attachments.retain(|a| &a.id != id);
        if state.attachments.len() == before {
            return Err(not_found(ATTACHMENTS_TABLE, id));
        }
        Ok(())
    }
}

/// A bucket in memory. Public URLs are `https://storage.test/<bucket>/<key>`.
pub struct MemoryBlobStorage {
    bucket: String,
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    probes: AtomicUsize,
}

impl MemoryBlobStorage {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            objects: Mutex::new(BTreeMap::new()),
            probes: AtomicUsize::new(0),
        }
    }

    /// Add an object with empty contents
    pub fn with_object(self, path: &str) -> Self {
        self.objects().insert(path.to_string(), Vec::new());
        self
    }

    fn objects(&self) -> MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.objects().contains_key(path)
    }

    /// Number of `exists` calls so far
    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStorage for MemoryBlobStorage {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> BackendResult<String> {
        self.objects().insert(path.to_string(), bytes);
        Ok(path.to_string())
    }

    fn public_url(&self, path: &str) -> String {
        format!("https://storage.test/{}/{}", self.bucket, path)
    }

    async fn list(&self, prefix: &str, limit: usize) -> BackendResult<Vec<BlobEntry>> {
        Ok(self
            .objects()
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .take(limit)
            .map(|(name, bytes)| BlobEntry {
                name: name.clone(),
                size: Some(bytes.len() as u64),
            })
            .collect())
    }

    async fn exists(&self, path: &str) -> BackendResult<bool> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        Ok(self.objects().contains_key(path))
    }

    async fn remove(&self, paths: &[String]) -> BackendResult<()> {
        let mut objects = self.objects();
        for path in paths {
            objects.remove(path);
        }
        Ok(())
    }
}

/// Identity provider with a fixed answer that counts lookups
pub struct FixedIdentity {
    principal: Option<Principal>,
    calls: AtomicUsize,
}

impl FixedIdentity {
    pub fn signed_in(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            principal: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for FixedIdentity {
    async fn current_user(&self) -> BackendResult<Option<Principal>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.principal.clone())
    }
}

/// A stored comment row, for seeding legacy data
pub fn comment_record(
    id: &str,
    card_id: &str,
    content: &str,
    parent: Option<(&str, u32)>,
    thread_id: Option<&str>,
    created_at: DateTime<Utc>,
) -> CommentRecord {
    CommentRecord {
        id: CommentId::from_string(id),
        card_id: CardId::from_string(card_id),
        author_id: UserId::from_string("u1"),
        author_name: "Ana".to_string(),
        author_role: None,
        content: content.to_string(),
        body: None,
        parent_id: parent.map(|(parent, _)| CommentId::from_string(parent)),
        level: parent.map(|(_, level)| level),
        thread_id: thread_id.map(ThreadId::from_string),
        created_at,
        updated_at: created_at,
    }
}

//! Per-card attachment records

use crate::backend::{AttachmentRepository, BlobStorage};
use crate::error::{BackendError, FichaError, Result};
use crate::identity::CachedIdentity;
use crate::types::{Attachment, AttachmentId, CardId, CommentId};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const FEATURE: &str = "attachments";

/// Attachment records of one card, oldest first
pub struct AttachmentStore {
    card_id: CardId,
    repo: Arc<dyn AttachmentRepository>,
    storage: Arc<dyn BlobStorage>,
    identity: Arc<CachedIdentity>,
    attachments: Vec<Attachment>,
    available: bool,
    error: Option<String>,
}

impl AttachmentStore {
    pub fn new(
        card_id: CardId,
        repo: Arc<dyn AttachmentRepository>,
        storage: Arc<dyn BlobStorage>,
        identity: Arc<CachedIdentity>,
    ) -> Self {
        Self {
            card_id,
            repo,
            storage,
            identity,
            attachments: Vec::new(),
            available: true,
            error: None,
        }
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Records bound to `comment_id`
    pub fn for_comment(&self, comment_id: &CommentId) -> Vec<&Attachment> {
        self.attachments
            .iter()
            .filter(|a| a.belongs_to(comment_id))
            .collect()
    }

    /// Uploads made on the card itself
    pub fn card_level(&self) -> Vec<&Attachment> {
        self.attachments
            .iter()
            .filter(|a| a.is_card_level())
            .collect()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn invalidate(&mut self) {
        self.attachments.clear();
        self.error = None;
        self.available = true;
    }

    pub async fn load(&mut self) -> Result<()> {
        self.error = None;
        match self.repo.select_by_card(&self.card_id).await {
            Ok(attachments) => {
                self.attachments = attachments;
                self.available = true;
                debug!(
                    "Loaded {} attachments for card {}",
                    self.attachments.len(),
                    self.card_id
                );
                Ok(())
            }
            Err(BackendError::NotProvisioned { table }) => {
                warn!("Table {} not provisioned; attachments unavailable", table);
                self.attachments.clear();
                self.available = false;
                Ok(())
            }
            Err(err) => {
                self.attachments.clear();
                Err(self.fail(err.into()))
            }
        }
    }

    /// Remove the stored file, then its record. Requires a signed-in user.
    pub async fn delete(&mut self, id: &AttachmentId) -> Result<()> {
        if let Err(err) = self.identity.require_user().await {
            return Err(self.fail(err));
        }
        let Some(path) = self
            .attachments
            .iter()
            .find(|a| &a.id == id)
            .map(|a| a.file_path.clone())
        else {
            return Err(self.fail(FichaError::NotFound {
                resource: "attachment".into(),
                id: id.to_string(),
            }));
        };

        if let Err(err) = self.storage.remove(&[path]).await {
            return Err(self.fail(err.into()));
        }
        if let Err(err) = self.repo.delete(id).await {
            return Err(self.fail(err.into()));
        }
        self.attachments.retain(|a| &a.id != id);
        info!("Deleted attachment {} from card {}", id, self.card_id);
        Ok(())
    }

    fn fail(&mut self, err: FichaError) -> FichaError {
        if err.is_not_provisioned() {
            warn!("Attachments table not provisioned: {}", err);
            self.available = false;
            return FichaError::unavailable(FEATURE);
        }
        error!("Attachment operation failed on card {}: {}", self.card_id, err);
        self.error = Some(err.to_string());
        err
    }
}

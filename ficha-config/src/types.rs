//! Strongly typed configuration sections

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the CRM core
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FichaConfig {
    pub comments: CommentSettings,
    pub tasks: TaskSettings,
    pub identity: IdentitySettings,
    pub storage: StorageSettings,
}

impl FichaConfig {
    /// Reject settings the stores cannot operate with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.comments.max_level == 0 {
            return Err(ConfigError::validation(
                "comments.max_level must be at least 1",
            ));
        }
        if self.comments.thread_warning_threshold >= self.comments.thread_message_limit {
            return Err(ConfigError::validation(format!(
                "comments.thread_warning_threshold ({}) must be below comments.thread_message_limit ({})",
                self.comments.thread_warning_threshold, self.comments.thread_message_limit
            )));
        }
        if self.storage.bucket.trim().is_empty() {
            return Err(ConfigError::validation("storage.bucket must not be empty"));
        }
        Ok(())
    }
}

/// Threading limits for card comments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentSettings {
    /// Depth ceiling: a reply whose level would reach this value is rejected
    pub max_level: u32,
    /// A thread with at least this many messages accepts no further replies
    pub thread_message_limit: usize,
    /// A thread with at least this many messages is flagged as approaching the limit
    pub thread_warning_threshold: usize,
}

impl Default for CommentSettings {
    fn default() -> Self {
        Self {
            max_level: 7,
            thread_message_limit: 7,
            thread_warning_threshold: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskSettings {
    /// Display name used when the identity directory has no name for a user
    pub fallback_name: String,
}

impl Default for TaskSettings {
    fn default() -> Self {
        Self {
            fallback_name: "Usuário".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentitySettings {
    /// How long a looked-up principal is reused before asking the provider again
    pub cache_ttl_secs: u64,
}

impl IdentitySettings {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self { cache_ttl_secs: 30 }
    }
}

/// Blob storage layout for card attachments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Bucket holding attachment files
    pub bucket: String,
    /// Folder prefix used by older uploads inside the bucket
    pub legacy_prefix: String,
    /// Maximum number of entries requested when listing the bucket
    pub list_limit: usize,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            bucket: "card-attachments".to_string(),
            legacy_prefix: "card-attachments".to_string(),
            list_limit: 1000,
        }
    }
}

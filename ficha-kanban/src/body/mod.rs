//! Structured comment bodies
//!
//! A comment is either plain text, a task announcement or an attachment
//! announcement. The kind is chosen when the comment is written and stored
//! next to the display text. Comments written before the structured column
//! existed are classified once, on load, by [`legacy::parse`].

pub mod legacy;

use crate::attachment::size::parse_file_size;
use serde::{Deserialize, Serialize};

pub(crate) const ATTACHMENT_MARKER: &str = "📎";
pub(crate) const CARD_MARKER: &str = "📋";
pub(crate) const DETAILS_MARKER: &str = "📊";
pub(crate) const ASSIGNEE_MARKER: &str = "👤";
pub(crate) const DESCRIPTION_MARKER: &str = "📝";
pub(crate) const DEADLINE_MARKER: &str = "📅";

/// What a comment represents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommentBody {
    #[default]
    PlainText,
    TaskAnnouncement(TaskAnnouncement),
    AttachmentAnnouncement(AttachmentAnnouncement),
}

impl CommentBody {
    /// Classify text written before structured bodies were stored
    pub fn from_legacy_text(text: &str) -> Self {
        legacy::parse(text)
    }

    /// Display text for this body; plain text has none of its own
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::PlainText => None,
            Self::TaskAnnouncement(task) => Some(task.to_text()),
            Self::AttachmentAnnouncement(attachment) => Some(attachment.to_text()),
        }
    }
}

/// A comment announcing a delegated task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAnnouncement {
    pub assignee_name: String,
    pub description: String,
    /// Already formatted for display
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
}

impl TaskAnnouncement {
    pub fn new(assignee_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            assignee_name: assignee_name.into(),
            description: description.into(),
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: impl Into<String>) -> Self {
        self.deadline = Some(deadline.into());
        self
    }

    pub fn to_text(&self) -> String {
        let mut text = format!(
            "{CARD_MARKER} **Tarefa criada**\n\n{ASSIGNEE_MARKER} **Para:** @{}\n{DESCRIPTION_MARKER} **Descrição:** {}",
            self.assignee_name, self.description
        );
        if let Some(deadline) = &self.deadline {
            text.push_str(&format!("\n{DEADLINE_MARKER} **Prazo:** {deadline}"));
        }
        text
    }
}

/// A comment announcing an uploaded file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentAnnouncement {
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<FileDetails>,
}

/// File details carried by the detailed announcement format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDetails {
    pub file_type: String,
    /// As displayed, e.g. `"2.5 MB"`
    pub size_text: String,
    pub extension: String,
    pub author_name: String,
    pub author_role: String,
}

impl FileDetails {
    pub fn size_bytes(&self) -> u64 {
        parse_file_size(&self.size_text)
    }
}

impl AttachmentAnnouncement {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            card_title: None,
            details: None,
        }
    }

    pub fn with_card_title(mut self, card_title: impl Into<String>) -> Self {
        self.card_title = Some(card_title.into());
        self
    }

    pub fn with_details(mut self, details: FileDetails) -> Self {
        self.details = Some(details);
        self
    }

    /// Lowercased text after the last dot, `"file"` when there is none
    pub fn extension(&self) -> String {
        if let Some(details) = &self.details {
            return details.extension.clone();
        }
        match self.file_name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => ext.to_lowercase(),
            _ => "file".to_string(),
        }
    }

    pub fn to_text(&self) -> String {
        let mut text = format!("{ATTACHMENT_MARKER} Anexo adicionado: {}", self.file_name);
        if let Some(card_title) = &self.card_title {
            text.push_str(&format!("\n{CARD_MARKER} Ficha: {card_title}"));
            if let Some(details) = &self.details {
                text.push_str(&format!(
                    "\n{DETAILS_MARKER} Detalhes do arquivo:\n• Tipo: {}\n• Tamanho: {}\n• Extensão: {}\n• Autor: {} ({})",
                    details.file_type,
                    details.size_text,
                    details.extension,
                    details.author_name,
                    details.author_role
                ));
            }
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_text_without_deadline() {
        let text = TaskAnnouncement::new("Alice", "Send the contract").to_text();
        assert_eq!(
            text,
            "📋 **Tarefa criada**\n\n👤 **Para:** @Alice\n📝 **Descrição:** Send the contract"
        );
    }

    #[test]
    fn test_task_text_with_deadline() {
        let text = TaskAnnouncement::new("Alice", "Send the contract")
            .with_deadline("10/10/2025 14:00")
            .to_text();
        assert!(text.ends_with("\n📅 **Prazo:** 10/10/2025 14:00"));
    }

    #[test]
    fn test_detailed_attachment_text() {
        let announcement = AttachmentAnnouncement::new("report.pdf")
            .with_card_title("ACME")
            .with_details(FileDetails {
                file_type: "application/pdf".into(),
                size_text: "2.5 MB".into(),
                extension: "pdf".into(),
                author_name: "Ana".into(),
                author_role: "vendedor".into(),
            });
        assert_eq!(
            announcement.to_text(),
            "📎 Anexo adicionado: report.pdf\n📋 Ficha: ACME\n📊 Detalhes do arquivo:\n• Tipo: application/pdf\n• Tamanho: 2.5 MB\n• Extensão: pdf\n• Autor: Ana (vendedor)"
        );
    }

    #[test]
    fn test_extension_fallback() {
        assert_eq!(AttachmentAnnouncement::new("Scan.PDF").extension(), "pdf");
        assert_eq!(AttachmentAnnouncement::new("README").extension(), "file");
    }

    #[test]
    fn test_body_serde_tagged() {
        let body = CommentBody::TaskAnnouncement(TaskAnnouncement::new("Bob", "Follow up"));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["kind"], "task_announcement");
        assert_eq!(json["assignee_name"], "Bob");
        let plain: CommentBody = serde_json::from_str(r#"{"kind":"plain_text"}"#).unwrap();
        assert_eq!(plain, CommentBody::PlainText);
    }
}

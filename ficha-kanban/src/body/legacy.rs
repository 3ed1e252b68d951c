//! Reader for comment text written before bodies were stored structurally.
//!
//! Recognized templates, checked in this order:
//!
//! 1. Task announcement: `📋 **Tarefa criada**`, assignee, description and an
//!    optional deadline line.
//! 2. Detailed attachment announcement: file, card, type, size, extension,
//!    author and role.
//! 3. Minimal attachment announcement: `📎 Anexo adicionado: NAME`, with an
//!    optional `📋 Ficha:` line anywhere in the text.
//!
//! Everything else is plain text.

use super::{AttachmentAnnouncement, CommentBody, FileDetails, TaskAnnouncement};
use regex::Regex;
use std::sync::OnceLock;

static TASK_REGEX: OnceLock<Regex> = OnceLock::new();
static ATTACHMENT_DETAILED_REGEX: OnceLock<Regex> = OnceLock::new();
static ATTACHMENT_MINIMAL_REGEX: OnceLock<Regex> = OnceLock::new();
static CARD_TITLE_REGEX: OnceLock<Regex> = OnceLock::new();

fn task_regex() -> &'static Regex {
    TASK_REGEX.get_or_init(|| {
        // Early announcements wrote the deadline label without bold
        Regex::new(
            r"(?s)📋 \*\*Tarefa criada\*\*\s*\n👤 \*\*Para:\*\* @(.+?)\n📝 \*\*Descrição:\*\* (.+?)(?:\n📅 (?:\*\*Prazo:\*\*|Prazo:) (.+?))?\s*$",
        )
        .expect("Invalid task announcement regex")
    })
}

fn attachment_detailed_regex() -> &'static Regex {
    ATTACHMENT_DETAILED_REGEX.get_or_init(|| {
        Regex::new(
            r"(?s)📎 Anexo adicionado: (.+?)\n📋 Ficha: (.+?)\n📊 Detalhes do arquivo:\n• Tipo: (.+?)\n• Tamanho: (.+?)\n• Extensão: (.+?)\n• Autor: (.+?) \((.+?)\)",
        )
        .expect("Invalid detailed attachment regex")
    })
}

fn attachment_minimal_regex() -> &'static Regex {
    ATTACHMENT_MINIMAL_REGEX.get_or_init(|| {
        Regex::new(r"📎 Anexo adicionado: (.+?)(?:\n|$)").expect("Invalid attachment regex")
    })
}

fn card_title_regex() -> &'static Regex {
    CARD_TITLE_REGEX.get_or_init(|| {
        Regex::new(r"📋 Ficha: (.+?)(?:\n|$)").expect("Invalid card title regex")
    })
}

/// Classify legacy comment text
pub fn parse(text: &str) -> CommentBody {
    if let Some(task) = parse_task(text) {
        return CommentBody::TaskAnnouncement(task);
    }
    if let Some(attachment) = parse_attachment(text) {
        return CommentBody::AttachmentAnnouncement(attachment);
    }
    CommentBody::PlainText
}

/// Parse the task announcement template
pub fn parse_task(text: &str) -> Option<TaskAnnouncement> {
    let captures = task_regex().captures(text)?;
    Some(TaskAnnouncement {
        assignee_name: captures[1].trim().to_string(),
        description: captures[2].trim().to_string(),
        deadline: captures.get(3).map(|m| m.as_str().trim().to_string()),
    })
}

/// Parse either attachment template, detailed first
pub fn parse_attachment(text: &str) -> Option<AttachmentAnnouncement> {
    if let Some(captures) = attachment_detailed_regex().captures(text) {
        return Some(AttachmentAnnouncement {
            file_name: captures[1].trim().to_string(),
            card_title: Some(captures[2].trim().to_string()),
            details: Some(FileDetails {
                file_type: captures[3].trim().to_string(),
                size_text: captures[4].trim().to_string(),
                extension: captures[5].trim().to_string(),
                author_name: captures[6].trim().to_string(),
                author_role: captures[7].trim().to_string(),
            }),
        });
    }

    let captures = attachment_minimal_regex().captures(text)?;
    let card_title = card_title_regex()
        .captures(text)
        .map(|c| c[1].trim().to_string());
    Some(AttachmentAnnouncement {
        file_name: captures[1].trim().to_string(),
        card_title,
        details: None,
    })
}

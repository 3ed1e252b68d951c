//! How a comment is presented
//!
//! Precedence, highest first: live task or stored attachment records, then
//! what the comment's body says, then plain text. A body parsed from old
//! text is a snapshot; the records reflect later edits.

use crate::attachment::{sanitize_card_name, sanitize_file_name};
use crate::body::{AttachmentAnnouncement, CommentBody, TaskAnnouncement};
use crate::task::{find_for_comment, find_legacy};
use crate::types::{Attachment, AttachmentId, Comment, Task, TaskId, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;

const FALLBACK_CARD_TITLE: &str = "Card";
const SYSTEM_AUTHOR: &str = "Sistema";

/// Display format for task deadlines
pub fn format_deadline(deadline: DateTime<Utc>) -> String {
    deadline.format("%d/%m/%Y %H:%M").to_string()
}

/// Where rendered data came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// A task or attachment record
    Record,
    /// The comment's own body
    Body,
}

/// Lookup data for [`render_comment`]
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub tasks: &'a [Task],
    pub attachments: &'a [Attachment],
    pub card_title: Option<&'a str>,
    /// Folder prefix used when reconstructing paths of detailed announcements
    pub legacy_prefix: &'a str,
}

impl<'a> RenderContext<'a> {
    pub fn new(tasks: &'a [Task], attachments: &'a [Attachment], legacy_prefix: &'a str) -> Self {
        Self {
            tasks,
            attachments,
            card_title: None,
            legacy_prefix,
        }
    }

    pub fn with_card_title(mut self, card_title: &'a str) -> Self {
        self.card_title = Some(card_title);
        self
    }

    fn attachments_of(&self, comment: &Comment) -> Vec<AttachmentView> {
        self.attachments
            .iter()
            .filter(|a| a.belongs_to(&comment.id))
            .map(|a| AttachmentView {
                attachment: a.clone(),
                source: Source::Record,
            })
            .collect()
    }
}

/// Completion checkbox target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskBinding {
    pub task_id: TaskId,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedTask {
    pub assignee: String,
    pub description: String,
    pub deadline: Option<String>,
    /// Present when a live task matched
    pub binding: Option<TaskBinding>,
    pub source: Source,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentView {
    pub attachment: Attachment,
    pub source: Source,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RenderedComment {
    Task(RenderedTask),
    Attachments { attachments: Vec<AttachmentView> },
    Text {
        content: String,
        attachments: Vec<AttachmentView>,
    },
}

/// Decide how `comment` is shown
pub fn render_comment(comment: &Comment, ctx: &RenderContext<'_>) -> RenderedComment {
    match &comment.body {
        CommentBody::TaskAnnouncement(announcement) => {
            RenderedComment::Task(render_task(comment, announcement, ctx))
        }
        CommentBody::AttachmentAnnouncement(announcement) => {
            let stored = ctx.attachments_of(comment);
            let attachments = if stored.is_empty() {
                vec![AttachmentView {
                    attachment: fallback_attachment(comment, announcement, ctx),
                    source: Source::Body,
                }]
            } else {
                stored
            };
            RenderedComment::Attachments { attachments }
        }
        CommentBody::PlainText => RenderedComment::Text {
            content: comment.content.clone(),
            attachments: ctx.attachments_of(comment),
        },
    }
}

fn render_task(
    comment: &Comment,
    announcement: &TaskAnnouncement,
    ctx: &RenderContext<'_>,
) -> RenderedTask {
    let live = find_for_comment(ctx.tasks, &comment.id)
        .or_else(|| find_legacy(ctx.tasks, &comment.card_id, &announcement.description));

    match live {
        Some(task) => RenderedTask {
            assignee: task.assigned_to_name.clone(),
            description: task.description.clone(),
            deadline: task.deadline.map(format_deadline),
            binding: Some(TaskBinding {
                task_id: task.id.clone(),
                completed: task.is_completed(),
            }),
            source: Source::Record,
        },
        None => RenderedTask {
            assignee: announcement.assignee_name.clone(),
            description: announcement.description.clone(),
            deadline: announcement.deadline.clone(),
            binding: None,
            source: Source::Body,
        },
    }
}

/// Attachment reconstructed from an announcement when no record exists
fn fallback_attachment(
    comment: &Comment,
    announcement: &AttachmentAnnouncement,
    ctx: &RenderContext<'_>,
) -> Attachment {
    let card_title = announcement
        .card_title
        .as_deref()
        .or(ctx.card_title)
        .unwrap_or(FALLBACK_CARD_TITLE);
    let extension = announcement.extension();
    let file_name = &announcement.file_name;

    let (file_path, file_size, file_type, author_name, author_role) = match &announcement.details
    {
        Some(details) => (
            format!(
                "{}/{}/{}",
                ctx.legacy_prefix,
                sanitize_card_name(card_title),
                sanitize_file_name(file_name)
            ),
            details.size_bytes(),
            details.file_type.clone(),
            details.author_name.clone(),
            Some(details.author_role.clone()),
        ),
        None => (
            format!("{card_title}/{file_name}"),
            0,
            format!("application/{extension}"),
            SYSTEM_AUTHOR.to_string(),
            None,
        ),
    };

    Attachment {
        id: AttachmentId::from_string(format!("comment-attachment-{}", comment.id)),
        card_id: comment.card_id.clone(),
        author_id: UserId::from_string(""),
        author_name,
        author_role,
        file_name: file_name.clone(),
        file_path,
        file_size,
        file_type,
        file_extension: extension,
        description: Some(card_title.to_string()),
        comment_id: Some(comment.id.clone()),
        created_at: comment.created_at,
        updated_at: comment.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::FileDetails;
    use crate::types::{CardId, CommentId, ThreadId};

    fn comment(body: CommentBody) -> Comment {
        let now = Utc::now();
        Comment {
            id: CommentId::from_string("c1"),
            card_id: CardId::from_string("card"),
            author_id: UserId::from_string("u1"),
            author_name: "Ana".into(),
            author_role: None,
            content: body.to_text().unwrap_or_else(|| "olá".into()),
            body,
            parent_id: None,
            level: 0,
            thread_id: ThreadId::from_string("c1"),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_plain_text_is_verbatim() {
        let c = comment(CommentBody::PlainText);
        let rendered = render_comment(&c, &RenderContext::new(&[], &[], "card-attachments"));
        assert_eq!(
            rendered,
            RenderedComment::Text {
                content: "olá".into(),
                attachments: vec![]
            }
        );
    }

    #[test]
    fn test_detailed_announcement_fabricates_sanitized_path() {
        let announcement = AttachmentAnnouncement::new("FICHA CNPJ (2).pdf")
            .with_card_title("ANTONIO BOZUTT")
            .with_details(FileDetails {
                file_type: "application/pdf".into(),
                size_text: "1 KB".into(),
                extension: "pdf".into(),
                author_name: "Ana".into(),
                author_role: "gestor".into(),
            });
        let c = comment(CommentBody::AttachmentAnnouncement(announcement));

        let rendered = render_comment(&c, &RenderContext::new(&[], &[], "card-attachments"));

        let RenderedComment::Attachments { attachments } = rendered else {
            panic!("expected attachments");
        };
        let fabricated = &attachments[0].attachment;
        assert_eq!(
            fabricated.file_path,
            "card-attachments/ANTONIO_BOZUTT/FICHA_CNPJ__2_.pdf"
        );
        assert_eq!(fabricated.file_size, 1024);
        assert_eq!(fabricated.author_role.as_deref(), Some("gestor"));
        assert_eq!(attachments[0].source, Source::Body);
    }

    #[test]
    fn test_minimal_announcement_uses_context_title() {
        let c = comment(CommentBody::AttachmentAnnouncement(AttachmentAnnouncement::new(
            "scan.PNG",
        )));
        let ctx = RenderContext::new(&[], &[], "card-attachments").with_card_title("ACME");

        let RenderedComment::Attachments { attachments } = render_comment(&c, &ctx) else {
            panic!("expected attachments");
        };
        let fabricated = &attachments[0].attachment;
        assert_eq!(fabricated.file_path, "ACME/scan.PNG");
        assert_eq!(fabricated.file_type, "application/png");
        assert_eq!(fabricated.author_name, "Sistema");
    }

    #[test]
    fn test_deadline_format() {
        use chrono::TimeZone;
        let at = Utc.with_ymd_and_hms(2025, 10, 10, 14, 0, 0).unwrap();
        assert_eq!(format_deadline(at), "10/10/2025 14:00");
    }
}

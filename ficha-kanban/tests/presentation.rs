//! Integration tests for comment rendering and attachment resolution

use chrono::{TimeZone, Utc};
use ficha_config::{FichaConfig, StorageSettings};
use ficha_kanban::attachment::parse_file_size;
use ficha_kanban::render::Source;
use ficha_kanban::test_support::{comment_record, FixedIdentity, MemoryBackend, MemoryBlobStorage};
use ficha_kanban::{
    render_comment, Attachment, AttachmentId, AttachmentResolver, CardId, Collaborators, CommentId,
    CreateTask, FichaContext, Principal, RenderedComment, StorageResolver, TaskPatch, UserId,
};
use std::sync::Arc;

fn context(backend: &Arc<MemoryBackend>, storage: Arc<MemoryBlobStorage>) -> FichaContext {
    let collaborators = Collaborators::from_backend(
        backend.clone(),
        storage,
        Arc::new(FixedIdentity::signed_in(Principal::new("u1", "Ana"))),
    );
    FichaContext::new(FichaConfig::default(), collaborators)
}

fn attachment(id: &str, comment: Option<&str>, path: &str) -> Attachment {
    let at = Utc.with_ymd_and_hms(2025, 10, 6, 9, 0, 0).unwrap();
    Attachment {
        id: AttachmentId::from_string(id),
        card_id: CardId::from_string("card-1"),
        author_id: UserId::from_string("u1"),
        author_name: "Ana".into(),
        author_role: None,
        file_name: "report.pdf".into(),
        file_path: path.into(),
        file_size: 2048,
        file_type: "application/pdf".into(),
        file_extension: "pdf".into(),
        description: None,
        comment_id: comment.map(CommentId::from_string),
        created_at: at,
        updated_at: at,
    }
}

#[test_log::test(tokio::test)]
async fn test_minimal_attachment_text_falls_back() {
    let backend = Arc::new(MemoryBackend::new());
    let at = Utc.with_ymd_and_hms(2025, 10, 6, 9, 0, 0).unwrap();
    backend.seed_comment(comment_record(
        "c1",
        "card-1",
        "📎 Anexo adicionado: report.pdf",
        None,
        None,
        at,
    ));
    let ctx = context(&backend, Arc::new(MemoryBlobStorage::new("card-attachments")));
    let mut comments = ctx.comments(CardId::from_string("card-1"));
    comments.load().await.unwrap();

    let rendered = render_comment(&comments.comments()[0], &ctx.render_context(&[], &[]));

    let RenderedComment::Attachments { attachments } = rendered else {
        panic!("expected an attachment rendering");
    };
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].source, Source::Body);
    assert_eq!(attachments[0].attachment.file_name, "report.pdf");
    assert_eq!(attachments[0].attachment.file_extension, "pdf");
    assert_eq!(attachments[0].attachment.file_path, "Card/report.pdf");
}

#[test_log::test(tokio::test)]
async fn test_stored_records_win_over_text() {
    let backend = Arc::new(MemoryBackend::new());
    let at = Utc.with_ymd_and_hms(2025, 10, 6, 9, 0, 0).unwrap();
    backend.seed_comment(comment_record(
        "c1",
        "card-1",
        "📎 Anexo adicionado: report.pdf",
        None,
        None,
        at,
    ));
    backend.seed_attachment(attachment("a1", Some("c1"), "card-1/report_v2.pdf"));
    backend.seed_attachment(attachment("a2", None, "card-1/contrato.pdf"));
    let ctx = context(&backend, Arc::new(MemoryBlobStorage::new("card-attachments")));

    let mut comments = ctx.comments(CardId::from_string("card-1"));
    comments.load().await.unwrap();
    let mut files = ctx.attachments(CardId::from_string("card-1"));
    files.load().await.unwrap();
    assert_eq!(files.card_level().len(), 1);
    assert_eq!(files.for_comment(&CommentId::from_string("c1")).len(), 1);

    let rendered = render_comment(
        &comments.comments()[0],
        &ctx.render_context(&[], files.attachments()),
    );

    let RenderedComment::Attachments { attachments } = rendered else {
        panic!("expected an attachment rendering");
    };
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].source, Source::Record);
    assert_eq!(attachments[0].attachment.file_path, "card-1/report_v2.pdf");
}

#[test_log::test(tokio::test)]
async fn test_live_task_record_wins_over_text() {
    let backend = Arc::new(MemoryBackend::new());
    backend.add_user("u2", "Alice");
    backend.add_user("u3", "Bob");
    let ctx = context(&backend, Arc::new(MemoryBlobStorage::new("card-attachments")));
    let card = CardId::from_string("card-1");
    let mut comments = ctx.comments(card.clone());
    let mut tasks = ctx.tasks(None, Some(card)).unwrap();

    let announced = ctx
        .announce_task(
            &mut comments,
            &mut tasks,
            CreateTask::new("card-1", "u2", "Ligar para o cliente"),
            "Alice",
        )
        .await
        .unwrap();
    let comment = announced.comment.unwrap();
    assert!(comment.content.contains("@Alice"));
    assert_eq!(announced.task.comment_id.as_ref(), Some(&comment.id));

    // Reassigned after the announcement was written
    tasks
        .update(&announced.task.id, TaskPatch::default().with_assignee("u3"))
        .await
        .unwrap();

    let rendered = render_comment(&comment, &ctx.render_context(tasks.tasks(), &[]));
    let RenderedComment::Task(task) = rendered else {
        panic!("expected a task rendering");
    };
    assert_eq!(task.assignee, "Bob");
    assert_eq!(task.source, Source::Record);
    let binding = task.binding.unwrap();
    assert_eq!(binding.task_id, announced.task.id);
    assert!(!binding.completed);
}

#[test_log::test(tokio::test)]
async fn test_legacy_task_matched_by_description() {
    let backend = Arc::new(MemoryBackend::new());
    let at = Utc.with_ymd_and_hms(2025, 10, 6, 9, 0, 0).unwrap();
    backend.seed_comment(comment_record(
        "c1",
        "card-1",
        "📋 **Tarefa criada**\n\n👤 **Para:** @Alice\n📝 **Descrição:** Enviar contrato",
        None,
        None,
        at,
    ));
    let ctx = context(&backend, Arc::new(MemoryBlobStorage::new("card-attachments")));
    let card = CardId::from_string("card-1");
    let mut comments = ctx.comments(card.clone());
    comments.load().await.unwrap();
    let mut tasks = ctx.tasks(None, Some(card)).unwrap();

    // No live task yet: the text is all there is
    let rendered = render_comment(&comments.comments()[0], &ctx.render_context(&[], &[]));
    let RenderedComment::Task(from_text) = rendered else {
        panic!("expected a task rendering");
    };
    assert_eq!(from_text.assignee, "Alice");
    assert!(from_text.binding.is_none());

    // A task created before comment links existed
    let task = tasks
        .create(CreateTask::new("card-1", "u2", "Enviar contrato"), None)
        .await
        .unwrap();
    let rendered = render_comment(
        &comments.comments()[0],
        &ctx.render_context(tasks.tasks(), &[]),
    );
    let RenderedComment::Task(live) = rendered else {
        panic!("expected a task rendering");
    };
    assert_eq!(live.binding.map(|b| b.task_id), Some(task.id));
}

#[test_log::test(tokio::test)]
async fn test_legacy_text_ignores_task_linked_elsewhere() {
    let backend = Arc::new(MemoryBackend::new());
    backend.add_user("u3", "Bob");
    let at = Utc.with_ymd_and_hms(2025, 10, 6, 9, 0, 0).unwrap();
    backend.seed_comment(comment_record(
        "comment-b",
        "card-1",
        "📋 **Tarefa criada**\n\n👤 **Para:** @Alice\n📝 **Descrição:** Ligar para o cliente",
        None,
        None,
        at,
    ));
    let ctx = context(&backend, Arc::new(MemoryBlobStorage::new("card-attachments")));
    let card = CardId::from_string("card-1");
    let mut comments = ctx.comments(card.clone());
    comments.load().await.unwrap();
    let mut tasks = ctx.tasks(None, Some(card)).unwrap();

    // Same description, but this task belongs to another announcement
    tasks
        .create(
            CreateTask::new("card-1", "u3", "Ligar para o cliente"),
            Some(CommentId::from_string("comment-a")),
        )
        .await
        .unwrap();

    let rendered = render_comment(
        &comments.comments()[0],
        &ctx.render_context(tasks.tasks(), &[]),
    );
    let RenderedComment::Task(task) = rendered else {
        panic!("expected a task rendering");
    };
    assert!(task.binding.is_none());
    assert_eq!(task.assignee, "Alice");
}

#[test_log::test(tokio::test)]
async fn test_resolver_prefers_existing_paths() {
    let storage = Arc::new(
        MemoryBlobStorage::new("card-attachments")
            .with_object("card-attachments/ACME_Ltda/nota_fiscal.pdf"),
    );
    let resolver = StorageResolver::new(storage.clone(), StorageSettings::default());

    let url = resolver.resolve("ACME Ltda/nota fiscal.pdf").await;

    assert_eq!(
        url,
        "https://storage.test/card-attachments/card-attachments/ACME_Ltda/nota_fiscal.pdf"
    );
}

#[test_log::test(tokio::test)]
async fn test_resolver_listing_match_and_fallback() {
    let storage = Arc::new(
        MemoryBlobStorage::new("card-attachments")
            .with_object("ACME/.emptyFolderPlaceholder")
            .with_object("ACME/1759757704162_nota-fiscal_2025.pdf"),
    );
    let resolver = StorageResolver::new(storage.clone(), StorageSettings::default());

    let url = resolver.resolve("ACME/nota-fiscal").await;
    assert_eq!(
        url,
        "https://storage.test/card-attachments/ACME/1759757704162_nota-fiscal_2025.pdf"
    );

    // Nothing matches: unverified URL of the original path
    let url = resolver.resolve("Outro/inexistente.pdf").await;
    assert_eq!(url, "https://storage.test/card-attachments/Outro/inexistente.pdf");
    assert!(storage.probes() > 0);
}

#[test_log::test(tokio::test)]
async fn test_attachment_delete_removes_blob_and_record() {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed_attachment(attachment("a1", None, "card-1/report.pdf"));
    let storage =
        Arc::new(MemoryBlobStorage::new("card-attachments").with_object("card-1/report.pdf"));
    let ctx = context(&backend, storage.clone());

    let mut files = ctx.attachments(CardId::from_string("card-1"));
    files.load().await.unwrap();
    files
        .delete(&AttachmentId::from_string("a1"))
        .await
        .unwrap();

    assert!(files.attachments().is_empty());
    assert!(!storage.contains("card-1/report.pdf"));
    assert_eq!(backend.attachment_count(), 0);
}

#[test]
fn test_file_size_parse() {
    assert_eq!(parse_file_size("2.5 MB"), (2.5 * 1024.0 * 1024.0) as u64);
    assert_eq!(parse_file_size("bogus"), 0);
}

//! Best-effort download URLs for attachment paths
//!
//! Stored paths drifted over time: some carry a legacy bucket prefix, some
//! were sanitized on upload, some were reconstructed from comment text. The
//! resolver probes the plausible variants and always answers with a URL,
//! which may point at nothing.

use crate::backend::BlobStorage;
use async_trait::async_trait;
use ficha_config::StorageSettings;
use std::sync::Arc;
use tracing::{debug, warn};

const PLACEHOLDER: &str = ".emptyFolderPlaceholder";

/// Turns a logical file reference into a downloadable URL
#[async_trait]
pub trait AttachmentResolver: Send + Sync {
    async fn resolve(&self, file_path: &str) -> String;
}

/// Replace everything but ASCII alphanumerics, `_` and `-` with `_`
pub fn sanitize_card_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Like [`sanitize_card_name`] but keeps `.`
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Lowercased ASCII alphanumerics only, for fuzzy listing matches
fn squash(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// First segment as the card folder (absent for a bare file name) and last
/// segment as the file
fn split_path(path: &str) -> (Option<&str>, &str) {
    match path.split_once('/') {
        Some((card, rest)) => (Some(card), rest.rsplit('/').next().unwrap_or(rest)),
        None => (None, path),
    }
}

/// Path variants worth probing for `path`, in probe order, without
/// duplicates
pub fn candidate_paths(path: &str, legacy_prefix: &str) -> Vec<String> {
    let (card, file) = split_path(path);

    let mut variants = vec![
        path.to_string(),
        file.to_string(),
        format!("{legacy_prefix}/{path}"),
        format!("{legacy_prefix}/{file}"),
    ];
    if let Some(card) = card {
        let card_clean = sanitize_card_name(card);
        let file_clean = sanitize_file_name(file);
        variants.extend([
            format!("{card}/{file}"),
            format!("{legacy_prefix}/{card}/{file}"),
            format!("{card_clean}/{file_clean}"),
            format!("{legacy_prefix}/{card_clean}/{file_clean}"),
        ]);
    } else {
        let file_clean = sanitize_file_name(file);
        variants.extend([file_clean.clone(), format!("{legacy_prefix}/{file_clean}")]);
    }

    let mut paths: Vec<String> = Vec::with_capacity(variants.len());
    for variant in variants {
        if !variant.is_empty() && !paths.contains(&variant) {
            paths.push(variant);
        }
    }
    paths
}

/// Resolves against a [`BlobStorage`] bucket
pub struct StorageResolver {
    storage: Arc<dyn BlobStorage>,
    settings: StorageSettings,
}

impl StorageResolver {
    pub fn new(storage: Arc<dyn BlobStorage>, settings: StorageSettings) -> Self {
        Self { storage, settings }
    }

    async fn probe(&self, path: &str) -> bool {
        match self.storage.exists(path).await {
            Ok(found) => found,
            Err(err) => {
                debug!("Probe of {} failed: {}", path, err);
                false
            }
        }
    }

    /// First listed object whose squashed name contains both the squashed
    /// card and file names
    async fn search_listing(&self, path: &str) -> Option<String> {
        let entries = match self.storage.list("", self.settings.list_limit).await {
            Ok(entries) => entries,
            Err(err) => {
                warn!("Listing bucket {} failed: {}", self.settings.bucket, err);
                return None;
            }
        };

        let (card, file) = split_path(path);
        let card = card.map(squash).unwrap_or_default();
        let file = squash(file);
        if file.is_empty() {
            return None;
        }

        entries
            .into_iter()
            .filter(|entry| entry.name != self.settings.bucket && !entry.name.contains(PLACEHOLDER))
            .find(|entry| {
                let name = squash(&entry.name);
                name.contains(&file) && name.contains(&card)
            })
            .map(|entry| entry.name)
    }
}

#[async_trait]
impl AttachmentResolver for StorageResolver {
    async fn resolve(&self, file_path: &str) -> String {
        for candidate in candidate_paths(file_path, &self.settings.legacy_prefix) {
            if self.probe(&candidate).await {
                debug!("Resolved {} as {}", file_path, candidate);
                return self.storage.public_url(&candidate);
            }
        }

        if let Some(found) = self.search_listing(file_path).await {
            debug!("Resolved {} by listing match {}", file_path, found);
            return self.storage.public_url(&found);
        }

        warn!("No stored object matches {}; returning unverified URL", file_path);
        self.storage.public_url(file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_card_name("ANTONIO BOZUTT"), "ANTONIO_BOZUTT");
        assert_eq!(sanitize_file_name("FICHA CNPJ (2).pdf"), "FICHA_CNPJ__2_.pdf");
        assert_eq!(sanitize_card_name("a.b"), "a_b");
    }

    #[test]
    fn test_candidates_in_probe_order() {
        let paths = candidate_paths("ACME Ltda/nota fiscal.pdf", "card-attachments");
        assert_eq!(
            paths,
            vec![
                "ACME Ltda/nota fiscal.pdf",
                "nota fiscal.pdf",
                "card-attachments/ACME Ltda/nota fiscal.pdf",
                "card-attachments/nota fiscal.pdf",
                "ACME_Ltda/nota_fiscal.pdf",
                "card-attachments/ACME_Ltda/nota_fiscal.pdf",
            ]
        );
    }

    #[test]
    fn test_bare_file_name_has_no_duplicates() {
        let paths = candidate_paths("report.pdf", "card-attachments");
        assert_eq!(paths, vec!["report.pdf", "card-attachments/report.pdf"]);

        let paths = candidate_paths("nota fiscal.pdf", "card-attachments");
        assert_eq!(
            paths,
            vec![
                "nota fiscal.pdf",
                "card-attachments/nota fiscal.pdf",
                "nota_fiscal.pdf",
                "card-attachments/nota_fiscal.pdf",
            ]
        );
    }
}

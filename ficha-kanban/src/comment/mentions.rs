//! `@handle` mentions and the notifications they produce

use crate::types::{CardId, CommentId, UserId};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

fn mention_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@(\w+)").expect("Invalid mention regex"))
}

/// Extract unique mention handles (without the `@`) in first-seen order
pub fn extract_mentions(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    mention_regex()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|handle| seen.insert(handle.clone()))
        .collect()
}

/// Something a collaborator should be told about after a comment is posted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// Someone answered `recipient`'s comment
    Reply {
        card_id: CardId,
        comment_id: CommentId,
        recipient: UserId,
        author_name: String,
    },
    /// `handle` was mentioned in a comment
    Mention {
        card_id: CardId,
        comment_id: CommentId,
        handle: String,
        author_name: String,
    },
}

impl Notification {
    pub fn comment_id(&self) -> &CommentId {
        match self {
            Self::Reply { comment_id, .. } | Self::Mention { comment_id, .. } => comment_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_unique_in_order() {
        let mentions = extract_mentions("@bruno veja com @ana e @bruno de novo");
        assert_eq!(mentions, vec!["bruno", "ana"]);
    }

    #[test]
    fn test_no_mentions() {
        assert!(extract_mentions("sem menções aqui, email@").is_empty());
    }

    #[test]
    fn test_handle_stops_at_punctuation() {
        assert_eq!(extract_mentions("oi @carla, tudo bem?"), vec!["carla"]);
    }
}

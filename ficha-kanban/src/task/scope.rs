use crate::types::{CardId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which tasks a [`TaskStore`](super::TaskStore) holds
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "by", content = "id", rename_all = "snake_case")]
pub enum TaskScope {
    /// Every task of a card, whoever it is assigned to
    Card(CardId),
    /// Tasks assigned to one user across all cards
    Assignee(UserId),
}

impl TaskScope {
    /// Resolve a filter pair. The card wins when both are given; `None` when
    /// neither is.
    pub fn from_filter(assignee: Option<UserId>, card: Option<CardId>) -> Option<Self> {
        match (card, assignee) {
            (Some(card), _) => Some(Self::Card(card)),
            (None, Some(user)) => Some(Self::Assignee(user)),
            (None, None) => None,
        }
    }

    pub fn card_id(&self) -> Option<&CardId> {
        match self {
            Self::Card(card) => Some(card),
            Self::Assignee(_) => None,
        }
    }
}

impl fmt::Display for TaskScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Card(card) => write!(f, "card {}", card),
            Self::Assignee(user) => write!(f, "assignee {}", user),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_filter_takes_precedence() {
        let scope = TaskScope::from_filter(
            Some(UserId::from_string("u1")),
            Some(CardId::from_string("c1")),
        );
        assert_eq!(scope, Some(TaskScope::Card(CardId::from_string("c1"))));
    }

    #[test]
    fn test_assignee_only_and_empty() {
        assert_eq!(
            TaskScope::from_filter(Some(UserId::from_string("u1")), None),
            Some(TaskScope::Assignee(UserId::from_string("u1")))
        );
        assert_eq!(TaskScope::from_filter(None, None), None);
    }
}

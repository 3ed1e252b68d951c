//! Thread assembly over a card's flat comment list
//!
//! Everything here is a pure function of the cached comments. Nothing is
//! stored; callers recompute whenever the list changes.

use crate::types::{Comment, CommentId, ThreadId};
use ficha_config::CommentSettings;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Whether a thread still accepts replies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ThreadCapacity {
    Open,
    /// At or past the warning threshold, `remaining` replies left
    ApproachingLimit { remaining: usize },
    LimitReached,
}

impl ThreadCapacity {
    pub fn for_count(count: usize, settings: &CommentSettings) -> Self {
        if count >= settings.thread_message_limit {
            Self::LimitReached
        } else if count >= settings.thread_warning_threshold {
            Self::ApproachingLimit {
                remaining: settings.thread_message_limit - count,
            }
        } else {
            Self::Open
        }
    }

    pub fn accepts_replies(&self) -> bool {
        !matches!(self, Self::LimitReached)
    }
}

/// Display colour of a thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadColor {
    Red,
    Blue,
    Green,
    Purple,
    Orange,
    Pink,
    Indigo,
    Teal,
    Gray,
}

const PALETTE: [ThreadColor; 8] = [
    ThreadColor::Red,
    ThreadColor::Blue,
    ThreadColor::Green,
    ThreadColor::Purple,
    ThreadColor::Orange,
    ThreadColor::Pink,
    ThreadColor::Indigo,
    ThreadColor::Teal,
];

impl ThreadColor {
    /// Deterministic colour from the last hex digit of the thread id.
    ///
    /// Gray when the id is empty or does not end in a hex digit.
    pub fn for_thread(thread_id: &ThreadId) -> Self {
        thread_id
            .as_str()
            .chars()
            .last()
            .and_then(|c| c.to_digit(16))
            .map(|digit| PALETTE[digit as usize % PALETTE.len()])
            .unwrap_or(Self::Gray)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Purple => "purple",
            Self::Orange => "orange",
            Self::Pink => "pink",
            Self::Indigo => "indigo",
            Self::Teal => "teal",
            Self::Gray => "gray",
        }
    }
}

/// One conversation: comments sharing a thread id, oldest first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreadGroup {
    pub thread_id: ThreadId,
    /// 1-based position among the card's threads
    pub index: usize,
    pub color: ThreadColor,
    pub capacity: ThreadCapacity,
    pub comments: Vec<Comment>,
}

impl ThreadGroup {
    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    /// The earliest comment
    pub fn first(&self) -> Option<&Comment> {
        self.comments.first()
    }

    /// Comments in reply-tree order
    pub fn conversation(&self) -> Vec<&Comment> {
        conversation_order(&self.comments)
    }
}

/// Threads of a card, ordered by their earliest comment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreadView {
    pub threads: Vec<ThreadGroup>,
    pub comment_count: usize,
}

impl ThreadView {
    pub fn assemble(comments: &[Comment], settings: &CommentSettings) -> Self {
        let mut order: Vec<ThreadId> = Vec::new();
        let mut grouped: HashMap<ThreadId, Vec<Comment>> = HashMap::new();

        for comment in comments {
            let thread_id = effective_thread_id(comment);
            grouped
                .entry(thread_id.clone())
                .or_insert_with(|| {
                    order.push(thread_id);
                    Vec::new()
                })
                .push(comment.clone());
        }

        let mut groups: Vec<(ThreadId, Vec<Comment>)> = order
            .into_iter()
            .filter_map(|id| grouped.remove(&id).map(|comments| (id, comments)))
            .collect();
        for (_, thread) in groups.iter_mut() {
            thread.sort_by_key(|c| c.created_at);
        }
        groups.sort_by_key(|(_, thread)| thread.first().map(|c| c.created_at));

        let threads = groups
            .into_iter()
            .enumerate()
            .map(|(i, (thread_id, comments))| ThreadGroup {
                color: ThreadColor::for_thread(&thread_id),
                capacity: ThreadCapacity::for_count(comments.len(), settings),
                index: i + 1,
                thread_id,
                comments,
            })
            .collect();

        Self {
            threads,
            comment_count: comments.len(),
        }
    }

    /// Number of distinct threads
    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    pub fn thread(&self, thread_id: &ThreadId) -> Option<&ThreadGroup> {
        self.threads.iter().find(|t| &t.thread_id == thread_id)
    }

    /// The group containing `comment`
    pub fn thread_of(&self, comment: &CommentId) -> Option<&ThreadGroup> {
        self.threads
            .iter()
            .find(|t| t.comments.iter().any(|c| &c.id == comment))
    }
}

fn effective_thread_id(comment: &Comment) -> ThreadId {
    if comment.thread_id.is_empty() {
        ThreadId::from(&comment.id)
    } else {
        comment.thread_id.clone()
    }
}

/// Whether a reply to `comment` would stay below the depth ceiling
pub fn can_reply(comment: &Comment, max_level: u32) -> bool {
    comment.level + 1 < max_level
}

/// Flatten comments into reply-tree order: each root followed depth-first by
/// its replies, siblings oldest first.
///
/// A reply whose parent is not in `comments` is placed as a root.
pub fn conversation_order(comments: &[Comment]) -> Vec<&Comment> {
    let present: HashSet<&CommentId> = comments.iter().map(|c| &c.id).collect();
    let mut children: HashMap<&CommentId, Vec<&Comment>> = HashMap::new();
    let mut roots: Vec<&Comment> = Vec::new();

    for comment in comments {
        match &comment.parent_id {
            Some(parent) if present.contains(parent) => {
                children.entry(parent).or_default().push(comment)
            }
            _ => roots.push(comment),
        }
    }
    roots.sort_by_key(|c| c.created_at);
    for siblings in children.values_mut() {
        siblings.sort_by_key(|c| c.created_at);
    }

    let mut ordered = Vec::with_capacity(comments.len());
    let mut stack: Vec<&Comment> = roots.into_iter().rev().collect();
    while let Some(comment) = stack.pop() {
        ordered.push(comment);
        if let Some(replies) = children.get(&comment.id) {
            stack.extend(replies.iter().rev());
        }
    }
    ordered
}

/// Ids to delete for `target`: every descendant depth-first, children before
/// their parent, and `target` last.
pub fn cascade_order(comments: &[Comment], target: &CommentId) -> Vec<CommentId> {
    let mut children: HashMap<&CommentId, Vec<&CommentId>> = HashMap::new();
    for comment in comments {
        if let Some(parent) = &comment.parent_id {
            children.entry(parent).or_default().push(&comment.id);
        }
    }

    let mut ordered = Vec::new();
    let mut visited = HashSet::new();
    collect_post_order(target, &children, &mut visited, &mut ordered);
    ordered
}

fn collect_post_order(
    id: &CommentId,
    children: &HashMap<&CommentId, Vec<&CommentId>>,
    visited: &mut HashSet<CommentId>,
    ordered: &mut Vec<CommentId>,
) {
    if !visited.insert(id.clone()) {
        return;
    }
    if let Some(replies) = children.get(id) {
        for child in replies {
            collect_post_order(child, children, visited, ordered);
        }
    }
    ordered.push(id.clone());
}

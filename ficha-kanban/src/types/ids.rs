//! Newtype identifiers
//!
//! Ids minted locally are ULIDs; ids coming back from the backend are kept
//! verbatim, whatever their format.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Mint a fresh ULID-backed id
            pub fn new() -> Self {
                Self(ulid::Ulid::new().to_string())
            }

            /// Wrap an existing id string
            pub fn from_string(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// A kanban card ("ficha")
    CardId
);
define_id!(CommentId);
define_id!(
    /// Conversation identifier shared by a root comment and all its replies
    ThreadId
);
define_id!(TaskId);
define_id!(AttachmentId);
define_id!(
    /// An authenticated user in the identity directory
    UserId
);

impl From<&CommentId> for ThreadId {
    /// A root comment's thread defaults to the comment's own id
    fn from(id: &CommentId) -> Self {
        Self(id.0.clone())
    }
}

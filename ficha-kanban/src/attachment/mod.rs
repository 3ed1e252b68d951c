//! Card attachments: stored records, download URL resolution and size text

mod resolver;
pub mod size;
mod store;

pub use resolver::{
    candidate_paths, sanitize_card_name, sanitize_file_name, AttachmentResolver, StorageResolver,
};
pub use size::{format_file_size, parse_file_size};
pub use store::AttachmentStore;

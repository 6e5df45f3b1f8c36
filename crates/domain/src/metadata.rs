//! Metadata stored next to each vector.

use crate::chunk::Chunk;
use crate::identity::RepositoryIdentity;
use serde::{Deserialize, Serialize};

/// Stored chunk text is cut to this many characters.
pub const MAX_METADATA_CONTENT_CHARS: usize = 1_000;

/// Per-vector metadata: repository identity, location, and a content preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorRecordMetadata {
    /// Repository owner.
    pub owner: Box<str>,
    /// Repository name.
    pub repo: Box<str>,
    /// User the repository was connected by; scopes later queries.
    pub user_id: Box<str>,
    /// File path of the chunk.
    pub path: Box<str>,
    /// First line (0-indexed, inclusive).
    pub start_line: usize,
    /// End line (exclusive).
    pub end_line: usize,
    /// Chunk text, at most [`MAX_METADATA_CONTENT_CHARS`] characters.
    pub content: Box<str>,
}

impl VectorRecordMetadata {
    /// Describe `chunk` of the repository identified by `identity`.
    #[must_use]
    pub fn for_chunk(identity: &RepositoryIdentity, chunk: &Chunk) -> Self {
        let range = chunk.range();
        Self {
            owner: identity.owner().into(),
            repo: identity.repo().into(),
            user_id: identity.user_id().into(),
            path: chunk.path().into(),
            start_line: range.start(),
            end_line: range.end(),
            content: truncate_chars(chunk.content(), MAX_METADATA_CONTENT_CHARS).into(),
        }
    }
}

/// Prefix of `text` holding at most `max_chars` characters, never splitting a code point.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    text.char_indices()
        .nth(max_chars)
        .map_or(text, |(byte_index, _)| text.get(..byte_index).unwrap_or(text))
}

//! Line-window chunker.
//!
//! A file is split on `\n` and walked with a window of `chunk_size` lines that
//! advances by `chunk_size - overlap` lines. Windows whose text is blank are
//! dropped. The walk stops after the window that reaches the last line.

use crate::primitives::ChunkId;
use crate::spans::LineRange;
use repo_indexer_shared::{ErrorCode, ErrorEnvelope};
use serde::Serialize;
use std::fmt;

/// Lines per window when not configured.
pub const DEFAULT_CHUNK_SIZE: usize = 100;
/// Lines shared by consecutive windows when not configured.
pub const DEFAULT_CHUNK_OVERLAP: usize = 20;
/// Largest accepted window.
pub const MAX_CHUNK_SIZE: usize = 10_000;

/// Rejected chunking parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkingError {
    /// `chunk_size` is zero or above [`MAX_CHUNK_SIZE`].
    ChunkSizeOutOfRange {
        /// Requested window size.
        chunk_size: usize,
    },
    /// `overlap >= chunk_size` would never advance the window.
    OverlapTooLarge {
        /// Requested window size.
        chunk_size: usize,
        /// Requested overlap.
        overlap: usize,
    },
}

impl fmt::Display for ChunkingError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChunkSizeOutOfRange { chunk_size } => write!(
                formatter,
                "chunk size {chunk_size} must be between 1 and {MAX_CHUNK_SIZE}"
            ),
            Self::OverlapTooLarge {
                chunk_size,
                overlap,
            } => write!(
                formatter,
                "overlap {overlap} must be smaller than chunk size {chunk_size}"
            ),
        }
    }
}

impl std::error::Error for ChunkingError {}

impl From<ChunkingError> for ErrorEnvelope {
    fn from(error: ChunkingError) -> Self {
        let envelope = Self::expected(
            ErrorCode::new("domain", "invalid_chunking_options"),
            error.to_string(),
        );
        match error {
            ChunkingError::ChunkSizeOutOfRange { chunk_size } => {
                envelope.with_metadata("chunk_size", chunk_size.to_string())
            },
            ChunkingError::OverlapTooLarge {
                chunk_size,
                overlap,
            } => envelope
                .with_metadata("chunk_size", chunk_size.to_string())
                .with_metadata("overlap", overlap.to_string()),
        }
    }
}

/// Validated window parameters. `overlap < chunk_size` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingOptions {
    chunk_size: usize,
    overlap: usize,
}

impl ChunkingOptions {
    /// Validate window parameters.
    pub const fn new(chunk_size: usize, overlap: usize) -> Result<Self, ChunkingError> {
        if chunk_size == 0 || chunk_size > MAX_CHUNK_SIZE {
            return Err(ChunkingError::ChunkSizeOutOfRange { chunk_size });
        }
        if overlap >= chunk_size {
            return Err(ChunkingError::OverlapTooLarge {
                chunk_size,
                overlap,
            });
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Lines per window.
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Lines shared by consecutive windows.
    #[must_use]
    pub const fn overlap(&self) -> usize {
        self.overlap
    }

    /// Distance between consecutive window starts; never zero.
    #[must_use]
    pub const fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// One embeddable slice of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    id: ChunkId,
    path: Box<str>,
    content: Box<str>,
    #[serde(flatten)]
    range: LineRange,
}

impl Chunk {
    /// Stable id derived from path and range.
    #[must_use]
    pub const fn id(&self) -> &ChunkId {
        &self.id
    }

    /// Repository path of the owning file.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Lines `[start, end)` joined with `\n`.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Covered lines.
    #[must_use]
    pub const fn range(&self) -> LineRange {
        self.range
    }
}

/// Split `content` into overlapping line windows.
///
/// Output depends only on the arguments, so re-chunking an unchanged file
/// reproduces the same ids.
#[must_use]
pub fn chunk_source(path: &str, content: &str, options: ChunkingOptions) -> Vec<Chunk> {
    let lines: Vec<&str> = content.split('\n').collect();
    let total = lines.len();
    let mut chunks = Vec::with_capacity(total / options.stride() + 1);
    let mut start = 0;

    while start < total {
        let end = start.saturating_add(options.chunk_size()).min(total);
        let text = lines.get(start..end).unwrap_or_default().join("\n");

        if !is_blank(&text) {
            if let Ok(range) = LineRange::new(start, end) {
                chunks.push(Chunk {
                    id: ChunkId::derive(path, range),
                    path: path.into(),
                    content: text.into_boxed_str(),
                    range,
                });
            }
        }

        if end >= total {
            break;
        }
        start += options.stride();
    }

    chunks
}

// A byte order mark counts as whitespace, so a BOM-only window is skipped.
fn is_blank(text: &str) -> bool {
    text.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
        .is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn numbered_lines(count: usize) -> String {
        (0..count)
            .map(|line| format!("line {line}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn ranges(chunks: &[Chunk]) -> Vec<(usize, usize)> {
        chunks
            .iter()
            .map(|chunk| (chunk.range().start(), chunk.range().end()))
            .collect()
    }

    #[test]
    fn default_windows_over_250_lines() {
        let chunks = chunk_source("src/app.ts", &numbered_lines(250), ChunkingOptions::default());

        assert_eq!(ranges(&chunks), vec![(0, 100), (80, 180), (160, 250)]);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks.get(2).map(|chunk| chunk.range().len()), Some(90));
        assert_eq!(
            chunks.first().map(|chunk| chunk.id().as_str()),
            Some("src/app.ts:0-100")
        );
    }

    #[test]
    fn byte_order_mark_alone_is_blank() {
        assert!(chunk_source("a.txt", "\u{feff}\n", ChunkingOptions::default()).is_empty());
        assert!(chunk_source("a.txt", "\u{feff} \n\t", ChunkingOptions::default()).is_empty());

        let chunks = chunk_source("a.txt", "\u{feff}x", ChunkingOptions::default());
        assert_eq!(chunks.first().map(Chunk::content), Some("\u{feff}x"));
    }

    #[test]
    fn empty_content_yields_nothing() {
        assert!(chunk_source("empty.txt", "", ChunkingOptions::default()).is_empty());
        assert!(chunk_source("blank.txt", "\n  \n\t\n", ChunkingOptions::default()).is_empty());
    }

    #[test]
    fn short_file_is_one_chunk() {
        let chunks = chunk_source("a.rs", "fn main() {}\n", ChunkingOptions::default());
        assert_eq!(ranges(&chunks), vec![(0, 2)]);
        assert_eq!(chunks.first().map(Chunk::content), Some("fn main() {}\n"));
    }

    #[test]
    fn blank_windows_are_skipped_but_walk_continues() -> Result<(), ChunkingError> {
        let mut lines = vec!["head".to_owned()];
        lines.extend(std::iter::repeat_n(String::new(), 10));
        lines.push("tail".to_owned());
        let options = ChunkingOptions::new(4, 1)?;

        let chunks = chunk_source("gap.txt", &lines.join("\n"), options);

        assert_eq!(ranges(&chunks), vec![(0, 4), (9, 12)]);
        Ok(())
    }

    #[test]
    fn rejects_non_advancing_windows() {
        assert_eq!(
            ChunkingOptions::new(10, 10),
            Err(ChunkingError::OverlapTooLarge {
                chunk_size: 10,
                overlap: 10
            })
        );
        assert!(ChunkingOptions::new(0, 0).is_err());
        assert!(ChunkingOptions::new(MAX_CHUNK_SIZE + 1, 0).is_err());
        assert_eq!(ChunkingOptions::new(1, 0).map(|o| o.stride()), Ok(1));
    }

    #[test]
    fn chunk_serializes_flat() -> Result<(), serde_json::Error> {
        let chunks = chunk_source("a.py", "print(1)", ChunkingOptions::default());
        let json = serde_json::to_value(&chunks)?;
        assert_eq!(
            json,
            serde_json::json!([{
                "id": "a.py:0-1",
                "path": "a.py",
                "content": "print(1)",
                "startLine": 0,
                "endLine": 1
            }])
        );
        Ok(())
    }

    fn options_strategy() -> impl Strategy<Value = ChunkingOptions> {
        (1_usize..40).prop_flat_map(|size| {
            (0..size).prop_map(move |overlap| {
                ChunkingOptions::new(size, overlap).unwrap_or_default()
            })
        })
    }

    proptest! {
        #[test]
        fn chunking_is_deterministic(
            content in "[a-z \n]{0,400}",
            options in options_strategy(),
        ) {
            let first = chunk_source("p.txt", &content, options);
            let second = chunk_source("p.txt", &content, options);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn non_blank_lines_are_covered_without_gaps(
            lines in prop::collection::vec("[a-z]{1,8}", 1..300),
            options in options_strategy(),
        ) {
            let chunks = chunk_source("p.txt", &lines.join("\n"), options);
            let mut covered_to = 0;
            for chunk in &chunks {
                prop_assert!(chunk.range().start() <= covered_to);
                covered_to = covered_to.max(chunk.range().end());
            }
            prop_assert_eq!(covered_to, lines.len());
        }

        #[test]
        fn no_emitted_chunk_is_blank(
            content in "[a \n\u{feff}]{0,300}",
            options in options_strategy(),
        ) {
            for chunk in chunk_source("p.txt", &content, options) {
                prop_assert!(!is_blank(chunk.content()));
                prop_assert!(chunk.range().start() < chunk.range().end());
            }
        }

        #[test]
        fn ids_are_unique_per_path_and_range(
            content in "[a-z\n]{1,300}",
            options in options_strategy(),
        ) {
            let mut ids: Vec<_> = chunk_source("a.txt", &content, options)
                .into_iter()
                .chain(chunk_source("b.txt", &content, options))
                .map(|chunk| chunk.id().clone())
                .collect();
            let total = ids.len();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), total);
        }
    }
}

//! Fetched text files.

use serde::{Deserialize, Serialize};

/// One decoded UTF-8 file of a repository, addressed by its repository path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path relative to the repository root, `/`-separated.
    pub path: Box<str>,
    /// Full file text.
    pub content: Box<str>,
}

impl SourceFile {
    /// Build a source file.
    pub fn new(path: impl Into<Box<str>>, content: impl Into<Box<str>>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

//! Identifier newtypes with validated constructors.

use crate::spans::LineRange;
use repo_indexer_shared::{ErrorCode, ErrorEnvelope};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Validation failures for identifiers and line ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimitiveError {
    /// `ChunkId` is empty after trimming.
    InvalidChunkId {
        /// Length of the raw input before trimming.
        input_length: usize,
    },
    /// `Namespace` is not of the form `owner/repo`.
    InvalidNamespace {
        /// Trimmed input that failed validation.
        input: String,
    },
    /// `LineRange` must satisfy `start < end`.
    EmptyLineRange {
        /// First line of the range (0-indexed, inclusive).
        start: usize,
        /// End of the range (exclusive).
        end: usize,
    },
}

impl PrimitiveError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidChunkId { .. } => ErrorCode::new("domain", "invalid_chunk_id"),
            Self::InvalidNamespace { .. } => ErrorCode::new("domain", "invalid_namespace"),
            Self::EmptyLineRange { .. } => ErrorCode::new("domain", "invalid_line_range"),
        }
    }
}

impl fmt::Display for PrimitiveError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidChunkId { .. } => formatter.write_str("ChunkId must be non-empty"),
            Self::InvalidNamespace { .. } => {
                formatter.write_str("Namespace must look like `owner/repo`")
            },
            Self::EmptyLineRange { .. } => {
                formatter.write_str("LineRange start must be < end")
            },
        }
    }
}

impl std::error::Error for PrimitiveError {}

impl From<PrimitiveError> for ErrorEnvelope {
    fn from(error: PrimitiveError) -> Self {
        let envelope = Self::expected(error.error_code(), error.to_string());
        match error {
            PrimitiveError::InvalidChunkId { input_length } => {
                envelope.with_metadata("input_length", input_length.to_string())
            },
            PrimitiveError::InvalidNamespace { input } => envelope.with_metadata("input", input),
            PrimitiveError::EmptyLineRange { start, end } => envelope
                .with_metadata("start", start.to_string())
                .with_metadata("end", end.to_string()),
        }
    }
}

/// Deterministic chunk identifier: `{path}:{start}-{end}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkId(Box<str>);

impl ChunkId {
    /// Parse a `ChunkId` from user input.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, PrimitiveError> {
        let raw = input.as_ref();
        let Some(trimmed) = trimmed_non_empty(raw) else {
            return Err(PrimitiveError::InvalidChunkId {
                input_length: raw.len(),
            });
        };
        Ok(Self(trimmed.into()))
    }

    /// Derive the id of the chunk covering `range` of the file at `path`.
    ///
    /// The same path and range always yield the same id.
    #[must_use]
    pub fn derive(path: &str, range: LineRange) -> Self {
        Self(format!("{path}:{}-{}", range.start(), range.end()).into_boxed_str())
    }

    /// Access the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the underlying string.
    #[must_use]
    pub fn into_inner(self) -> Box<str> {
        self.0
    }
}

impl AsRef<str> for ChunkId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Vector-store partition for one repository: `{owner}/{repo}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(Box<str>);

impl Namespace {
    /// Parse a namespace; both halves around the first `/` must be non-empty.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, PrimitiveError> {
        let trimmed = input.as_ref().trim();
        let valid = trimmed
            .split_once('/')
            .is_some_and(|(owner, repo)| !owner.is_empty() && !repo.is_empty());
        if !valid {
            return Err(PrimitiveError::InvalidNamespace {
                input: trimmed.to_owned(),
            });
        }
        Ok(Self(trimmed.into()))
    }

    pub(crate) fn from_parts(owner: &str, repo: &str) -> Self {
        Self(format!("{owner}/{repo}").into_boxed_str())
    }

    /// Access the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Namespace {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Globally unique vector id: `{owner}/{repo}:{chunk id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorRecordId(Box<str>);

impl VectorRecordId {
    /// Compose the record id for a chunk stored under `namespace`.
    #[must_use]
    pub fn compose(namespace: &Namespace, chunk_id: &ChunkId) -> Self {
        Self(format!("{namespace}:{chunk_id}").into_boxed_str())
    }

    /// Access the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the underlying string.
    #[must_use]
    pub fn into_inner(self) -> Box<str> {
        self.0
    }
}

impl AsRef<str> for VectorRecordId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for VectorRecordId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Identity provider a stored credential belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialProvider {
    /// GitHub OAuth access token.
    #[serde(rename = "github")]
    GitHub,
}

impl CredentialProvider {
    /// Provider id as stored by the account table.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GitHub => "github",
        }
    }
}

impl fmt::Display for CredentialProvider {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

fn trimmed_non_empty(input: &str) -> Option<&str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_id_is_path_and_range() -> Result<(), PrimitiveError> {
        let id = ChunkId::derive("src/main.rs", LineRange::new(80, 180)?);
        assert_eq!(id.as_str(), "src/main.rs:80-180");
        Ok(())
    }

    #[test]
    fn chunk_id_rejects_blank_input() {
        assert!(matches!(
            ChunkId::parse("  "),
            Err(PrimitiveError::InvalidChunkId { input_length: 2 })
        ));
    }

    #[test]
    fn namespace_requires_owner_and_repo() -> Result<(), PrimitiveError> {
        assert_eq!(Namespace::parse(" octocat/hello ")?.as_str(), "octocat/hello");
        assert!(Namespace::parse("octocat").is_err());
        assert!(Namespace::parse("/hello").is_err());
        assert!(Namespace::parse("octocat/").is_err());
        Ok(())
    }

    #[test]
    fn record_id_prefixes_namespace() -> Result<(), PrimitiveError> {
        let namespace = Namespace::parse("octocat/hello")?;
        let chunk = ChunkId::derive("README.md", LineRange::new(0, 12)?);
        let id = VectorRecordId::compose(&namespace, &chunk);
        assert_eq!(id.as_str(), "octocat/hello:README.md:0-12");
        Ok(())
    }

    #[test]
    fn credential_provider_serializes_lowercase() -> Result<(), serde_json::Error> {
        assert_eq!(serde_json::to_string(&CredentialProvider::GitHub)?, "\"github\"");
        assert_eq!(CredentialProvider::GitHub.to_string(), "github");
        Ok(())
    }

    #[test]
    fn errors_map_to_envelope_codes() {
        let envelope = ErrorEnvelope::from(PrimitiveError::EmptyLineRange { start: 4, end: 4 });
        assert_eq!(envelope.code, ErrorCode::new("domain", "invalid_line_range"));
        assert_eq!(envelope.metadata.get("start").map(String::as_str), Some("4"));
    }
}

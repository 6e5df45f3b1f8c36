//! # repo-indexer-domain
//!
//! Domain model for repository indexing.
//!
//! This crate holds the pure, I/O-free part of the pipeline:
//!
//! - **Identity** - `RepositoryIdentity`, namespace and vector id derivation
//! - **Chunking** - `ChunkingOptions`, `Chunk`, `chunk_source`
//! - **Formatting** - `format_for_embedding`
//! - **Metadata** - `VectorRecordMetadata`
//!
//! ## Dependency Rules
//!
//! - Depends only on the `shared` crate
//! - No infrastructure or adapter dependencies

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub use repo_indexer_shared::shared_crate_version;

pub mod chunk;
pub mod formatting;
pub mod identity;
pub mod metadata;
pub mod primitives;
pub mod source;
pub mod spans;

pub use chunk::{
    Chunk, ChunkingError, ChunkingOptions, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE,
    MAX_CHUNK_SIZE, chunk_source,
};
pub use formatting::{format_for_embedding, language_hint};
pub use identity::{IdentityError, RepositoryIdentity};
pub use metadata::{MAX_METADATA_CONTENT_CHARS, VectorRecordMetadata, truncate_chars};
pub use primitives::{ChunkId, CredentialProvider, Namespace, PrimitiveError, VectorRecordId};
pub use source::SourceFile;
pub use spans::LineRange;

/// Returns the domain crate version.
#[must_use]
pub const fn domain_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

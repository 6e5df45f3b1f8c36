//! Vector store boundary contract.

use crate::BoxFuture;
use crate::embedding::EmbeddingVector;
use repo_indexer_domain::{Namespace, VectorRecordId, VectorRecordMetadata};
use repo_indexer_shared::{RequestContext, Result};

/// Provider descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorStoreProviderInfo {
    /// Stable provider identifier (`pinecone`, `memory`).
    pub id: Box<str>,
    /// Index the records are written to.
    pub index_name: Box<str>,
}

/// One vector with its id and metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    /// `{owner}/{repo}:{chunk id}`.
    pub id: VectorRecordId,
    /// Embedding of the chunk text.
    pub values: EmbeddingVector,
    /// Identity, location and content preview.
    pub metadata: VectorRecordMetadata,
}

/// Owned upsert request.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertRequest {
    /// Target partition.
    pub namespace: Namespace,
    /// Records to insert or replace by id.
    pub records: Vec<VectorRecord>,
}

/// Namespaced insert-or-replace store.
///
/// A record whose id already exists in the namespace is replaced. No atomicity
/// across the records of one call is assumed.
pub trait VectorStorePort: Send + Sync {
    /// Provider info for this implementation.
    fn provider(&self) -> &VectorStoreProviderInfo;

    /// Upsert every record of the request.
    fn upsert(&self, ctx: &RequestContext, request: UpsertRequest) -> BoxFuture<'_, Result<()>>;
}

//! Embedding boundary contract.

use crate::BoxFuture;
use repo_indexer_shared::{RequestContext, Result};
use std::sync::Arc;

/// An embedding vector payload.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingVector {
    vector: Arc<[f32]>,
}

impl EmbeddingVector {
    /// Build an embedding vector from a shared slice.
    #[must_use]
    pub const fn new(vector: Arc<[f32]>) -> Self {
        Self { vector }
    }

    /// Build an embedding vector from an owned vector.
    #[must_use]
    pub fn from_vec(vector: Vec<f32>) -> Self {
        Self::new(Arc::from(vector))
    }

    /// Borrow the vector as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.vector
    }

    /// Number of components.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }

    /// Consume and return the shared vector buffer.
    #[must_use]
    pub fn into_vector(self) -> Arc<[f32]> {
        self.vector
    }
}

/// Provider descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingProviderInfo {
    /// Stable provider identifier (`gemini`, `openai`, `hash`).
    pub id: Box<str>,
    /// Model the provider calls.
    pub model: Box<str>,
}

/// Owned request to embed a batch of texts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedBatchRequest {
    /// Texts to embed, in output order.
    pub texts: Vec<Box<str>>,
}

impl From<Vec<String>> for EmbedBatchRequest {
    fn from(texts: Vec<String>) -> Self {
        Self {
            texts: texts.into_iter().map(String::into_boxed_str).collect(),
        }
    }
}

/// Batched text to vector conversion.
///
/// One call per batch. The result holds exactly one vector per input text, in
/// input order. Failures are returned unchanged; retries belong to the caller.
pub trait EmbeddingPort: Send + Sync {
    /// Provider info for this implementation.
    fn provider(&self) -> &EmbeddingProviderInfo;

    /// Embed every text of the request.
    fn embed_batch(
        &self,
        ctx: &RequestContext,
        request: EmbedBatchRequest,
    ) -> BoxFuture<'_, Result<Vec<EmbeddingVector>>>;
}

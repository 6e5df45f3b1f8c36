//! Deterministic SHA-256 embedder for offline runs and tests.

use repo_indexer_ports::{
    BoxFuture, EmbedBatchRequest, EmbeddingPort, EmbeddingProviderInfo, EmbeddingVector,
};
use repo_indexer_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result};
use sha2::{Digest, Sha256};

/// Embeds text by expanding `sha256(text ":" counter)` into `[-1, 1]` floats.
///
/// Equal texts always map to equal vectors; no network is involved.
#[derive(Debug, Clone)]
pub struct HashEmbedding {
    provider: EmbeddingProviderInfo,
    dimension: usize,
}

impl HashEmbedding {
    /// Build a hash embedder with a fixed dimension.
    pub fn new(dimension: u32) -> Result<Self> {
        let dimension = usize::try_from(dimension)
            .ok()
            .filter(|value| *value > 0)
            .ok_or_else(|| {
                ErrorEnvelope::expected(
                    ErrorCode::invalid_input(),
                    "embedding dimension must be positive",
                )
            })?;
        Ok(Self {
            provider: EmbeddingProviderInfo {
                id: "hash".into(),
                model: format!("sha256-{dimension}").into(),
            },
            dimension,
        })
    }

    /// Vector for a single text.
    #[must_use]
    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut vector = Vec::with_capacity(self.dimension);
        let mut counter = 0_u64;

        while vector.len() < self.dimension {
            let mut hasher = Sha256::new();
            hasher.update(text.as_bytes());
            hasher.update(b":");
            hasher.update(counter.to_le_bytes());
            for byte in hasher.finalize() {
                vector.push(f32::from(byte) / 127.5 - 1.0);
                if vector.len() == self.dimension {
                    break;
                }
            }
            counter = counter.saturating_add(1);
        }

        vector
    }
}

impl EmbeddingPort for HashEmbedding {
    fn provider(&self) -> &EmbeddingProviderInfo {
        &self.provider
    }

    fn embed_batch(
        &self,
        ctx: &RequestContext,
        request: EmbedBatchRequest,
    ) -> BoxFuture<'_, Result<Vec<EmbeddingVector>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("hash_embedding.embed_batch")?;
            Ok(request
                .texts
                .iter()
                .map(|text| EmbeddingVector::from_vec(self.vector_for(text)))
                .collect())
        })
    }
}

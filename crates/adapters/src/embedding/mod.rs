//! Embedding adapter implementations.
//!
//! Remote providers make exactly one HTTP call per `embed_batch` and never
//! retry locally; retries belong to the step runner around the whole step.

pub mod gemini;
pub mod hash;
pub mod openai;

pub use gemini::{GeminiEmbedding, GeminiEmbeddingConfig};
pub use hash::HashEmbedding;
pub use openai::{OpenAiEmbedding, OpenAiEmbeddingConfig};

use repo_indexer_ports::EmbeddingVector;
use repo_indexer_shared::{ErrorClass, ErrorCode, ErrorEnvelope, Result};

/// Validate a provider response against the request that produced it.
///
/// The count must match the number of inputs, every vector must be
/// non-empty, and all vectors must share one dimension (the configured one,
/// when set).
pub(crate) fn check_batch(
    provider: &str,
    vectors: Vec<EmbeddingVector>,
    expected_count: usize,
    expected_dimension: Option<u32>,
) -> Result<Vec<EmbeddingVector>> {
    if vectors.len() != expected_count {
        return Err(ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            format!(
                "embedding response count mismatch (expected {expected_count}, got {})",
                vectors.len()
            ),
            ErrorClass::NonRetriable,
        )
        .with_metadata("provider", provider));
    }

    let expected = expected_dimension
        .and_then(|dimension| usize::try_from(dimension).ok())
        .or_else(|| vectors.first().map(EmbeddingVector::dimension));

    for (index, vector) in vectors.iter().enumerate() {
        if vector.dimension() == 0 {
            return Err(ErrorEnvelope::unexpected(
                ErrorCode::internal(),
                "provider returned an empty embedding",
                ErrorClass::NonRetriable,
            )
            .with_metadata("provider", provider)
            .with_metadata("index", index.to_string()));
        }
        if let Some(expected) = expected
            && vector.dimension() != expected
        {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "embedding dimension mismatch",
            )
            .with_metadata("provider", provider)
            .with_metadata("index", index.to_string())
            .with_metadata("expected", expected.to_string())
            .with_metadata("actual", vector.dimension().to_string()));
        }
    }

    Ok(vectors)
}

//! Embedding adapter selection.

use crate::InfraResult;
use repo_indexer_adapters::embedding::{
    GeminiEmbedding, GeminiEmbeddingConfig, HashEmbedding, OpenAiEmbedding, OpenAiEmbeddingConfig,
};
use repo_indexer_config::env::{ENV_EMBEDDING_API_KEY, ENV_GEMINI_API_KEY, ENV_OPENAI_API_KEY};
use repo_indexer_config::{
    BackendEnv, DEFAULT_HASH_DIMENSION, EmbeddingProviderKind, ValidatedBackendConfig,
};
use repo_indexer_ports::EmbeddingPort;
use repo_indexer_shared::{ErrorCode, ErrorEnvelope, SecretString};
use std::sync::Arc;

/// Build the embedding port selected by `embedding.provider`.
///
/// Remote providers need an API key from the env; `hash` runs offline.
pub fn build_embedding_port(
    config: &ValidatedBackendConfig,
    env: &BackendEnv,
) -> InfraResult<Arc<dyn EmbeddingPort>> {
    let embedding = &config.embedding;
    let port: Arc<dyn EmbeddingPort> = match embedding.provider {
        EmbeddingProviderKind::Gemini => {
            let api_key = require_api_key(env, EmbeddingProviderKind::Gemini)?;
            let adapter_config = GeminiEmbeddingConfig::from_embedding_config(api_key, embedding);
            Arc::new(GeminiEmbedding::new(&adapter_config)?)
        },
        EmbeddingProviderKind::OpenAi => {
            let api_key = require_api_key(env, EmbeddingProviderKind::OpenAi)?;
            let adapter_config = OpenAiEmbeddingConfig::from_embedding_config(api_key, embedding);
            Arc::new(OpenAiEmbedding::new(&adapter_config)?)
        },
        EmbeddingProviderKind::Hash => Arc::new(HashEmbedding::new(
            embedding.dimension.unwrap_or(DEFAULT_HASH_DIMENSION),
        )?),
    };

    tracing::debug!(
        provider = %port.provider().id,
        model = %port.provider().model,
        "embedding port selected"
    );
    Ok(port)
}

fn require_api_key(env: &BackendEnv, provider: EmbeddingProviderKind) -> InfraResult<SecretString> {
    let fallback = match provider {
        EmbeddingProviderKind::Gemini => ENV_GEMINI_API_KEY,
        EmbeddingProviderKind::OpenAi => ENV_OPENAI_API_KEY,
        EmbeddingProviderKind::Hash => ENV_EMBEDDING_API_KEY,
    };
    env.embedding_api_key_for(provider)
        .filter(|key| !key.is_blank())
        .cloned()
        .ok_or_else(|| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "missing_api_key"),
                format!("{provider} API key is required (set {ENV_EMBEDDING_API_KEY} or {fallback})"),
            )
            .with_metadata("provider", provider.as_str())
        })
}

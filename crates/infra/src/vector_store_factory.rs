//! Vector store adapter selection.

use crate::InfraResult;
use repo_indexer_adapters::vector_store::{
    MemoryVectorStore, PineconeVectorStore, PineconeVectorStoreConfig,
};
use repo_indexer_config::env::ENV_PINECONE_API_KEY;
use repo_indexer_config::{BackendEnv, ValidatedBackendConfig, VectorStoreProviderKind};
use repo_indexer_ports::VectorStorePort;
use repo_indexer_shared::{ErrorCode, ErrorEnvelope};
use std::sync::Arc;

/// Selected vector store plus a handle on it when it lives in memory.
#[derive(Clone)]
pub struct VectorStoreSelection {
    /// Port handed to the indexing job.
    pub port: Arc<dyn VectorStorePort>,
    /// Same store, inspectable after a run (memory provider or dry run).
    pub memory: Option<MemoryVectorStore>,
}

/// Build the vector store selected by `vectorStore.provider`.
///
/// `dry_run` forces the in-memory store regardless of config.
pub fn build_vector_store_port(
    config: &ValidatedBackendConfig,
    env: &BackendEnv,
    dry_run: bool,
) -> InfraResult<VectorStoreSelection> {
    let store = &config.vector_store;
    let provider = if dry_run {
        VectorStoreProviderKind::Memory
    } else {
        store.provider
    };

    let selection = match provider {
        VectorStoreProviderKind::Memory => {
            let memory = MemoryVectorStore::new(store.index_name.clone());
            VectorStoreSelection {
                port: Arc::new(memory.clone()),
                memory: Some(memory),
            }
        },
        VectorStoreProviderKind::Pinecone => {
            let api_key = env
                .pinecone_api_key
                .clone()
                .filter(|key| !key.is_blank())
                .ok_or_else(|| {
                    ErrorEnvelope::expected(
                        ErrorCode::new("config", "missing_api_key"),
                        format!("Pinecone API key is required (set {ENV_PINECONE_API_KEY})"),
                    )
                    .with_metadata("provider", provider.as_str())
                })?;
            let adapter_config = PineconeVectorStoreConfig::from_vector_store_config(api_key, store)?;
            VectorStoreSelection {
                port: Arc::new(PineconeVectorStore::new(&adapter_config)?),
                memory: None,
            }
        },
    };

    tracing::debug!(
        provider = %selection.port.provider().id,
        index = %selection.port.provider().index_name,
        dry_run,
        "vector store selected"
    );
    Ok(selection)
}

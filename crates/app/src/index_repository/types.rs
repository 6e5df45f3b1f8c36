//! Inputs, dependencies and outcome of an indexing run.

use repo_indexer_domain::ChunkingOptions;
use repo_indexer_ports::{
    CredentialStorePort, EmbeddingPort, LoggerPort, SourceFetcherPort, StepStorePort,
    VectorStorePort,
};
use repo_indexer_shared::{ErrorEnvelope, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Texts per embedding call, and records per upsert call.
pub const EMBEDDING_BATCH_SIZE: usize = 50;

/// Looks up the GitHub credential of the triggering user.
pub const STEP_GET_TOKEN: &str = "get-token";
/// Lists and downloads the repository's text files.
pub const STEP_FETCH_FILES: &str = "fetch-files";
/// Chunks, embeds and upserts every fetched file.
pub const STEP_INDEX_CODEBASE: &str = "index-codebase";

/// Terminal outcome of the run; the only result kept once the run finishes.
pub const STEP_RUN_OUTCOME: &str = "run-outcome";

/// Error text reported when the user has no GitHub credential.
pub const NO_TOKEN_ERROR: &str = "No GitHub token found";

/// Collaborators of an indexing run. Built once and shared across runs.
#[derive(Clone)]
pub struct IndexRepositoryDeps {
    /// Credential lookup.
    pub credentials: Arc<dyn CredentialStorePort>,
    /// Repository file listing.
    pub fetcher: Arc<dyn SourceFetcherPort>,
    /// Embedding provider.
    pub embedding: Arc<dyn EmbeddingPort>,
    /// Vector store.
    pub vector_store: Arc<dyn VectorStorePort>,
    /// Step result store.
    pub steps: Arc<dyn StepStorePort>,
    /// Optional logger.
    pub logger: Option<Arc<dyn LoggerPort>>,
}

/// One `repository.connected` trigger. Fields are validated by the run.
#[derive(Debug, Clone)]
pub struct IndexRepositoryInput {
    /// Run id keying the step cache; re-use it to resume a run.
    pub run_id: Box<str>,
    /// Repository owner.
    pub owner: Option<String>,
    /// Repository name.
    pub repo: Option<String>,
    /// User whose credential is used.
    pub user_id: Option<String>,
    /// Chunk window parameters.
    pub chunking: ChunkingOptions,
    /// Retry policy applied to each step.
    pub retry: RetryPolicy,
}

/// Cached result of the `index-codebase` step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexCodebaseSummary {
    /// Records sent to the vector store.
    pub chunks_indexed: usize,
    /// Embedding calls made.
    pub batches: usize,
}

/// Structured result of a run. Absent fields are omitted on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexRunOutcome {
    /// Whether the repository was indexed.
    pub success: bool,
    /// Files fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files_processed: Option<usize>,
    /// Vector records upserted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunks_indexed: Option<usize>,
    /// Failure text or machine code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Human-readable failure detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl IndexRunOutcome {
    /// Successful run.
    #[must_use]
    pub const fn completed(files_processed: usize, chunks_indexed: usize) -> Self {
        Self {
            success: true,
            files_processed: Some(files_processed),
            chunks_indexed: Some(chunks_indexed),
            error: None,
            message: None,
        }
    }

    /// Failure detected and reported by the run itself.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            files_processed: None,
            chunks_indexed: None,
            error: Some(error.into()),
            message: None,
        }
    }

    /// Failure that escaped a step after its retries.
    ///
    /// `error` carries the envelope code; `message` names the step when the
    /// envelope is tagged with one.
    #[must_use]
    pub fn from_error(error: &ErrorEnvelope) -> Self {
        let message = match error.metadata.get("step") {
            Some(step) => format!("{step} failed: {}", error.message),
            None => error.message.clone(),
        };
        Self {
            message: Some(message),
            ..Self::failed(error.code.to_string())
        }
    }
}

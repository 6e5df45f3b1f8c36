//! Composition root for indexing runs.

use crate::embedding_factory::build_embedding_port;
use crate::storage_factory::{build_credential_store, build_step_store};
use crate::vector_store_factory::build_vector_store_port;
use crate::InfraResult;
use repo_indexer_adapters::github::{GitHubSourceFetcher, GitHubSourceFetcherConfig};
use repo_indexer_adapters::vector_store::MemoryVectorStore;
use repo_indexer_app::{IndexRepositoryDeps, IndexRepositoryInput, IndexRunOutcome, index_repository};
use repo_indexer_config::{BackendEnv, RepositoryConnectedEvent, ValidatedBackendConfig};
use repo_indexer_domain::ChunkingOptions;
use repo_indexer_ports::LoggerPort;
use repo_indexer_shared::{CorrelationId, RequestContext, RetryPolicy};
use std::sync::Arc;

/// Runtime switches that are not part of the config file.
#[derive(Clone, Default)]
pub struct RuntimeOptions {
    /// Swap the configured vector store for an in-memory one.
    pub dry_run: bool,
    /// Event logger handed to every run.
    pub logger: Option<Arc<dyn LoggerPort>>,
}

/// Result of one triggered run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRunReport {
    /// Run id keying the step cache; pass it again to resume.
    pub run_id: Box<str>,
    /// Structured outcome.
    pub outcome: IndexRunOutcome,
}

/// Adapters and settings shared by every run of this process.
pub struct IndexerRuntime {
    deps: IndexRepositoryDeps,
    chunking: ChunkingOptions,
    retry: RetryPolicy,
    memory_store: Option<MemoryVectorStore>,
}

impl IndexerRuntime {
    /// Build every adapter once from the validated config and env secrets.
    pub fn from_config(
        config: &ValidatedBackendConfig,
        env: &BackendEnv,
        options: RuntimeOptions,
    ) -> InfraResult<Self> {
        let embedding = build_embedding_port(config, env)?;
        let vector_store = build_vector_store_port(config, env, options.dry_run)?;
        let fetcher = GitHubSourceFetcher::new(&GitHubSourceFetcherConfig::from_github_config(
            &config.github,
            config.core.timeout_ms,
        ))?;

        let deps = IndexRepositoryDeps {
            credentials: build_credential_store(config, env),
            fetcher: Arc::new(fetcher),
            embedding,
            vector_store: vector_store.port,
            steps: build_step_store(config),
            logger: options.logger,
        };
        Ok(Self {
            deps,
            chunking: config.chunking_options(),
            retry: config.retry_policy(),
            memory_store: vector_store.memory,
        })
    }

    /// Runtime over caller-supplied collaborators.
    #[must_use]
    pub const fn with_deps(
        deps: IndexRepositoryDeps,
        chunking: ChunkingOptions,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            deps,
            chunking,
            retry,
            memory_store: None,
        }
    }

    /// Collaborators used by each run.
    #[must_use]
    pub const fn deps(&self) -> &IndexRepositoryDeps {
        &self.deps
    }

    /// The in-memory vector store, when one was selected.
    #[must_use]
    pub const fn memory_store(&self) -> Option<&MemoryVectorStore> {
        self.memory_store.as_ref()
    }

    /// Handle one `repository.connected` event.
    ///
    /// A fresh run id is minted unless `run_id` is given. Failures that
    /// escape the job are folded into the outcome.
    pub async fn run_repository_connected(
        &self,
        ctx: &RequestContext,
        event: &RepositoryConnectedEvent,
        run_id: Option<&str>,
    ) -> IndexRunReport {
        let run_id: Box<str> = match run_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => id.into(),
            None => CorrelationId::new_run_id().as_str().into(),
        };
        let input = IndexRepositoryInput {
            run_id: run_id.clone(),
            owner: event.owner.clone(),
            repo: event.repo.clone(),
            user_id: event.user_id.clone(),
            chunking: self.chunking,
            retry: self.retry,
        };

        let outcome = match index_repository(ctx, &self.deps, input).await {
            Ok(outcome) => outcome,
            Err(error) => {
                tracing::warn!(run_id = %run_id, code = %error.code, "indexing run failed");
                IndexRunOutcome::from_error(&error)
            },
        };
        IndexRunReport { run_id, outcome }
    }
}

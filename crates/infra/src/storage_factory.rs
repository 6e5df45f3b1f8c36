//! Credential and step store selection.

use repo_indexer_adapters::credentials::{SqliteCredentialStore, StaticCredentialStore};
use repo_indexer_adapters::steps::{MemoryStepStore, SqliteStepStore};
use repo_indexer_config::{BackendEnv, ValidatedBackendConfig};
use repo_indexer_ports::{CredentialStorePort, StepStorePort};
use std::sync::Arc;

/// Credential lookup: the SQLite `account` table when a path is configured,
/// otherwise the static `RIX_GITHUB_TOKEN` for every user.
pub fn build_credential_store(
    config: &ValidatedBackendConfig,
    env: &BackendEnv,
) -> Arc<dyn CredentialStorePort> {
    match &config.storage.credential_store_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "using sqlite credential store");
            Arc::new(SqliteCredentialStore::new(path.clone()))
        },
        None => Arc::new(StaticCredentialStore::new(env.github_token.clone())),
    }
}

/// Step results: durable in SQLite when a path is configured, otherwise
/// kept for the life of the process.
pub fn build_step_store(config: &ValidatedBackendConfig) -> Arc<dyn StepStorePort> {
    match &config.storage.step_store_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "using sqlite step store");
            Arc::new(SqliteStepStore::new(path.clone()))
        },
        None => Arc::new(MemoryStepStore::default()),
    }
}

//! # repo-indexer-config
//!
//! Configuration schema, env overrides, loading, and event intake DTOs.
//! This crate depends on `domain` and `shared` only.

/// Environment variable parsing and merging.
pub mod env;
/// Config loading helpers (env + file).
pub mod load;
/// Event DTOs and intake parsing.
pub mod requests;
/// JSON Schema exports for event DTOs.
pub mod requests_schema;
/// Configuration schema types and helpers.
pub mod schema;

pub use schema::{
    BackendConfig, CURRENT_CONFIG_VERSION, ChunkingConfig, ConfigLimits, ConfigSchemaError,
    CoreConfig, DEFAULT_GITHUB_API_BASE_URL, DEFAULT_HASH_DIMENSION, DEFAULT_INDEX_NAME,
    EmbeddingConfig, EmbeddingProviderKind, GithubConfig, RetryConfig, StorageConfig,
    ValidatedBackendConfig, VectorStoreConfig, VectorStoreProviderKind, parse_backend_config_json,
    parse_backend_config_toml,
};

pub use env::{BackendEnv, EnvParseError, apply_env_overrides};
pub use load::{
    load_backend_config_from_path, load_backend_config_from_sources, load_backend_config_std_env,
    to_pretty_json, to_pretty_toml,
};
pub use requests::{
    EventEnvelopeDto, EventIntakeError, REPOSITORY_CONNECTED_EVENT, RepositoryConnectedEvent,
    parse_repository_connected_event_json,
};
pub use requests_schema::{event_envelope_schema, repository_connected_event_schema};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use repo_indexer_domain::domain_crate_version;
    use repo_indexer_shared::shared_crate_version;

    #[test]
    fn config_crate_compiles() {
        let version = config_crate_version();
        assert!(!version.is_empty());
    }

    #[test]
    fn config_can_use_domain_and_shared() {
        let domain_version = domain_crate_version();
        let shared_version = shared_crate_version();

        assert!(!domain_version.is_empty());
        assert!(!shared_version.is_empty());
    }
}

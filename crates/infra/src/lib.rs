//! # repo-indexer-infra
//!
//! Infrastructure wiring and runtime composition.
//! This crate depends on `app`, `adapters`, `config`, and `shared`.

/// Config loading helpers used by CLI surfaces.
pub mod config_check;
/// Embedding adapter selection.
mod embedding_factory;
/// Environment validation helpers used by CLI surfaces.
pub mod env_check;
/// Event logger selection.
pub mod observability;
/// Per-process runtime that drives indexing runs.
pub mod runtime;
/// Credential and step store selection.
mod storage_factory;
/// Vector store adapter selection.
mod vector_store_factory;

pub use config_check::{ConfigFormat, load_effective_config, render_effective_config};
pub use embedding_factory::build_embedding_port;
pub use env_check::{InfraError, InfraResult, validate_env_parsing};
pub use observability::{ObservabilitySettings, build_logger, build_logger_with_sink};
pub use runtime::{IndexRunReport, IndexerRuntime, RuntimeOptions};
pub use storage_factory::{build_credential_store, build_step_store};
pub use vector_store_factory::{VectorStoreSelection, build_vector_store_port};

// Re-export redaction utilities for CLI boundary sanitization
pub use repo_indexer_shared::{is_secret_key, redact_if_secret};

/// Returns the infra crate version.
#[must_use]
pub const fn infra_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

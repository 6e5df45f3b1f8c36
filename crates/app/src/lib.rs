//! # repo-indexer-app
//!
//! Application use cases: the checkpointed workflow driver and the
//! repository indexing job built on it.
//! This crate depends on `ports`, `domain`, and `shared`.

pub mod index_repository;
pub mod workflow;

/// Returns the app crate version.
#[must_use]
pub const fn app_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub use index_repository::{
    EMBEDDING_BATCH_SIZE, IndexCodebaseSummary, IndexRepositoryDeps, IndexRepositoryInput,
    IndexRunOutcome, NO_TOKEN_ERROR, STEP_FETCH_FILES, STEP_GET_TOKEN, STEP_INDEX_CODEBASE,
    STEP_RUN_OUTCOME, index_repository,
};
pub use workflow::WorkflowRun;

//! # repo-indexer-adapters
//!
//! Adapter implementations for the ports: embedding providers, vector stores,
//! the GitHub file fetcher, credential and step stores, and the JSON logger.
//! This crate depends on `ports`, `shared`, `config` and `domain`; never on
//! `app` or `infra`.

/// Credential store adapters (SQLite `account` table, static token).
pub mod credentials;
/// Embedding providers (Gemini, OpenAI, deterministic hash).
pub mod embedding;
/// GitHub REST file fetcher.
pub mod github;
pub mod log_sink;
pub mod logger;
/// Step result stores (SQLite, in-memory).
pub mod steps;
/// Vector stores (Pinecone, in-memory).
pub mod vector_store;

mod http;
mod sqlite;

/// Returns the adapters crate version.
#[must_use]
pub const fn adapters_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use repo_indexer_ports::ports_crate_version;
    use repo_indexer_shared::shared_crate_version;

    fn workspace_deps() -> Vec<String> {
        let cargo_toml = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"));
        let mut deps = Vec::new();
        let mut in_deps = false;

        for raw_line in cargo_toml.lines() {
            let line = raw_line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with('[') {
                in_deps = line == "[dependencies]" || line == "[dev-dependencies]";
                continue;
            }
            if in_deps && line.starts_with("repo-indexer-") {
                let key = line.split('=').next().unwrap_or("").trim();
                deps.push(key.split('.').next().unwrap_or("").trim().to_string());
            }
        }

        deps
    }

    #[test]
    fn adapters_do_not_depend_on_app_or_infra() {
        let forbidden = ["repo-indexer-app", "repo-indexer-infra"];
        for dep in workspace_deps() {
            assert!(
                !forbidden.contains(&dep.as_str()),
                "forbidden dependency found: {dep}"
            );
        }
    }

    #[test]
    fn adapters_can_use_ports_and_shared() {
        assert!(!adapters_crate_version().is_empty());
        assert!(!ports_crate_version().is_empty());
        assert!(!shared_crate_version().is_empty());
    }
}

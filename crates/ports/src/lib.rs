//! # repo-indexer-ports
//!
//! Boundary traits between the indexing pipeline and the outside world.
//!
//! This crate defines the interfaces adapters implement. It depends only on
//! `domain` and `shared`.

use std::future::Future;
use std::pin::Pin;

/// Boxed future used by port traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Returns the ports crate version.
#[must_use]
pub const fn ports_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub mod credentials;
pub mod embedding;
pub mod logger;
pub mod source;
pub mod steps;
pub mod vector_store;

pub use credentials::*;
pub use embedding::*;
pub use logger::*;
pub use source::*;
pub use steps::*;
pub use vector_store::*;

// Domain types used in port signatures, so adapter crates can implement ports
// without depending on `repo-indexer-domain` directly.
pub use repo_indexer_domain::{
    CredentialProvider, Namespace, SourceFile, VectorRecordId, VectorRecordMetadata,
};

#[cfg(test)]
mod tests {
    use super::*;
    use repo_indexer_domain::domain_crate_version;
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
    fn ports_depends_only_on_domain_and_shared() {
        let deps = workspace_deps();
        let allowed = ["repo-indexer-domain", "repo-indexer-shared"];

        for dep in &deps {
            assert!(
                allowed.contains(&dep.as_str()),
                "unexpected dependency found: {dep}"
            );
        }
        for expected in allowed {
            assert!(
                deps.iter().any(|dep| dep == expected),
                "missing dependency: {expected}"
            );
        }
    }

    #[test]
    fn ports_can_use_domain_and_shared() {
        assert!(!ports_crate_version().is_empty());
        assert!(!domain_crate_version().is_empty());
        assert!(!shared_crate_version().is_empty());
    }

    #[test]
    fn step_key_displays_run_and_step() {
        assert_eq!(StepKey::new("run_1", "get-token").to_string(), "run_1/get-token");
    }
}

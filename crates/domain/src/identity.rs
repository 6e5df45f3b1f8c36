//! Repository identity: the `(owner, repo, userId)` triple a run is keyed on.

use crate::primitives::{ChunkId, Namespace, VectorRecordId};
use repo_indexer_shared::{ErrorCode, ErrorEnvelope};
use serde::Serialize;
use std::fmt;

/// One or more identity fields were absent or blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityError {
    /// Wire names of the missing fields, in `owner`, `repo`, `userId` order.
    pub missing: Vec<&'static str>,
}

impl fmt::Display for IdentityError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "Missing required fields: {}",
            self.missing.join(", ")
        )
    }
}

impl std::error::Error for IdentityError {}

impl From<IdentityError> for ErrorEnvelope {
    fn from(error: IdentityError) -> Self {
        let fields = error.missing.join(",");
        Self::expected(ErrorCode::invalid_input(), error.to_string())
            .with_metadata("missing_fields", fields)
    }
}

/// Validated repository identity. Every field is non-blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryIdentity {
    owner: Box<str>,
    repo: Box<str>,
    user_id: Box<str>,
}

impl RepositoryIdentity {
    /// Validate raw event fields, reporting every missing one at once.
    pub fn parse(
        owner: Option<&str>,
        repo: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<Self, IdentityError> {
        let fields = [("owner", owner), ("repo", repo), ("userId", user_id)];
        let missing: Vec<&'static str> = fields
            .iter()
            .filter(|(_, value)| value.is_none_or(|value| value.trim().is_empty()))
            .map(|(name, _)| *name)
            .collect();

        match (owner, repo, user_id) {
            (Some(owner), Some(repo), Some(user_id)) if missing.is_empty() => Ok(Self {
                owner: owner.trim().into(),
                repo: repo.trim().into(),
                user_id: user_id.trim().into(),
            }),
            _ => Err(IdentityError { missing }),
        }
    }

    /// Repository owner (user or organization login).
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name.
    #[must_use]
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Id of the user whose credential authorizes the fetch.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Vector-store namespace `{owner}/{repo}`.
    #[must_use]
    pub fn namespace(&self) -> Namespace {
        Namespace::from_parts(&self.owner, &self.repo)
    }

    /// Vector id for a chunk of this repository.
    #[must_use]
    pub fn record_id(&self, chunk_id: &ChunkId) -> VectorRecordId {
        VectorRecordId::compose(&self.namespace(), chunk_id)
    }
}

impl fmt::Display for RepositoryIdentity {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}/{}", self.owner, self.repo)
    }
}

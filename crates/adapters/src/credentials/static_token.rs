//! Single configured token served for every user.

use repo_indexer_ports::{BoxFuture, CredentialStorePort, TokenRequest};
use repo_indexer_shared::{RequestContext, Result, SecretString};

/// Credential store that answers every lookup with the same token, or none.
///
/// Used by the CLI when no account database is configured.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialStore {
    token: Option<SecretString>,
}

impl StaticCredentialStore {
    /// Serve `token` (blank tokens count as absent).
    #[must_use]
    pub fn new(token: Option<SecretString>) -> Self {
        Self {
            token: token.filter(|token| !token.is_blank()),
        }
    }
}

impl CredentialStorePort for StaticCredentialStore {
    fn get_token(
        &self,
        ctx: &RequestContext,
        _request: TokenRequest,
    ) -> BoxFuture<'_, Result<Option<SecretString>>> {
        let result = ctx
            .ensure_not_cancelled("credentials.get_token")
            .map(|()| self.token.clone());
        Box::pin(async move { result })
    }
}

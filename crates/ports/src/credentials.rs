//! Credential lookup contract.

use crate::BoxFuture;
use repo_indexer_domain::CredentialProvider;
use repo_indexer_shared::{RequestContext, Result, SecretString};

/// Owned token lookup request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    /// User the credential belongs to.
    pub user_id: Box<str>,
    /// Identity provider of the credential.
    pub provider: CredentialProvider,
}

/// Resolves stored access tokens.
pub trait CredentialStorePort: Send + Sync {
    /// Token for the user and provider, `None` when none is stored.
    fn get_token(
        &self,
        ctx: &RequestContext,
        request: TokenRequest,
    ) -> BoxFuture<'_, Result<Option<SecretString>>>;
}

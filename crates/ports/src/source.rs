//! Repository file listing contract.

use crate::BoxFuture;
use repo_indexer_domain::SourceFile;
use repo_indexer_shared::{RequestContext, Result, SecretString};

/// Owned file listing request.
#[derive(Debug, Clone)]
pub struct ListTextFilesRequest {
    /// Access token authorizing the fetch.
    pub token: SecretString,
    /// Repository owner.
    pub owner: Box<str>,
    /// Repository name.
    pub repo: Box<str>,
}

/// Fetches the text files of a repository.
///
/// Binary, media, lock and build-artifact files are excluded, as are files above
/// the configured size limit. Content is decoded UTF-8.
pub trait SourceFetcherPort: Send + Sync {
    /// Every text file of the repository, in a stable order.
    fn list_text_files(
        &self,
        ctx: &RequestContext,
        request: ListTextFilesRequest,
    ) -> BoxFuture<'_, Result<Vec<SourceFile>>>;
}

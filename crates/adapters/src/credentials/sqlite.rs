//! Reads OAuth access tokens from the application's `account` table.

use crate::sqlite::{StoreLabel, open_read_only};
use repo_indexer_ports::{BoxFuture, CredentialStorePort, TokenRequest};
use repo_indexer_shared::{RequestContext, Result, SecretString};
use rusqlite::OptionalExtension;
use std::path::PathBuf;
use tokio::task::spawn_blocking;

const LABEL: StoreLabel = StoreLabel {
    namespace: "credentials",
    name: "credential store",
};

const SELECT_TOKEN: &str =
    "SELECT access_token FROM account WHERE user_id = ?1 AND provider_id = ?2 LIMIT 1";

/// Credential store over a SQLite database holding an `account` table
/// (`user_id`, `provider_id`, `access_token`).
#[derive(Debug, Clone)]
pub struct SqliteCredentialStore {
    path: PathBuf,
}

impl SqliteCredentialStore {
    /// Store reading from the database at `path`; opened per lookup.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl CredentialStorePort for SqliteCredentialStore {
    fn get_token(
        &self,
        ctx: &RequestContext,
        request: TokenRequest,
    ) -> BoxFuture<'_, Result<Option<SecretString>>> {
        let ctx = ctx.clone();
        let path = self.path.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("credentials.get_token")?;
            let token = spawn_blocking(move || {
                let conn = open_read_only(&path, LABEL)?;
                conn.query_row(
                    SELECT_TOKEN,
                    (&*request.user_id, request.provider.as_str()),
                    |row| row.get::<_, Option<String>>(0),
                )
                .optional()
                .map_err(|error| LABEL.error("query", &error))
            })
            .await
            .map_err(|error| LABEL.task_error(&error))??;

            Ok(token
                .flatten()
                .map(SecretString::new)
                .filter(|token| !token.is_blank()))
        })
    }
}

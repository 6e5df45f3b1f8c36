//! GitHub REST v3 file fetcher.
//!
//! Lists the default branch tree recursively, filters blobs by path and size,
//! then downloads the survivors with bounded concurrency. Results keep tree
//! order regardless of which download finishes first.

pub mod filter;

pub use filter::FileFilter;

use crate::http::{self, HttpReply, Remote};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures_util::{StreamExt, TryStreamExt, stream};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use repo_indexer_config::GithubConfig;
use repo_indexer_ports::{BoxFuture, ListTextFilesRequest, SourceFetcherPort, SourceFile};
use repo_indexer_shared::{
    ErrorClass, ErrorCode, ErrorEnvelope, RequestContext, Result, SecretString,
};
use serde::Deserialize;

const ACCEPT_GITHUB_JSON: &str = "application/vnd.github+json";
const USER_AGENT_VALUE: &str = "repo-indexer";
const HEADER_API_VERSION: &str = "x-github-api-version";
const API_VERSION: &str = "2022-11-28";
const REMOTE: Remote = Remote {
    name: "GitHub",
    namespace: "github",
    slug: "github",
};

/// GitHub fetcher configuration.
#[derive(Debug, Clone)]
pub struct GitHubSourceFetcherConfig {
    /// REST API root (`https://api.github.com`).
    pub api_base_url: Box<str>,
    /// Blobs larger than this are skipped.
    pub max_file_size_bytes: u64,
    /// Concurrent blob downloads.
    pub fetch_concurrency: usize,
    /// Extensions excluded on top of the built-in list.
    pub excluded_extensions: Vec<Box<str>>,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl GitHubSourceFetcherConfig {
    /// Build from the GitHub config section and the core request timeout.
    #[must_use]
    pub fn from_github_config(config: &GithubConfig, timeout_ms: u64) -> Self {
        Self {
            api_base_url: config.api_base_url.clone(),
            max_file_size_bytes: config.max_file_size_bytes,
            fetch_concurrency: usize::try_from(config.fetch_concurrency).unwrap_or(1),
            excluded_extensions: config.excluded_extensions.clone(),
            timeout_ms,
        }
    }
}

/// Fetches the text files of a repository through the GitHub REST API.
pub struct GitHubSourceFetcher {
    client: reqwest::Client,
    api_base_url: Box<str>,
    filter: FileFilter,
    fetch_concurrency: usize,
}

impl GitHubSourceFetcher {
    /// Create a fetcher. The token is supplied per request.
    pub fn new(config: &GitHubSourceFetcherConfig) -> Result<Self> {
        let api_base_url = http::normalize_base_url("api base url", &config.api_base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_GITHUB_JSON));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(HEADER_API_VERSION, HeaderValue::from_static(API_VERSION));
        let client = http::build_client(REMOTE, config.timeout_ms, headers)?;

        Ok(Self {
            client,
            api_base_url,
            filter: FileFilter::new(config.max_file_size_bytes, &config.excluded_extensions),
            fetch_concurrency: config.fetch_concurrency.max(1),
        })
    }

    async fn list(
        &self,
        ctx: &RequestContext,
        request: ListTextFilesRequest,
    ) -> Result<Vec<SourceFile>> {
        let repo_url = format!(
            "{}/repos/{}/{}",
            self.api_base_url, request.owner, request.repo
        );
        let token = &request.token;

        let repository: RepositoryResponse = self
            .get(ctx, token, &repo_url, "github.get_repository")
            .await
            .and_then(|reply| {
                if reply.status == StatusCode::NOT_FOUND {
                    return Err(repository_not_found(&request));
                }
                reply.into_json(REMOTE)
            })?;

        let tree_url = format!(
            "{repo_url}/git/trees/{}?recursive=1",
            repository.default_branch
        );
        let reply = self.get(ctx, token, &tree_url, "github.get_tree").await?;
        // An empty repository has no tree yet.
        if reply.status == StatusCode::CONFLICT {
            return Ok(Vec::new());
        }
        let tree: TreeResponse = reply.into_json(REMOTE)?;
        if tree.truncated {
            tracing::warn!(
                owner = %request.owner,
                repo = %request.repo,
                entries = tree.tree.len(),
                "github tree listing truncated; indexing the returned entries only"
            );
        }

        let blobs: Vec<TreeEntry> = tree
            .tree
            .into_iter()
            .filter(|entry| &*entry.kind == "blob")
            .filter(|entry| self.filter.accepts(&entry.path, entry.size.unwrap_or(0)))
            .collect();

        let files: Vec<Option<SourceFile>> = stream::iter(blobs)
            .map(|entry| {
                let blob_url = format!("{repo_url}/git/blobs/{}", entry.sha);
                async move {
                    let blob: BlobResponse = self
                        .get(ctx, token, &blob_url, "github.get_blob")
                        .await?
                        .into_json(REMOTE)?;
                    decode_blob(entry.path, &blob)
                }
            })
            .buffered(self.fetch_concurrency)
            .try_collect()
            .await?;

        Ok(files.into_iter().flatten().collect())
    }

    async fn get(
        &self,
        ctx: &RequestContext,
        token: &SecretString,
        url: &str,
        operation: &'static str,
    ) -> Result<HttpReply> {
        let builder = self.client.get(url).bearer_auth(token.expose());
        let reply = http::execute(ctx, REMOTE, builder, operation).await?;
        if is_rate_limited(&reply) {
            return Err(ErrorEnvelope::unexpected(
                ErrorCode::rate_limited(),
                "GitHub API rate limit exhausted",
                ErrorClass::Retriable,
            )
            .with_metadata("status", reply.status.as_u16().to_string())
            .with_metadata("operation", operation));
        }
        Ok(reply)
    }
}

impl SourceFetcherPort for GitHubSourceFetcher {
    fn list_text_files(
        &self,
        ctx: &RequestContext,
        request: ListTextFilesRequest,
    ) -> BoxFuture<'_, Result<Vec<SourceFile>>> {
        let ctx = ctx.clone();
        Box::pin(async move { self.list(&ctx, request).await })
    }
}

#[derive(Debug, Deserialize)]
struct RepositoryResponse {
    default_branch: Box<str>,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct TreeEntry {
    path: Box<str>,
    #[serde(rename = "type")]
    kind: Box<str>,
    sha: Box<str>,
    #[serde(default)]
    size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct BlobResponse {
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

/// Decode a blob payload; `None` when the bytes are not UTF-8 text.
fn decode_blob(path: Box<str>, blob: &BlobResponse) -> Result<Option<SourceFile>> {
    let bytes = match blob.encoding.as_deref() {
        None | Some("base64") => {
            let compact: String = blob
                .content
                .chars()
                .filter(|ch| !ch.is_ascii_whitespace())
                .collect();
            STANDARD.decode(compact).map_err(|error| {
                ErrorEnvelope::unexpected(
                    ErrorCode::new("github", "github_invalid_blob"),
                    format!("failed to decode blob content: {error}"),
                    ErrorClass::NonRetriable,
                )
                .with_metadata("path", &*path)
            })?
        },
        Some("utf-8") => blob.content.clone().into_bytes(),
        Some(other) => {
            return Err(ErrorEnvelope::unexpected(
                ErrorCode::new("github", "github_invalid_blob"),
                format!("unsupported blob encoding `{other}`"),
                ErrorClass::NonRetriable,
            )
            .with_metadata("path", &*path));
        },
    };

    match String::from_utf8(bytes) {
        Ok(content) => Ok(Some(SourceFile::new(path, content))),
        Err(_) => {
            tracing::debug!(path = %path, "skipping non-UTF-8 blob");
            Ok(None)
        },
    }
}

fn is_rate_limited(reply: &HttpReply) -> bool {
    matches!(reply.status, StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS)
        && reply
            .headers
            .get("x-ratelimit-remaining")
            .and_then(|value| value.to_str().ok())
            == Some("0")
}

fn repository_not_found(request: &ListTextFilesRequest) -> ErrorEnvelope {
    ErrorEnvelope::expected(
        ErrorCode::not_found(),
        format!(
            "repository {}/{} not found or not accessible",
            request.owner, request.repo
        ),
    )
    .with_metadata("owner", &*request.owner)
    .with_metadata("repo", &*request.repo)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(content: &str, encoding: Option<&str>) -> BlobResponse {
        BlobResponse {
            content: content.to_owned(),
            encoding: encoding.map(str::to_owned),
        }
    }

    #[test]
    fn base64_with_line_breaks_decodes() {
        // GitHub wraps base64 content at 60 columns.
        let file = decode_blob("a.txt".into(), &blob("aGVsbG8g\nd29ybGQ=\n", Some("base64")))
            .unwrap()
            .unwrap();
        assert_eq!(file.content.as_ref(), "hello world");
        assert_eq!(file.path.as_ref(), "a.txt");
    }

    #[test]
    fn non_utf8_blob_is_skipped() {
        let encoded = STANDARD.encode([0xff_u8, 0xfe, 0x00]);
        assert_eq!(decode_blob("bin".into(), &blob(&encoded, Some("base64"))).unwrap(), None);
    }

    #[test]
    fn invalid_base64_is_an_error() {
        let error = decode_blob("a.txt".into(), &blob("!!!", Some("base64"))).unwrap_err();
        assert_eq!(error.code, ErrorCode::new("github", "github_invalid_blob"));
        assert_eq!(error.metadata.get("path").map(String::as_str), Some("a.txt"));
    }

    #[test]
    fn config_concurrency_is_at_least_one() -> Result<()> {
        let config = GitHubSourceFetcherConfig {
            fetch_concurrency: 0,
            ..GitHubSourceFetcherConfig::from_github_config(&GithubConfig::default(), 1_000)
        };
        let fetcher = GitHubSourceFetcher::new(&config)?;
        assert_eq!(fetcher.fetch_concurrency, 1);
        assert_eq!(fetcher.api_base_url.as_ref(), "https://api.github.com");
        Ok(())
    }
}

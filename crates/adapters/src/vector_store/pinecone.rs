//! Pinecone data-plane REST adapter.
//!
//! Upserts go to `POST {indexHost}/vectors/upsert`. Pinecone replaces records
//! whose id already exists in the namespace, which is what makes re-running
//! an indexing step safe.

use crate::http::{self, Remote};
use reqwest::header::{HeaderMap, HeaderValue};
use repo_indexer_config::VectorStoreConfig;
use repo_indexer_ports::{
    BoxFuture, UpsertRequest, VectorRecord, VectorRecordMetadata, VectorStorePort,
    VectorStoreProviderInfo,
};
use repo_indexer_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result, SecretString};
use serde::{Deserialize, Serialize};

const HEADER_API_KEY: &str = "api-key";
const HEADER_API_VERSION: &str = "x-pinecone-api-version";
const API_VERSION: &str = "2024-07";
const REMOTE: Remote = Remote {
    name: "Pinecone",
    namespace: "vector_store",
    slug: "pinecone",
};

/// Pinecone adapter configuration.
#[derive(Debug, Clone)]
pub struct PineconeVectorStoreConfig {
    /// API key sent as `Api-Key`.
    pub api_key: SecretString,
    /// Index name, reported in provider info.
    pub index_name: Box<str>,
    /// Data-plane host of the index (`https://<index>-<project>.svc.<env>.pinecone.io`).
    pub index_host: Box<str>,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl PineconeVectorStoreConfig {
    /// Build from the vector store config plus an API key.
    pub fn from_vector_store_config(
        api_key: SecretString,
        config: &VectorStoreConfig,
    ) -> Result<Self> {
        let index_host = config.index_host.clone().ok_or_else(|| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "missing_field"),
                "vectorStore.indexHost is required for pinecone",
            )
        })?;
        Ok(Self {
            api_key,
            index_name: config.index_name.clone(),
            index_host,
            timeout_ms: config.timeout_ms,
        })
    }
}

/// Pinecone vector store adapter.
pub struct PineconeVectorStore {
    provider: VectorStoreProviderInfo,
    client: reqwest::Client,
    upsert_endpoint: Box<str>,
}

impl PineconeVectorStore {
    /// Create a new Pinecone adapter.
    pub fn new(config: &PineconeVectorStoreConfig) -> Result<Self> {
        let api_key = http::normalize_required("api key", config.api_key.expose())?;
        let index_host = http::normalize_base_url("index host", &config.index_host)?;
        let index_name = http::normalize_required("index name", &config.index_name)?;

        let mut headers = HeaderMap::new();
        http::insert_sensitive(&mut headers, HEADER_API_KEY, &api_key, "api key")?;
        headers.insert(HEADER_API_VERSION, HeaderValue::from_static(API_VERSION));
        let client = http::build_client(REMOTE, config.timeout_ms, headers)?;

        Ok(Self {
            provider: VectorStoreProviderInfo {
                id: "pinecone".into(),
                index_name,
            },
            client,
            upsert_endpoint: format!("{index_host}/vectors/upsert").into(),
        })
    }

    async fn upsert_records(&self, ctx: &RequestContext, request: UpsertRequest) -> Result<()> {
        const OPERATION: &str = "pinecone.upsert";
        ctx.ensure_not_cancelled(OPERATION)?;
        if request.records.is_empty() {
            return Ok(());
        }

        let sent = request.records.len();
        let body = PineconeUpsertRequest {
            vectors: request.records.iter().map(PineconeVector::from).collect(),
            namespace: request.namespace.as_str(),
        };
        let builder = self.client.post(self.upsert_endpoint.as_ref()).json(&body);
        let response: PineconeUpsertResponse = http::execute(ctx, REMOTE, builder, OPERATION)
            .await?
            .into_json(REMOTE)?;

        if response.upserted_count.is_some_and(|count| count != sent) {
            tracing::warn!(
                namespace = %request.namespace,
                sent,
                upserted = response.upserted_count,
                "pinecone acknowledged a different record count"
            );
        }
        Ok(())
    }
}

impl VectorStorePort for PineconeVectorStore {
    fn provider(&self) -> &VectorStoreProviderInfo {
        &self.provider
    }

    fn upsert(&self, ctx: &RequestContext, request: UpsertRequest) -> BoxFuture<'_, Result<()>> {
        let ctx = ctx.clone();
        Box::pin(async move { self.upsert_records(&ctx, request).await })
    }
}

#[derive(Debug, Serialize)]
struct PineconeUpsertRequest<'a> {
    vectors: Vec<PineconeVector<'a>>,
    namespace: &'a str,
}

#[derive(Debug, Serialize)]
struct PineconeVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: &'a VectorRecordMetadata,
}

impl<'a> From<&'a VectorRecord> for PineconeVector<'a> {
    fn from(record: &'a VectorRecord) -> Self {
        Self {
            id: record.id.as_str(),
            values: record.values.as_slice(),
            metadata: &record.metadata,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PineconeUpsertResponse {
    #[serde(default)]
    upserted_count: Option<usize>,
}

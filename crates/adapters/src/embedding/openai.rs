//! OpenAI embedding adapter (`POST /embeddings`).

use crate::embedding::check_batch;
use crate::http::{self, Remote};
use reqwest::header::HeaderMap;
use repo_indexer_config::EmbeddingConfig;
use repo_indexer_ports::{
    BoxFuture, EmbedBatchRequest, EmbeddingPort, EmbeddingProviderInfo, EmbeddingVector,
};
use repo_indexer_shared::{
    ErrorClass, ErrorCode, ErrorEnvelope, RequestContext, Result, SecretString,
};
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const REMOTE: Remote = Remote {
    name: "OpenAI",
    namespace: "embedding",
    slug: "openai",
};

/// OpenAI embedding adapter configuration.
#[derive(Debug, Clone)]
pub struct OpenAiEmbeddingConfig {
    /// API key sent as a bearer token.
    pub api_key: SecretString,
    /// Embedding model name.
    pub model: Box<str>,
    /// Base URL override (defaults to `https://api.openai.com/v1`).
    pub base_url: Option<Box<str>>,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Requested output dimension (`dimensions` request field).
    pub dimension: Option<u32>,
}

impl OpenAiEmbeddingConfig {
    /// Build from the shared embedding config plus an API key.
    #[must_use]
    pub fn from_embedding_config(api_key: SecretString, config: &EmbeddingConfig) -> Self {
        Self {
            api_key,
            model: config.effective_model().into(),
            base_url: config.base_url.clone(),
            timeout_ms: config.timeout_ms,
            dimension: config.dimension,
        }
    }
}

/// OpenAI embedding adapter implementation.
pub struct OpenAiEmbedding {
    provider: EmbeddingProviderInfo,
    client: reqwest::Client,
    endpoint: Box<str>,
    dimension: Option<u32>,
}

impl OpenAiEmbedding {
    /// Create a new OpenAI embedding adapter.
    pub fn new(config: &OpenAiEmbeddingConfig) -> Result<Self> {
        let api_key = http::normalize_required("api key", config.api_key.expose())?;
        let model = http::normalize_required("model", &config.model)?;
        let base_url = http::normalize_base_url(
            "base url",
            config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL),
        )?;

        let mut headers = HeaderMap::new();
        http::insert_sensitive(
            &mut headers,
            "authorization",
            &format!("Bearer {api_key}"),
            "api key",
        )?;
        let client = http::build_client(REMOTE, config.timeout_ms, headers)?;

        Ok(Self {
            provider: EmbeddingProviderInfo {
                id: "openai".into(),
                model,
            },
            client,
            endpoint: format!("{base_url}/embeddings").into(),
            dimension: config.dimension,
        })
    }

    async fn embed_many(
        &self,
        ctx: &RequestContext,
        texts: Vec<Box<str>>,
    ) -> Result<Vec<EmbeddingVector>> {
        const OPERATION: &str = "openai_embedding.embed_batch";
        ctx.ensure_not_cancelled(OPERATION)?;
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let expected_count = texts.len();
        let request = OpenAiEmbeddingRequest {
            model: self.provider.model.clone(),
            input: texts
                .into_iter()
                .map(|text| if text.is_empty() { " ".into() } else { text })
                .collect(),
            dimensions: self.dimension,
        };

        let builder = self.client.post(self.endpoint.as_ref()).json(&request);
        let response: OpenAiEmbeddingResponse = http::execute(ctx, REMOTE, builder, OPERATION)
            .await?
            .into_json(REMOTE)?;

        let vectors = order_by_index(response.data, expected_count)?;
        check_batch(REMOTE.slug, vectors, expected_count, self.dimension)
    }
}

impl EmbeddingPort for OpenAiEmbedding {
    fn provider(&self) -> &EmbeddingProviderInfo {
        &self.provider
    }

    fn embed_batch(
        &self,
        ctx: &RequestContext,
        request: EmbedBatchRequest,
    ) -> BoxFuture<'_, Result<Vec<EmbeddingVector>>> {
        let ctx = ctx.clone();
        Box::pin(async move { self.embed_many(&ctx, request.texts).await })
    }
}

#[derive(Debug, Serialize)]
struct OpenAiEmbeddingRequest {
    model: Box<str>,
    input: Vec<Box<str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<OpenAiEmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingDatum {
    embedding: Vec<f32>,
    index: usize,
}

// The API documents `data` as ordered by `index`, but does not promise it.
fn order_by_index(
    data: Vec<OpenAiEmbeddingDatum>,
    expected_count: usize,
) -> Result<Vec<EmbeddingVector>> {
    if data.len() != expected_count {
        // Let check_batch report the mismatch with the usual code.
        return Ok(data
            .into_iter()
            .map(|datum| EmbeddingVector::from_vec(datum.embedding))
            .collect());
    }

    let mut slots: Vec<Option<EmbeddingVector>> = vec![None; expected_count];
    for datum in data {
        let slot = slots.get_mut(datum.index).ok_or_else(|| {
            ErrorEnvelope::unexpected(
                ErrorCode::internal(),
                "embedding response index out of range",
                ErrorClass::NonRetriable,
            )
            .with_metadata("index", datum.index.to_string())
        })?;
        if slot.is_some() {
            return Err(ErrorEnvelope::unexpected(
                ErrorCode::internal(),
                "embedding response index duplicated",
                ErrorClass::NonRetriable,
            )
            .with_metadata("index", datum.index.to_string()));
        }
        *slot = Some(EmbeddingVector::from_vec(datum.embedding));
    }

    slots
        .into_iter()
        .map(|slot| {
            slot.ok_or_else(|| {
                ErrorEnvelope::unexpected(
                    ErrorCode::internal(),
                    "embedding response missing index",
                    ErrorClass::NonRetriable,
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn datum(index: usize, value: f32) -> OpenAiEmbeddingDatum {
        OpenAiEmbeddingDatum {
            embedding: vec![value, value],
            index,
        }
    }

    #[test]
    fn request_serializes_with_dimensions() {
        let request = OpenAiEmbeddingRequest {
            model: "text-embedding-3-small".into(),
            input: vec!["a".into(), "b".into()],
            dimensions: Some(2),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "text-embedding-3-small",
                "input": ["a", "b"],
                "dimensions": 2
            })
        );
    }

    #[test]
    fn out_of_order_data_is_reordered() {
        let vectors = order_by_index(vec![datum(1, 1.0), datum(0, 0.0)], 2).unwrap();
        assert_eq!(vectors[0].as_slice(), &[0.0, 0.0]);
        assert_eq!(vectors[1].as_slice(), &[1.0, 1.0]);
    }

    #[test]
    fn duplicate_index_is_rejected() {
        let error = order_by_index(vec![datum(0, 0.0), datum(0, 1.0)], 2).unwrap_err();
        assert_eq!(error.code, ErrorCode::internal());
    }

    #[test]
    fn index_out_of_range_is_rejected() {
        assert!(order_by_index(vec![datum(0, 0.0), datum(5, 1.0)], 2).is_err());
    }
}

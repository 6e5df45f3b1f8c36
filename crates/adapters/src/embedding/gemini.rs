//! Gemini embedding adapter (`batchEmbedContents`).

use crate::embedding::check_batch;
use crate::http::{self, Remote};
use reqwest::header::HeaderMap;
use repo_indexer_config::EmbeddingConfig;
use repo_indexer_ports::{
    BoxFuture, EmbedBatchRequest, EmbeddingPort, EmbeddingProviderInfo, EmbeddingVector,
};
use repo_indexer_shared::{ErrorCode, ErrorEnvelope, RequestContext, Result, SecretString};
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const HEADER_API_KEY: &str = "x-goog-api-key";
const REMOTE: Remote = Remote {
    name: "Gemini",
    namespace: "embedding",
    slug: "gemini",
};

/// Gemini embedding adapter configuration.
#[derive(Debug, Clone)]
pub struct GeminiEmbeddingConfig {
    /// API key sent as `x-goog-api-key`.
    pub api_key: SecretString,
    /// Model name, with or without the `models/` prefix.
    pub model: Box<str>,
    /// Base URL override (defaults to `https://generativelanguage.googleapis.com/v1beta`).
    pub base_url: Option<Box<str>>,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Requested output dimensionality.
    pub dimension: Option<u32>,
}

impl GeminiEmbeddingConfig {
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

/// Gemini embedding adapter implementation.
pub struct GeminiEmbedding {
    provider: EmbeddingProviderInfo,
    client: reqwest::Client,
    batch_endpoint: Box<str>,
    model_resource: Box<str>,
    dimension: Option<u32>,
}

impl GeminiEmbedding {
    /// Create a new Gemini embedding adapter.
    pub fn new(config: &GeminiEmbeddingConfig) -> Result<Self> {
        let api_key = http::normalize_required("api key", config.api_key.expose())?;
        let model_resource = normalize_model_resource(&config.model)?;
        let base_url = http::normalize_base_url(
            "base url",
            config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL),
        )?;

        let mut headers = HeaderMap::new();
        http::insert_sensitive(&mut headers, HEADER_API_KEY, &api_key, "api key")?;
        let client = http::build_client(REMOTE, config.timeout_ms, headers)?;

        let model = model_resource
            .strip_prefix("models/")
            .unwrap_or(&model_resource)
            .into();
        Ok(Self {
            provider: EmbeddingProviderInfo {
                id: "gemini".into(),
                model,
            },
            client,
            batch_endpoint: format!("{base_url}/{model_resource}:batchEmbedContents").into(),
            model_resource,
            dimension: config.dimension,
        })
    }

    async fn embed_many(
        &self,
        ctx: &RequestContext,
        texts: Vec<Box<str>>,
    ) -> Result<Vec<EmbeddingVector>> {
        const OPERATION: &str = "gemini_embedding.embed_batch";
        ctx.ensure_not_cancelled(OPERATION)?;
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let expected_count = texts.len();
        let request = GeminiBatchEmbedRequest {
            requests: texts
                .into_iter()
                .map(|text| GeminiEmbedContentRequest {
                    model: self.model_resource.clone(),
                    content: GeminiContent::from_text(text),
                    output_dimensionality: self.dimension,
                })
                .collect(),
        };

        let builder = self.client.post(self.batch_endpoint.as_ref()).json(&request);
        let response: GeminiBatchEmbedResponse = http::execute(ctx, REMOTE, builder, OPERATION)
            .await?
            .into_json(REMOTE)?;

        let vectors = response
            .embeddings
            .into_iter()
            .map(|embedding| EmbeddingVector::from_vec(embedding.values))
            .collect();
        check_batch(REMOTE.slug, vectors, expected_count, self.dimension)
    }
}

impl EmbeddingPort for GeminiEmbedding {
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
struct GeminiBatchEmbedRequest {
    requests: Vec<GeminiEmbedContentRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiEmbedContentRequest {
    model: Box<str>,
    content: GeminiContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dimensionality: Option<u32>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

impl GeminiContent {
    fn from_text(text: Box<str>) -> Self {
        // The API rejects empty parts.
        let text = if text.is_empty() { " ".into() } else { text };
        Self {
            parts: vec![GeminiPart { text }],
        }
    }
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: Box<str>,
}

#[derive(Debug, Deserialize)]
struct GeminiBatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<GeminiEmbeddingValues>,
}

#[derive(Debug, Deserialize)]
struct GeminiEmbeddingValues {
    values: Vec<f32>,
}

fn normalize_model_resource(model: &str) -> Result<Box<str>> {
    let trimmed = model.trim();
    if trimmed.is_empty() || trimmed == "models/" {
        return Err(ErrorEnvelope::expected(
            ErrorCode::invalid_input(),
            "model must be non-empty",
        ));
    }
    if trimmed.starts_with("models/") {
        Ok(trimmed.into())
    } else {
        Ok(format!("models/{trimmed}").into())
    }
}

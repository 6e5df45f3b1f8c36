//! HTTP adapter integration tests against a mock server.
#![allow(missing_docs)]

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use repo_indexer_adapters::embedding::{
    GeminiEmbedding, GeminiEmbeddingConfig, OpenAiEmbedding, OpenAiEmbeddingConfig,
};
use repo_indexer_adapters::github::{GitHubSourceFetcher, GitHubSourceFetcherConfig};
use repo_indexer_adapters::vector_store::{PineconeVectorStore, PineconeVectorStoreConfig};
use repo_indexer_domain::{ChunkingOptions, RepositoryIdentity, chunk_source};
use repo_indexer_ports::{
    EmbedBatchRequest, EmbeddingPort, EmbeddingVector, ListTextFilesRequest, SourceFetcherPort,
    UpsertRequest, VectorRecord, VectorRecordMetadata, VectorStorePort,
};
use repo_indexer_shared::{ErrorCode, RequestContext, Result, SecretString};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gemini(server: &MockServer, dimension: Option<u32>) -> Result<GeminiEmbedding> {
    GeminiEmbedding::new(&GeminiEmbeddingConfig {
        api_key: SecretString::new("example"), // pragma: allowlist secret
        model: "text-embedding-004".into(),
        base_url: Some(server.uri().into()),
        timeout_ms: 5_000,
        dimension,
    })
}

fn openai(server: &MockServer) -> Result<OpenAiEmbedding> {
    OpenAiEmbedding::new(&OpenAiEmbeddingConfig {
        api_key: SecretString::new("example"), // pragma: allowlist secret
        model: "text-embedding-3-small".into(),
        base_url: Some(server.uri().into()),
        timeout_ms: 5_000,
        dimension: Some(2),
    })
}

fn texts(items: &[&str]) -> EmbedBatchRequest {
    EmbedBatchRequest::from(items.iter().map(|item| (*item).to_owned()).collect::<Vec<_>>())
}

#[tokio::test]
async fn gemini_batch_keeps_input_order() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/text-embedding-004:batchEmbedContents"))
        .and(header("x-goog-api-key", "example"))
        .and(body_partial_json(json!({
            "requests": [
                { "model": "models/text-embedding-004", "content": { "parts": [ { "text": "a" } ] } },
                { "model": "models/text-embedding-004", "content": { "parts": [ { "text": "b" } ] } }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [ { "values": [0.1, 0.2] }, { "values": [0.3, 0.4] } ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = gemini(&server, None)?;
    let vectors = adapter
        .embed_batch(&RequestContext::new_request(), texts(&["a", "b"]))
        .await?;

    assert_eq!(vectors.len(), 2);
    assert_eq!(vectors[0].as_slice(), &[0.1, 0.2]);
    assert_eq!(vectors[1].as_slice(), &[0.3, 0.4]);
    Ok(())
}

#[tokio::test]
async fn empty_batch_makes_no_request() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let adapter = gemini(&server, None)?;
    let vectors = adapter
        .embed_batch(&RequestContext::new_request(), texts(&[]))
        .await?;
    assert!(vectors.is_empty());
    Ok(())
}

#[tokio::test]
async fn gemini_count_mismatch_is_internal() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [ { "values": [0.1, 0.2] } ]
        })))
        .mount(&server)
        .await;

    let adapter = gemini(&server, None)?;
    let error = adapter
        .embed_batch(&RequestContext::new_request(), texts(&["a", "b"]))
        .await
        .err()
        .ok_or_else(|| std::io::Error::other("expected count mismatch"))?;
    assert_eq!(error.code, ErrorCode::internal());
    assert!(!error.is_retriable());
    Ok(())
}

#[tokio::test]
async fn gemini_dimension_mismatch_is_rejected() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "requests": [ { "outputDimensionality": 3 } ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [ { "values": [0.1, 0.2] } ]
        })))
        .mount(&server)
        .await;

    let adapter = gemini(&server, Some(3))?;
    let error = adapter
        .embed_batch(&RequestContext::new_request(), texts(&["a"]))
        .await
        .err()
        .ok_or_else(|| std::io::Error::other("expected dimension mismatch"))?;
    assert_eq!(error.code, ErrorCode::invalid_input());
    assert_eq!(error.metadata.get("expected").map(String::as_str), Some("3"));
    Ok(())
}

#[tokio::test]
async fn openai_out_of_order_data_is_reordered() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(header("authorization", "Bearer example"))
        .and(body_partial_json(json!({
            "model": "text-embedding-3-small",
            "input": ["first", "second"],
            "dimensions": 2
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "embedding": [2.0, 2.0], "index": 1 },
                { "embedding": [1.0, 1.0], "index": 0 }
            ]
        })))
        .mount(&server)
        .await;

    let adapter = openai(&server)?;
    let vectors = adapter
        .embed_batch(&RequestContext::new_request(), texts(&["first", "second"]))
        .await?;
    assert_eq!(vectors[0].as_slice(), &[1.0, 1.0]);
    assert_eq!(vectors[1].as_slice(), &[2.0, 2.0]);
    Ok(())
}

#[tokio::test]
async fn provider_statuses_are_classified() -> Result<()> {
    let cases = [
        (429, ErrorCode::rate_limited(), true),
        (503, ErrorCode::dependency_unavailable(), true),
        (401, ErrorCode::permission_denied(), false),
        (400, ErrorCode::invalid_input(), false),
    ];

    for (status, code, retriable) in cases {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_json(json!({ "error": { "message": "provider says no" } })),
            )
            .mount(&server)
            .await;

        let adapter = openai(&server)?;
        let error = adapter
            .embed_batch(&RequestContext::new_request(), texts(&["a"]))
            .await
            .err()
            .ok_or_else(|| std::io::Error::other("expected failure"))?;
        assert_eq!(error.code, code, "status {status}");
        assert_eq!(error.is_retriable(), retriable, "status {status}");
        assert_eq!(error.message, "provider says no");
        assert_eq!(
            error.metadata.get("status").map(String::as_str),
            Some(status.to_string().as_str())
        );
    }
    Ok(())
}

#[tokio::test]
async fn cancelled_context_skips_the_request() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let ctx = RequestContext::new_request();
    ctx.cancel();
    let error = openai(&server)?
        .embed_batch(&ctx, texts(&["a"]))
        .await
        .err()
        .ok_or_else(|| std::io::Error::other("expected cancellation"))?;
    assert_eq!(error.code, ErrorCode::cancelled());
    Ok(())
}

#[tokio::test]
async fn pinecone_upsert_posts_namespace_and_records() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/vectors/upsert"))
        .and(header("api-key", "example"))
        .and(header("x-pinecone-api-version", "2024-07"))
        .and(body_partial_json(json!({
            "namespace": "octocat/hello",
            "vectors": [{
                "id": "octocat/hello:src/main.rs:0-2",
                "values": [0.25, 0.75],
                "metadata": {
                    "owner": "octocat",
                    "repo": "hello",
                    "userId": "u_1",
                    "path": "src/main.rs",
                    "startLine": 0,
                    "endLine": 2
                }
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "upsertedCount": 1 })))
        .expect(1)
        .mount(&server)
        .await;

    let store = PineconeVectorStore::new(&PineconeVectorStoreConfig {
        api_key: SecretString::new("example"), // pragma: allowlist secret
        index_name: "code".into(),
        index_host: server.uri().into(),
        timeout_ms: 5_000,
    })?;

    let identity = RepositoryIdentity::parse(Some("octocat"), Some("hello"), Some("u_1"))?;
    let chunk = chunk_source("src/main.rs", "fn main() {\n}", ChunkingOptions::default())
        .pop()
        .ok_or_else(|| std::io::Error::other("expected a chunk"))?;
    let record = VectorRecord {
        id: identity.record_id(chunk.id()),
        values: EmbeddingVector::from_vec(vec![0.25, 0.75]),
        metadata: VectorRecordMetadata::for_chunk(&identity, &chunk),
    };

    store
        .upsert(
            &RequestContext::new_request(),
            UpsertRequest {
                namespace: identity.namespace(),
                records: vec![record],
            },
        )
        .await?;
    Ok(())
}

fn encoded(text: &str) -> String {
    STANDARD.encode(text)
}

fn fetcher(server: &MockServer) -> Result<GitHubSourceFetcher> {
    GitHubSourceFetcher::new(&GitHubSourceFetcherConfig {
        api_base_url: server.uri().into(),
        max_file_size_bytes: 1_000,
        fetch_concurrency: 2,
        excluded_extensions: vec!["txt".into()],
        timeout_ms: 5_000,
    })
}

fn list_request() -> ListTextFilesRequest {
    ListTextFilesRequest {
        token: SecretString::new("gho_example"), // pragma: allowlist secret
        owner: "octocat".into(),
        repo: "hello".into(),
    }
}

async fn mount_repository(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello"))
        .and(header("authorization", "Bearer gho_example"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "default_branch": "main" })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn github_lists_filtered_text_files_in_tree_order() -> Result<()> {
    let server = MockServer::start().await;
    mount_repository(&server).await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello/git/trees/main"))
        .and(query_param("recursive", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "truncated": false,
            "tree": [
                { "path": "src", "type": "tree", "sha": "t1" },
                { "path": "src/lib.rs", "type": "blob", "sha": "b1", "size": 12 },
                { "path": "README.md", "type": "blob", "sha": "b2", "size": 6 },
                { "path": "logo.png", "type": "blob", "sha": "b3", "size": 10 },
                { "path": "node_modules/x/index.js", "type": "blob", "sha": "b4", "size": 10 },
                { "path": "notes.txt", "type": "blob", "sha": "b5", "size": 10 },
                { "path": "big.rs", "type": "blob", "sha": "b6", "size": 5_000 },
                { "path": "raw.bin.rs", "type": "blob", "sha": "b7", "size": 3 }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello/git/blobs/b1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": encoded("pub fn a() {}"),
            "encoding": "base64"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello/git/blobs/b2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": encoded("# Hello"),
            "encoding": "base64"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello/git/blobs/b7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": STANDARD.encode([0xff_u8, 0xfe, 0x00]),
            "encoding": "base64"
        })))
        .mount(&server)
        .await;

    let files = fetcher(&server)?
        .list_text_files(&RequestContext::new_request(), list_request())
        .await?;

    let paths: Vec<&str> = files.iter().map(|file| file.path.as_ref()).collect();
    assert_eq!(paths, vec!["src/lib.rs", "README.md"]);
    assert_eq!(files[0].content.as_ref(), "pub fn a() {}");
    Ok(())
}

#[tokio::test]
async fn github_missing_repository_is_not_found() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
        .mount(&server)
        .await;

    let error = fetcher(&server)?
        .list_text_files(&RequestContext::new_request(), list_request())
        .await
        .err()
        .ok_or_else(|| std::io::Error::other("expected not found"))?;
    assert_eq!(error.code, ErrorCode::not_found());
    assert_eq!(error.metadata.get("repo").map(String::as_str), Some("hello"));
    Ok(())
}

#[tokio::test]
async fn github_empty_repository_has_no_files() -> Result<()> {
    let server = MockServer::start().await;
    mount_repository(&server).await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello/git/trees/main"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({ "message": "Git Repository is empty." })),
        )
        .mount(&server)
        .await;

    let files = fetcher(&server)?
        .list_text_files(&RequestContext::new_request(), list_request())
        .await?;
    assert!(files.is_empty());
    Ok(())
}

#[tokio::test]
async fn github_exhausted_rate_limit_is_retriable() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .set_body_json(json!({ "message": "API rate limit exceeded" })),
        )
        .mount(&server)
        .await;

    let error = fetcher(&server)?
        .list_text_files(&RequestContext::new_request(), list_request())
        .await
        .err()
        .ok_or_else(|| std::io::Error::other("expected rate limit"))?;
    assert_eq!(error.code, ErrorCode::rate_limited());
    assert!(error.is_retriable());
    Ok(())
}

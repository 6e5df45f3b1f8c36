//! The `index-codebase` step body: chunk, embed and upsert in fixed batches.

use super::types::{EMBEDDING_BATCH_SIZE, IndexCodebaseSummary, IndexRepositoryDeps};
use repo_indexer_domain::{
    Chunk, ChunkingOptions, RepositoryIdentity, SourceFile, VectorRecordMetadata, chunk_source,
    format_for_embedding,
};
use repo_indexer_ports::{EmbedBatchRequest, LoggerPort, UpsertRequest, VectorRecord, log_fields};
use repo_indexer_shared::{ErrorClass, ErrorCode, ErrorEnvelope, RequestContext, Result};

/// Chunks of every file, in fetch order then window order.
pub(crate) fn chunk_files(files: &[SourceFile], options: ChunkingOptions) -> Vec<Chunk> {
    files
        .iter()
        .flat_map(|file| chunk_source(&file.path, &file.content, options))
        .collect()
}

/// Embed and upsert `chunks` one batch at a time, strictly in order.
///
/// Batches are not checkpointed: a failure propagates and a retry of the
/// step starts again from the first batch. Upsert by id keeps that safe.
pub(crate) async fn index_chunks(
    ctx: &RequestContext,
    deps: &IndexRepositoryDeps,
    identity: &RepositoryIdentity,
    chunks: &[Chunk],
    logger: &dyn LoggerPort,
) -> Result<IndexCodebaseSummary> {
    let namespace = identity.namespace();
    let mut summary = IndexCodebaseSummary {
        chunks_indexed: 0,
        batches: 0,
    };

    for batch in chunks.chunks(EMBEDDING_BATCH_SIZE) {
        ctx.ensure_not_cancelled("index_repository.index_batch")?;

        let texts: Vec<String> = batch
            .iter()
            .map(|chunk| format_for_embedding(chunk.path(), chunk.content()))
            .collect();
        let vectors = deps
            .embedding
            .embed_batch(ctx, EmbedBatchRequest::from(texts))
            .await?;
        if vectors.len() != batch.len() {
            return Err(ErrorEnvelope::unexpected(
                ErrorCode::internal(),
                "embedding provider returned a different number of vectors",
                ErrorClass::NonRetriable,
            )
            .with_metadata("expected", batch.len().to_string())
            .with_metadata("actual", vectors.len().to_string()));
        }

        let records: Vec<VectorRecord> = batch
            .iter()
            .zip(vectors)
            .map(|(chunk, values)| VectorRecord {
                id: identity.record_id(chunk.id()),
                values,
                metadata: VectorRecordMetadata::for_chunk(identity, chunk),
            })
            .collect();
        let sent = records.len();

        deps.vector_store
            .upsert(
                ctx,
                UpsertRequest {
                    namespace: namespace.clone(),
                    records,
                },
            )
            .await?;

        summary.chunks_indexed += sent;
        summary.batches += 1;
        logger.debug(
            "index.batch_upserted",
            "Batch embedded and upserted",
            Some(log_fields([
                ("batch", summary.batches.into()),
                ("size", sent.into()),
                ("total", summary.chunks_indexed.into()),
            ])),
        );
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_keep_file_order() {
        let files = vec![
            SourceFile::new("b.rs", "fn b() {}"),
            SourceFile::new("a.rs", "fn a() {}\n\nfn a2() {}"),
        ];
        let chunks = chunk_files(&files, ChunkingOptions::default());
        let paths: Vec<&str> = chunks.iter().map(Chunk::path).collect();
        assert_eq!(paths, vec!["b.rs", "a.rs"]);
    }

    #[test]
    fn blank_files_contribute_no_chunks() {
        let files = vec![SourceFile::new("empty.md", ""), SourceFile::new("blank.md", "\n \n")];
        assert!(chunk_files(&files, ChunkingOptions::default()).is_empty());
    }
}

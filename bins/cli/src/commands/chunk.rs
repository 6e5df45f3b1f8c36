//! Chunk command handler: preview how a local file is split and framed.

use crate::error::{CliError, ExitCode};
use crate::format::{OutputMode, to_json_line};
use crate::{CliOutput, format_error_output};
use repo_indexer_domain::{Chunk, ChunkingOptions, chunk_source, format_for_embedding};
use repo_indexer_shared::ErrorEnvelope;
use serde::Serialize;
use std::path::Path;

/// Arguments of `rix chunk`.
#[derive(Debug, Clone, Copy)]
pub struct ChunkCommandInput<'a> {
    /// Local file to read.
    pub file: &'a Path,
    /// Repository path the chunks are attributed to; defaults to `file`.
    pub path: Option<&'a str>,
    /// Window size in lines.
    pub chunk_size: Option<usize>,
    /// Lines shared by consecutive windows.
    pub overlap: Option<usize>,
    /// Include the text sent to the embedding model.
    pub show_embedding_text: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChunkView<'a> {
    #[serde(flatten)]
    chunk: &'a Chunk,
    #[serde(skip_serializing_if = "Option::is_none")]
    embedding_text: Option<String>,
}

/// Chunk one local file.
pub fn run_chunk(mode: OutputMode, input: ChunkCommandInput<'_>) -> Result<CliOutput, CliError> {
    let defaults = ChunkingOptions::default();
    let options = match ChunkingOptions::new(
        input.chunk_size.unwrap_or_else(|| defaults.chunk_size()),
        input.overlap.unwrap_or_else(|| defaults.overlap()),
    ) {
        Ok(options) => options,
        Err(error) => return Ok(format_error_output(mode, &ErrorEnvelope::from(error))),
    };

    let content = std::fs::read_to_string(input.file)?;
    let file_label = input.file.to_string_lossy();
    let path = input.path.unwrap_or(&file_label);
    let chunks = chunk_source(path, &content, options);
    tracing::debug!(path, chunks = chunks.len(), "file chunked");

    let views: Vec<ChunkView<'_>> = chunks
        .iter()
        .map(|chunk| ChunkView {
            chunk,
            embedding_text: input
                .show_embedding_text
                .then(|| format_for_embedding(chunk.path(), chunk.content())),
        })
        .collect();

    let stdout = if mode.is_json() {
        to_json_line(&serde_json::json!({
            "path": path,
            "chunkSize": options.chunk_size(),
            "overlap": options.overlap(),
            "chunks": views,
        }))?
    } else {
        format_chunks_text(path, &views)
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}

fn format_chunks_text(path: &str, views: &[ChunkView<'_>]) -> String {
    let mut out = format!("path: {path}\nchunks: {}\n", views.len());
    for view in views {
        let range = view.chunk.range();
        out.push_str(&format!(
            "\n--- {} (lines {}..{})\n",
            view.chunk.id(),
            range.start(),
            range.end()
        ));
        out.push_str(view.embedding_text.as_deref().unwrap_or(view.chunk.content()));
        out.push('\n');
    }
    out
}

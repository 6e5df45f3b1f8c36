//! Config command handlers.

use crate::error::{CliError, ExitCode};
use crate::format::{OutputMode, to_json_line};
use crate::{CliOutput, format_error_output};
use repo_indexer_infra::{
    ConfigFormat, IndexerRuntime, RuntimeOptions, load_effective_config, render_effective_config,
};
use std::collections::BTreeMap;
use std::path::Path;

/// Print the effective config (file + env overrides, secrets excluded).
pub fn run_config_show(
    mode: OutputMode,
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
    format: ConfigFormat,
) -> Result<CliOutput, CliError> {
    match render_effective_config(env, config_path, format) {
        Ok(stdout) => Ok(CliOutput {
            stdout,
            stderr: String::new(),
            exit_code: ExitCode::Ok,
        }),
        Err(error) => Ok(format_error_output(mode, &error)),
    }
}

/// Validate the config and check that every adapter can be built from it.
pub fn run_config_validate(
    mode: OutputMode,
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
) -> Result<CliOutput, CliError> {
    let (config, backend_env) = match load_effective_config(env, config_path) {
        Ok(loaded) => loaded,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };
    if let Err(error) = IndexerRuntime::from_config(&config, &backend_env, RuntimeOptions::default())
    {
        return Ok(format_error_output(mode, &error));
    }

    let embedding = config.embedding.provider.as_str();
    let model = config.embedding.effective_model();
    let vector_store = config.vector_store.provider.as_str();
    let chunking = config.chunking_options();

    let stdout = if mode.is_json() {
        to_json_line(&serde_json::json!({
            "status": "ok",
            "embedding": { "provider": embedding, "model": model },
            "vectorStore": {
                "provider": vector_store,
                "indexName": &*config.vector_store.index_name,
            },
            "chunking": {
                "chunkSize": chunking.chunk_size(),
                "overlap": chunking.overlap(),
            },
        }))?
    } else {
        format!(
            "status: ok\nembedding: {embedding} ({model})\nvectorStore: {vector_store} ({})\nchunking: {} lines, {} overlap\n",
            config.vector_store.index_name,
            chunking.chunk_size(),
            chunking.overlap()
        )
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{LogFormat, OutputFormat};

    const fn mode(format: OutputFormat) -> OutputMode {
        OutputMode {
            format,
            log_format: LogFormat::Text,
        }
    }

    fn env(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect()
    }

    #[test]
    fn validate_reports_selected_providers() -> Result<(), Box<dyn std::error::Error>> {
        let output = run_config_validate(
            mode(OutputFormat::Json),
            &env(&[
                ("RIX_EMBEDDING_PROVIDER", "hash"),
                ("RIX_VECTOR_STORE_PROVIDER", "memory"),
            ]),
            None,
        )?;
        assert_eq!(output.exit_code, ExitCode::Ok);
        let value: serde_json::Value = serde_json::from_str(&output.stdout)?;
        assert_eq!(value["embedding"]["provider"], "hash");
        assert_eq!(value["vectorStore"]["provider"], "memory");
        assert_eq!(value["chunking"]["chunkSize"], 100);
        Ok(())
    }

    #[test]
    fn validate_flags_missing_api_keys() -> Result<(), CliError> {
        let output = run_config_validate(
            mode(OutputFormat::Text),
            &env(&[("RIX_EMBEDDING_PROVIDER", "gemini")]),
            None,
        )?;
        assert_eq!(output.exit_code, ExitCode::InvalidInput);
        assert!(output.stdout.contains("config:missing_api_key"), "{}", output.stdout);
        Ok(())
    }

    #[test]
    fn show_renders_toml() -> Result<(), CliError> {
        let output = run_config_show(
            mode(OutputFormat::Text),
            &env(&[("RIX_CHUNK_OVERLAP", "5")]),
            None,
            ConfigFormat::Toml,
        )?;
        assert_eq!(output.exit_code, ExitCode::Ok);
        assert!(output.stdout.contains("overlap = 5"), "{}", output.stdout);
        Ok(())
    }
}

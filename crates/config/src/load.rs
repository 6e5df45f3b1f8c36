//! Config loading helpers (env + file).
//!
//! The loader is responsible for deterministic merge order and surfacing
//! user-facing errors as typed `ErrorEnvelope`s.

use crate::{BackendConfig, BackendEnv, ValidatedBackendConfig, apply_env_overrides};
use repo_indexer_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Json,
    Toml,
}

/// Load the backend config from an in-memory JSON document.
///
/// Precedence (highest wins):
/// - env overrides (`BackendEnv`)
/// - config JSON
/// - defaults (`BackendConfig::default()`)
pub fn load_backend_config_from_sources(
    config_json: Option<&str>,
    env: &BackendEnv,
) -> Result<ValidatedBackendConfig, ErrorEnvelope> {
    let config = match config_json {
        None => BackendConfig::default(),
        Some(input) => parse_config_unvalidated(input, ConfigFormat::Json)?,
    };

    // env is applied last and also validates/normalizes the resulting config.
    apply_env_overrides(config, env)
}

/// Load the backend config from an optional file path.
pub fn load_backend_config_from_path(
    config_path: Option<&Path>,
    env: &BackendEnv,
) -> Result<ValidatedBackendConfig, ErrorEnvelope> {
    let config = match config_path {
        None => BackendConfig::default(),
        Some(path) => {
            let format = detect_config_format(path)?;
            let config_text = read_config_file(path)?;
            parse_config_unvalidated(&config_text, format)?
        },
    };

    apply_env_overrides(config, env)
}

/// Load the backend config from std env and an optional file path.
pub fn load_backend_config_std_env(
    config_path: Option<&Path>,
) -> Result<(ValidatedBackendConfig, BackendEnv), ErrorEnvelope> {
    let env = BackendEnv::from_std_env().map_err(ErrorEnvelope::from)?;
    let config = load_backend_config_from_path(config_path, &env)?;
    tracing::debug!(
        embedding = %config.embedding.provider,
        vector_store = %config.vector_store.provider,
        from_file = config_path.is_some(),
        "backend config loaded"
    );
    Ok((config, env))
}

/// Serialize the config as deterministic pretty JSON (with trailing newline).
pub fn to_pretty_json(config: &BackendConfig) -> Result<String, ErrorEnvelope> {
    let mut output = serde_json::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            format!("failed to serialize config: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    output.push('\n');
    Ok(output)
}

/// Serialize the config as deterministic pretty TOML (with trailing newline).
pub fn to_pretty_toml(config: &BackendConfig) -> Result<String, ErrorEnvelope> {
    let mut output = toml::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::new("config", "serialize_toml"),
            format!("failed to serialize config TOML: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    output.push('\n');
    Ok(output)
}

fn parse_config_unvalidated(
    input: &str,
    format: ConfigFormat,
) -> Result<BackendConfig, ErrorEnvelope> {
    match format {
        ConfigFormat::Json => serde_json::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_json"),
                format!("invalid config JSON: {error}"),
            )
            .with_metadata("source", "config")
        }),
        ConfigFormat::Toml => toml::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_toml"),
                format!("invalid config TOML: {error}"),
            )
            .with_metadata("source", "config")
        }),
    }
}

fn read_config_file(path: &Path) -> Result<String, ErrorEnvelope> {
    std::fs::read_to_string(path).map_err(|error| {
        let code = match error.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::new("config", "config_file_not_found"),
            std::io::ErrorKind::PermissionDenied => {
                ErrorCode::new("config", "config_file_permission_denied")
            },
            _ => ErrorCode::new("config", "config_file_io"),
        };

        ErrorEnvelope::expected(code, format!("failed to read config file: {error}"))
            .with_metadata("path", path.to_string_lossy().to_string())
    })
}

fn detect_config_format(path: &Path) -> Result<ConfigFormat, ErrorEnvelope> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        None | Some("json") => Ok(ConfigFormat::Json),
        Some("toml") => Ok(ConfigFormat::Toml),
        Some(other) => Err(ErrorEnvelope::expected(
            ErrorCode::new("config", "unsupported_format"),
            "unsupported config format; use .json or .toml",
        )
        .with_metadata("extension", other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EmbeddingProviderKind, VectorStoreProviderKind};

    fn memory_env() -> BackendEnv {
        BackendEnv {
            vector_store_provider: Some(VectorStoreProviderKind::Memory),
            ..BackendEnv::default()
        }
    }

    #[test]
    fn env_wins_over_file() -> Result<(), Box<dyn std::error::Error>> {
        let config_json = r#"{
          "version": 1,
          "chunking": { "chunkSize": 80, "overlap": 10 },
          "embedding": { "provider": "openai" }
        }"#;

        let env = BackendEnv {
            chunk_size: Some(60),
            embedding_provider: Some(EmbeddingProviderKind::Hash),
            ..memory_env()
        };

        let config = load_backend_config_from_sources(Some(config_json), &env)?;
        assert_eq!(config.chunking.chunk_size, 60);
        assert_eq!(config.chunking.overlap, 10);
        assert_eq!(config.embedding.provider, EmbeddingProviderKind::Hash);
        Ok(())
    }

    #[test]
    fn serialization_is_deterministic() -> Result<(), Box<dyn std::error::Error>> {
        let config = load_backend_config_from_sources(None, &memory_env())?;
        let first = to_pretty_json(&config)?;
        let second = to_pretty_json(&config)?;
        assert_eq!(first, second);

        let toml = to_pretty_toml(&config)?;
        assert!(toml.contains("indexName = \"rabbit-stack-embeddings-v1\""));
        Ok(())
    }

    #[test]
    fn invalid_config_value_overridden_by_valid_env_succeeds()
    -> Result<(), Box<dyn std::error::Error>> {
        // overlap 100 >= chunkSize 100 is rejected unless env fixes it first.
        let config_json = r#"{
          "version": 1,
          "chunking": { "overlap": 100 }
        }"#;

        let env = BackendEnv {
            chunk_overlap: Some(5),
            ..memory_env()
        };

        let config = load_backend_config_from_sources(Some(config_json), &env)?;
        assert_eq!(config.chunking_options().overlap(), 5);
        Ok(())
    }

    #[test]
    fn malformed_file_reports_source() -> Result<(), Box<dyn std::error::Error>> {
        let error = load_backend_config_from_sources(Some(r#"{ "core": { "timeoutMs": }"#), &memory_env())
            .err()
            .ok_or_else(|| std::io::Error::other("expected parse error"))?;
        assert_eq!(error.code, ErrorCode::new("config", "invalid_json"));
        assert_eq!(
            error.metadata.get("source").map(String::as_str),
            Some("config")
        );
        Ok(())
    }

    #[test]
    fn unsupported_extension_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let error = load_backend_config_from_path(Some(Path::new("rix.yaml")), &memory_env())
            .err()
            .ok_or_else(|| std::io::Error::other("expected format error"))?;
        assert_eq!(error.code, ErrorCode::new("config", "unsupported_format"));
        Ok(())
    }

    #[test]
    fn missing_file_is_not_found() -> Result<(), Box<dyn std::error::Error>> {
        let path = std::env::temp_dir().join("rix-config-does-not-exist.toml");
        let error = load_backend_config_from_path(Some(&path), &memory_env())
            .err()
            .ok_or_else(|| std::io::Error::other("expected io error"))?;
        assert_eq!(error.code, ErrorCode::new("config", "config_file_not_found"));
        Ok(())
    }
}

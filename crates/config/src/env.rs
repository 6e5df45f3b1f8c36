//! Environment variable parsing and env-to-config merging.
//!
//! This module keeps env parsing:
//! - strict (invalid values fail fast)
//! - safe (secret values are redacted in error metadata)
//!
//! Secrets are only ever read from the environment; they never round-trip
//! through a config file.

use crate::schema::{
    BackendConfig, EmbeddingProviderKind, ValidatedBackendConfig, VectorStoreProviderKind,
};
use repo_indexer_shared::{ErrorCode, ErrorEnvelope, REDACTED, SecretString, is_secret_key};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use url::Url;

/// Env var: embedding provider (`gemini`, `openai`, `hash`).
pub const ENV_EMBEDDING_PROVIDER: &str = "RIX_EMBEDDING_PROVIDER";
/// Env var: embedding model override.
pub const ENV_EMBEDDING_MODEL: &str = "RIX_EMBEDDING_MODEL";
/// Env var: embedding base URL.
pub const ENV_EMBEDDING_BASE_URL: &str = "RIX_EMBEDDING_BASE_URL";
/// Env var: embedding dimension override.
pub const ENV_EMBEDDING_DIMENSION: &str = "RIX_EMBEDDING_DIMENSION";
/// Env var: embedding API key (secret).
pub const ENV_EMBEDDING_API_KEY: &str = "RIX_EMBEDDING_API_KEY";
/// Env var: Gemini API key fallback (secret).
pub const ENV_GEMINI_API_KEY: &str = "GOOGLE_GENERATIVE_AI_API_KEY";
/// Env var: `OpenAI` API key fallback (secret).
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Env var: vector store provider (`pinecone`, `memory`).
pub const ENV_VECTOR_STORE_PROVIDER: &str = "RIX_VECTOR_STORE_PROVIDER";
/// Env var: vector index name.
pub const ENV_VECTOR_STORE_INDEX_NAME: &str = "RIX_VECTOR_STORE_INDEX_NAME";
/// Env var: vector index data-plane host.
pub const ENV_VECTOR_STORE_INDEX_HOST: &str = "RIX_VECTOR_STORE_INDEX_HOST";
/// Env var: Pinecone API key (secret).
pub const ENV_PINECONE_API_KEY: &str = "PINECONE_DB_API_KEY";

/// Env var: chunk size in lines.
pub const ENV_CHUNK_SIZE: &str = "RIX_CHUNK_SIZE";
/// Env var: chunk overlap in lines.
pub const ENV_CHUNK_OVERLAP: &str = "RIX_CHUNK_OVERLAP";

/// Env var: GitHub API root.
pub const ENV_GITHUB_API_BASE_URL: &str = "RIX_GITHUB_API_BASE_URL";
/// Env var: static GitHub token used without a credential store (secret).
pub const ENV_GITHUB_TOKEN: &str = "RIX_GITHUB_TOKEN";

/// Env var: SQLite step store path.
pub const ENV_STEP_STORE_PATH: &str = "RIX_STEP_STORE_PATH";
/// Env var: SQLite credential store path.
pub const ENV_CREDENTIAL_STORE_PATH: &str = "RIX_CREDENTIAL_STORE_PATH";

/// Every variable read by [`BackendEnv::from_std_env`].
pub const ENV_VARS: [&str; 17] = [
    ENV_EMBEDDING_PROVIDER,
    ENV_EMBEDDING_MODEL,
    ENV_EMBEDDING_BASE_URL,
    ENV_EMBEDDING_DIMENSION,
    ENV_EMBEDDING_API_KEY,
    ENV_GEMINI_API_KEY,
    ENV_OPENAI_API_KEY,
    ENV_VECTOR_STORE_PROVIDER,
    ENV_VECTOR_STORE_INDEX_NAME,
    ENV_VECTOR_STORE_INDEX_HOST,
    ENV_PINECONE_API_KEY,
    ENV_CHUNK_SIZE,
    ENV_CHUNK_OVERLAP,
    ENV_GITHUB_API_BASE_URL,
    ENV_GITHUB_TOKEN,
    ENV_STEP_STORE_PATH,
    ENV_CREDENTIAL_STORE_PATH,
];

/// Parsed env overrides and secrets.
#[derive(Debug, Clone, Default)]
pub struct BackendEnv {
    /// Override for `embedding.provider`.
    pub embedding_provider: Option<EmbeddingProviderKind>,
    /// Override for `embedding.model`.
    pub embedding_model: Option<Box<str>>,
    /// Override for `embedding.baseUrl`.
    pub embedding_base_url: Option<Box<str>>,
    /// Override for `embedding.dimension`.
    pub embedding_dimension: Option<u32>,
    /// Secret: provider-neutral embedding API key.
    pub embedding_api_key: Option<SecretString>,
    /// Secret: Gemini API key fallback.
    pub gemini_api_key: Option<SecretString>,
    /// Secret: `OpenAI` API key fallback.
    pub openai_api_key: Option<SecretString>,

    /// Override for `vectorStore.provider`.
    pub vector_store_provider: Option<VectorStoreProviderKind>,
    /// Override for `vectorStore.indexName`.
    pub vector_store_index_name: Option<Box<str>>,
    /// Override for `vectorStore.indexHost`.
    pub vector_store_index_host: Option<Box<str>>,
    /// Secret: Pinecone API key.
    pub pinecone_api_key: Option<SecretString>,

    /// Override for `chunking.chunkSize`.
    pub chunk_size: Option<u32>,
    /// Override for `chunking.overlap`.
    pub chunk_overlap: Option<u32>,

    /// Override for `github.apiBaseUrl`.
    pub github_api_base_url: Option<Box<str>>,
    /// Secret: static GitHub token.
    pub github_token: Option<SecretString>,

    /// Override for `storage.stepStorePath`.
    pub step_store_path: Option<PathBuf>,
    /// Override for `storage.credentialStorePath`.
    pub credential_store_path: Option<PathBuf>,
}

impl BackendEnv {
    /// Parse env overrides from a key/value map (useful for tests and fixtures).
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, EnvParseError> {
        Ok(Self {
            embedding_provider: parse_optional_enum(
                map,
                ENV_EMBEDDING_PROVIDER,
                EmbeddingProviderKind::parse,
            )?,
            embedding_model: parse_optional_trimmed_string(map, ENV_EMBEDDING_MODEL)?,
            embedding_base_url: parse_optional_url_string(map, ENV_EMBEDDING_BASE_URL)?,
            embedding_dimension: parse_optional_u32(map, ENV_EMBEDDING_DIMENSION)?,
            embedding_api_key: parse_optional_secret(map, ENV_EMBEDDING_API_KEY)?,
            gemini_api_key: parse_optional_secret(map, ENV_GEMINI_API_KEY)?,
            openai_api_key: parse_optional_secret(map, ENV_OPENAI_API_KEY)?,
            vector_store_provider: parse_optional_enum(
                map,
                ENV_VECTOR_STORE_PROVIDER,
                VectorStoreProviderKind::parse,
            )?,
            vector_store_index_name: parse_optional_trimmed_string(
                map,
                ENV_VECTOR_STORE_INDEX_NAME,
            )?,
            vector_store_index_host: parse_optional_url_string(map, ENV_VECTOR_STORE_INDEX_HOST)?,
            pinecone_api_key: parse_optional_secret(map, ENV_PINECONE_API_KEY)?,
            chunk_size: parse_optional_u32(map, ENV_CHUNK_SIZE)?,
            chunk_overlap: parse_optional_u32(map, ENV_CHUNK_OVERLAP)?,
            github_api_base_url: parse_optional_url_string(map, ENV_GITHUB_API_BASE_URL)?,
            github_token: parse_optional_secret(map, ENV_GITHUB_TOKEN)?,
            step_store_path: parse_optional_path(map, ENV_STEP_STORE_PATH)?,
            credential_store_path: parse_optional_path(map, ENV_CREDENTIAL_STORE_PATH)?,
        })
    }

    /// Parse env overrides from the current process environment.
    pub fn from_std_env() -> Result<Self, EnvParseError> {
        let mut map = BTreeMap::new();
        for name in ENV_VARS {
            if let Ok(value) = std::env::var(name) {
                map.insert(name.to_string(), value);
            }
        }

        Self::from_map(&map)
    }

    /// API key for the selected embedding provider.
    ///
    /// `RIX_EMBEDDING_API_KEY` wins; otherwise the provider's conventional
    /// variable is used. The `hash` provider never needs one.
    #[must_use]
    pub fn embedding_api_key_for(&self, provider: EmbeddingProviderKind) -> Option<&SecretString> {
        let fallback = match provider {
            EmbeddingProviderKind::Gemini => self.gemini_api_key.as_ref(),
            EmbeddingProviderKind::OpenAi => self.openai_api_key.as_ref(),
            EmbeddingProviderKind::Hash => return None,
        };
        self.embedding_api_key.as_ref().or(fallback)
    }
}

/// Apply env overrides to a base config (env wins over file/default values).
pub fn apply_env_overrides(
    base: BackendConfig,
    env: &BackendEnv,
) -> Result<ValidatedBackendConfig, ErrorEnvelope> {
    let mut config = base;

    set_copy(&mut config.embedding.provider, env.embedding_provider);
    set_opt_box_str(&mut config.embedding.model, env.embedding_model.as_deref());
    set_opt_box_str(
        &mut config.embedding.base_url,
        env.embedding_base_url.as_deref(),
    );
    if env.embedding_dimension.is_some() {
        config.embedding.dimension = env.embedding_dimension;
    }

    set_copy(&mut config.vector_store.provider, env.vector_store_provider);
    if let Some(name) = env.vector_store_index_name.as_deref() {
        config.vector_store.index_name = name.into();
    }
    set_opt_box_str(
        &mut config.vector_store.index_host,
        env.vector_store_index_host.as_deref(),
    );

    set_copy(&mut config.chunking.chunk_size, env.chunk_size);
    set_copy(&mut config.chunking.overlap, env.chunk_overlap);

    if let Some(url) = env.github_api_base_url.as_deref() {
        config.github.api_base_url = url.into();
    }

    if env.step_store_path.is_some() {
        config.storage.step_store_path.clone_from(&env.step_store_path);
    }
    if env.credential_store_path.is_some() {
        config
            .storage
            .credential_store_path
            .clone_from(&env.credential_store_path);
    }

    config.validate_and_normalize().map_err(Into::into)
}

const fn set_copy<T: Copy>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

fn set_opt_box_str(field: &mut Option<Box<str>>, value: Option<&str>) {
    if let Some(value) = value {
        *field = Some(value.into());
    }
}

/// Validation failures when parsing env variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvParseError {
    /// An env var was present but empty after trimming.
    EmptyValue {
        /// Env var name.
        var: &'static str,
    },
    /// A secret env var was present but empty after trimming.
    EmptySecret {
        /// Env var name.
        var: &'static str,
    },
    /// Integer env var had an invalid value.
    InvalidInt {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// URL env var had an invalid value.
    InvalidUrl {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// Enum env var had an invalid value.
    InvalidEnum {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
}

impl EnvParseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyValue { .. } | Self::EmptySecret { .. } => {
                ErrorCode::new("config", "empty_env_var")
            },
            Self::InvalidInt { .. } => ErrorCode::new("config", "invalid_env_int"),
            Self::InvalidUrl { .. } => ErrorCode::new("config", "invalid_env_url"),
            Self::InvalidEnum { .. } => ErrorCode::new("config", "invalid_env_enum"),
        }
    }
}

impl fmt::Display for EnvParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyValue { var } | Self::EmptySecret { var } => {
                write!(formatter, "{var} must be non-empty")
            },
            Self::InvalidInt { var, .. } => write!(formatter, "{var} must be an integer"),
            Self::InvalidUrl { var, .. } => write!(formatter, "{var} must be a valid URL"),
            Self::InvalidEnum { var, .. } => write!(formatter, "{var} has an unsupported value"),
        }
    }
}

impl std::error::Error for EnvParseError {}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let envelope = Self::expected(code, message);

        match error {
            EnvParseError::EmptyValue { var } | EnvParseError::EmptySecret { var } => {
                envelope.with_metadata("env_var", var)
            },
            EnvParseError::InvalidInt { var, value }
            | EnvParseError::InvalidUrl { var, value }
            | EnvParseError::InvalidEnum { var, value } => envelope
                .with_metadata("env_var", var)
                .with_metadata("value", redact_value(var, &value)),
        }
    }
}

fn parse_optional_trimmed_string(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Box<str>>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }

    Ok(Some(trimmed.into()))
}

fn parse_optional_path(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<PathBuf>, EnvParseError> {
    Ok(parse_optional_trimmed_string(map, var)?.map(|value| PathBuf::from(&*value)))
}

fn parse_optional_secret(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<SecretString>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptySecret { var });
    }

    Ok(Some(SecretString::new(trimmed)))
}

fn parse_optional_u32(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<u32>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }

    trimmed
        .parse::<u32>()
        .map(Some)
        .map_err(|_| EnvParseError::InvalidInt {
            var,
            value: raw.clone(),
        })
}

fn parse_optional_enum<T>(
    map: &BTreeMap<String, String>,
    var: &'static str,
    parse: fn(&str) -> Option<T>,
) -> Result<Option<T>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }

    parse(raw).map(Some).ok_or_else(|| EnvParseError::InvalidEnum {
        var,
        value: raw.clone(),
    })
}

fn parse_optional_url_string(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Box<str>>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }

    let parsed = Url::parse(trimmed).map_err(|_| EnvParseError::InvalidUrl {
        var,
        value: raw.clone(),
    })?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(EnvParseError::InvalidUrl {
            var,
            value: raw.clone(),
        });
    }

    Ok(Some(trimmed.into()))
}

fn redact_value(var: &str, value: &str) -> String {
    if is_secret_key(var) {
        REDACTED.to_string()
    } else {
        value.to_string()
    }
}

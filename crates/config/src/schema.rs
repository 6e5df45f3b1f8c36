//! Backend configuration schema, defaults, validation, and normalization.
//!
//! - Deserialization uses `serde` (JSON or TOML).
//! - Validation is manual and returns typed errors mapped to `ErrorEnvelope`.
//! - Normalization trims strings and sorts list fields.

use repo_indexer_domain::{ChunkingError, ChunkingOptions};
use repo_indexer_shared::{BoundedU32, BoundedU64, ErrorCode, ErrorEnvelope, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use url::Url;

/// Strips credentials from a URL before it lands in an error message.
fn sanitize_url_for_error(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            if parsed.password().is_some() || !parsed.username().is_empty() {
                if parsed.set_username("").is_err() {
                    return "[invalid url: invalid username]".to_string();
                }
                if parsed.set_password(None).is_err() {
                    return "[invalid url: invalid password]".to_string();
                }
            }
            parsed.to_string()
        },
        Err(error) => format!("[invalid url: {error}]"),
    }
}

/// Current supported configuration schema version.
pub const CURRENT_CONFIG_VERSION: u32 = 1;

const CORE_TIMEOUT_MIN_MS: u64 = 1_000;
const CORE_TIMEOUT_MAX_MS: u64 = 600_000;

const RETRY_MAX_ATTEMPTS_MIN: u32 = 1;
const RETRY_MAX_ATTEMPTS_MAX: u32 = 10;
const RETRY_BASE_DELAY_MIN_MS: u64 = 1;
const RETRY_BASE_DELAY_MAX_MS: u64 = 60_000;
const RETRY_MAX_DELAY_MIN_MS: u64 = 1;
const RETRY_MAX_DELAY_MAX_MS: u64 = 600_000;
const RETRY_JITTER_RATIO_PCT_MIN: u32 = 0;
const RETRY_JITTER_RATIO_PCT_MAX: u32 = 100;

const EMBEDDING_TIMEOUT_MIN_MS: u64 = 1_000;
const EMBEDDING_TIMEOUT_MAX_MS: u64 = 1_200_000;
const EMBEDDING_DIMENSION_MIN: u32 = 1;
const EMBEDDING_DIMENSION_MAX: u32 = 65_536;

const VECTOR_STORE_TIMEOUT_MIN_MS: u64 = 1_000;
const VECTOR_STORE_TIMEOUT_MAX_MS: u64 = 1_200_000;

const GITHUB_MAX_FILE_SIZE_MIN_BYTES: u64 = 1;
const GITHUB_MAX_FILE_SIZE_MAX_BYTES: u64 = 10_000_000;
const GITHUB_FETCH_CONCURRENCY_MIN: u32 = 1;
const GITHUB_FETCH_CONCURRENCY_MAX: u32 = 32;
const GITHUB_EXCLUDED_EXTENSIONS_MAX: usize = 256;

/// Default Gemini embedding model.
pub const DEFAULT_GEMINI_MODEL: &str = "text-embedding-004";
/// Default `OpenAI` embedding model.
pub const DEFAULT_OPENAI_MODEL: &str = "text-embedding-3-small";
/// Default dimension of the offline hash embedder.
pub const DEFAULT_HASH_DIMENSION: u32 = 64;
/// Default vector index name.
pub const DEFAULT_INDEX_NAME: &str = "rabbit-stack-embeddings-v1";
/// Default GitHub REST API root.
pub const DEFAULT_GITHUB_API_BASE_URL: &str = "https://api.github.com";

/// Top-level backend configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct BackendConfig {
    /// Schema version for forward-compatible migrations.
    pub version: u32,
    /// Core runtime settings.
    pub core: CoreConfig,
    /// Line-window chunking settings.
    pub chunking: ChunkingConfig,
    /// Embedding provider settings.
    pub embedding: EmbeddingConfig,
    /// Vector store settings.
    pub vector_store: VectorStoreConfig,
    /// GitHub file fetch settings.
    pub github: GithubConfig,
    /// Local persistence settings.
    pub storage: StorageConfig,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_CONFIG_VERSION,
            core: CoreConfig::default(),
            chunking: ChunkingConfig::default(),
            embedding: EmbeddingConfig::default(),
            vector_store: VectorStoreConfig::default(),
            github: GithubConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl BackendConfig {
    /// Validate and normalize the config.
    pub fn validate_and_normalize(mut self) -> Result<ValidatedBackendConfig, ConfigSchemaError> {
        self.validate_version()?;

        self.core.validate()?;
        self.embedding.normalize();
        self.embedding.validate()?;
        self.vector_store.normalize();
        self.vector_store.validate()?;
        self.github.normalize_and_validate()?;
        self.storage.normalize();

        let limits = ConfigLimits::new(&self)?;
        Ok(ValidatedBackendConfig { raw: self, limits })
    }

    const fn validate_version(&self) -> Result<(), ConfigSchemaError> {
        if self.version != CURRENT_CONFIG_VERSION {
            return Err(ConfigSchemaError::UnsupportedVersion {
                found: self.version,
                supported: CURRENT_CONFIG_VERSION,
            });
        }
        Ok(())
    }
}

/// Validated config wrapper carrying bounded values.
#[derive(Debug, Clone)]
pub struct ValidatedBackendConfig {
    raw: BackendConfig,
    limits: ConfigLimits,
}

impl ValidatedBackendConfig {
    /// Access validated bounds.
    #[must_use]
    pub const fn limits(&self) -> &ConfigLimits {
        &self.limits
    }

    /// Chunker parameters; `overlap < chunk_size` is already guaranteed.
    #[must_use]
    pub const fn chunking_options(&self) -> ChunkingOptions {
        self.limits.chunking
    }

    /// Step retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        let retry = &self.raw.core.retry;
        RetryPolicy {
            max_attempts: retry.max_attempts,
            base_delay_ms: retry.base_delay_ms,
            max_delay_ms: retry.max_delay_ms,
            jitter_ratio_pct: retry.jitter_ratio_pct,
        }
    }

    /// Borrow the raw config.
    #[must_use]
    pub const fn as_ref(&self) -> &BackendConfig {
        &self.raw
    }

    /// Consume the wrapper and return the raw config.
    #[must_use]
    pub fn into_inner(self) -> BackendConfig {
        self.raw
    }
}

impl AsRef<BackendConfig> for ValidatedBackendConfig {
    fn as_ref(&self) -> &BackendConfig {
        &self.raw
    }
}

impl std::ops::Deref for ValidatedBackendConfig {
    type Target = BackendConfig;

    fn deref(&self) -> &Self::Target {
        &self.raw
    }
}

/// Validated limits derived from the config.
#[derive(Debug, Clone, Copy)]
pub struct ConfigLimits {
    /// Core timeout (ms).
    pub core_timeout_ms: BoundedU64<CORE_TIMEOUT_MIN_MS, CORE_TIMEOUT_MAX_MS>,
    /// Chunker parameters.
    pub chunking: ChunkingOptions,
    /// Largest fetched file (bytes).
    pub github_max_file_size_bytes:
        BoundedU64<GITHUB_MAX_FILE_SIZE_MIN_BYTES, GITHUB_MAX_FILE_SIZE_MAX_BYTES>,
    /// Concurrent blob downloads.
    pub github_fetch_concurrency:
        BoundedU32<GITHUB_FETCH_CONCURRENCY_MIN, GITHUB_FETCH_CONCURRENCY_MAX>,
    /// Optional embedding dimension override.
    pub embedding_dimension: Option<BoundedU32<EMBEDDING_DIMENSION_MIN, EMBEDDING_DIMENSION_MAX>>,
}

impl ConfigLimits {
    fn new(config: &BackendConfig) -> Result<Self, ConfigSchemaError> {
        Ok(Self {
            core_timeout_ms: bounded_u64(
                "core",
                "timeoutMs",
                config.core.timeout_ms,
                CORE_TIMEOUT_MIN_MS,
                CORE_TIMEOUT_MAX_MS,
            )?,
            chunking: config.chunking.to_options()?,
            github_max_file_size_bytes: bounded_u64(
                "github",
                "maxFileSizeBytes",
                config.github.max_file_size_bytes,
                GITHUB_MAX_FILE_SIZE_MIN_BYTES,
                GITHUB_MAX_FILE_SIZE_MAX_BYTES,
            )?,
            github_fetch_concurrency: bounded_u32(
                "github",
                "fetchConcurrency",
                config.github.fetch_concurrency,
                GITHUB_FETCH_CONCURRENCY_MIN,
                GITHUB_FETCH_CONCURRENCY_MAX,
            )?,
            embedding_dimension: config
                .embedding
                .dimension
                .map(|value| {
                    bounded_u32(
                        "embedding",
                        "dimension",
                        value,
                        EMBEDDING_DIMENSION_MIN,
                        EMBEDDING_DIMENSION_MAX,
                    )
                })
                .transpose()?,
        })
    }
}

/// Parse a backend config from a JSON string, applying validation and normalization.
pub fn parse_backend_config_json(input: &str) -> Result<ValidatedBackendConfig, ErrorEnvelope> {
    let config: BackendConfig = serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid config JSON: {error}"),
        )
    })?;

    config.validate_and_normalize().map_err(Into::into)
}

/// Parse a backend config from a TOML string, applying validation and normalization.
pub fn parse_backend_config_toml(input: &str) -> Result<ValidatedBackendConfig, ErrorEnvelope> {
    let config: BackendConfig = toml::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_toml"),
            format!("invalid config TOML: {error}"),
        )
    })?;

    config.validate_and_normalize().map_err(Into::into)
}

/// Core runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct CoreConfig {
    /// Overall budget (ms) for a single outbound call that has no own timeout.
    pub timeout_ms: u64,
    /// Retry policy for retriable step failures.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            retry: RetryConfig::default(),
        }
    }
}

impl CoreConfig {
    fn validate(&self) -> Result<(), ConfigSchemaError> {
        validate_timeout_ms(
            "core",
            "timeoutMs",
            self.timeout_ms,
            CORE_TIMEOUT_MIN_MS,
            CORE_TIMEOUT_MAX_MS,
        )?;
        self.retry.validate()
    }
}

/// Retry policy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct RetryConfig {
    /// Maximum attempts (including the first attempt).
    pub max_attempts: u32,
    /// Base delay for exponential backoff (ms).
    pub base_delay_ms: u64,
    /// Maximum delay cap for backoff (ms).
    pub max_delay_ms: u64,
    /// Jitter ratio as a percentage (0..=100).
    pub jitter_ratio_pct: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            base_delay_ms: policy.base_delay_ms,
            max_delay_ms: policy.max_delay_ms,
            jitter_ratio_pct: policy.jitter_ratio_pct,
        }
    }
}

impl RetryConfig {
    fn validate(&self) -> Result<(), ConfigSchemaError> {
        validate_limit_u32(
            "core.retry",
            "maxAttempts",
            self.max_attempts,
            RETRY_MAX_ATTEMPTS_MIN,
            RETRY_MAX_ATTEMPTS_MAX,
        )?;
        validate_timeout_ms(
            "core.retry",
            "baseDelayMs",
            self.base_delay_ms,
            RETRY_BASE_DELAY_MIN_MS,
            RETRY_BASE_DELAY_MAX_MS,
        )?;
        validate_timeout_ms(
            "core.retry",
            "maxDelayMs",
            self.max_delay_ms,
            RETRY_MAX_DELAY_MIN_MS,
            RETRY_MAX_DELAY_MAX_MS,
        )?;
        if self.max_delay_ms < self.base_delay_ms {
            return Err(ConfigSchemaError::LimitOutOfRange {
                section: "core.retry",
                field: "maxDelayMs",
                value: self.max_delay_ms,
                min: self.base_delay_ms,
                max: RETRY_MAX_DELAY_MAX_MS,
            });
        }
        validate_limit_u32(
            "core.retry",
            "jitterRatioPct",
            self.jitter_ratio_pct,
            RETRY_JITTER_RATIO_PCT_MIN,
            RETRY_JITTER_RATIO_PCT_MAX,
        )
    }
}

/// Line-window chunking configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ChunkingConfig {
    /// Lines per chunk.
    pub chunk_size: u32,
    /// Lines shared by consecutive chunks; must be smaller than `chunkSize`.
    pub overlap: u32,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        let options = ChunkingOptions::default();
        Self {
            chunk_size: u32::try_from(options.chunk_size()).unwrap_or(u32::MAX),
            overlap: u32::try_from(options.overlap()).unwrap_or(u32::MAX),
        }
    }
}

impl ChunkingConfig {
    fn to_options(&self) -> Result<ChunkingOptions, ConfigSchemaError> {
        let chunk_size = usize::try_from(self.chunk_size).unwrap_or(usize::MAX);
        let overlap = usize::try_from(self.overlap).unwrap_or(usize::MAX);
        ChunkingOptions::new(chunk_size, overlap).map_err(ConfigSchemaError::InvalidChunking)
    }
}

/// Embedding backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// Google Gemini `batchEmbedContents`.
    #[default]
    Gemini,
    /// `OpenAI` `/embeddings`.
    OpenAi,
    /// Deterministic offline vectors.
    Hash,
}

impl EmbeddingProviderKind {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
            Self::Hash => "hash",
        }
    }

    /// Parse a wire name, case-insensitively.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gemini" => Some(Self::Gemini),
            "openai" => Some(Self::OpenAi),
            "hash" => Some(Self::Hash),
            _ => None,
        }
    }

    /// Model used when the config leaves it unset.
    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::Gemini => DEFAULT_GEMINI_MODEL,
            Self::OpenAi => DEFAULT_OPENAI_MODEL,
            Self::Hash => "sha256",
        }
    }
}

impl fmt::Display for EmbeddingProviderKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Embedding provider configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct EmbeddingConfig {
    /// Provider to call.
    pub provider: EmbeddingProviderKind,
    /// Optional model override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<Box<str>>,
    /// Optional base URL override (http/https).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<Box<str>>,
    /// Request timeout (ms).
    pub timeout_ms: u64,
    /// Optional output dimension (`hash` uses it directly; remote providers verify it).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<u32>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::default(),
            model: None,
            base_url: None,
            timeout_ms: 60_000,
            dimension: None,
        }
    }
}

impl EmbeddingConfig {
    fn normalize(&mut self) {
        normalize_optional_trimmed(&mut self.model);
        normalize_optional_trimmed(&mut self.base_url);
    }

    fn validate(&self) -> Result<(), ConfigSchemaError> {
        validate_timeout_ms(
            "embedding",
            "timeoutMs",
            self.timeout_ms,
            EMBEDDING_TIMEOUT_MIN_MS,
            EMBEDDING_TIMEOUT_MAX_MS,
        )?;
        if let Some(base_url) = self.base_url.as_deref() {
            validate_http_url("embedding", "baseUrl", base_url)?;
        }
        Ok(())
    }

    /// Model to call, falling back to the provider default.
    #[must_use]
    pub fn effective_model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }
}

/// Vector store backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreProviderKind {
    /// Pinecone data-plane REST API.
    #[default]
    Pinecone,
    /// Process-local map; nothing persists.
    Memory,
}

impl VectorStoreProviderKind {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pinecone => "pinecone",
            Self::Memory => "memory",
        }
    }

    /// Parse a wire name, case-insensitively.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pinecone" => Some(Self::Pinecone),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

impl fmt::Display for VectorStoreProviderKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Vector store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct VectorStoreConfig {
    /// Provider to write to.
    pub provider: VectorStoreProviderKind,
    /// Index name.
    pub index_name: Box<str>,
    /// Data-plane host of the index (required for pinecone).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_host: Option<Box<str>>,
    /// Request timeout (ms).
    pub timeout_ms: u64,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            provider: VectorStoreProviderKind::default(),
            index_name: DEFAULT_INDEX_NAME.into(),
            index_host: None,
            timeout_ms: 30_000,
        }
    }
}

impl VectorStoreConfig {
    fn normalize(&mut self) {
        normalize_boxed_str(&mut self.index_name);
        normalize_optional_trimmed(&mut self.index_host);
    }

    fn validate(&self) -> Result<(), ConfigSchemaError> {
        if self.index_name.is_empty() {
            return Err(ConfigSchemaError::MissingField {
                section: "vectorStore",
                field: "indexName",
            });
        }
        validate_timeout_ms(
            "vectorStore",
            "timeoutMs",
            self.timeout_ms,
            VECTOR_STORE_TIMEOUT_MIN_MS,
            VECTOR_STORE_TIMEOUT_MAX_MS,
        )?;
        match (self.provider, self.index_host.as_deref()) {
            (_, Some(host)) => validate_http_url("vectorStore", "indexHost", host),
            (VectorStoreProviderKind::Pinecone, None) => Err(ConfigSchemaError::MissingField {
                section: "vectorStore",
                field: "indexHost",
            }),
            (VectorStoreProviderKind::Memory, None) => Ok(()),
        }
    }
}

/// GitHub file fetch configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct GithubConfig {
    /// REST API root.
    pub api_base_url: Box<str>,
    /// Files above this size are skipped.
    pub max_file_size_bytes: u64,
    /// Concurrent blob downloads.
    pub fetch_concurrency: u32,
    /// Extensions skipped on top of the built-in binary/lock list (lowercase, no dot).
    pub excluded_extensions: Vec<Box<str>>,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_GITHUB_API_BASE_URL.into(),
            max_file_size_bytes: 100_000,
            fetch_concurrency: 8,
            excluded_extensions: Vec::new(),
        }
    }
}

impl GithubConfig {
    fn normalize_and_validate(&mut self) -> Result<(), ConfigSchemaError> {
        normalize_boxed_str(&mut self.api_base_url);
        validate_http_url("github", "apiBaseUrl", &self.api_base_url)?;
        self.excluded_extensions = normalize_extensions(&self.excluded_extensions)?;
        if self.excluded_extensions.len() > GITHUB_EXCLUDED_EXTENSIONS_MAX {
            return Err(ConfigSchemaError::ListTooLarge {
                section: "github",
                field: "excludedExtensions",
                len: self.excluded_extensions.len(),
                max: GITHUB_EXCLUDED_EXTENSIONS_MAX,
            });
        }
        Ok(())
    }
}

/// Local persistence configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct StorageConfig {
    /// SQLite file for step results; in-memory when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_store_path: Option<PathBuf>,
    /// SQLite file holding the `account` table; static token when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_store_path: Option<PathBuf>,
}

impl StorageConfig {
    fn normalize(&mut self) {
        for path in [&mut self.step_store_path, &mut self.credential_store_path] {
            if path
                .as_ref()
                .is_some_and(|value| value.as_os_str().is_empty())
            {
                *path = None;
            }
        }
    }
}

/// Config validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSchemaError {
    /// The config version is not supported by this binary.
    UnsupportedVersion {
        /// Version found in the config.
        found: u32,
        /// Version supported by this crate.
        supported: u32,
    },
    /// A timeout value is out of bounds.
    TimeoutOutOfRange {
        /// Schema section (e.g. `core`).
        section: &'static str,
        /// Field name in the config file (e.g. `timeoutMs`).
        field: &'static str,
        /// Value provided (ms).
        value_ms: u64,
        /// Minimum allowed value (ms).
        min_ms: u64,
        /// Maximum allowed value (ms).
        max_ms: u64,
    },
    /// A numeric limit is out of bounds.
    LimitOutOfRange {
        /// Schema section (e.g. `github`).
        section: &'static str,
        /// Field name in the config file (e.g. `fetchConcurrency`).
        field: &'static str,
        /// Value provided.
        value: u64,
        /// Minimum allowed value.
        min: u64,
        /// Maximum allowed value.
        max: u64,
    },
    /// Chunk size or overlap is unusable.
    InvalidChunking(ChunkingError),
    /// A list field exceeds the maximum allowed size.
    ListTooLarge {
        /// Schema section.
        section: &'static str,
        /// Field name in the config file.
        field: &'static str,
        /// Number of entries after normalization/deduplication.
        len: usize,
        /// Maximum allowed number of entries.
        max: usize,
    },
    /// A file extension entry is invalid.
    InvalidExtension {
        /// Invalid extension value.
        extension: String,
    },
    /// A URL entry is invalid.
    InvalidUrl {
        /// Schema section (e.g. `embedding`).
        section: &'static str,
        /// Field name in the config file (e.g. `baseUrl`).
        field: &'static str,
        /// Invalid URL value.
        url: String,
    },
    /// A required field is absent or blank.
    MissingField {
        /// Schema section.
        section: &'static str,
        /// Field name in the config file.
        field: &'static str,
    },
}

impl ConfigSchemaError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedVersion { .. } => ErrorCode::new("config", "unsupported_version"),
            Self::TimeoutOutOfRange { .. } => ErrorCode::new("config", "invalid_timeout"),
            Self::LimitOutOfRange { .. } => ErrorCode::new("config", "invalid_limit"),
            Self::InvalidChunking(_) => ErrorCode::new("config", "invalid_chunking"),
            Self::ListTooLarge { .. } => ErrorCode::new("config", "list_too_large"),
            Self::InvalidExtension { .. } => ErrorCode::new("config", "invalid_extension"),
            Self::InvalidUrl { .. } => ErrorCode::new("config", "invalid_url"),
            Self::MissingField { .. } => ErrorCode::new("config", "missing_field"),
        }
    }
}

impl fmt::Display for ConfigSchemaError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { found, supported } => {
                write!(
                    formatter,
                    "unsupported config version: {found} (supported: {supported})"
                )
            },
            Self::TimeoutOutOfRange {
                section,
                field,
                value_ms,
                min_ms,
                max_ms,
            } => write!(
                formatter,
                "{section}.{field} must be within [{min_ms}, {max_ms}] ms (got {value_ms})"
            ),
            Self::LimitOutOfRange {
                section,
                field,
                value,
                min,
                max,
            } => write!(
                formatter,
                "{section}.{field} must be within [{min}, {max}] (got {value})"
            ),
            Self::InvalidChunking(error) => write!(formatter, "chunking: {error}"),
            Self::ListTooLarge {
                section,
                field,
                len,
                max,
            } => write!(
                formatter,
                "{section}.{field} must have at most {max} entries (got {len})"
            ),
            Self::InvalidExtension { extension } => {
                write!(formatter, "invalid extension entry: {extension}")
            },
            Self::InvalidUrl { section, field, .. } => {
                write!(formatter, "invalid URL for {section}.{field}")
            },
            Self::MissingField { section, field } => {
                write!(formatter, "{section}.{field} is required")
            },
        }
    }
}

impl std::error::Error for ConfigSchemaError {}

impl From<ConfigSchemaError> for ErrorEnvelope {
    fn from(error: ConfigSchemaError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let envelope = Self::expected(code, message);

        match error {
            ConfigSchemaError::UnsupportedVersion { found, supported } => envelope
                .with_metadata("found", found.to_string())
                .with_metadata("supported", supported.to_string()),
            ConfigSchemaError::TimeoutOutOfRange {
                section,
                field,
                value_ms,
                min_ms,
                max_ms,
            } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field)
                .with_metadata("value_ms", value_ms.to_string())
                .with_metadata("min_ms", min_ms.to_string())
                .with_metadata("max_ms", max_ms.to_string()),
            ConfigSchemaError::LimitOutOfRange {
                section,
                field,
                value,
                min,
                max,
            } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field)
                .with_metadata("value", value.to_string())
                .with_metadata("min", min.to_string())
                .with_metadata("max", max.to_string()),
            ConfigSchemaError::InvalidChunking(chunking) => {
                let envelope = envelope.with_metadata("section", "chunking");
                match chunking {
                    ChunkingError::ChunkSizeOutOfRange { chunk_size } => {
                        envelope.with_metadata("chunk_size", chunk_size.to_string())
                    },
                    ChunkingError::OverlapTooLarge {
                        chunk_size,
                        overlap,
                    } => envelope
                        .with_metadata("chunk_size", chunk_size.to_string())
                        .with_metadata("overlap", overlap.to_string()),
                }
            },
            ConfigSchemaError::ListTooLarge {
                section,
                field,
                len,
                max,
            } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field)
                .with_metadata("len", len.to_string())
                .with_metadata("max", max.to_string()),
            ConfigSchemaError::InvalidExtension { extension } => {
                envelope.with_metadata("extension", extension)
            },
            ConfigSchemaError::InvalidUrl {
                section,
                field,
                url,
            } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field)
                .with_metadata("url", sanitize_url_for_error(&url)),
            ConfigSchemaError::MissingField { section, field } => envelope
                .with_metadata("section", section)
                .with_metadata("field", field),
        }
    }
}

const fn validate_timeout_ms(
    section: &'static str,
    field: &'static str,
    value_ms: u64,
    min_ms: u64,
    max_ms: u64,
) -> Result<(), ConfigSchemaError> {
    if value_ms < min_ms || value_ms > max_ms {
        return Err(ConfigSchemaError::TimeoutOutOfRange {
            section,
            field,
            value_ms,
            min_ms,
            max_ms,
        });
    }
    Ok(())
}

fn bounded_u32<const MIN: u32, const MAX: u32>(
    section: &'static str,
    field: &'static str,
    value: u32,
    min: u32,
    max: u32,
) -> Result<BoundedU32<MIN, MAX>, ConfigSchemaError> {
    BoundedU32::try_new(value).map_err(|_| ConfigSchemaError::LimitOutOfRange {
        section,
        field,
        value: u64::from(value),
        min: u64::from(min),
        max: u64::from(max),
    })
}

fn bounded_u64<const MIN: u64, const MAX: u64>(
    section: &'static str,
    field: &'static str,
    value: u64,
    min: u64,
    max: u64,
) -> Result<BoundedU64<MIN, MAX>, ConfigSchemaError> {
    BoundedU64::try_new(value).map_err(|_| ConfigSchemaError::LimitOutOfRange {
        section,
        field,
        value,
        min,
        max,
    })
}

fn validate_http_url(
    section: &'static str,
    field: &'static str,
    value: &str,
) -> Result<(), ConfigSchemaError> {
    let parsed = Url::parse(value).map_err(|_| ConfigSchemaError::InvalidUrl {
        section,
        field,
        url: value.to_owned(),
    })?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ConfigSchemaError::InvalidUrl {
            section,
            field,
            url: value.to_owned(),
        });
    }

    Ok(())
}

fn validate_limit_u32(
    section: &'static str,
    field: &'static str,
    value: u32,
    min: u32,
    max: u32,
) -> Result<(), ConfigSchemaError> {
    if value < min || value > max {
        return Err(ConfigSchemaError::LimitOutOfRange {
            section,
            field,
            value: u64::from(value),
            min: u64::from(min),
            max: u64::from(max),
        });
    }
    Ok(())
}

fn normalize_optional_trimmed(value: &mut Option<Box<str>>) {
    let Some(raw) = value.take() else {
        return;
    };
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        *value = Some(trimmed.into());
    }
}

fn normalize_boxed_str(value: &mut Box<str>) {
    let trimmed = value.trim();
    if trimmed == value.as_ref() {
        return;
    }
    *value = trimmed.into();
}

fn normalize_extensions(input: &[Box<str>]) -> Result<Vec<Box<str>>, ConfigSchemaError> {
    let mut normalized = Vec::with_capacity(input.len());
    for ext in input {
        let trimmed = ext.trim();
        let trimmed = trimmed.strip_prefix("*.").unwrap_or(trimmed);
        let trimmed = trimmed.strip_prefix('.').unwrap_or(trimmed);
        let candidate = trimmed.to_ascii_lowercase();

        if candidate.is_empty() || !candidate.chars().all(|ch| ch.is_ascii_alphanumeric()) {
            return Err(ConfigSchemaError::InvalidExtension {
                extension: trimmed.to_owned(),
            });
        }

        normalized.push(candidate.into_boxed_str());
    }

    normalized.sort_unstable();
    normalized.dedup();
    Ok(normalized)
}

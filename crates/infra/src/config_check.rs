//! Config loading helpers for CLI surfaces.

use crate::InfraResult;
use repo_indexer_config::{
    BackendEnv, ValidatedBackendConfig, load_backend_config_from_path, to_pretty_json,
    to_pretty_toml,
};
use repo_indexer_shared::ErrorEnvelope;
use std::collections::BTreeMap;
use std::path::Path;

/// Serialization of the effective config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigFormat {
    /// Pretty JSON.
    #[default]
    Json,
    /// Pretty TOML.
    Toml,
}

/// Load and validate the effective config from an env map and optional file.
pub fn load_effective_config(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
) -> InfraResult<(ValidatedBackendConfig, BackendEnv)> {
    let env = BackendEnv::from_map(env).map_err(ErrorEnvelope::from)?;
    let config = load_backend_config_from_path(config_path, &env)?;
    Ok((config, env))
}

/// Load and validate the effective config, returning it rendered deterministically.
pub fn render_effective_config(
    env: &BTreeMap<String, String>,
    config_path: Option<&Path>,
    format: ConfigFormat,
) -> InfraResult<String> {
    let (config, _) = load_effective_config(env, config_path)?;
    match format {
        ConfigFormat::Json => to_pretty_json(&config),
        ConfigFormat::Toml => to_pretty_toml(&config),
    }
}

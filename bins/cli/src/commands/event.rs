//! Event command handler: run the job for a `repository.connected` payload.

use crate::commands::index::{IndexCommandInput, run_index};
use crate::error::CliError;
use crate::format::OutputMode;
use crate::{CliOutput, format_error_output};
use repo_indexer_config::parse_repository_connected_event_json;
use std::collections::BTreeMap;

/// Parse `payload` (bare event or envelope) and index the repository it names.
pub fn run_event(
    mode: OutputMode,
    env: &BTreeMap<String, String>,
    payload: &str,
    input: IndexCommandInput<'_>,
) -> Result<CliOutput, CliError> {
    let event = match parse_repository_connected_event_json(payload) {
        Ok(event) => event,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };
    tracing::debug!(
        owner = event.owner.as_deref().unwrap_or_default(),
        repo = event.repo.as_deref().unwrap_or_default(),
        "repository.connected received"
    );
    run_index(mode, env, &event, input)
}

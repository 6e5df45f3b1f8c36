//! Structured event logging selected from the environment.

use repo_indexer_adapters::log_sink::{LogSink, StderrLogSink};
use repo_indexer_adapters::logger::JsonLogger;
use repo_indexer_ports::{LogLevel, LoggerPort, log_fields};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Enables JSON event logs when set to `json`.
pub const LOG_FORMAT_ENV: &str = "RIX_LOG_FORMAT";
/// Minimum event level (`debug`, `info`, `warn`, `error`).
pub const LOG_LEVEL_ENV: &str = "RIX_LOG_LEVEL";

/// Event log settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservabilitySettings {
    /// Emit JSON event lines.
    pub json: bool,
    /// Minimum level emitted.
    pub min_level: LogLevel,
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        Self {
            json: false,
            min_level: LogLevel::Info,
        }
    }
}

impl ObservabilitySettings {
    /// Read settings from a key/value map.
    #[must_use]
    pub fn from_map(env: &BTreeMap<String, String>) -> Self {
        let json = env
            .get(LOG_FORMAT_ENV)
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("json"));
        Self {
            json,
            min_level: parse_log_level(env.get(LOG_LEVEL_ENV).map(String::as_str)),
        }
    }

    /// Read settings from the process environment.
    #[must_use]
    pub fn from_std_env() -> Self {
        let env = [LOG_FORMAT_ENV, LOG_LEVEL_ENV]
            .into_iter()
            .filter_map(|key| Some((key.to_owned(), std::env::var(key).ok()?)))
            .collect();
        Self::from_map(&env)
    }

    /// Force JSON output (the CLI's `--log-format json`).
    #[must_use]
    pub const fn with_json(mut self, json: bool) -> Self {
        self.json = self.json || json;
        self
    }
}

/// Parse a level name; unknown or missing names mean `info`.
#[must_use]
pub fn parse_log_level(value: Option<&str>) -> LogLevel {
    match value.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
        Some("debug") => LogLevel::Debug,
        Some("warn") => LogLevel::Warn,
        Some("error") => LogLevel::Error,
        _ => LogLevel::Info,
    }
}

/// Event logger for the settings; `None` when JSON output is off.
#[must_use]
pub fn build_logger(settings: ObservabilitySettings) -> Option<Arc<dyn LoggerPort>> {
    build_logger_with_sink(settings, Arc::new(StderrLogSink))
}

/// Same as [`build_logger`] with an explicit sink.
#[must_use]
pub fn build_logger_with_sink(
    settings: ObservabilitySettings,
    sink: Arc<dyn LogSink>,
) -> Option<Arc<dyn LoggerPort>> {
    if !settings.json {
        return None;
    }
    let logger = JsonLogger::new(sink)
        .with_min_level(settings.min_level)
        .with_base_fields(log_fields([("service", "repo-indexer".into())]));
    Some(Arc::new(logger))
}

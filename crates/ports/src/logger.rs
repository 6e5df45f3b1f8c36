//! Structured logging boundary contract.

use repo_indexer_shared::ErrorEnvelope;
use std::collections::BTreeMap;

/// Log level, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Debug.
    Debug,
    /// Info.
    Info,
    /// Warn.
    Warn,
    /// Error.
    Error,
}

impl LogLevel {
    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Additional event fields.
pub type LogFields = BTreeMap<Box<str>, serde_json::Value>;

/// Build [`LogFields`] from key/value pairs.
pub fn log_fields<const N: usize>(pairs: [(&str, serde_json::Value); N]) -> LogFields {
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value))
        .collect()
}

/// Structured log event.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    /// Stable dotted event name, e.g. `index.batch_upserted`.
    pub event: Box<str>,
    /// Severity.
    pub level: LogLevel,
    /// Human-readable message (safe, redacted).
    pub message: Box<str>,
    /// Optional structured fields.
    pub fields: Option<LogFields>,
    /// Optional error payload.
    pub error: Option<serde_json::Value>,
}

/// Boundary contract for structured logging.
pub trait LoggerPort: Send + Sync {
    /// Emit a structured event.
    fn log(&self, event: LogEvent);

    /// Create a child logger with base fields applied to every event.
    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort>;

    /// Convenience: debug event.
    fn debug(&self, event: &str, message: &str, fields: Option<LogFields>) {
        self.log(plain(LogLevel::Debug, event, message, fields));
    }

    /// Convenience: info event.
    fn info(&self, event: &str, message: &str, fields: Option<LogFields>) {
        self.log(plain(LogLevel::Info, event, message, fields));
    }

    /// Convenience: warn event.
    fn warn(&self, event: &str, message: &str, fields: Option<LogFields>) {
        self.log(plain(LogLevel::Warn, event, message, fields));
    }

    /// Convenience: error event.
    fn error(&self, event: &str, message: &str, fields: Option<LogFields>) {
        self.log(plain(LogLevel::Error, event, message, fields));
    }

    /// Emit an event carrying a serialized error envelope.
    fn failure(
        &self,
        level: LogLevel,
        event: &str,
        message: &str,
        error: &ErrorEnvelope,
        fields: Option<LogFields>,
    ) {
        let mut entry = plain(level, event, message, fields);
        entry.error = serde_json::to_value(error).ok();
        self.log(entry);
    }
}

fn plain(level: LogLevel, event: &str, message: &str, fields: Option<LogFields>) -> LogEvent {
    LogEvent {
        event: event.into(),
        level,
        message: message.into(),
        fields,
        error: None,
    }
}

/// Logger that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl LoggerPort for NoopLogger {
    fn log(&self, _event: LogEvent) {}

    fn child(&self, _fields: LogFields) -> Box<dyn LoggerPort> {
        Box::new(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repo_indexer_shared::{ErrorClass, ErrorCode};
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct Capture(Arc<Mutex<Vec<LogEvent>>>);

    impl LoggerPort for Capture {
        fn log(&self, event: LogEvent) {
            self.0.lock().expect("lock").push(event);
        }

        fn child(&self, _fields: LogFields) -> Box<dyn LoggerPort> {
            Box::new(self.clone())
        }
    }

    #[test]
    fn helpers_set_level_and_error_payload() {
        let capture = Capture::default();
        capture.info("index.run_started", "starting", Some(log_fields([("owner", "octocat".into())])));
        let error = ErrorEnvelope::unexpected(
            ErrorCode::dependency_unavailable(),
            "502",
            ErrorClass::Retriable,
        );
        capture.failure(LogLevel::Error, "index.step_failed", "failed", &error, None);

        let events = capture.0.lock().expect("lock");
        assert_eq!(events.len(), 2);
        let first = events.first().expect("first event");
        assert_eq!(first.level, LogLevel::Info);
        assert_eq!(
            first.fields.as_ref().and_then(|fields| fields.get("owner")),
            Some(&serde_json::json!("octocat"))
        );
        let second = events.get(1).expect("second event");
        assert_eq!(second.level, LogLevel::Error);
        assert_eq!(
            second.error.as_ref().and_then(|error| error.get("class")),
            Some(&serde_json::json!("retriable"))
        );
    }

    #[test]
    fn levels_are_ordered_by_severity() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert_eq!(LogLevel::Warn.as_str(), "warn");
    }
}

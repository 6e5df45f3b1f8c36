//! Structured JSON logger adapter.
//!
//! One line per event: `timestampMs`, `level`, `event`, `message`, and the
//! optional `fields` and `error` objects. Values under secret-looking keys
//! are replaced with `[REDACTED]` at any depth.

use crate::log_sink::LogSink;
use repo_indexer_ports::{LogEvent, LogFields, LogLevel, LoggerPort};
use repo_indexer_shared::{REDACTED, is_secret_key};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

const SERIALIZE_FAILED_LINE: &str = "{\"timestampMs\":0,\"level\":\"error\",\"event\":\"logger.serialize_failed\",\"message\":\"log serialization failed\"}\n";

/// JSON logger emitting one line per event.
#[derive(Clone)]
pub struct JsonLogger {
    sink: Arc<dyn LogSink>,
    base_fields: LogFields,
    min_level: LogLevel,
}

impl JsonLogger {
    /// Logger writing to `sink` at `info` and above.
    #[must_use]
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            base_fields: LogFields::new(),
            min_level: LogLevel::Info,
        }
    }

    /// Fields merged into every event.
    #[must_use]
    pub fn with_base_fields(mut self, fields: LogFields) -> Self {
        self.base_fields = fields;
        self
    }

    /// Drop events below `level`.
    #[must_use]
    pub const fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    fn render(&self, event: LogEvent) -> String {
        let mut fields = self.base_fields.clone();
        fields.extend(event.fields.unwrap_or_default());

        let mut payload = Map::new();
        payload.insert("timestampMs".to_owned(), Value::from(now_epoch_ms()));
        payload.insert("level".to_owned(), Value::from(event.level.as_str()));
        payload.insert("event".to_owned(), Value::from(&*event.event));
        payload.insert("message".to_owned(), Value::from(&*event.message));
        if !fields.is_empty() {
            let mut object: Value = fields
                .into_iter()
                .map(|(key, value)| (key.into_string(), value))
                .collect::<Map<_, _>>()
                .into();
            redact(&mut object);
            payload.insert("fields".to_owned(), object);
        }
        if let Some(mut error) = event.error {
            redact(&mut error);
            payload.insert("error".to_owned(), error);
        }

        serde_json::to_string(&Value::Object(payload)).map_or_else(
            |_| SERIALIZE_FAILED_LINE.to_owned(),
            |mut line| {
                line.push('\n');
                line
            },
        )
    }
}

impl LoggerPort for JsonLogger {
    fn log(&self, event: LogEvent) {
        if event.level < self.min_level {
            return;
        }
        self.sink.write_line(&self.render(event));
    }

    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort> {
        let mut merged = self.base_fields.clone();
        merged.extend(fields);
        Box::new(Self {
            sink: Arc::clone(&self.sink),
            base_fields: merged,
            min_level: self.min_level,
        })
    }
}

fn redact(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map.iter_mut() {
                if is_secret_key(key) {
                    *nested = Value::from(REDACTED);
                } else {
                    redact(nested);
                }
            }
        },
        Value::Array(items) => items.iter_mut().for_each(redact),
        _ => {},
    }
}

fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|duration| u64::try_from(duration.as_millis()).ok())
        .unwrap_or_default()
}

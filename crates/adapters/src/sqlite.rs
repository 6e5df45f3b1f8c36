//! SQLite helpers shared by the credential and step stores.

use repo_indexer_shared::{ErrorClass, ErrorCode, ErrorEnvelope, Result};
use rusqlite::{Connection, ErrorCode as SqliteErrorCode};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Which store an error came from; becomes the error code namespace.
#[derive(Debug, Clone, Copy)]
pub struct StoreLabel {
    pub namespace: &'static str,
    pub name: &'static str,
}

impl StoreLabel {
    pub fn error(self, action: &str, error: &rusqlite::Error) -> ErrorEnvelope {
        let class = if is_busy(error) {
            ErrorClass::Retriable
        } else {
            ErrorClass::NonRetriable
        };
        ErrorEnvelope::unexpected(
            ErrorCode::new(self.namespace, "sqlite"),
            format!("{} {action} failed: {error}", self.name),
            class,
        )
    }

    pub fn task_error(self, error: &tokio::task::JoinError) -> ErrorEnvelope {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            format!("{} task failed: {error}", self.name),
            ErrorClass::NonRetriable,
        )
    }
}

fn is_busy(error: &rusqlite::Error) -> bool {
    matches!(
        error.sqlite_error_code(),
        Some(SqliteErrorCode::DatabaseBusy | SqliteErrorCode::DatabaseLocked)
    )
}

/// Open an existing database read-only; a missing file is an I/O error.
pub fn open_read_only(path: &Path, label: StoreLabel) -> Result<Connection> {
    if !path.exists() {
        return Err(ErrorEnvelope::expected(
            ErrorCode::io(),
            format!("{} database not found", label.name),
        )
        .with_metadata("path", path.to_string_lossy()));
    }
    Connection::open_with_flags(path, rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|error| label.error("open", &error))
}

/// Open (creating if needed) a WAL-mode database and apply `schema`.
pub fn open_read_write(path: &Path, schema: &str, label: StoreLabel) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::io(),
                format!("{} directory create failed: {error}", label.name),
            )
            .with_metadata("path", parent.to_string_lossy())
        })?;
    }

    let conn = Connection::open(path).map_err(|error| label.error("open", &error))?;
    conn.busy_timeout(std::time::Duration::from_secs(5))
        .map_err(|error| label.error("busy timeout", &error))?;
    conn.execute_batch("PRAGMA journal_mode = WAL;")
        .map_err(|error| label.error("pragma", &error))?;
    conn.execute_batch(schema)
        .map_err(|error| label.error("schema", &error))?;
    Ok(conn)
}

pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|duration| i64::try_from(duration.as_millis()).ok())
        .unwrap_or_default()
}

//! SQLite-backed step store, so runs survive process restarts.

use crate::sqlite::{StoreLabel, now_epoch_ms, open_read_write};
use repo_indexer_ports::{BoxFuture, StepKey, StepStorePort};
use repo_indexer_shared::{ErrorClass, ErrorCode, ErrorEnvelope, RequestContext, Result};
use rusqlite::OptionalExtension;
use serde_json::Value;
use std::path::PathBuf;
use tokio::task::spawn_blocking;

const LABEL: StoreLabel = StoreLabel {
    namespace: "steps",
    name: "step store",
};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS step_results (
    run_id TEXT NOT NULL,
    step_name TEXT NOT NULL,
    value_json TEXT NOT NULL,
    completed_at_ms INTEGER NOT NULL,
    PRIMARY KEY (run_id, step_name)
);";

/// Step results persisted as JSON text, one row per `(run_id, step_name)`.
#[derive(Debug, Clone)]
pub struct SqliteStepStore {
    path: PathBuf,
}

impl SqliteStepStore {
    /// Store backed by the database at `path` (created on first use).
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl StepStorePort for SqliteStepStore {
    fn load(&self, ctx: &RequestContext, key: StepKey) -> BoxFuture<'_, Result<Option<Value>>> {
        let ctx = ctx.clone();
        let path = self.path.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("step_store.load")?;
            let raw = spawn_blocking(move || {
                let conn = open_read_write(&path, SCHEMA, LABEL)?;
                conn.query_row(
                    "SELECT value_json FROM step_results WHERE run_id = ?1 AND step_name = ?2",
                    (&*key.run_id, &*key.step_name),
                    |row| row.get::<_, String>(0),
                )
                .optional()
                .map_err(|error| LABEL.error("query", &error))
            })
            .await
            .map_err(|error| LABEL.task_error(&error))??;

            raw.map(|json| {
                serde_json::from_str(&json).map_err(|error| {
                    ErrorEnvelope::unexpected(
                        ErrorCode::new("steps", "corrupt_result"),
                        format!("stored step result is not valid JSON: {error}"),
                        ErrorClass::NonRetriable,
                    )
                })
            })
            .transpose()
        })
    }

    fn save(&self, ctx: &RequestContext, key: StepKey, value: Value) -> BoxFuture<'_, Result<()>> {
        let ctx = ctx.clone();
        let path = self.path.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("step_store.save")?;
            let json = value.to_string();
            spawn_blocking(move || {
                let conn = open_read_write(&path, SCHEMA, LABEL)?;
                conn.execute(
                    "INSERT OR REPLACE INTO step_results (run_id, step_name, value_json, completed_at_ms) VALUES (?1, ?2, ?3, ?4)",
                    (&*key.run_id, &*key.step_name, &json, now_epoch_ms()),
                )
                .map_err(|error| LABEL.error("insert", &error))?;
                Ok::<(), ErrorEnvelope>(())
            })
            .await
            .map_err(|error| LABEL.task_error(&error))?
        })
    }

    fn compact_run(&self, ctx: &RequestContext, keep: StepKey) -> BoxFuture<'_, Result<usize>> {
        let ctx = ctx.clone();
        let path = self.path.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("step_store.compact_run")?;
            spawn_blocking(move || {
                let conn = open_read_write(&path, SCHEMA, LABEL)?;
                conn.execute(
                    "DELETE FROM step_results WHERE run_id = ?1 AND step_name <> ?2",
                    (&*keep.run_id, &*keep.step_name),
                )
                .map_err(|error| LABEL.error("delete", &error))
            })
            .await
            .map_err(|error| LABEL.task_error(&error))?
        })
    }
}

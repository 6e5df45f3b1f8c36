//! Process-local step store.

use repo_indexer_ports::{BoxFuture, StepKey, StepStorePort};
use repo_indexer_shared::{RequestContext, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Step results kept in memory; lost when the process exits.
#[derive(Debug, Clone, Default)]
pub struct MemoryStepStore {
    entries: Arc<RwLock<BTreeMap<StepKey, Value>>>,
}

impl MemoryStepStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the completed steps of `run_id`, sorted.
    pub async fn completed_steps(&self, run_id: &str) -> Vec<Box<str>> {
        self.entries
            .read()
            .await
            .keys()
            .filter(|key| &*key.run_id == run_id)
            .map(|key| key.step_name.clone())
            .collect()
    }
}

impl StepStorePort for MemoryStepStore {
    fn load(&self, ctx: &RequestContext, key: StepKey) -> BoxFuture<'_, Result<Option<Value>>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("step_store.load")?;
            Ok(self.entries.read().await.get(&key).cloned())
        })
    }

    fn save(&self, ctx: &RequestContext, key: StepKey, value: Value) -> BoxFuture<'_, Result<()>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("step_store.save")?;
            self.entries.write().await.insert(key, value);
            Ok(())
        })
    }

    fn compact_run(&self, ctx: &RequestContext, keep: StepKey) -> BoxFuture<'_, Result<usize>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("step_store.compact_run")?;
            let mut entries = self.entries.write().await;
            let before = entries.len();
            entries.retain(|key, _| key.run_id != keep.run_id || *key == keep);
            Ok(before - entries.len())
        })
    }
}

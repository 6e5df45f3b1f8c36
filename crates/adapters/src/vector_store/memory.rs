//! Process-local vector store.
//!
//! Backs `--dry-run` and tests. Records are kept per namespace with the same
//! insert-or-replace semantics as the real store.

use repo_indexer_ports::{
    BoxFuture, Namespace, UpsertRequest, VectorRecord, VectorRecordId, VectorStorePort,
    VectorStoreProviderInfo,
};
use repo_indexer_shared::{RequestContext, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type Records = BTreeMap<VectorRecordId, VectorRecord>;

/// In-memory, namespaced vector store.
#[derive(Clone)]
pub struct MemoryVectorStore {
    provider: VectorStoreProviderInfo,
    namespaces: Arc<RwLock<BTreeMap<Namespace, Records>>>,
}

impl MemoryVectorStore {
    /// Create an empty store reporting `index_name`.
    #[must_use]
    pub fn new(index_name: impl Into<Box<str>>) -> Self {
        Self {
            provider: VectorStoreProviderInfo {
                id: "memory".into(),
                index_name: index_name.into(),
            },
            namespaces: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Number of records stored under `namespace`.
    pub async fn len(&self, namespace: &Namespace) -> usize {
        self.namespaces
            .read()
            .await
            .get(namespace)
            .map_or(0, BTreeMap::len)
    }

    /// Look up a single record.
    pub async fn get(&self, namespace: &Namespace, id: &VectorRecordId) -> Option<VectorRecord> {
        self.namespaces
            .read()
            .await
            .get(namespace)
            .and_then(|records| records.get(id))
            .cloned()
    }

    /// All records of a namespace, ordered by id.
    pub async fn records(&self, namespace: &Namespace) -> Vec<VectorRecord> {
        self.namespaces
            .read()
            .await
            .get(namespace)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Namespaces holding at least one record.
    pub async fn namespaces(&self) -> Vec<Namespace> {
        self.namespaces.read().await.keys().cloned().collect()
    }
}

impl VectorStorePort for MemoryVectorStore {
    fn provider(&self) -> &VectorStoreProviderInfo {
        &self.provider
    }

    fn upsert(&self, ctx: &RequestContext, request: UpsertRequest) -> BoxFuture<'_, Result<()>> {
        let ctx = ctx.clone();
        Box::pin(async move {
            ctx.ensure_not_cancelled("memory_vector_store.upsert")?;
            if request.records.is_empty() {
                return Ok(());
            }
            let mut namespaces = self.namespaces.write().await;
            let records = namespaces.entry(request.namespace).or_default();
            for record in request.records {
                records.insert(record.id.clone(), record);
            }
            Ok(())
        })
    }
}

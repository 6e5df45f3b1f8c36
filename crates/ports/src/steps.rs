//! Step result persistence contract.

use crate::BoxFuture;
use repo_indexer_shared::{RequestContext, Result};
use serde_json::Value;
use std::fmt;

/// Cache key of one step of one run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepKey {
    /// Run the step belongs to.
    pub run_id: Box<str>,
    /// Step name, unique within a run.
    pub step_name: Box<str>,
}

impl StepKey {
    /// Build a key.
    pub fn new(run_id: impl Into<Box<str>>, step_name: impl Into<Box<str>>) -> Self {
        Self {
            run_id: run_id.into(),
            step_name: step_name.into(),
        }
    }
}

impl fmt::Display for StepKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}/{}", self.run_id, self.step_name)
    }
}

/// Stores the JSON result of completed steps.
pub trait StepStorePort: Send + Sync {
    /// Cached result, `None` when the step has not completed.
    fn load(&self, ctx: &RequestContext, key: StepKey) -> BoxFuture<'_, Result<Option<Value>>>;

    /// Record a step result, replacing any earlier one.
    fn save(&self, ctx: &RequestContext, key: StepKey, value: Value) -> BoxFuture<'_, Result<()>>;

    /// Delete every result of `keep.run_id` except `keep` itself.
    ///
    /// Returns the number of results removed.
    fn compact_run(&self, ctx: &RequestContext, keep: StepKey) -> BoxFuture<'_, Result<usize>>;
}

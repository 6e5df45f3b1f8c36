//! Checkpointed workflow steps.
//!
//! A run is a sequence of named steps. Each step result is stored under
//! `(run id, step name)` once the body succeeds; invoking the run again
//! returns the stored result instead of running the body. Bodies may run
//! more than once (a crash between the body and the save), so they must be
//! idempotent.

use repo_indexer_ports::{LogLevel, LoggerPort, StepKey, StepStorePort, log_fields};
use repo_indexer_shared::{
    ErrorCode, ErrorEnvelope, RequestContext, Result, RetryPolicy, retry_async_with_observer,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

/// Driver for the steps of one run.
pub struct WorkflowRun<'a> {
    run_id: &'a str,
    store: &'a dyn StepStorePort,
    retry: RetryPolicy,
    logger: &'a dyn LoggerPort,
}

impl<'a> WorkflowRun<'a> {
    /// Bind a run id to a step store.
    pub const fn new(
        run_id: &'a str,
        store: &'a dyn StepStorePort,
        retry: RetryPolicy,
        logger: &'a dyn LoggerPort,
    ) -> Self {
        Self {
            run_id,
            store,
            retry,
            logger,
        }
    }

    /// Run id this driver is bound to.
    #[must_use]
    pub const fn run_id(&self) -> &str {
        self.run_id
    }

    /// Return the cached result of `name`, or run `body` and cache its result.
    ///
    /// Retriable failures of `body` are retried under the run's policy. The
    /// final failure is returned with a `step` metadata entry and nothing is
    /// cached for the step.
    #[tracing::instrument(name = "workflow.step", skip_all, fields(run_id = %self.run_id, step = name))]
    pub async fn step<T, F, Fut>(
        &self,
        ctx: &RequestContext,
        name: &'static str,
        mut body: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let key = StepKey::new(self.run_id, name);

        let cached = self
            .store
            .load(ctx, key.clone())
            .await
            .map_err(|error| error.with_metadata("step", name))?;
        if let Some(value) = cached {
            let result = decode_cached(&key, value)?;
            self.logger.debug(
                "workflow.step_cached",
                "Step result reused",
                Some(log_fields([("step", name.into())])),
            );
            return Ok(result);
        }

        let logger = self.logger;
        let on_retry = |attempt: u32, delay: Duration, error: &ErrorEnvelope| {
            let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
            logger.failure(
                LogLevel::Warn,
                "workflow.step_retry",
                "Step failed; retrying",
                error,
                Some(log_fields([
                    ("step", name.into()),
                    ("attempt", attempt.into()),
                    ("delayMs", delay_ms.into()),
                ])),
            );
        };
        let result = retry_async_with_observer(ctx, self.retry, name, &mut body, on_retry)
            .await
            .map_err(|error| error.with_metadata("step", name))?;

        let value = serde_json::to_value(&result).map_err(|error| {
            ErrorEnvelope::invariant(
                ErrorCode::new("workflow", "unserializable_step_result"),
                format!("step result could not be serialized: {error}"),
            )
            .with_metadata("step", name)
        })?;
        self.store
            .save(ctx, key, value)
            .await
            .map_err(|error| error.with_metadata("step", name))?;

        self.logger.info(
            "workflow.step_completed",
            "Step completed",
            Some(log_fields([("step", name.into())])),
        );
        Ok(result)
    }

    /// Cached result of `name`, without running anything.
    pub async fn cached<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        name: &'static str,
    ) -> Result<Option<T>> {
        let key = StepKey::new(self.run_id, name);
        let cached = self
            .store
            .load(ctx, key.clone())
            .await
            .map_err(|error| error.with_metadata("step", name))?;
        cached.map(|value| decode_cached(&key, value)).transpose()
    }

    /// Store the terminal result of the run under `name` and drop every other
    /// step result of the run.
    ///
    /// Intermediate results hold the credential and the fetched files; only
    /// the terminal result is needed to replay a finished run.
    pub async fn finish<T: Serialize>(
        &self,
        ctx: &RequestContext,
        name: &'static str,
        result: &T,
    ) -> Result<()> {
        let key = StepKey::new(self.run_id, name);
        let value = serde_json::to_value(result).map_err(|error| {
            ErrorEnvelope::invariant(
                ErrorCode::new("workflow", "unserializable_step_result"),
                format!("run result could not be serialized: {error}"),
            )
            .with_metadata("step", name)
        })?;
        self.store
            .save(ctx, key.clone(), value)
            .await
            .map_err(|error| error.with_metadata("step", name))?;
        let removed = self
            .store
            .compact_run(ctx, key)
            .await
            .map_err(|error| error.with_metadata("step", name))?;

        self.logger.debug(
            "workflow.run_compacted",
            "Intermediate step results removed",
            Some(log_fields([("removed", removed.into())])),
        );
        Ok(())
    }
}

fn decode_cached<T: DeserializeOwned>(key: &StepKey, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|error| {
        ErrorEnvelope::invariant(
            ErrorCode::new("workflow", "incompatible_step_result"),
            format!("cached result of {key} does not match the step: {error}"),
        )
        .with_metadata("step", &*key.step_name)
        .with_metadata("run_id", &*key.run_id)
    })
}

//! Index one GitHub repository into the vector store.
//!
//! The run is three checkpointed steps: `get-token`, `fetch-files` and
//! `index-codebase`. Missing identity fields, a missing credential and an
//! empty repository end the run with a structured outcome. Everything else
//! propagates out of the failing step once its retries are spent.
//!
//! Once a run reaches an outcome, the outcome is stored as `run-outcome` and
//! the other step results of the run (token, file contents) are deleted.

mod batches;
mod types;

pub use types::{
    EMBEDDING_BATCH_SIZE, IndexCodebaseSummary, IndexRepositoryDeps, IndexRepositoryInput,
    IndexRunOutcome, NO_TOKEN_ERROR, STEP_FETCH_FILES, STEP_GET_TOKEN, STEP_INDEX_CODEBASE,
    STEP_RUN_OUTCOME,
};

use crate::workflow::WorkflowRun;
use repo_indexer_domain::{ChunkingOptions, CredentialProvider, RepositoryIdentity, SourceFile};
use repo_indexer_ports::{
    ListTextFilesRequest, LogLevel, LoggerPort, NoopLogger, TokenRequest, log_fields,
};
use repo_indexer_shared::{RequestContext, Result, SecretString};
use serde_json::json;

/// Run (or resume) the indexing job for one `repository.connected` trigger.
///
/// Re-invoking with the same `run_id` reuses every completed step, so a run
/// that already finished returns the same outcome without external calls.
#[tracing::instrument(name = "index_repository", skip_all, fields(run_id = %input.run_id))]
pub async fn index_repository(
    ctx: &RequestContext,
    deps: &IndexRepositoryDeps,
    input: IndexRepositoryInput,
) -> Result<IndexRunOutcome> {
    ctx.ensure_not_cancelled("index_repository")?;

    let run_fields = log_fields([("runId", json!(&*input.run_id))]);
    let logger: Box<dyn LoggerPort> = match deps.logger.as_ref() {
        Some(logger) => logger.child(run_fields),
        None => Box::new(NoopLogger),
    };

    let identity = match RepositoryIdentity::parse(
        input.owner.as_deref(),
        input.repo.as_deref(),
        input.user_id.as_deref(),
    ) {
        Ok(identity) => identity,
        Err(error) => {
            let message = error.to_string();
            logger.warn(
                "index.identity_invalid",
                &message,
                Some(log_fields([("missingFields", json!(error.missing))])),
            );
            return Ok(IndexRunOutcome::failed(message));
        },
    };

    let logger = logger.child(log_fields([
        ("owner", json!(identity.owner())),
        ("repo", json!(identity.repo())),
    ]));
    logger.info("index.run_started", "Indexing started", None);

    let run = WorkflowRun::new(&input.run_id, deps.steps.as_ref(), input.retry, logger.as_ref());
    if let Some(outcome) = run.cached::<IndexRunOutcome>(ctx, STEP_RUN_OUTCOME).await? {
        logger.debug(
            "workflow.step_cached",
            "Finished run replayed",
            Some(log_fields([("step", json!(STEP_RUN_OUTCOME))])),
        );
        return Ok(outcome);
    }

    let result = run_steps(ctx, deps, &identity, input.chunking, &run, logger.as_ref()).await;
    if let Ok(outcome) = &result {
        run.finish(ctx, STEP_RUN_OUTCOME, outcome).await?;
    }

    if let Err(error) = &result {
        let step = error.metadata.get("step").map_or("unknown", String::as_str);
        logger.failure(
            LogLevel::Error,
            "index.step_failed",
            "Indexing step failed",
            error,
            Some(log_fields([("step", json!(step))])),
        );
    }
    result
}

async fn run_steps(
    ctx: &RequestContext,
    deps: &IndexRepositoryDeps,
    identity: &RepositoryIdentity,
    chunking: ChunkingOptions,
    run: &WorkflowRun<'_>,
    logger: &dyn LoggerPort,
) -> Result<IndexRunOutcome> {
    let user_id = identity.user_id();
    let token: Option<String> = run
        .step(ctx, STEP_GET_TOKEN, move || lookup_token(ctx, deps, user_id))
        .await?;
    let Some(token) = token.map(SecretString::from) else {
        logger.warn(
            "index.credential_missing",
            NO_TOKEN_ERROR,
            Some(log_fields([("userId", json!(user_id))])),
        );
        return Ok(IndexRunOutcome::failed(NO_TOKEN_ERROR));
    };

    let token = &token;
    let files: Vec<SourceFile> = run
        .step(ctx, STEP_FETCH_FILES, move || {
            fetch_files(ctx, deps, identity, token)
        })
        .await?;
    logger.info(
        "index.files_fetched",
        "Repository files fetched",
        Some(log_fields([("fileCount", json!(files.len()))])),
    );

    if files.is_empty() {
        logger.info("index.no_files", "Repository has no indexable files", None);
        return Ok(IndexRunOutcome::completed(0, 0));
    }

    let chunks = batches::chunk_files(&files, chunking);
    let chunks = chunks.as_slice();
    let summary: IndexCodebaseSummary = run
        .step(ctx, STEP_INDEX_CODEBASE, move || {
            batches::index_chunks(ctx, deps, identity, chunks, logger)
        })
        .await?;

    logger.info(
        "index.run_completed",
        "Indexing completed",
        Some(log_fields([
            ("filesProcessed", json!(files.len())),
            ("chunksIndexed", json!(summary.chunks_indexed)),
            ("batches", json!(summary.batches)),
        ])),
    );
    Ok(IndexRunOutcome::completed(files.len(), summary.chunks_indexed))
}

// The token is cached as plain text in the step store, which shares the
// credential store's trust domain.
async fn lookup_token(
    ctx: &RequestContext,
    deps: &IndexRepositoryDeps,
    user_id: &str,
) -> Result<Option<String>> {
    let token = deps
        .credentials
        .get_token(
            ctx,
            TokenRequest {
                user_id: user_id.into(),
                provider: CredentialProvider::GitHub,
            },
        )
        .await?;
    Ok(token
        .filter(|token| !token.is_blank())
        .map(|token| token.into_inner().into_string()))
}

async fn fetch_files(
    ctx: &RequestContext,
    deps: &IndexRepositoryDeps,
    identity: &RepositoryIdentity,
    token: &SecretString,
) -> Result<Vec<SourceFile>> {
    deps.fetcher
        .list_text_files(
            ctx,
            ListTextFilesRequest {
                token: token.clone(),
                owner: identity.owner().into(),
                repo: identity.repo().into(),
            },
        )
        .await
        .map_err(|error| {
            error
                .with_metadata("owner", identity.owner())
                .with_metadata("repo", identity.repo())
        })
}

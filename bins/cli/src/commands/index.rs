//! Index command handler.

use crate::error::{CliError, ExitCode};
use crate::format::{OutputMode, to_json_line};
use crate::{CliOutput, format_error_output};
use repo_indexer_config::RepositoryConnectedEvent;
use repo_indexer_infra::{
    IndexRunReport, IndexerRuntime, ObservabilitySettings, RuntimeOptions, build_logger,
    load_effective_config,
};
use repo_indexer_shared::RequestContext;
use std::collections::BTreeMap;
use std::path::Path;

/// Arguments shared by `index` and `event`.
#[derive(Debug, Clone, Copy)]
pub struct IndexCommandInput<'a> {
    /// Optional config file.
    pub config_path: Option<&'a Path>,
    /// Run id to resume.
    pub run_id: Option<&'a str>,
    /// Use the in-memory vector store.
    pub dry_run: bool,
}

/// Run one indexing job for `event` and render its outcome.
pub fn run_index(
    mode: OutputMode,
    env: &BTreeMap<String, String>,
    event: &RepositoryConnectedEvent,
    input: IndexCommandInput<'_>,
) -> Result<CliOutput, CliError> {
    let (config, backend_env) = match load_effective_config(env, input.config_path) {
        Ok(loaded) => loaded,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };
    let settings = ObservabilitySettings::from_map(env).with_json(mode.json_logs());
    let options = RuntimeOptions {
        dry_run: input.dry_run,
        logger: build_logger(settings),
    };
    let runtime = match IndexerRuntime::from_config(&config, &backend_env, options) {
        Ok(runtime) => runtime,
        Err(error) => return Ok(format_error_output(mode, &error)),
    };

    let executor = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let (report, stored) = executor.block_on(async {
        let ctx = RequestContext::new_request();
        let cancel_ctx = ctx.clone();
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, cancelling run");
                cancel_ctx.cancel();
            }
        });

        let report = runtime
            .run_repository_connected(&ctx, event, input.run_id)
            .await;
        watcher.abort();

        let stored = match runtime.memory_store() {
            Some(store) => {
                let mut total = 0;
                for namespace in store.namespaces().await {
                    total += store.len(&namespace).await;
                }
                Some(total)
            },
            None => None,
        };
        (report, stored)
    });

    format_report(mode, &report, stored)
}

fn format_report(
    mode: OutputMode,
    report: &IndexRunReport,
    stored: Option<usize>,
) -> Result<CliOutput, CliError> {
    let outcome = &report.outcome;
    let exit_code = if outcome.success {
        ExitCode::Ok
    } else {
        ExitCode::InvalidInput
    };

    let stdout = if mode.is_json() {
        let mut payload = serde_json::to_value(outcome)?;
        if let Some(object) = payload.as_object_mut() {
            object.insert("runId".to_owned(), report.run_id.as_ref().into());
            if let Some(stored) = stored {
                object.insert("storedRecords".to_owned(), stored.into());
            }
        }
        to_json_line(&payload)?
    } else {
        let mut out = String::new();
        out.push_str(if outcome.success {
            "status: ok\n"
        } else {
            "status: failed\n"
        });
        push_line(&mut out, "runId", Some(report.run_id.as_ref()));
        push_line(
            &mut out,
            "filesProcessed",
            outcome.files_processed.map(|value| value.to_string()).as_deref(),
        );
        push_line(
            &mut out,
            "chunksIndexed",
            outcome.chunks_indexed.map(|value| value.to_string()).as_deref(),
        );
        push_line(&mut out, "error", outcome.error.as_deref());
        push_line(&mut out, "message", outcome.message.as_deref());
        push_line(
            &mut out,
            "storedRecords",
            stored.map(|value| value.to_string()).as_deref(),
        );
        out
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code,
    })
}

fn push_line(out: &mut String, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        out.push_str(key);
        out.push_str(": ");
        out.push_str(value);
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{LogFormat, OutputFormat};
    use repo_indexer_app::IndexRunOutcome;

    const fn mode(format: OutputFormat) -> OutputMode {
        OutputMode {
            format,
            log_format: LogFormat::Text,
        }
    }

    #[test]
    fn failed_outcomes_exit_with_invalid_input() -> Result<(), CliError> {
        let report = IndexRunReport {
            run_id: "run-1".into(),
            outcome: IndexRunOutcome::failed("Missing required fields: userId"),
        };
        let output = format_report(mode(OutputFormat::Text), &report, None)?;
        assert_eq!(output.exit_code, ExitCode::InvalidInput);
        assert_eq!(
            output.stdout,
            "status: failed\nrunId: run-1\nerror: Missing required fields: userId\n"
        );
        Ok(())
    }

    #[test]
    fn json_report_carries_run_id_and_stored_records() -> Result<(), Box<dyn std::error::Error>> {
        let report = IndexRunReport {
            run_id: "run-2".into(),
            outcome: IndexRunOutcome::completed(3, 7),
        };
        let output = format_report(mode(OutputFormat::Json), &report, Some(7))?;
        assert_eq!(output.exit_code, ExitCode::Ok);

        let value: serde_json::Value = serde_json::from_str(&output.stdout)?;
        assert_eq!(
            value,
            serde_json::json!({
                "success": true,
                "filesProcessed": 3,
                "chunksIndexed": 7,
                "runId": "run-2",
                "storedRecords": 7
            })
        );
        Ok(())
    }

    #[test]
    fn missing_config_file_is_reported_not_raised() -> Result<(), CliError> {
        let path = std::env::temp_dir().join("rix-index-missing-config.toml");
        let output = run_index(
            mode(OutputFormat::Text),
            &BTreeMap::new(),
            &RepositoryConnectedEvent::default(),
            IndexCommandInput {
                config_path: Some(&path),
                run_id: None,
                dry_run: true,
            },
        )?;
        assert_eq!(output.exit_code, ExitCode::InvalidInput);
        assert!(output.stdout.starts_with("status: error\n"));
        Ok(())
    }
}

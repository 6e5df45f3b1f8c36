//! CLI binary entrypoint.

mod commands;
mod error;
mod format;

use clap::{Parser, Subcommand, ValueEnum};
use commands::{
    ChunkCommandInput, IndexCommandInput, run_chunk, run_config_show, run_config_validate,
    run_event, run_event_schema, run_index,
};
use error::{CliError, ExitCode};
use format::{OutputArgs, OutputMode, to_json_line};
use repo_indexer_config::RepositoryConnectedEvent;
use repo_indexer_config::env::ENV_VARS;
use repo_indexer_infra::observability::{LOG_FORMAT_ENV, LOG_LEVEL_ENV};
use repo_indexer_infra::{ConfigFormat, InfraError, redact_if_secret};
use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "rix",
    version,
    about = "Index GitHub repositories into a vector store",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    output: OutputArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Index one repository.
    Index {
        /// Repository owner.
        #[arg(long)]
        owner: Option<String>,
        /// Repository name.
        #[arg(long)]
        repo: Option<String>,
        /// User whose GitHub credential is used.
        #[arg(long)]
        user_id: Option<String>,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Run the job for a `repository.connected` event read from a file or stdin.
    Event {
        /// Event JSON file (bare payload or `{ name, data }` envelope). Reads stdin when omitted.
        #[arg(long)]
        file: Option<PathBuf>,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Chunk a local file and print the windows.
    Chunk {
        /// File to read.
        #[arg(long)]
        file: PathBuf,
        /// Repository path to attribute chunks to (defaults to `--file`).
        #[arg(long)]
        path: Option<String>,
        /// Lines per chunk.
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Lines shared by consecutive chunks.
        #[arg(long)]
        overlap: Option<usize>,
        /// Print the text sent to the embedding model instead of raw content.
        #[arg(long)]
        show_embedding_text: bool,
    },
    /// Config-related commands.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Print the JSON Schema of the event payload.
    EventSchema {
        /// Print the schema of the `{ name, data }` envelope instead.
        #[arg(long)]
        envelope: bool,
    },
}

#[derive(Debug, clap::Args)]
struct RunArgs {
    /// Run id; reuse one to resume a run from its last completed step.
    #[arg(long)]
    run_id: Option<String>,
    /// Optional config file path (JSON/TOML).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write vectors to an in-memory store instead of the configured one.
    #[arg(long)]
    dry_run: bool,
}

impl RunArgs {
    fn as_input(&self) -> IndexCommandInput<'_> {
        IndexCommandInput {
            config_path: self.config.as_deref(),
            run_id: self.run_id.as_deref(),
            dry_run: self.dry_run,
        }
    }
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Print the effective config (file + env overrides).
    Show {
        /// Optional config file path (JSON/TOML).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Serialization of the printed config.
        #[arg(long, value_enum, default_value_t = ShowFormat::Json)]
        format: ShowFormat,
    },
    /// Validate the config and the adapters it selects.
    Validate {
        /// Optional config file path (JSON/TOML).
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ShowFormat {
    Json,
    Toml,
}

impl From<ShowFormat> for ConfigFormat {
    fn from(format: ShowFormat) -> Self {
        match format {
            ShowFormat::Json => Self::Json,
            ShowFormat::Toml => Self::Toml,
        }
    }
}

pub(crate) struct CliOutput {
    stdout: String,
    stderr: String,
    exit_code: ExitCode,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let mode = OutputMode::from_args(&cli.output);
    init_tracing(mode);

    match run(&cli.command, mode) {
        Ok(output) => match write_output(&output) {
            Ok(()) => std::process::ExitCode::from(output.exit_code.as_u8()),
            Err(error) => exit_with_error(&error),
        },
        Err(error) => exit_with_error(&error),
    }
}

fn init_tracing(mode: OutputMode) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    let _ = if mode.json_logs() {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

fn exit_with_error(error: &CliError) -> std::process::ExitCode {
    let _ = writeln!(io::stderr(), "error: {error}");
    std::process::ExitCode::from(error.exit_code().as_u8())
}

fn run(command: &Commands, mode: OutputMode) -> Result<CliOutput, CliError> {
    let env = collect_backend_env();
    match command {
        Commands::Index {
            owner,
            repo,
            user_id,
            run,
        } => {
            let event = RepositoryConnectedEvent {
                owner: owner.clone(),
                repo: repo.clone(),
                user_id: user_id.clone(),
            };
            run_index(mode, &env, &event, run.as_input())
        },
        Commands::Event { file, run } => {
            let payload = read_event_payload(file.as_deref())?;
            run_event(mode, &env, &payload, run.as_input())
        },
        Commands::Chunk {
            file,
            path,
            chunk_size,
            overlap,
            show_embedding_text,
        } => run_chunk(
            mode,
            ChunkCommandInput {
                file,
                path: path.as_deref(),
                chunk_size: *chunk_size,
                overlap: *overlap,
                show_embedding_text: *show_embedding_text,
            },
        ),
        Commands::Config { command } => match command {
            ConfigCommands::Show { config, format } => {
                run_config_show(mode, &env, config.as_deref(), (*format).into())
            },
            ConfigCommands::Validate { config } => {
                run_config_validate(mode, &env, config.as_deref())
            },
        },
        Commands::EventSchema { envelope } => run_event_schema(*envelope),
    }
}

fn read_event_payload(file: Option<&Path>) -> Result<String, CliError> {
    let payload = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        },
    };
    if payload.trim().is_empty() {
        return Err(CliError::InvalidInput("event payload is empty".to_owned()));
    }
    Ok(payload)
}

/// Render an error envelope and pick the exit code for it.
pub(crate) fn format_error_output(mode: OutputMode, error: &InfraError) -> CliOutput {
    let exit_code = ExitCode::for_envelope(error);
    let metadata: BTreeMap<&str, String> = error
        .metadata
        .iter()
        .map(|(key, value)| (key.as_str(), redact_if_secret(key, value)))
        .collect();

    let stdout = if mode.is_json() {
        let payload = serde_json::json!({
            "status": "error",
            "error": {
                "code": error.code.to_string(),
                "message": error.message,
                "kind": error.kind.to_string(),
                "meta": metadata,
            },
        });
        // This is a CLI boundary, so JSON serialization errors are internal.
        to_json_line(&payload).unwrap_or_else(|_| {
            "{\"status\":\"error\",\"error\":{\"code\":\"core:internal\",\"message\":\"internal error\"}}\n"
                .to_owned()
        })
    } else {
        let mut out = format!(
            "status: error\ncode: {}\nmessage: {}\nkind: {}\n",
            error.code, error.message, error.kind
        );
        if !metadata.is_empty() {
            out.push_str("meta:\n");
            for (key, value) in &metadata {
                out.push_str(&format!("  {key}: {value}\n"));
            }
        }
        out
    };

    CliOutput {
        stdout,
        stderr: String::new(),
        exit_code,
    }
}

fn write_output(output: &CliOutput) -> Result<(), CliError> {
    let mut stdout = io::stdout();
    stdout.write_all(output.stdout.as_bytes())?;

    if !output.stderr.is_empty() {
        let mut stderr = io::stderr();
        stderr.write_all(output.stderr.as_bytes())?;
        stderr.flush()?;
    }

    Ok(())
}

fn collect_backend_env() -> BTreeMap<String, String> {
    ENV_VARS
        .into_iter()
        .chain([LOG_FORMAT_ENV, LOG_LEVEL_ENV])
        .filter_map(|key| Some((key.to_owned(), std::env::var(key).ok()?)))
        .collect()
}

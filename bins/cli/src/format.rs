//! Output format helpers for CLI commands.

use clap::{Args, ValueEnum};

/// Output format choices for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-friendly text output.
    #[default]
    Text,
    /// Machine-friendly JSON output.
    Json,
}

/// Diagnostics format on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable tracing lines.
    #[default]
    Text,
    /// JSON tracing lines plus structured indexing events.
    Json,
}

/// Output-related CLI flags.
#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Output format for command responses.
    #[arg(long, global = true, value_enum, default_value_t)]
    pub output: OutputFormat,
    /// Format of diagnostics written to stderr.
    #[arg(long, global = true, value_enum, default_value_t)]
    pub log_format: LogFormat,
}

/// Output mode derived from CLI flags.
#[derive(Debug, Clone, Copy)]
pub struct OutputMode {
    pub format: OutputFormat,
    pub log_format: LogFormat,
}

impl OutputMode {
    /// Build output mode from CLI flags.
    #[must_use]
    pub const fn from_args(args: &OutputArgs) -> Self {
        Self {
            format: args.output,
            log_format: args.log_format,
        }
    }

    /// Returns true when JSON output is requested.
    #[must_use]
    pub const fn is_json(self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Returns true when JSON diagnostics are requested.
    #[must_use]
    pub const fn json_logs(self) -> bool {
        matches!(self.log_format, LogFormat::Json)
    }
}

/// Pretty JSON with a trailing newline.
pub fn to_json_line(value: &serde_json::Value) -> Result<String, serde_json::Error> {
    let mut output = serde_json::to_string_pretty(value)?;
    output.push('\n');
    Ok(output)
}

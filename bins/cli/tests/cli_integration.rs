//! CLI integration tests.

use std::io::Write;
use std::process::{Command, Output, Stdio};

const SCOPED_KEYS: &[&str] = &[
    "GOOGLE_GENERATIVE_AI_API_KEY",
    "OPENAI_API_KEY",
    "PINECONE_DB_API_KEY",
    "RUST_LOG",
];

fn cli(args: &[&str]) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_rix"));
    command.args(args);
    for (key, _) in std::env::vars() {
        if key.starts_with("RIX_") {
            command.env_remove(key);
        }
    }
    for key in SCOPED_KEYS {
        command.env_remove(key);
    }
    command.env("RIX_EMBEDDING_PROVIDER", "hash");
    command
}

fn run_with_stdin(args: &[&str], stdin: &str) -> std::io::Result<Output> {
    let mut child = cli(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    if let Some(mut pipe) = child.stdin.take() {
        pipe.write_all(stdin.as_bytes())?;
    }
    child.wait_with_output()
}

#[test]
fn index_without_user_reports_missing_field() -> Result<(), Box<dyn std::error::Error>> {
    let output = cli(&[
        "index",
        "--owner",
        "octocat",
        "--repo",
        "hello",
        "--dry-run",
        "--output",
        "json",
    ])
    .output()?;

    assert_eq!(output.status.code(), Some(2));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value["success"], false);
    assert_eq!(value["error"], "Missing required fields: userId");
    assert!(value["runId"].as_str().is_some_and(|id| !id.is_empty()));
    Ok(())
}

#[test]
fn event_from_stdin_without_token_reports_missing_credential()
-> Result<(), Box<dyn std::error::Error>> {
    let payload = r#"{ "name": "repository.connected", "data": { "owner": "octocat", "repo": "hello", "userId": "u_1" } }"#;
    let output = run_with_stdin(&["event", "--dry-run", "--run-id", "run-cli"], payload)?;

    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("runId: run-cli\n"), "{stdout}");
    assert!(stdout.contains("error: No GitHub token found\n"), "{stdout}");
    Ok(())
}

#[test]
fn empty_stdin_is_invalid_input() -> Result<(), Box<dyn std::error::Error>> {
    let output = run_with_stdin(&["event", "--dry-run"], "   ")?;
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8(output.stderr)?.contains("event payload is empty"));
    Ok(())
}

#[test]
fn config_show_prints_env_overrides_as_toml() -> Result<(), Box<dyn std::error::Error>> {
    let output = cli(&["config", "show", "--format", "toml"])
        .env("RIX_CHUNK_SIZE", "60")
        .output()?;
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("chunkSize = 60"), "{stdout}");
    assert!(stdout.contains("provider = \"hash\""), "{stdout}");
    Ok(())
}

#[test]
fn invalid_env_value_exits_with_invalid_input() -> Result<(), Box<dyn std::error::Error>> {
    let output = cli(&["config", "validate"])
        .env("RIX_CHUNK_OVERLAP", "not-a-number")
        .output()?;
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8(output.stdout)?.starts_with("status: error\n"));
    Ok(())
}

#[test]
fn chunk_prints_each_window() -> Result<(), Box<dyn std::error::Error>> {
    let file = std::env::temp_dir().join(format!("rix-cli-chunk-{}.py", std::process::id()));
    std::fs::write(&file, "import os\n\nprint(os.getcwd())\n")?;
    let file_arg = file.to_string_lossy().to_string();

    let output = cli(&[
        "chunk",
        "--file",
        &file_arg,
        "--path",
        "tools/cwd.py",
        "--show-embedding-text",
    ])
    .output()?;
    std::fs::remove_file(&file)?;

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.starts_with("path: tools/cwd.py\nchunks: 1\n"), "{stdout}");
    assert!(stdout.contains("--- tools/cwd.py:0-4 (lines 0..4)\n"), "{stdout}");
    assert!(stdout.contains("File: tools/cwd.py\nLanguage: py\n\nimport os"), "{stdout}");
    Ok(())
}

#[test]
fn event_schema_is_json() -> Result<(), Box<dyn std::error::Error>> {
    let output = cli(&["event-schema"]).output()?;
    assert_eq!(output.status.code(), Some(0));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert!(value["properties"]["userId"].is_object());
    Ok(())
}

//! Event schema command handler.

use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use crate::format::to_json_line;
use repo_indexer_config::{event_envelope_schema, repository_connected_event_schema};

/// Print the JSON Schema of the event payload, or of the named envelope.
pub fn run_event_schema(envelope: bool) -> Result<CliOutput, CliError> {
    let schema = if envelope {
        event_envelope_schema()
    } else {
        repository_connected_event_schema()
    };
    Ok(CliOutput {
        stdout: to_json_line(&serde_json::to_value(schema)?)?,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_schema_lists_camel_case_fields() -> Result<(), Box<dyn std::error::Error>> {
        let output = run_event_schema(false)?;
        let value: serde_json::Value = serde_json::from_str(&output.stdout)?;
        let properties = value["properties"].as_object().ok_or("properties")?;
        for field in ["owner", "repo", "userId"] {
            assert!(properties.contains_key(field), "missing {field}");
        }
        Ok(())
    }

    #[test]
    fn envelope_schema_requires_name_and_data() -> Result<(), Box<dyn std::error::Error>> {
        let output = run_event_schema(true)?;
        let value: serde_json::Value = serde_json::from_str(&output.stdout)?;
        let required = value["required"].as_array().ok_or("required")?;
        for field in ["name", "data"] {
            assert!(required.iter().any(|entry| entry == field), "missing {field}");
        }
        Ok(())
    }
}

//! Integration tests for event intake and schema export.

use repo_indexer_config::{
    REPOSITORY_CONNECTED_EVENT, parse_repository_connected_event_json,
    repository_connected_event_schema,
};
use std::error::Error;
use std::fs;
use std::path::Path;

#[test]
fn envelope_fixture_parses_into_identity() -> Result<(), Box<dyn Error>> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("event.envelope.json");
    let event = parse_repository_connected_event_json(&fs::read_to_string(path)?)?;

    let identity = event.identity()?;
    assert_eq!(identity.owner(), "octocat");
    assert_eq!(identity.repo(), "hello-world");
    assert_eq!(identity.user_id(), "user_01");
    Ok(())
}

#[test]
fn schema_lists_camel_case_properties() -> Result<(), Box<dyn Error>> {
    let schema = serde_json::to_value(repository_connected_event_schema())?;
    let properties = schema
        .get("properties")
        .and_then(serde_json::Value::as_object)
        .ok_or_else(|| std::io::Error::other("schema has no properties"))?;

    let mut names: Vec<&str> = properties.keys().map(String::as_str).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["owner", "repo", "userId"]);
    assert_eq!(REPOSITORY_CONNECTED_EVENT, "repository.connected");
    Ok(())
}

//! Event DTOs accepted at the job boundary.
//!
//! Intake validates shape only: the JSON must parse and, when wrapped in an
//! envelope, the event name must be `repository.connected`. Required-field
//! checks belong to the domain (`RepositoryIdentity::parse`) so a
//! missing field becomes a structured run outcome rather than an intake error.

use repo_indexer_domain::{IdentityError, RepositoryIdentity};
use repo_indexer_shared::{ErrorCode, ErrorEnvelope};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the event that triggers indexing.
pub const REPOSITORY_CONNECTED_EVENT: &str = "repository.connected";

/// Payload of a `repository.connected` event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryConnectedEvent {
    /// Repository owner (user or organization login).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Repository name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    /// Application user whose GitHub credential is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl RepositoryConnectedEvent {
    /// Build an event from a `"owner/repo"` full name.
    ///
    /// Splits on the first `/`; without one the whole input becomes the owner
    /// and `repo` stays unset.
    #[must_use]
    pub fn from_full_name(full_name: &str, user_id: impl Into<String>) -> Self {
        let (owner, repo) = match full_name.split_once('/') {
            Some((owner, repo)) => (owner.to_owned(), Some(repo.to_owned())),
            None => (full_name.to_owned(), None),
        };
        Self {
            owner: Some(owner),
            repo,
            user_id: Some(user_id.into()),
        }
    }

    /// Validate required fields into a domain identity.
    pub fn identity(&self) -> Result<RepositoryIdentity, IdentityError> {
        RepositoryIdentity::parse(
            self.owner.as_deref(),
            self.repo.as_deref(),
            self.user_id.as_deref(),
        )
    }
}

/// Named event wrapper, as delivered by an event bus.
///
/// Bus metadata next to `name` and `data` (`id`, `ts`, `v`, `user`) is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelopeDto {
    /// Event name; only `repository.connected` is accepted.
    pub name: String,
    /// Event payload.
    pub data: RepositoryConnectedEvent,
}

/// Event intake failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventIntakeError {
    /// The envelope carries an event this job does not handle.
    UnsupportedEvent {
        /// Name found in the envelope.
        name: String,
    },
}

impl fmt::Display for EventIntakeError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedEvent { name } => write!(
                formatter,
                "unsupported event `{name}` (expected `{REPOSITORY_CONNECTED_EVENT}`)"
            ),
        }
    }
}

impl std::error::Error for EventIntakeError {}

impl From<EventIntakeError> for ErrorEnvelope {
    fn from(error: EventIntakeError) -> Self {
        let message = error.to_string();
        match error {
            EventIntakeError::UnsupportedEvent { name } => {
                Self::expected(ErrorCode::invalid_input(), message).with_metadata("event_name", name)
            },
        }
    }
}

fn invalid_event_json(error: &serde_json::Error) -> ErrorEnvelope {
    ErrorEnvelope::expected(
        ErrorCode::new("config", "invalid_json"),
        format!("invalid event JSON: {error}"),
    )
    .with_metadata("request_kind", "event")
}

/// Parse a `repository.connected` event, bare or inside an envelope.
///
/// Any object with a `name` key is read as an envelope.
pub fn parse_repository_connected_event_json(
    input: &str,
) -> Result<RepositoryConnectedEvent, ErrorEnvelope> {
    let value: serde_json::Value =
        serde_json::from_str(input).map_err(|error| invalid_event_json(&error))?;

    if value.get("name").is_none() {
        return serde_json::from_value(value).map_err(|error| invalid_event_json(&error));
    }

    let envelope: EventEnvelopeDto =
        serde_json::from_value(value).map_err(|error| invalid_event_json(&error))?;
    if envelope.name != REPOSITORY_CONNECTED_EVENT {
        return Err(EventIntakeError::UnsupportedEvent {
            name: envelope.name,
        }
        .into());
    }
    Ok(envelope.data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn bare_and_enveloped_events_parse() -> Result<(), Box<dyn Error>> {
        let bare = parse_repository_connected_event_json(
            r#"{ "owner": "octocat", "repo": "hello-world", "userId": "u_1" }"#,
        )?;
        let wrapped = parse_repository_connected_event_json(
            r#"{
              "name": "repository.connected",
              "data": { "owner": "octocat", "repo": "hello-world", "userId": "u_1" }
            }"#,
        )?;
        assert_eq!(bare, wrapped);
        assert_eq!(bare.identity()?.to_string(), "octocat/hello-world");
        Ok(())
    }

    #[test]
    fn other_event_names_are_rejected() -> Result<(), Box<dyn Error>> {
        let error = parse_repository_connected_event_json(
            r#"{ "name": "repository.disconnected", "data": {} }"#,
        )
        .err()
        .ok_or_else(|| std::io::Error::other("expected rejection"))?;
        assert_eq!(error.code, ErrorCode::invalid_input());
        assert_eq!(
            error.metadata.get("event_name").map(String::as_str),
            Some("repository.disconnected")
        );
        Ok(())
    }

    #[test]
    fn envelope_metadata_keys_are_ignored() -> Result<(), Box<dyn Error>> {
        let event = parse_repository_connected_event_json(
            r#"{
              "name": "repository.connected",
              "id": "01HZX",
              "ts": 1717171717000,
              "v": "2024-01-01.1",
              "data": { "owner": "octocat", "repo": "hello-world", "userId": "u_1" }
            }"#,
        )?;
        assert_eq!(event.identity()?.to_string(), "octocat/hello-world");
        assert_eq!(event.user_id.as_deref(), Some("u_1"));
        Ok(())
    }

    #[test]
    fn other_event_names_with_metadata_are_rejected() -> Result<(), Box<dyn Error>> {
        let error = parse_repository_connected_event_json(
            r#"{
              "name": "repository.deleted",
              "ts": 1,
              "data": { "owner": "octocat", "repo": "hello-world", "userId": "u_1" }
            }"#,
        )
        .err()
        .ok_or_else(|| std::io::Error::other("expected rejection"))?;
        assert_eq!(error.code, ErrorCode::invalid_input());
        assert_eq!(
            error.metadata.get("event_name").map(String::as_str),
            Some("repository.deleted")
        );
        Ok(())
    }

    #[test]
    fn envelope_without_data_is_invalid_json() {
        let result = parse_repository_connected_event_json(r#"{ "name": "repository.connected" }"#);
        assert!(result.is_err_and(|error| error.code == ErrorCode::new("config", "invalid_json")));
    }

    #[test]
    fn missing_fields_survive_intake() -> Result<(), Box<dyn Error>> {
        let event = parse_repository_connected_event_json(r#"{ "owner": "octocat" }"#)?;
        let error = event
            .identity()
            .err()
            .ok_or_else(|| std::io::Error::other("expected identity error"))?;
        assert_eq!(error.to_string(), "Missing required fields: repo, userId");
        Ok(())
    }

    #[test]
    fn full_name_splits_on_first_slash() {
        let event = RepositoryConnectedEvent::from_full_name("octocat/hello/world", "u_1");
        assert_eq!(event.owner.as_deref(), Some("octocat"));
        assert_eq!(event.repo.as_deref(), Some("hello/world"));

        let event = RepositoryConnectedEvent::from_full_name("octocat", "u_1");
        assert_eq!(event.repo, None);
        assert!(event.identity().is_err());
    }

    #[test]
    fn malformed_json_is_invalid_json() {
        let result = parse_repository_connected_event_json("{ owner: 1 ");
        assert!(result.is_err_and(|error| error.code == ErrorCode::new("config", "invalid_json")));
    }
}

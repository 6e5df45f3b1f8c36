//! JSON Schema exports for event DTOs.

use crate::{EventEnvelopeDto, RepositoryConnectedEvent};
use schemars::{Schema, schema_for};

/// JSON Schema for `RepositoryConnectedEvent`.
#[must_use]
pub fn repository_connected_event_schema() -> Schema {
    schema_for!(RepositoryConnectedEvent)
}

/// JSON Schema for the named envelope wrapping the event.
#[must_use]
pub fn event_envelope_schema() -> Schema {
    schema_for!(EventEnvelopeDto)
}

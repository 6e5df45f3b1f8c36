//! # repo-indexer-shared
//!
//! Foundational types used by every other crate in the workspace:
//!
//! - Result and error envelope types
//! - Request context (run correlation + cancellation)
//! - Retry with backoff for step execution
//! - Secret redaction helpers
//!
//! ## Design Principles
//!
//! 1. **No workspace dependencies** - This crate only depends on external crates
//! 2. **Serde-compatible** - Envelopes cross process boundaries as JSON

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod context;
pub mod errors;
pub mod invariants;
pub mod redaction;
pub mod result;
pub mod retry;

pub use context::{CorrelationId, RequestContext};
pub use errors::{
    ErrorClass, ErrorCode, ErrorEnvelope, ErrorKind, ErrorMetadata, UnexpectedError,
    normalize_unexpected_error,
};
pub use invariants::{BoundedU32, BoundedU64, BoundsError};
pub use redaction::{REDACTED, SecretString, is_secret_key, redact_if_secret};
pub use result::{Result, ResultExt};
pub use retry::{RetryPolicy, retry_async, retry_async_with_observer};

/// Returns the shared crate version.
#[must_use]
pub const fn shared_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_and_result_are_reexported() {
        let outcome: Result<u8> = Err(ErrorEnvelope::expected(
            ErrorCode::invalid_input(),
            "owner is required",
        ));
        assert!(matches!(outcome, Err(ref error) if error.kind == ErrorKind::Expected));
        assert!(!shared_crate_version().is_empty());
    }
}

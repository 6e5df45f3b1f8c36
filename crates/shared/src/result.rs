//! Result alias and envelope-aware combinators.

use crate::errors::ErrorEnvelope;

/// Shared result type used across the workspace.
pub type Result<T, E = ErrorEnvelope> = std::result::Result<T, E>;

/// Helpers for decorating errors as they cross layers.
pub trait ResultExt<T> {
    /// Attach a metadata entry to the error, if any.
    fn with_error_metadata(self, key: &str, value: impl Into<String>) -> Result<T>;

    /// Prefix the error message with an operation label, if any.
    fn with_error_context(self, context: &str) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_error_metadata(self, key: &str, value: impl Into<String>) -> Result<T> {
        self.map_err(|error| error.with_metadata(key, value))
    }

    fn with_error_context(self, context: &str) -> Result<T> {
        self.map_err(|error| error.with_context(context))
    }
}

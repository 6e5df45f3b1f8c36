//! Error envelope types and helpers.

use crate::redaction::{REDACTED, is_secret_key};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fmt, io};

/// Metadata attached to errors for diagnostics.
pub type ErrorMetadata = BTreeMap<String, String>;

/// Where a failure originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Expected failures (validation, missing input, cancellation).
    Expected,
    /// Invariant violations in domain logic.
    Invariant,
    /// Unexpected failures (I/O, network, providers).
    Unexpected,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Expected => "expected",
            Self::Invariant => "invariant",
            Self::Unexpected => "unexpected",
        })
    }
}

/// Whether the step runner may try the failed operation again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorClass {
    /// Transient; a later attempt may succeed.
    Retriable,
    /// Permanent for this input.
    NonRetriable,
}

impl ErrorClass {
    /// Returns true when the error is considered retriable.
    #[must_use]
    pub const fn is_retriable(self) -> bool {
        matches!(self, Self::Retriable)
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Retriable => "retriable",
            Self::NonRetriable => "non-retriable",
        })
    }
}

/// Stable error code with namespace and identifier (`namespace:code`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode {
    namespace: String,
    code: String,
}

impl ErrorCode {
    /// Create a new error code with a namespace and code.
    pub fn new(namespace: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            code: code.into(),
        }
    }

    /// Operation was cancelled.
    pub fn cancelled() -> Self {
        Self::new("core", "cancelled")
    }

    /// Caller supplied invalid input.
    pub fn invalid_input() -> Self {
        Self::new("core", "invalid_input")
    }

    /// Requested resource does not exist.
    pub fn not_found() -> Self {
        Self::new("core", "not_found")
    }

    /// Credential was rejected.
    pub fn permission_denied() -> Self {
        Self::new("core", "permission_denied")
    }

    /// Operation timed out.
    pub fn timeout() -> Self {
        Self::new("core", "timeout")
    }

    /// Provider throttled the request.
    pub fn rate_limited() -> Self {
        Self::new("core", "rate_limited")
    }

    /// Provider returned a server-side failure.
    pub fn dependency_unavailable() -> Self {
        Self::new("core", "dependency_unavailable")
    }

    /// Local I/O failure.
    pub fn io() -> Self {
        Self::new("core", "io")
    }

    /// Internal failure.
    pub fn internal() -> Self {
        Self::new("core", "internal")
    }

    /// Returns the namespace portion.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the code identifier.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.namespace, self.code)
    }
}

/// Structured error shared across crates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Error kind describing the origin category.
    pub kind: ErrorKind,
    /// Retry classification.
    pub class: ErrorClass,
    /// Stable error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
    /// Additional diagnostic metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: ErrorMetadata,
}

impl ErrorEnvelope {
    /// Create an expected, non-retriable error.
    pub fn expected(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::build(ErrorKind::Expected, ErrorClass::NonRetriable, code, message)
    }

    /// Create an invariant error (always non-retriable).
    pub fn invariant(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::build(ErrorKind::Invariant, ErrorClass::NonRetriable, code, message)
    }

    /// Create an unexpected error with the provided retry classification.
    pub fn unexpected(code: ErrorCode, message: impl Into<String>, class: ErrorClass) -> Self {
        Self::build(ErrorKind::Unexpected, class, code, message)
    }

    /// Create a cancellation error.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::expected(ErrorCode::cancelled(), message)
    }

    fn build(kind: ErrorKind, class: ErrorClass, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            kind,
            class,
            code,
            message: message.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Returns true if the error represents a cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.code == ErrorCode::cancelled()
    }

    /// Returns true if the step runner may retry.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        self.class.is_retriable()
    }

    /// Attach a single metadata entry. Values under secret-looking keys are redacted.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = if is_secret_key(&key) {
            REDACTED.to_string()
        } else {
            value.into()
        };
        self.metadata.insert(key, value);
        self
    }

    /// Prefix the message with an operation label, keeping code and class.
    #[must_use]
    pub fn with_context(mut self, context: &str) -> Self {
        self.message = format!("{context}: {}", self.message);
        self
    }
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{} {} {}: {}",
            self.kind, self.class, self.code, self.message
        )
    }
}

impl std::error::Error for ErrorEnvelope {}

impl From<io::Error> for ErrorEnvelope {
    fn from(error: io::Error) -> Self {
        normalize_unexpected_error(UnexpectedError::error(error))
    }
}

/// Wrapper for foreign errors that have no dedicated mapping.
#[derive(Debug)]
pub enum UnexpectedError {
    /// Bare message.
    Message(String),
    /// Foreign error value.
    Error(Box<dyn std::error::Error + Send + Sync>),
}

impl UnexpectedError {
    /// Wrap an unexpected message.
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Wrap an unexpected error value.
    pub fn error<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Error(Box::new(error))
    }
}

/// Normalize a foreign error into an envelope, classifying I/O failures found in the source chain.
pub fn normalize_unexpected_error(error: UnexpectedError) -> ErrorEnvelope {
    match error {
        UnexpectedError::Message(message) => {
            ErrorEnvelope::unexpected(ErrorCode::internal(), message, ErrorClass::NonRetriable)
        },
        UnexpectedError::Error(error) => {
            let (code, class) = find_io_error(&*error)
                .map_or((ErrorCode::internal(), ErrorClass::NonRetriable), |io_error| {
                    classify_io(io_error.kind())
                });
            ErrorEnvelope::unexpected(code, error.to_string(), class)
        },
    }
}

fn find_io_error<'a>(error: &'a (dyn std::error::Error + 'static)) -> Option<&'a io::Error> {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(error);
    while let Some(candidate) = current {
        if let Some(io_error) = candidate.downcast_ref::<io::Error>() {
            return Some(io_error);
        }
        current = candidate.source();
    }
    None
}

fn classify_io(kind: io::ErrorKind) -> (ErrorCode, ErrorClass) {
    match kind {
        io::ErrorKind::NotFound => (ErrorCode::not_found(), ErrorClass::NonRetriable),
        io::ErrorKind::PermissionDenied => {
            (ErrorCode::permission_denied(), ErrorClass::NonRetriable)
        },
        io::ErrorKind::TimedOut => (ErrorCode::timeout(), ErrorClass::Retriable),
        io::ErrorKind::Interrupted
        | io::ErrorKind::WouldBlock
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionRefused
        | io::ErrorKind::NotConnected
        | io::ErrorKind::BrokenPipe => (ErrorCode::io(), ErrorClass::Retriable),
        _ => (ErrorCode::io(), ErrorClass::NonRetriable),
    }
}

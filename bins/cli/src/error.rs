use repo_indexer_shared::{ErrorCode, ErrorEnvelope, ErrorKind};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Ok = 0,
    InvalidInput = 2,
    Io = 3,
    Internal = 1,
}

impl ExitCode {
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Exit code for an error surfaced by the runtime or config layers.
    #[must_use]
    pub fn for_envelope(error: &ErrorEnvelope) -> Self {
        if error.code == ErrorCode::io() {
            return Self::Io;
        }
        match error.kind {
            ErrorKind::Expected => Self::InvalidInput,
            ErrorKind::Invariant | ErrorKind::Unexpected => Self::Internal,
        }
    }
}

#[derive(Debug)]
pub enum CliError {
    InvalidInput(String),
    Io(std::io::Error),
    Serialization(serde_json::Error),
}

impl CliError {
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::InvalidInput(_) => ExitCode::InvalidInput,
            Self::Io(_) => ExitCode::Io,
            Self::Serialization(_) => ExitCode::Internal,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(message) => write!(formatter, "invalid input: {message}"),
            Self::Io(error) => write!(formatter, "io error: {error}"),
            Self::Serialization(error) => write!(formatter, "serialization error: {error}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repo_indexer_shared::ErrorClass;

    #[test]
    fn envelope_exit_codes_follow_kind_and_code() {
        let expected = ErrorEnvelope::expected(ErrorCode::invalid_input(), "bad");
        let io = ErrorEnvelope::from(std::io::Error::other("disk"));
        let unexpected = ErrorEnvelope::unexpected(
            ErrorCode::dependency_unavailable(),
            "down",
            ErrorClass::Retriable,
        );

        assert_eq!(ExitCode::for_envelope(&expected), ExitCode::InvalidInput);
        assert_eq!(ExitCode::for_envelope(&io), ExitCode::Io);
        assert_eq!(ExitCode::for_envelope(&unexpected), ExitCode::Internal);
    }

    #[test]
    fn cli_error_exit_codes() -> Result<(), Box<dyn std::error::Error>> {
        let serialization = match serde_json::from_str::<serde_json::Value>("not-json") {
            Ok(_) => return Err("expected serialization error".into()),
            Err(error) => CliError::Serialization(error),
        };
        assert_eq!(serialization.exit_code(), ExitCode::Internal);
        assert_eq!(
            CliError::Io(std::io::Error::other("io")).exit_code(),
            ExitCode::Io
        );
        assert_eq!(
            CliError::InvalidInput("x".to_owned()).exit_code(),
            ExitCode::InvalidInput
        );
        Ok(())
    }
}

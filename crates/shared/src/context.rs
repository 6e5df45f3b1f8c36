//! Request-scoped context: correlation id plus cooperative cancellation.

use crate::{ErrorCode, ErrorEnvelope, Result};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Identifier carried through logs and errors for one run or request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(Arc<str>);

impl CorrelationId {
    /// Parse a correlation id from user input. Trimmed; empty values are rejected.
    pub fn parse(value: impl AsRef<str>) -> Result<Self> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ErrorEnvelope::expected(
                ErrorCode::invalid_input(),
                "correlationId must be non-empty",
            ));
        }
        Ok(Self(Arc::from(trimmed)))
    }

    /// Fresh `run_*` id for a new indexing run.
    #[must_use]
    pub fn new_run_id() -> Self {
        Self::prefixed("run_")
    }

    /// Fresh `req_*` id for ad-hoc requests.
    #[must_use]
    pub fn new_request_id() -> Self {
        Self::prefixed("req_")
    }

    fn prefixed(prefix: &str) -> Self {
        let id = uuid::Uuid::new_v4().simple().to_string();
        Self(Arc::from(format!("{prefix}{id}")))
    }

    /// Borrow the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Context passed across every port call.
#[derive(Debug, Clone)]
pub struct RequestContext {
    correlation_id: CorrelationId,
    cancellation: CancellationToken,
}

impl RequestContext {
    /// Create a context with a fresh cancellation token.
    #[must_use]
    pub fn new(correlation_id: CorrelationId) -> Self {
        Self {
            correlation_id,
            cancellation: CancellationToken::new(),
        }
    }

    /// Create a context with an auto-generated `req_*` id.
    #[must_use]
    pub fn new_request() -> Self {
        Self::new(CorrelationId::new_request_id())
    }

    /// Derive a context that is cancelled with this one but can also be cancelled alone.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            correlation_id: self.correlation_id.clone(),
            cancellation: self.cancellation.child_token(),
        }
    }

    /// Correlation id of this context.
    #[must_use]
    pub const fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    /// Returns true if the context was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Cancel this context and its children.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Resolves once the context is cancelled.
    pub async fn cancelled(&self) {
        self.cancellation.cancelled().await;
    }

    /// Return a cancellation error when cancelled, tagged with the operation name.
    pub fn ensure_not_cancelled(&self, operation: &str) -> Result<()> {
        if self.is_cancelled() {
            return Err(ErrorEnvelope::cancelled("operation cancelled")
                .with_metadata("operation", operation));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_rejects_blank() -> Result<()> {
        assert_eq!(CorrelationId::parse("  run_1 ")?.as_str(), "run_1");
        assert!(CorrelationId::parse("   ").is_err());
        Ok(())
    }

    #[test]
    fn generated_ids_are_prefixed_and_distinct() {
        let first = CorrelationId::new_run_id();
        let second = CorrelationId::new_run_id();
        assert!(first.as_str().starts_with("run_"));
        assert!(CorrelationId::new_request_id().as_str().starts_with("req_"));
        assert_ne!(first, second);
    }

    #[test]
    fn cancelling_parent_cancels_child_only_downwards() {
        let parent = RequestContext::new_request();
        let child = parent.child();
        child.cancel();
        assert!(!parent.is_cancelled());

        let sibling = parent.child();
        parent.cancel();
        assert!(sibling.is_cancelled());
        assert!(parent.ensure_not_cancelled("index").is_err_and(|e| e.is_cancelled()));
    }

    #[tokio::test]
    async fn cancelled_future_resolves_after_cancel() {
        let ctx = RequestContext::new_request();
        let waiter = ctx.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });
        ctx.cancel();
        assert!(handle.await.is_ok());
    }
}

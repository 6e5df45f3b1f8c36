//! Bounded retry with exponential backoff for retriable failures.

use crate::{ErrorEnvelope, RequestContext, Result};
use std::future::Future;
use std::time::Duration;

/// How many times a failed operation is re-run and how long to wait between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum attempts, the first try included.
    pub max_attempts: u32,
    /// Delay before the second attempt, in milliseconds.
    pub base_delay_ms: u64,
    /// Upper bound for any single delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Jitter as a percentage of the computed delay (0..=100).
    pub jitter_ratio_pct: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 250,
            max_delay_ms: 5_000,
            jitter_ratio_pct: 20,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 0,
            max_delay_ms: 0,
            jitter_ratio_pct: 0,
        }
    }

    /// Delay applied after the given failed attempt (1-based), before jitter.
    #[must_use]
    pub fn delay_for(self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(30);
        let raw = self.base_delay_ms.saturating_mul(1_u64 << exponent);
        Duration::from_millis(raw.min(self.max_delay_ms))
    }

    fn jittered_delay_for(self, attempt: u32) -> Duration {
        let base = self.delay_for(attempt);
        let pct = u128::from(self.jitter_ratio_pct.min(100));
        if pct == 0 || base.is_zero() {
            return base;
        }
        let base_ms = base.as_millis();
        let spread = base_ms.saturating_mul(pct) / 100;
        if spread == 0 {
            return base;
        }
        // Uniform offset in [-spread, +spread].
        let roll = uuid::Uuid::new_v4().as_u128() % (spread * 2 + 1);
        let jittered = (base_ms + roll).saturating_sub(spread);
        let capped = jittered.min(u128::from(self.max_delay_ms));
        Duration::from_millis(u64::try_from(capped).unwrap_or(self.max_delay_ms))
    }
}

/// Run `op` until it succeeds, fails with a non-retriable error, or attempts run out.
pub async fn retry_async<T, F, Fut>(
    ctx: &RequestContext,
    policy: RetryPolicy,
    operation: &str,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry_async_with_observer(ctx, policy, operation, &mut op, |_, _, _| {}).await
}

/// Same as [`retry_async`], calling `on_retry(attempt, delay, error)` before each wait.
pub async fn retry_async_with_observer<T, F, Fut, Obs>(
    ctx: &RequestContext,
    policy: RetryPolicy,
    operation: &str,
    op: &mut F,
    mut on_retry: Obs,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    Obs: FnMut(u32, Duration, &ErrorEnvelope),
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0_u32;

    loop {
        attempt = attempt.saturating_add(1);
        ctx.ensure_not_cancelled(operation)?;

        match op().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_retriable() && attempt < max_attempts => {
                let delay = policy.jittered_delay_for(attempt);
                on_retry(attempt, delay, &error);
                sleep_or_cancel(ctx, delay, operation).await?;
            },
            Err(error) => {
                return Err(error.with_metadata("attempts", attempt.to_string()));
            },
        }
    }
}

async fn sleep_or_cancel(ctx: &RequestContext, delay: Duration, operation: &str) -> Result<()> {
    tokio::select! {
        () = ctx.cancelled() => Err(
            ErrorEnvelope::cancelled("operation cancelled").with_metadata("operation", operation),
        ),
        () = tokio::time::sleep(delay) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorClass, ErrorCode};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay_ms: 1,
            max_delay_ms: 4,
            jitter_ratio_pct: 0,
        }
    }

    fn transient() -> ErrorEnvelope {
        ErrorEnvelope::unexpected(ErrorCode::timeout(), "timeout", ErrorClass::Retriable)
    }

    #[test]
    fn delays_double_and_cap() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(250));
        assert_eq!(policy.delay_for(2), Duration::from_millis(500));
        assert_eq!(policy.delay_for(3), Duration::from_millis(1_000));
        assert_eq!(policy.delay_for(40), Duration::from_millis(5_000));
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let policy = RetryPolicy::default();
        for _ in 0..200 {
            let delay = policy.jittered_delay_for(1).as_millis();
            assert!((200..=300).contains(&delay), "delay {delay} out of range");
        }
    }

    #[tokio::test]
    async fn retriable_failures_are_retried_until_success() -> Result<()> {
        let ctx = RequestContext::new_request();
        let calls = Arc::new(AtomicU32::new(0));
        let calls_task = Arc::clone(&calls);

        let value = retry_async(&ctx, fast_policy(3), "flaky", || {
            let calls = Arc::clone(&calls_task);
            async move {
                let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 { Err(transient()) } else { Ok(attempt) }
            }
        })
        .await?;

        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        Ok(())
    }

    #[tokio::test]
    async fn non_retriable_failures_stop_immediately() {
        let ctx = RequestContext::new_request();
        let calls = Arc::new(AtomicU32::new(0));
        let calls_task = Arc::clone(&calls);

        let result: Result<()> = retry_async(&ctx, fast_policy(5), "strict", || {
            let calls = Arc::clone(&calls_task);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ErrorEnvelope::expected(ErrorCode::not_found(), "missing"))
            }
        })
        .await;

        let error = result.expect_err("should fail");
        assert_eq!(error.code, ErrorCode::not_found());
        assert_eq!(error.metadata.get("attempts").map(String::as_str), Some("1"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn observer_sees_each_retry() {
        let ctx = RequestContext::new_request();
        let mut seen = Vec::new();
        let mut op = || async { Err::<(), _>(transient()) };

        let result = retry_async_with_observer(&ctx, fast_policy(3), "always", &mut op, |attempt, _, _| {
            seen.push(attempt);
        })
        .await;

        assert!(result.is_err());
        assert_eq!(seen, vec![1, 2]);
    }

    #[tokio::test]
    async fn cancelled_context_short_circuits() {
        let ctx = RequestContext::new_request();
        ctx.cancel();

        let result: Result<()> = retry_async(&ctx, fast_policy(3), "cancelled", || async {
            Ok(())
        })
        .await;

        assert!(result.is_err_and(|error| error.is_cancelled()));
    }
}

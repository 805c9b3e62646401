//! Bounded retry for reference-number collisions
//!
//! One combinator wraps "generate candidate, attempt insert" everywhere a
//! sequence is consumed, instead of inline loops at each call site. Only
//! [`PostingError::Conflict`] is retried; every other error aborts
//! immediately. The jittered delay desynchronizes colliding writers.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::error::PostingError;

/// Retry bounds for conflict-prone operations
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Base delay before each retry; up to the same amount again is added
    /// as random jitter
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(20),
        }
    }
}

/// Runs `op` until it succeeds, fails with a non-conflict error, or the
/// attempt bound is exhausted.
///
/// The attempt number (starting at 1) is passed to `op` so callers can log
/// it. Exhaustion surfaces the final [`PostingError::Conflict`] unchanged;
/// nothing further up the stack retries again.
pub async fn with_conflict_retry<T, F, Fut>(
    policy: RetryPolicy,
    mut op: F,
) -> Result<T, PostingError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, PostingError>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(PostingError::Conflict(detail)) => {
                if attempt >= policy.max_attempts {
                    warn!(attempts = attempt, %detail, "conflict retries exhausted");
                    return Err(PostingError::Conflict(detail));
                }
                let base = policy.base_delay.as_millis() as u64;
                let jitter = rand::thread_rng().gen_range(0..=base);
                warn!(attempt, %detail, "conflict, retrying");
                tokio::time::sleep(Duration::from_millis(base + jitter)).await;
            }
            Err(other) => return Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn succeeds_first_try_without_delay() {
        let result = with_conflict_retry(quick_policy(5), |_| async { Ok::<_, PostingError>(7) })
            .await
            .unwrap();
        assert_eq!(result, 7);
    }

    #[tokio::test]
    async fn retries_conflicts_until_success() {
        let calls = AtomicU32::new(0);
        let result = with_conflict_retry(quick_policy(5), |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 3 {
                    Err(PostingError::conflict("duplicate reference"))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhaustion_surfaces_the_conflict() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_conflict_retry(quick_policy(5), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(PostingError::conflict("duplicate reference")) }
        })
        .await;

        assert!(matches!(result, Err(PostingError::Conflict(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn non_conflict_errors_abort_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_conflict_retry(quick_policy(5), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(PostingError::validation("bad input")) }
        })
        .await;

        assert!(matches!(result, Err(PostingError::Validation(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

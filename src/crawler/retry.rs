//! Bounded retry with exponential backoff for single network calls
//!
//! Only transient failures (connection errors, timeouts) are retried;
//! protocol-level responses propagate immediately so a 4xx/5xx is never
//! hammered. Attempt *n* (0-indexed) backs off `base_delay * 2^n` plus a
//! uniform jitter in `[0, base_delay)` before the next attempt; with the
//! default 1s base that is exactly 2^n seconds + [0,1)s.

use crate::{CrawlError, CrawlResult};
use std::future::Future;
use std::time::Duration;

/// Retry policy for idempotent network calls
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,

    /// Backoff unit; doubled per attempt
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Runs `operation`, retrying transient failures up to the attempt limit
    ///
    /// `operation` is a closure producing a fresh future per attempt (the
    /// underlying call must be idempotent). Exhausting all attempts
    /// re-raises the last transient error as-is.
    ///
    /// # Arguments
    ///
    /// * `operation` - Closure building the request future
    ///
    /// # Returns
    ///
    /// * `Ok(T)` - The first successful result
    /// * `Err(CrawlError)` - A non-transient error, or the final transient one
    pub async fn execute<T, F, Fut>(&self, mut operation: F) -> CrawlResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = CrawlResult<T>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt + 1 < self.max_attempts => {
                    let backoff = self.base_delay * 2u32.saturating_pow(attempt);
                    let jitter = self.base_delay.mul_f64(rand::random::<f64>());
                    tracing::debug!(
                        "Transient failure (attempt {}/{}): {}; backing off {:?}",
                        attempt + 1,
                        self.max_attempts,
                        e,
                        backoff + jitter
                    );
                    tokio::time::sleep(backoff + jitter).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        }
    }

    fn transient() -> CrawlError {
        CrawlError::Transient {
            url: "https://example.com".to_string(),
            reason: "connection reset".to_string(),
        }
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let calls = AtomicU32::new(0);
        let result = fast_policy()
            .execute(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, CrawlError>(42) }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_retried_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result = fast_policy()
            .execute(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(transient())
                    } else {
                        Ok(7)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_transient_exhausts_attempts() {
        let calls = AtomicU32::new(0);
        let result: CrawlResult<()> = fast_policy()
            .execute(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(transient()) }
            })
            .await;

        assert!(matches!(result, Err(CrawlError::Transient { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_protocol_error_not_retried() {
        let calls = AtomicU32::new(0);
        let result: CrawlResult<()> = fast_policy()
            .execute(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(CrawlError::Http {
                        url: "https://example.com".to_string(),
                        status: 500,
                    })
                }
            })
            .await;

        assert!(matches!(result, Err(CrawlError::Http { status: 500, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_robots_denial_not_retried() {
        let calls = AtomicU32::new(0);
        let result: CrawlResult<()> = fast_policy()
            .execute(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(CrawlError::RobotsDenied {
                        url: "https://example.com/products/x".to_string(),
                    })
                }
            })
            .await;

        assert!(matches!(result, Err(CrawlError::RobotsDenied { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

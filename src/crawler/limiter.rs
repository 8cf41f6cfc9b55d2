//! Per-host request pacing
//!
//! Enforces a minimum interval between permitted requests to the same host,
//! independent of other hosts. Each host gets its own async gate plus a
//! last-permitted timestamp; callers block inside the gate until the
//! remainder of the interval has elapsed, so waiters drain FIFO-by-arrival.
//! The limiter is the one piece of state shared across every logical crawl
//! in a run, whichever brand the request belongs to.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Per-host rate limiter
pub struct RateLimiter {
    min_interval: Duration,
    hosts: Mutex<HashMap<String, Arc<tokio::sync::Mutex<Option<Instant>>>>>,
}

impl RateLimiter {
    /// Creates a limiter permitting `rate` requests per second per host
    pub fn new(rate: f64) -> Self {
        Self {
            min_interval: Duration::from_secs_f64(1.0 / rate),
            hosts: Mutex::new(HashMap::new()),
        }
    }

    /// The enforced minimum interval between same-host requests
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Blocks until a request to `host` is permitted
    ///
    /// Computes the elapsed time since the host's last permitted request,
    /// sleeps the remainder of the minimum interval if positive, and stamps
    /// a fresh timestamp before releasing the host's gate.
    pub async fn wait_for_host(&self, host: &str) {
        let gate = {
            let mut hosts = self.hosts.lock().unwrap_or_else(|e| e.into_inner());
            hosts
                .entry(host.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(None)))
                .clone()
        };

        let mut last_request = gate.lock().await;
        if let Some(last) = *last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last_request = Some(Instant::now());
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(1.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_request_is_immediate() {
        let limiter = RateLimiter::new(2.0);
        let start = Instant::now();
        limiter.wait_for_host("example.com").await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_same_host_requests_are_spaced() {
        let limiter = RateLimiter::new(20.0); // 50ms interval
        let start = Instant::now();

        limiter.wait_for_host("example.com").await;
        limiter.wait_for_host("example.com").await;
        limiter.wait_for_host("example.com").await;

        // Two enforced gaps of >= 50ms each, minus scheduling slop
        assert!(start.elapsed() >= Duration::from_millis(95));
    }

    #[tokio::test]
    async fn test_different_hosts_do_not_block_each_other() {
        let limiter = RateLimiter::new(2.0); // 500ms interval
        limiter.wait_for_host("a.example.com").await;

        let start = Instant::now();
        limiter.wait_for_host("b.example.com").await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_concurrent_same_host_serialized() {
        let limiter = Arc::new(RateLimiter::new(20.0)); // 50ms interval
        let start = Instant::now();

        let mut tasks = Vec::new();
        for _ in 0..3 {
            let limiter = limiter.clone();
            tasks.push(tokio::spawn(async move {
                limiter.wait_for_host("example.com").await;
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert!(start.elapsed() >= Duration::from_millis(95));
    }

    #[test]
    fn test_interval_from_rate() {
        let limiter = RateLimiter::new(1.5);
        let interval = limiter.min_interval();
        assert!(interval > Duration::from_millis(650) && interval < Duration::from_millis(680));
    }
}

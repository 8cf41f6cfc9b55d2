//! Robots.txt gate
//!
//! Before any storefront request the crawler consults this gate. Rulesets
//! are fetched once per origin and cached for the lifetime of the gate (one
//! ingest run). A ruleset that cannot be fetched fails open: the origin is
//! treated as fully permissive rather than blocking the crawl. A denial is a
//! policy violation, not a fetch failure: callers skip the brand and never
//! retry it.

mod rules;

pub use rules::RobotsRules;

use crate::crawler::RetryPolicy;
use crate::{CrawlError, CrawlResult};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tokio::sync::Mutex;
use url::Url;

/// Per-origin robots.txt permission gate
pub struct RobotsGate {
    client: reqwest::Client,
    product_token: String,
    retry: RetryPolicy,
    rules: Mutex<HashMap<String, RobotsRules>>,
}

impl RobotsGate {
    /// Creates a gate with an empty ruleset cache
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client (carries the User-Agent header)
    /// * `product_token` - Robots.txt product token to match rules against
    /// * `retry` - Retry policy for the ruleset fetch itself
    pub fn new(client: reqwest::Client, product_token: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            client,
            product_token: product_token.into(),
            retry,
            rules: Mutex::new(HashMap::new()),
        }
    }

    /// Checks whether the gate permits fetching the given URL
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The URL is allowed
    /// * `Err(CrawlError::RobotsDenied)` - The origin's ruleset disallows it
    pub async fn check(&self, url: &Url) -> CrawlResult<()> {
        let origin = origin_of(url);

        let mut cache = self.rules.lock().await;
        let rules = match cache.entry(origin.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(slot) => {
                let fetched = self.fetch_rules(&origin).await;
                slot.insert(fetched)
            }
        };

        if rules.is_allowed(url.path(), &self.product_token) {
            Ok(())
        } else {
            Err(CrawlError::RobotsDenied {
                url: url.to_string(),
            })
        }
    }

    /// Fetches and parses robots.txt for an origin, failing open
    async fn fetch_rules(&self, origin: &str) -> RobotsRules {
        let robots_url = format!("{}/robots.txt", origin);

        let result = self
            .retry
            .execute(|| {
                let client = self.client.clone();
                let url = robots_url.clone();
                async move {
                    let response = client
                        .get(&url)
                        .send()
                        .await
                        .map_err(|e| CrawlError::from_reqwest(&url, e))?;
                    let status = response.status();
                    if !status.is_success() {
                        return Err(CrawlError::Http {
                            url: url.clone(),
                            status: status.as_u16(),
                        });
                    }
                    response
                        .text()
                        .await
                        .map_err(|e| CrawlError::from_reqwest(&url, e))
                }
            })
            .await;

        match result {
            Ok(content) => {
                tracing::debug!("Fetched robots.txt for {}", origin);
                RobotsRules::from_content(&content)
            }
            Err(e) => {
                tracing::info!(
                    "Could not fetch robots.txt for {} ({}); treating origin as permissive",
                    origin,
                    e
                );
                RobotsRules::allow_all()
            }
        }
    }
}

/// The `scheme://host[:port]` origin of a URL
fn origin_of(url: &Url) -> String {
    match url.port() {
        Some(port) => format!(
            "{}://{}:{}",
            url.scheme(),
            url.host_str().unwrap_or_default(),
            port
        ),
        None => format!("{}://{}", url.scheme(), url.host_str().unwrap_or_default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_of_strips_path() {
        let url = Url::parse("https://shop.example.com/products/x.js?v=1").unwrap();
        assert_eq!(origin_of(&url), "https://shop.example.com");
    }

    #[test]
    fn test_origin_of_keeps_port() {
        let url = Url::parse("http://127.0.0.1:8080/robots.txt").unwrap();
        assert_eq!(origin_of(&url), "http://127.0.0.1:8080");
    }
}

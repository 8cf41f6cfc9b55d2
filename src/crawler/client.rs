//! Storefront crawling client
//!
//! Discovers product handles for a brand (sitemap first, catalog listing
//! pages as fallback) and fetches per-product JSON documents under the
//! crate's politeness stack: every request passes the robots gate and the
//! per-host rate limiter, transient failures ride the retry policy, and
//! product documents use conditional fetching so unchanged products are
//! skipped without a download.

use crate::config::{BrandConfig, UserAgentConfig};
use crate::crawler::discovery::{handles_from_listing, handles_from_text, has_next_page_marker};
use crate::crawler::{EtagCache, RateLimiter, RetryPolicy};
use crate::robots::RobotsGate;
use crate::urls::{extract_host, normalize_origin};
use crate::{CrawlError, CrawlResult};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use url::Url;

/// Path of the product sitemap on a storefront origin
const SITEMAP_PATH: &str = "/sitemap_products_1.xml";

/// Maximum catalog listing pages consulted during fallback discovery
const MAX_CATALOG_PAGES: u32 = 10;

/// One crawled product with its raw variant payloads
///
/// Variant objects are kept as the origin returned them (price fields in
/// major-currency decimal units, free-form option keys); the storage layer
/// owns normalization.
#[derive(Debug, Clone)]
pub struct ProductRecord {
    pub handle: String,
    pub title: String,
    pub url: String,
    pub variants: Vec<serde_json::Map<String, Value>>,
}

/// Builds the shared HTTP client with identification and timeouts
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Crawls one storefront brand at a time under the politeness stack
///
/// Cheap to clone: the HTTP client, rate limiter, robots gate, and validator
/// cache are all shared handles, which is what lets per-product fetch tasks
/// run concurrently against the same state.
#[derive(Clone)]
pub struct StorefrontClient {
    client: Client,
    limiter: Arc<RateLimiter>,
    robots: Arc<RobotsGate>,
    etags: Arc<Mutex<EtagCache>>,
    retry: RetryPolicy,
    concurrency: usize,
}

impl StorefrontClient {
    /// Creates a client over shared politeness state
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client
    /// * `limiter` - Per-host rate limiter (shared across all crawls)
    /// * `robots` - Robots gate (shared across all crawls)
    /// * `etags` - Validator cache (shared across all crawls)
    /// * `retry` - Retry policy for individual requests
    /// * `concurrency` - Maximum in-flight product fetches per brand
    pub fn new(
        client: Client,
        limiter: Arc<RateLimiter>,
        robots: Arc<RobotsGate>,
        etags: Arc<Mutex<EtagCache>>,
        retry: RetryPolicy,
        concurrency: usize,
    ) -> Self {
        Self {
            client,
            limiter,
            robots,
            etags,
            retry,
            concurrency,
        }
    }

    /// Crawls every product of a brand's storefront
    ///
    /// Discovery failures and robots denials abort the brand; individual
    /// products that are unchanged (304) or unavailable (403/404) are
    /// skipped. Results are sorted by handle so persistence sees a
    /// reproducible order.
    ///
    /// # Arguments
    ///
    /// * `brand` - The configured brand to crawl
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<ProductRecord>)` - Crawled products (may be empty)
    /// * `Err(CrawlError)` - The brand's crawl was aborted
    pub async fn fetch_products(&self, brand: &BrandConfig) -> CrawlResult<Vec<ProductRecord>> {
        let base = normalize_origin(&brand.domain).map_err(|e| CrawlError::Parse {
            url: brand.domain.clone(),
            message: e.to_string(),
        })?;

        tracing::info!("Fetching products for {}", brand.name);
        let handles = self.discover_product_handles(&base).await?;
        tracing::info!(
            "Discovered {} product handles for {}",
            handles.len(),
            brand.name
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks: JoinSet<CrawlResult<Option<ProductRecord>>> = JoinSet::new();

        for handle in handles {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break, // semaphore is never closed
            };
            let client = self.clone();
            let base = base.clone();
            tasks.spawn(async move {
                let _permit = permit;
                client.fetch_product(&base, &handle).await
            });
        }

        let mut products = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(Some(product))) => products.push(product),
                Ok(Ok(None)) => {}
                // Dropping the JoinSet aborts in-flight siblings with it
                Ok(Err(e)) => return Err(e),
                Err(e) => {
                    return Err(CrawlError::Transient {
                        url: base.clone(),
                        reason: format!("product fetch task failed: {}", e),
                    })
                }
            }
        }

        products.sort_by(|a, b| a.handle.cmp(&b.handle));
        Ok(products)
    }

    /// Discovers product handles, sitemap first then catalog pages
    ///
    /// Returns handles deduplicated and sorted. A robots denial during
    /// discovery aborts the brand; any other sitemap failure falls through
    /// to catalog pagination.
    pub async fn discover_product_handles(&self, base: &str) -> CrawlResult<Vec<String>> {
        let sitemap_url = parse_url(&format!("{}{}", base, SITEMAP_PATH))?;

        match self.fetch_document(&sitemap_url, false).await {
            Ok(body) => Ok(handles_from_text(&body).into_iter().collect()),
            Err(CrawlError::RobotsDenied { url }) => Err(CrawlError::RobotsDenied { url }),
            Err(e) => {
                tracing::info!(
                    "Sitemap fetch failed for {} ({}); falling back to catalog pages",
                    base,
                    e
                );
                self.discover_via_catalog(base).await
            }
        }
    }

    /// Paginates `/collections/all` accumulating handles across pages
    async fn discover_via_catalog(&self, base: &str) -> CrawlResult<Vec<String>> {
        let mut handles: BTreeSet<String> = BTreeSet::new();

        for page in 1..=MAX_CATALOG_PAGES {
            let page_url = parse_url(&format!("{}/collections/all?page={}", base, page))?;
            let body = match self.fetch_document(&page_url, false).await {
                Ok(body) => body,
                Err(CrawlError::Unavailable { status: 404, .. }) => break,
                Err(e) => return Err(e),
            };

            handles.extend(handles_from_listing(&body));

            if !has_next_page_marker(&body) {
                break;
            }
        }

        Ok(handles.into_iter().collect())
    }

    /// Fetches one product's JSON document
    ///
    /// # Returns
    ///
    /// * `Ok(Some(ProductRecord))` - The product was fetched and parsed
    /// * `Ok(None)` - Unchanged since last crawl (304) or unavailable (403/404)
    /// * `Err(CrawlError)` - Robots denial or a failure that aborts the brand
    pub async fn fetch_product(
        &self,
        base: &str,
        handle: &str,
    ) -> CrawlResult<Option<ProductRecord>> {
        let product_url = parse_url(&format!("{}/products/{}.js", base, handle))?;

        let body = match self.fetch_document(&product_url, true).await {
            Ok(body) => body,
            Err(CrawlError::NotModified { url }) => {
                tracing::info!("Product {} not modified", url);
                return Ok(None);
            }
            Err(CrawlError::Unavailable { url, status }) => {
                tracing::warn!("Product {} unavailable ({})", url, status);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let document: Value = serde_json::from_str(&body).map_err(|e| CrawlError::Parse {
            url: product_url.to_string(),
            message: e.to_string(),
        })?;

        let title = document
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| titlecase_handle(handle));

        let variants = document
            .get("variants")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_object().cloned())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Some(ProductRecord {
            handle: handle.to_string(),
            title,
            url: format!("{}/products/{}", base, handle),
            variants,
        }))
    }

    /// Fetches one document under the full politeness stack
    ///
    /// Robots gate, then (for product documents) the cached validator as
    /// `If-None-Match`, then host pacing, then the request through the
    /// retry policy. A returned `ETag` replaces the cached validator.
    async fn fetch_document(&self, url: &Url, conditional: bool) -> CrawlResult<String> {
        self.robots.check(url).await?;

        let validator = if conditional {
            self.etags.lock().await.get(url.as_str()).map(str::to_string)
        } else {
            None
        };

        if let Some(host) = extract_host(url) {
            self.limiter.wait_for_host(&host).await;
        }

        let response = self
            .retry
            .execute(|| {
                let client = self.client.clone();
                let request_url = url.clone();
                let validator = validator.clone();
                async move {
                    let mut request = client.get(request_url.as_str());
                    if let Some(token) = validator {
                        request = request.header(reqwest::header::IF_NONE_MATCH, token);
                    }
                    request
                        .send()
                        .await
                        .map_err(|e| CrawlError::from_reqwest(request_url.as_str(), e))
                }
            })
            .await?;

        let status = response.status();

        if status == StatusCode::NOT_MODIFIED {
            return Err(CrawlError::NotModified {
                url: url.to_string(),
            });
        }

        if status.is_success() {
            if conditional {
                let etag = response
                    .headers()
                    .get(reqwest::header::ETAG)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string);
                if let Some(token) = etag {
                    self.etags.lock().await.set(url.as_str(), Some(token));
                }
            }
            return response
                .text()
                .await
                .map_err(|e| CrawlError::from_reqwest(url.as_str(), e));
        }

        if status == StatusCode::FORBIDDEN || status == StatusCode::NOT_FOUND {
            Err(CrawlError::Unavailable {
                url: url.to_string(),
                status: status.as_u16(),
            })
        } else {
            Err(CrawlError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            })
        }
    }
}

/// Parses an internally assembled URL, mapping failures to `CrawlError`
fn parse_url(raw: &str) -> CrawlResult<Url> {
    Url::parse(raw).map_err(|e| CrawlError::Parse {
        url: raw.to_string(),
        message: e.to_string(),
    })
}

/// Fallback product title derived from the handle, e.g. `alpha-serum` ->
/// `Alpha Serum`
fn titlecase_handle(handle: &str) -> String {
    handle
        .split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

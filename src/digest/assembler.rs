//! Full-run orchestration
//!
//! The assembler owns the configured clients and the store, and drives one
//! complete run: crawl every brand, persist observations, fetch ad
//! summaries, compute the digest, persist the leaderboard. Brand-level
//! failures are isolated: a failing crawl or persistence step logs and
//! moves on so sibling brands and the digest always complete.

use crate::ads::AdsLibraryClient;
use crate::config::{BrandConfig, Config};
use crate::crawler::{build_http_client, EtagCache, RateLimiter, RetryPolicy, StorefrontClient};
use crate::dates::{parse_utc_offset, today_in_offset};
use crate::digest::{compute_daily_digest, DailyDigest};
use crate::robots::RobotsGate;
use crate::storage::{BrandSeed, SqliteStore, Store};
use crate::urls::normalize_origin;
use crate::{CrawlError, Result};
use chrono::{FixedOffset, NaiveDate};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Orchestrates ingest and digest computation for one process
pub struct DigestAssembler {
    config: Config,
    store: SqliteStore,
    storefront: StorefrontClient,
    ads_client: Option<AdsLibraryClient>,
    etags: Arc<Mutex<EtagCache>>,
    offset: FixedOffset,
}

impl DigestAssembler {
    /// Builds the assembler from a validated configuration
    ///
    /// Constructs the shared HTTP client, rate limiter, robots gate, and
    /// validator cache once, wires them into the storefront client, and
    /// opens the store.
    pub fn new(config: Config) -> Result<Self> {
        let offset = parse_utc_offset(&config.utc_offset)?;
        let client = build_http_client(&config.user_agent)?;
        let retry = RetryPolicy::default();

        let limiter = Arc::new(RateLimiter::new(config.crawler.requests_per_second));
        let robots = Arc::new(RobotsGate::new(
            client.clone(),
            config.user_agent.product_token(),
            retry.clone(),
        ));
        let etags = Arc::new(Mutex::new(EtagCache::load(&config.storage.etag_cache_path)));

        let storefront = StorefrontClient::new(
            client.clone(),
            limiter,
            robots,
            etags.clone(),
            retry.clone(),
            config.crawler.max_concurrent_products as usize,
        );

        let ads_client = config.ads.as_ref().map(|ads| {
            AdsLibraryClient::new(client, ads.endpoint.clone(), ads.access_token.clone(), retry)
        });

        let store = SqliteStore::new(Path::new(&config.storage.database_path))?;

        Ok(Self {
            config,
            store,
            storefront,
            ads_client,
            etags,
            offset,
        })
    }

    /// Runs a full ingest-and-digest cycle
    ///
    /// # Arguments
    ///
    /// * `as_of` - Observation date; defaults to today in the configured zone
    ///
    /// # Returns
    ///
    /// The computed digest (possibly with fewer signals when data sources
    /// degraded during the run)
    pub async fn run(&mut self, as_of: Option<NaiveDate>) -> Result<DailyDigest> {
        let target = as_of.unwrap_or_else(|| today_in_offset(&self.offset));
        tracing::info!(
            "Starting daily run for {} ({} brands)",
            target,
            self.config.brands.len()
        );

        let brands = self.config.brands.clone();
        for brand in &brands {
            self.ingest_brand(brand, target).await;
        }

        if self.ads_client.is_some() {
            for brand in &brands {
                self.ingest_brand_ads(brand, target).await;
            }
        } else {
            tracing::info!("No [ads] configuration; skipping ad activity");
        }

        if let Err(e) = self.etags.lock().await.flush() {
            tracing::warn!("Could not flush validator cache: {}", e);
        }

        self.finish(target)
    }

    /// Recomputes the digest from already-stored observations
    ///
    /// # Arguments
    ///
    /// * `as_of` - Observation date; defaults to today in the configured zone
    pub fn run_digest_only(&mut self, as_of: Option<NaiveDate>) -> Result<DailyDigest> {
        let target = as_of.unwrap_or_else(|| today_in_offset(&self.offset));
        tracing::info!("Computing digest for {} without ingest", target);
        self.finish(target)
    }

    /// Computes the digest and persists the day's leaderboard
    fn finish(&mut self, target: NaiveDate) -> Result<DailyDigest> {
        let digest = compute_daily_digest(&self.store, target, &self.config.signals)?;
        self.store.persist_leaderboard(&digest.leaderboard, target)?;
        tracing::info!(
            "Digest for {}: {} movers, {} leaderboard entries, {} ad highlights",
            target,
            digest.movers.len(),
            digest.leaderboard.len(),
            digest.ads.len()
        );
        Ok(digest)
    }

    /// Crawls and persists one brand, absorbing failures
    async fn ingest_brand(&mut self, brand: &BrandConfig, target: NaiveDate) {
        match self.storefront.fetch_products(brand).await {
            Ok(products) => {
                let persisted = self
                    .upsert_brand_seed(brand)
                    .and_then(|brand_id| self.store.persist_crawl(brand_id, &products, target));
                match persisted {
                    Ok(rows) => tracing::info!(
                        "Persisted {} price rows across {} products for {}",
                        rows,
                        products.len(),
                        brand.name
                    ),
                    Err(e) => tracing::error!("Persistence failed for {}: {}", brand.name, e),
                }
            }
            Err(CrawlError::RobotsDenied { url }) => {
                tracing::warn!("Skipping {}: disallowed by robots.txt ({})", brand.name, url);
            }
            Err(e) => {
                tracing::error!("Crawl failed for {}: {}", brand.name, e);
            }
        }
    }

    /// Fetches and persists one brand's ad summary, absorbing failures
    async fn ingest_brand_ads(&mut self, brand: &BrandConfig, target: NaiveDate) {
        let Some(ads_client) = &self.ads_client else {
            return;
        };
        let Some(account_id) = &brand.ads_account_id else {
            tracing::info!("Skipping ads for {}: no ads-account-id", brand.name);
            return;
        };

        match ads_client.fetch_summary(account_id, target).await {
            Ok(summary) => {
                let persisted = self.upsert_brand_seed(brand).and_then(|brand_id| {
                    self.store.upsert_ad_observation(brand_id, target, &summary)
                });
                match persisted {
                    Ok(()) => tracing::info!(
                        "Recorded {} active ads ({} new) for {}",
                        summary.active_ads,
                        summary.new_ads_24h,
                        brand.name
                    ),
                    Err(e) => tracing::error!("Ad persistence failed for {}: {}", brand.name, e),
                }
            }
            Err(e) => {
                tracing::warn!("Ads fetch failed for {}: {}", brand.name, e);
            }
        }
    }

    /// Upserts the brand's identity row from its configuration
    fn upsert_brand_seed(
        &mut self,
        brand: &BrandConfig,
    ) -> std::result::Result<i64, crate::storage::StorageError> {
        let domain = normalize_origin(&brand.domain).unwrap_or_else(|_| brand.domain.clone());
        let seed = BrandSeed {
            name: brand.name.clone(),
            domain,
            category: brand.category.clone(),
            ads_account_id: brand.ads_account_id.clone(),
        };
        self.store.upsert_brand(&seed)
    }
}

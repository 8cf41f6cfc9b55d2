//! Ads-directory activity fetcher
//!
//! Queries an ads-archive API for a brand's account and summarizes the
//! result into the two counters the signal engine consumes: currently
//! active ads and ads created within the last day. Brands without an ads
//! account are skipped upstream; a missing `[ads]` config section disables
//! the feature entirely.

use crate::crawler::RetryPolicy;
use crate::{CrawlError, CrawlResult};
use chrono::NaiveDate;
use serde::Deserialize;

/// Result-count cap per query; pagination beyond this is not followed
const RESULT_LIMIT: u32 = 500;

/// Ad-type filter sent with every archive query
const AD_TYPE: &str = "POLITICAL_AND_ISSUE_ADS";

/// Per-brand advertising activity summary for one day
#[derive(Debug, Clone, Copy)]
pub struct AdSummary {
    /// Number of currently active ads
    pub active_ads: i64,

    /// Number of ads created within the last day
    pub new_ads_24h: i64,
}

/// Archive query response envelope
#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    #[serde(default)]
    data: Vec<ArchiveAd>,
}

/// One ad row; only the creation timestamp is requested
#[derive(Debug, Deserialize)]
struct ArchiveAd {
    ad_creation_time: Option<String>,
}

/// Client for the external ads-directory API
pub struct AdsLibraryClient {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
    retry: RetryPolicy,
}

impl AdsLibraryClient {
    /// Creates a client against the given archive endpoint
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        access_token: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            access_token: access_token.into(),
            retry,
        }
    }

    /// Fetches the activity summary for one ads account
    ///
    /// # Arguments
    ///
    /// * `account_id` - The brand's account identifier in the ads directory
    /// * `today` - The configured local observation date
    ///
    /// # Returns
    ///
    /// * `Ok(AdSummary)` - Active and newly created ad counts
    /// * `Err(CrawlError)` - Network failure (after retries) or API error
    pub async fn fetch_summary(
        &self,
        account_id: &str,
        today: NaiveDate,
    ) -> CrawlResult<AdSummary> {
        let response = self
            .retry
            .execute(|| {
                let client = self.client.clone();
                let endpoint = self.endpoint.clone();
                let token = self.access_token.clone();
                let account = account_id.to_string();
                let limit = RESULT_LIMIT.to_string();
                async move {
                    client
                        .get(&endpoint)
                        .query(&[
                            ("search_page_ids", account.as_str()),
                            ("ad_type", AD_TYPE),
                            ("access_token", token.as_str()),
                            ("fields", "ad_creation_time"),
                            ("limit", limit.as_str()),
                        ])
                        .send()
                        .await
                        .map_err(|e| CrawlError::from_reqwest(&endpoint, e))
                }
            })
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::Http {
                url: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| CrawlError::from_reqwest(&self.endpoint, e))?;
        let payload: ArchiveResponse =
            serde_json::from_str(&body).map_err(|e| CrawlError::Parse {
                url: self.endpoint.clone(),
                message: e.to_string(),
            })?;

        let active_ads = payload.data.len() as i64;
        let new_ads_24h = payload
            .data
            .iter()
            .filter(|ad| is_recent(ad.ad_creation_time.as_deref(), today))
            .count() as i64;

        Ok(AdSummary {
            active_ads,
            new_ads_24h,
        })
    }
}

/// Whether a creation timestamp falls within the last day of `today`
fn is_recent(timestamp: Option<&str>, today: NaiveDate) -> bool {
    let Some(timestamp) = timestamp else {
        return false;
    };
    if timestamp.len() < 10 {
        return false;
    }
    match NaiveDate::parse_from_str(&timestamp[..10], "%Y-%m-%d") {
        Ok(created) => (today - created).num_days() <= 1,
        Err(_) => false,
    }
}

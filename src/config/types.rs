use crate::signals::SignalThresholds;
use serde::Deserialize;

/// Main configuration structure for Merchwire
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Local time zone for observation dates, as a fixed UTC offset
    #[serde(rename = "utc-offset", default = "default_utc_offset")]
    pub utc_offset: String,

    pub crawler: CrawlerConfig,

    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,

    pub storage: StorageConfig,

    /// Signal thresholds; every field carries a default
    #[serde(default)]
    pub signals: SignalThresholds,

    /// Ads-directory API access; the ads feature is disabled when absent
    #[serde(default)]
    pub ads: Option<AdsConfig>,

    #[serde(default)]
    pub brands: Vec<BrandConfig>,
}

fn default_utc_offset() -> String {
    "-08:00".to_string()
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of concurrent per-product fetches within one brand
    #[serde(
        rename = "max-concurrent-products",
        default = "default_max_concurrent_products"
    )]
    pub max_concurrent_products: u32,

    /// Maximum request rate against a single host (requests per second)
    #[serde(rename = "requests-per-second", default = "default_requests_per_second")]
    pub requests_per_second: f64,
}

fn default_max_concurrent_products() -> u32 {
    5
}

fn default_requests_per_second() -> f64 {
    1.5
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler (also the robots.txt product token)
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Full User-Agent header value: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }

    /// Product token used for robots.txt rule matching
    pub fn product_token(&self) -> &str {
        &self.crawler_name
    }
}

/// Persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the conditional-fetch validator cache file
    #[serde(rename = "etag-cache-path", default = "default_etag_cache_path")]
    pub etag_cache_path: String,
}

fn default_etag_cache_path() -> String {
    ".cache/etags.json".to_string()
}

/// Ads-directory API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AdsConfig {
    /// Ads-archive endpoint URL
    #[serde(default = "default_ads_endpoint")]
    pub endpoint: String,

    /// API access token
    #[serde(rename = "access-token")]
    pub access_token: String,
}

fn default_ads_endpoint() -> String {
    "https://graph.facebook.com/v18.0/ads_archive".to_string()
}

/// One tracked brand
#[derive(Debug, Clone, Deserialize)]
pub struct BrandConfig {
    /// Display name
    pub name: String,

    /// Storefront domain or URL; normalized to a lowercase origin for identity
    pub domain: String,

    /// Category tag used for grouping in downstream output
    pub category: String,

    /// Account identifier in the external ads directory, if known
    #[serde(rename = "ads-account-id", default)]
    pub ads_account_id: Option<String>,
}

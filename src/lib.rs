//! Merchwire: a storefront pricing and ads signal engine
//!
//! This crate tracks e-commerce storefront pricing and advertising activity
//! over time, crawling storefront product data politely (robots.txt, per-host
//! rate limits, conditional fetching) and deriving daily comparative signals:
//! price movers, discount spikes, ad-activity surges, and brand rankings.

pub mod ads;
pub mod config;
pub mod crawler;
pub mod dates;
pub mod digest;
pub mod robots;
pub mod signals;
pub mod storage;
pub mod urls;

use thiserror::Error;

/// Main error type for Merchwire operations
#[derive(Debug, Error)]
pub enum MerchwireError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Crawl error: {0}")]
    Crawl(#[from] CrawlError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors arising from network fetches against storefronts and the ads API
///
/// The variants carry the taxonomy the crawl pipeline dispatches on: only
/// `Transient` is ever retried; `RobotsDenied` aborts a brand's crawl as a
/// policy skip; `NotModified` and `Unavailable` are per-document conditions
/// the caller absorbs without failing the crawl.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// Connection failure or timeout; eligible for retry
    #[error("Transient network error for {url}: {reason}")]
    Transient { url: String, reason: String },

    /// The origin's robots.txt disallows this URL for our agent
    #[error("URL disallowed by robots.txt: {url}")]
    RobotsDenied { url: String },

    /// Conditional fetch hit: the document is unchanged since last crawl
    #[error("Not modified: {url}")]
    NotModified { url: String },

    /// The individual document is gone or forbidden (403/404)
    #[error("Remote unavailable ({status}) for {url}")]
    Unavailable { url: String, status: u16 },

    /// Any other protocol-level error response; never retried
    #[error("HTTP error {status} for {url}")]
    Http { url: String, status: u16 },

    /// The response body could not be parsed as the expected document
    #[error("Parse error for {url}: {message}")]
    Parse { url: String, message: String },
}

impl CrawlError {
    /// Whether the retry policy may re-attempt the operation
    pub fn is_transient(&self) -> bool {
        matches!(self, CrawlError::Transient { .. })
    }

    /// Classifies a reqwest transport error against a URL
    ///
    /// Connection errors and timeouts are transient; anything else (TLS
    /// failures, body decode errors) surfaces as a parse-level failure.
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            CrawlError::Transient {
                url: url.to_string(),
                reason: err.to_string(),
            }
        } else {
            CrawlError::Parse {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid UTC offset: {0}")]
    InvalidOffset(String),
}

/// Result type alias for Merchwire operations
pub type Result<T> = std::result::Result<T, MerchwireError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for crawl operations
pub type CrawlResult<T> = std::result::Result<T, CrawlError>;

// Re-export commonly used types
pub use config::Config;
pub use digest::{DailyDigest, DigestAssembler};
pub use signals::SignalThresholds;
pub use urls::{extract_host, normalize_origin};

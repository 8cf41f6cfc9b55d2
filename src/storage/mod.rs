//! Time-series persistence module
//!
//! Upsert-only storage over brand/product/variant identity and daily
//! price/ad observations, plus the read queries the signal engine consumes.

mod schema;
mod sqlite;
mod traits;

pub use schema::{initialize_schema, SCHEMA_SQL};
pub use sqlite::SqliteStore;
pub use traits::{Store, StorageError, StorageResult};

/// Brand identity as seeded from configuration or discovery
///
/// `domain` must already be a normalized lowercase origin; it is the unique
/// identity key. Name, category, and the ads account refresh on every
/// upsert; brands are never deleted.
#[derive(Debug, Clone)]
pub struct BrandSeed {
    pub name: String,
    pub domain: String,
    pub category: String,
    pub ads_account_id: Option<String>,
}

/// One variant's price observation for the target date, with lagged history
///
/// `price_1d` / `price_7d` are the LAG(1) / LAG(7) values over the
/// variant's observation series up to the target date.
#[derive(Debug, Clone)]
pub struct PriceRow {
    pub brand_id: i64,
    pub brand_name: String,
    pub category: String,
    pub product_title: String,
    pub product_url: String,
    pub sku: Option<String>,
    pub price_cents: Option<i64>,
    pub compare_at_cents: Option<i64>,
    pub available: bool,
    pub price_1d: Option<i64>,
    pub price_7d: Option<i64>,
}

/// One brand's ad observations over the trailing window
///
/// `active_today` and `new_ads_24h` come from the latest observation in the
/// window; `trailing` holds the earlier active-ad counts in date order.
#[derive(Debug, Clone)]
pub struct AdActivity {
    pub active_today: i64,
    pub new_ads_24h: i64,
    pub trailing: Vec<i64>,
}

//! Storage trait and error types
//!
//! This module defines the trait interface for the time-series store and
//! associated error types.

use crate::ads::AdSummary;
use crate::crawler::ProductRecord;
use crate::signals::LeaderboardEntry;
use crate::storage::{AdActivity, BrandSeed, PriceRow};
use chrono::NaiveDate;
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for the time-series storage backend
///
/// All write operations are upserts keyed on the data model's identity
/// columns; repeating a write for the same key overwrites in place.
pub trait Store {
    // ===== Identity upserts =====

    /// Inserts a brand or refreshes its mutable attributes
    ///
    /// # Arguments
    ///
    /// * `seed` - Brand identity and attributes (domain must be a
    ///   normalized lowercase origin)
    ///
    /// # Returns
    ///
    /// The brand's row ID
    fn upsert_brand(&mut self, seed: &BrandSeed) -> StorageResult<i64>;

    // ===== Observation writes =====

    /// Persists one brand's crawl result for one observation date
    ///
    /// Runs as a single transaction: products and variants are ensured and
    /// one price row per (variant, date) is upserted; a product's full
    /// variant set becomes visible atomically or not at all.
    ///
    /// # Returns
    ///
    /// The number of price rows written
    fn persist_crawl(
        &mut self,
        brand_id: i64,
        products: &[ProductRecord],
        as_of: NaiveDate,
    ) -> StorageResult<usize>;

    /// Upserts one brand's ad observation for one date
    fn upsert_ad_observation(
        &mut self,
        brand_id: i64,
        as_of: NaiveDate,
        summary: &AdSummary,
    ) -> StorageResult<()>;

    /// Upserts the day's leaderboard rows
    fn persist_leaderboard(
        &mut self,
        entries: &[LeaderboardEntry],
        as_of: NaiveDate,
    ) -> StorageResult<()>;

    // ===== Signal reads =====

    /// Loads the target date's price rows with lagged history
    ///
    /// Rows come back in a fixed (brand, product, variant) insertion order
    /// so downstream candidate ordering is deterministic.
    fn load_price_rows(&self, as_of: NaiveDate) -> StorageResult<Vec<PriceRow>>;

    /// Loads per-brand ad activity over the 7-day window ending at `as_of`
    fn load_ad_activity(&self, as_of: NaiveDate) -> StorageResult<HashMap<i64, AdActivity>>;

    // ===== Counters =====

    /// Total number of persisted price observations
    fn count_price_rows(&self) -> StorageResult<i64>;

    /// Total number of known products
    fn count_products(&self) -> StorageResult<i64>;

    /// Total number of known variants
    fn count_variants(&self) -> StorageResult<i64>;
}

//! SQLite storage implementation
//!
//! This module provides the SQLite-backed implementation of the Store
//! trait. One brand's crawl result commits as a single transaction; price
//! normalization (decimal major units to integer cents, malformed input to
//! NULL) happens here at the persistence boundary.

use crate::ads::AdSummary;
use crate::crawler::ProductRecord;
use crate::dates::format_date;
use crate::signals::LeaderboardEntry;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Store, StorageError, StorageResult};
use crate::storage::{AdActivity, BrandSeed, PriceRow};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the database at the given path
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened database
    /// * `Err(StorageError)` - Failed to open or initialize
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl Store for SqliteStore {
    fn upsert_brand(&mut self, seed: &BrandSeed) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO brands (name, domain, category, ads_account_id)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(domain) DO UPDATE SET
               name = excluded.name,
               category = excluded.category,
               ads_account_id = excluded.ads_account_id",
            params![seed.name, seed.domain, seed.category, seed.ads_account_id],
        )?;

        let id = self.conn.query_row(
            "SELECT id FROM brands WHERE domain = ?1",
            params![seed.domain],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn persist_crawl(
        &mut self,
        brand_id: i64,
        products: &[ProductRecord],
        as_of: NaiveDate,
    ) -> StorageResult<usize> {
        let ts_date = format_date(as_of);
        let tx = self.conn.transaction()?;
        let mut rows_written = 0;

        for product in products {
            let product_id = ensure_product(&tx, brand_id, product)?;

            for variant in &product.variants {
                let variant_id = ensure_variant(&tx, product_id, variant)?;
                let price_cents = price_to_cents(variant.get("price"));
                let compare_at_cents = price_to_cents(variant.get("compare_at_price"));
                let currency = variant
                    .get("currency")
                    .or_else(|| variant.get("currency_code"))
                    .and_then(Value::as_str)
                    .unwrap_or("USD");
                let available = variant
                    .get("available")
                    .and_then(Value::as_bool)
                    .unwrap_or(true);

                tx.execute(
                    "INSERT INTO prices (variant_id, ts_date, currency, price_cents, compare_at_cents, available)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(variant_id, ts_date) DO UPDATE SET
                       currency = excluded.currency,
                       price_cents = excluded.price_cents,
                       compare_at_cents = excluded.compare_at_cents,
                       available = excluded.available",
                    params![variant_id, ts_date, currency, price_cents, compare_at_cents, available],
                )?;
                rows_written += 1;
            }
        }

        tx.commit()?;
        Ok(rows_written)
    }

    fn upsert_ad_observation(
        &mut self,
        brand_id: i64,
        as_of: NaiveDate,
        summary: &AdSummary,
    ) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO ads_daily (brand_id, ts_date, active_ads, new_ads_24h)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(brand_id, ts_date) DO UPDATE SET
               active_ads = excluded.active_ads,
               new_ads_24h = excluded.new_ads_24h",
            params![
                brand_id,
                format_date(as_of),
                summary.active_ads,
                summary.new_ads_24h
            ],
        )?;
        Ok(())
    }

    fn persist_leaderboard(
        &mut self,
        entries: &[LeaderboardEntry],
        as_of: NaiveDate,
    ) -> StorageResult<()> {
        let ts_date = format_date(as_of);
        let tx = self.conn.transaction()?;
        for entry in entries {
            tx.execute(
                "INSERT INTO leaders (ts_date, brand_id, score, rank)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(ts_date, brand_id) DO UPDATE SET
                   score = excluded.score,
                   rank = excluded.rank",
                params![ts_date, entry.brand_id, entry.score, entry.rank],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn load_price_rows(&self, as_of: NaiveDate) -> StorageResult<Vec<PriceRow>> {
        let mut stmt = self.conn.prepare(
            "WITH base AS (
                SELECT pr.ts_date,
                       b.id AS brand_id, b.name AS brand_name, b.category,
                       p.id AS product_id, p.title, p.url,
                       v.id AS variant_id, v.sku,
                       pr.price_cents, pr.compare_at_cents, pr.available,
                       LAG(pr.price_cents) OVER (PARTITION BY pr.variant_id ORDER BY pr.ts_date) AS price_1d,
                       LAG(pr.price_cents, 7) OVER (PARTITION BY pr.variant_id ORDER BY pr.ts_date) AS price_7d
                FROM prices pr
                JOIN variants v ON v.id = pr.variant_id
                JOIN products p ON p.id = v.product_id
                JOIN brands b ON b.id = p.brand_id
                WHERE pr.ts_date <= ?1
            )
            SELECT brand_id, brand_name, category, title, url, sku,
                   price_cents, compare_at_cents, available, price_1d, price_7d
            FROM base
            WHERE ts_date = ?1
            ORDER BY brand_id, product_id, variant_id",
        )?;

        let rows = stmt
            .query_map(params![format_date(as_of)], |row| {
                Ok(PriceRow {
                    brand_id: row.get(0)?,
                    brand_name: row.get(1)?,
                    category: row.get(2)?,
                    product_title: row.get(3)?,
                    product_url: row.get(4)?,
                    sku: row.get(5)?,
                    price_cents: row.get(6)?,
                    compare_at_cents: row.get(7)?,
                    available: row.get(8)?,
                    price_1d: row.get(9)?,
                    price_7d: row.get(10)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn load_ad_activity(&self, as_of: NaiveDate) -> StorageResult<HashMap<i64, AdActivity>> {
        let start = as_of - chrono::Duration::days(6);
        let mut stmt = self.conn.prepare(
            "SELECT brand_id, active_ads, new_ads_24h
             FROM ads_daily
             WHERE ts_date BETWEEN ?1 AND ?2
             ORDER BY brand_id, ts_date",
        )?;

        let observations = stmt
            .query_map(params![format_date(start), format_date(as_of)], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut by_brand: HashMap<i64, Vec<(i64, i64)>> = HashMap::new();
        for (brand_id, active_ads, new_ads) in observations {
            by_brand
                .entry(brand_id)
                .or_default()
                .push((active_ads, new_ads));
        }

        // Latest observation in the window counts as "today"; earlier
        // active counts form the trailing window for surge detection.
        let mut activity = HashMap::new();
        for (brand_id, series) in by_brand {
            if let Some(&(active_today, new_ads_24h)) = series.last() {
                let trailing = series[..series.len() - 1]
                    .iter()
                    .map(|&(active, _)| active)
                    .collect();
                activity.insert(
                    brand_id,
                    AdActivity {
                        active_today,
                        new_ads_24h,
                        trailing,
                    },
                );
            }
        }

        Ok(activity)
    }

    fn count_price_rows(&self) -> StorageResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM prices", [], |row| row.get(0))?;
        Ok(count)
    }

    fn count_products(&self) -> StorageResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(count)
    }

    fn count_variants(&self) -> StorageResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM variants", [], |row| row.get(0))?;
        Ok(count)
    }
}

/// Inserts a product or refreshes its title and URL, returning the row ID
fn ensure_product(
    conn: &Connection,
    brand_id: i64,
    product: &ProductRecord,
) -> StorageResult<i64> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM products WHERE brand_id = ?1 AND handle = ?2",
            params![brand_id, product.handle],
            |row| row.get(0),
        )
        .optional()?;

    if let Some(id) = existing {
        conn.execute(
            "UPDATE products SET title = ?1, url = ?2 WHERE id = ?3",
            params![product.title, product.url, id],
        )?;
        return Ok(id);
    }

    conn.execute(
        "INSERT INTO products (brand_id, handle, title, url) VALUES (?1, ?2, ?3, ?4)",
        params![brand_id, product.handle, product.title, product.url],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Inserts a variant or finds the existing one, returning the row ID
///
/// Identity is (product, sku); when the payload carries no usable SKU the
/// canonical option-set JSON stands in as the identity key.
fn ensure_variant(
    conn: &Connection,
    product_id: i64,
    variant: &serde_json::Map<String, Value>,
) -> StorageResult<i64> {
    let sku = variant_sku(variant);
    let options = variant_options(variant)?;

    let existing: Option<i64> = match &sku {
        Some(sku) => conn
            .query_row(
                "SELECT id FROM variants WHERE product_id = ?1 AND sku = ?2",
                params![product_id, sku],
                |row| row.get(0),
            )
            .optional()?,
        None => conn
            .query_row(
                "SELECT id FROM variants WHERE product_id = ?1 AND sku IS NULL AND options = ?2",
                params![product_id, options],
                |row| row.get(0),
            )
            .optional()?,
    };

    if let Some(id) = existing {
        conn.execute(
            "UPDATE variants SET options = ?1 WHERE id = ?2",
            params![options, id],
        )?;
        return Ok(id);
    }

    conn.execute(
        "INSERT INTO variants (product_id, sku, options) VALUES (?1, ?2, ?3)",
        params![product_id, sku, options],
    )?;
    Ok(conn.last_insert_rowid())
}

/// The variant's SKU, treating missing and empty values as absent
fn variant_sku(variant: &serde_json::Map<String, Value>) -> Option<String> {
    variant
        .get("sku")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|sku| !sku.is_empty())
        .map(str::to_string)
}

/// Canonical JSON of the variant's option keys
///
/// Keys beginning with "option" are carried opaquely; serde_json object
/// keys are sorted, so equal option sets serialize identically.
fn variant_options(variant: &serde_json::Map<String, Value>) -> StorageResult<String> {
    let options: serde_json::Map<String, Value> = variant
        .iter()
        .filter(|(key, _)| key.starts_with("option"))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    serde_json::to_string(&Value::Object(options))
        .map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Converts a decimal major-unit price value to integer cents
///
/// Malformed or non-numeric input yields `None` rather than a stored zero
/// or an error; the surrounding record still persists.
fn price_to_cents(value: Option<&Value>) -> Option<i64> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::Number(number)) => number.as_f64().map(|v| (v * 100.0).round() as i64),
        Some(Value::String(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed
                .parse::<f64>()
                .ok()
                .map(|v| (v * 100.0).round() as i64)
        }
        Some(_) => None,
    }
}

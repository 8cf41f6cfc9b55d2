//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Merchwire
//! database. Dates are stored as `YYYY-MM-DD` text, so lexicographic
//! ordering matches chronological ordering.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Tracked brands; domain is the normalized lowercase origin
CREATE TABLE IF NOT EXISTS brands (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    domain TEXT NOT NULL UNIQUE,
    category TEXT NOT NULL,
    ads_account_id TEXT
);

-- Storefront products, keyed by (brand, handle)
CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    brand_id INTEGER NOT NULL REFERENCES brands(id),
    handle TEXT NOT NULL,
    title TEXT NOT NULL,
    url TEXT NOT NULL,
    UNIQUE(brand_id, handle)
);

CREATE INDEX IF NOT EXISTS idx_products_brand ON products(brand_id);

-- Product variants; identity is (product, sku), or the option set when
-- sku is NULL. Enforced procedurally, not by constraint.
CREATE TABLE IF NOT EXISTS variants (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    product_id INTEGER NOT NULL REFERENCES products(id),
    sku TEXT,
    options TEXT NOT NULL DEFAULT '{}'
);

CREATE INDEX IF NOT EXISTS idx_variants_product ON variants(product_id);
CREATE INDEX IF NOT EXISTS idx_variants_sku ON variants(product_id, sku);

-- Daily price observations; at most one row per variant per calendar day
CREATE TABLE IF NOT EXISTS prices (
    variant_id INTEGER NOT NULL REFERENCES variants(id),
    ts_date TEXT NOT NULL,
    currency TEXT NOT NULL,
    price_cents INTEGER,
    compare_at_cents INTEGER,
    available INTEGER NOT NULL DEFAULT 1,
    PRIMARY KEY (variant_id, ts_date)
);

CREATE INDEX IF NOT EXISTS idx_prices_date ON prices(ts_date);

-- Daily ad observations; at most one row per brand per calendar day
CREATE TABLE IF NOT EXISTS ads_daily (
    brand_id INTEGER NOT NULL REFERENCES brands(id),
    ts_date TEXT NOT NULL,
    active_ads INTEGER NOT NULL,
    new_ads_24h INTEGER NOT NULL,
    PRIMARY KEY (brand_id, ts_date)
);

-- Persisted daily leaderboard (top 10 brands)
CREATE TABLE IF NOT EXISTS leaders (
    ts_date TEXT NOT NULL,
    brand_id INTEGER NOT NULL REFERENCES brands(id),
    score REAL NOT NULL,
    rank INTEGER NOT NULL,
    PRIMARY KEY (ts_date, brand_id)
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

//! Daily digest computation
//!
//! Turns the day's stored price and ad observations into the structured
//! digest external collaborators consume: top-10 price movers, the top-10
//! brand leaderboard, and notable surging ad activity. This module only
//! reads the store; orchestration of crawling and persistence lives in the
//! assembler.

mod assembler;

pub use assembler::DigestAssembler;

use crate::signals::{
    ad_surge, discount_percentage, is_mover, percent_change, rank_brands, top_sku_movers,
    BrandSignal, LeaderboardEntry, MoverEntry, SignalThresholds,
};
use crate::storage::Store;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

/// Maximum notable ad-activity entries in a digest
const NOTABLE_ADS: usize = 3;

/// One brand's advertising highlight for the digest
#[derive(Debug, Clone, Serialize)]
pub struct AdHighlight {
    pub brand_name: String,
    pub active_ads: i64,
    pub new_ads_24h: i64,
    pub surge: bool,
}

/// The structured daily digest consumed by rendering and export
///
/// This is the engine's sole output contract: downstream email, chart, and
/// export subsystems must not re-derive signals themselves.
#[derive(Debug, Clone, Serialize)]
pub struct DailyDigest {
    pub as_of: NaiveDate,
    pub movers: Vec<MoverEntry>,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub ads: Vec<AdHighlight>,
}

/// Computes the digest for one observation date from stored time series
///
/// Candidate brands (those with at least one discounted SKU today) are
/// collected in first-appearance order over the store's fixed row order, so
/// ranking output is deterministic. Each brand's leaderboard delta signal
/// comes from its first matching price row, not an aggregate across its
/// SKUs; changing that would alter ranking outcomes.
///
/// # Arguments
///
/// * `store` - The time-series store (read-only access)
/// * `as_of` - The observation date
/// * `thresholds` - Signal thresholds
pub fn compute_daily_digest(
    store: &dyn Store,
    as_of: NaiveDate,
    thresholds: &SignalThresholds,
) -> crate::Result<DailyDigest> {
    let rows = store.load_price_rows(as_of)?;
    let activity = store.load_ad_activity(as_of)?;

    let surges: HashMap<i64, bool> = activity
        .iter()
        .map(|(brand_id, brand_activity)| {
            (
                *brand_id,
                ad_surge(brand_activity.active_today, &brand_activity.trailing, thresholds),
            )
        })
        .collect();

    let mut movers: Vec<MoverEntry> = Vec::new();
    let mut discount_order: Vec<i64> = Vec::new();
    let mut discount_counts: HashMap<i64, i64> = HashMap::new();
    let mut highlight_order: Vec<i64> = Vec::new();
    let mut highlights: HashMap<i64, AdHighlight> = HashMap::new();

    for row in &rows {
        let discount_pct = discount_percentage(row.price_cents, row.compare_at_cents);
        if discount_pct > 0.0 {
            if !discount_counts.contains_key(&row.brand_id) {
                discount_order.push(row.brand_id);
            }
            *discount_counts.entry(row.brand_id).or_insert(0) += 1;
        }

        let delta_7d = percent_change(row.price_cents, row.price_7d);
        if is_mover(delta_7d, thresholds.mover_threshold) {
            movers.push(MoverEntry {
                brand_id: row.brand_id,
                brand_name: row.brand_name.clone(),
                product_title: row.product_title.clone(),
                product_url: row.product_url.clone(),
                sku: row.sku.clone(),
                new_price_cents: row.price_cents,
                old_price_cents: row.price_7d,
                delta_pct_7d: delta_7d,
                discount_pct,
            });
        }

        if let Some(brand_activity) = activity.get(&row.brand_id) {
            if !highlights.contains_key(&row.brand_id) {
                highlight_order.push(row.brand_id);
                highlights.insert(
                    row.brand_id,
                    AdHighlight {
                        brand_name: row.brand_name.clone(),
                        active_ads: brand_activity.active_today,
                        new_ads_24h: brand_activity.new_ads_24h,
                        surge: surges.get(&row.brand_id).copied().unwrap_or(false),
                    },
                );
            }
        }
    }

    let mut candidates: Vec<BrandSignal> = Vec::new();
    for brand_id in &discount_order {
        let Some(example) = rows.iter().find(|row| row.brand_id == *brand_id) else {
            continue;
        };
        let delta = percent_change(example.price_cents, example.price_7d).unwrap_or(0.0);
        let surge = surges.get(brand_id).copied().unwrap_or(false);
        candidates.push(BrandSignal {
            brand_id: *brand_id,
            brand_name: example.brand_name.clone(),
            delta_pct_7d: delta,
            discounted_sku_count: discount_counts.get(brand_id).copied().unwrap_or(0),
            ad_surge: if surge { 1.0 } else { 0.0 },
        });
    }

    let leaderboard = rank_brands(&candidates);
    let top_movers = top_sku_movers(movers);

    let mut notable: Vec<AdHighlight> = highlight_order
        .iter()
        .filter_map(|brand_id| highlights.get(brand_id))
        .filter(|highlight| highlight.surge)
        .cloned()
        .collect();
    notable.sort_by(|a, b| b.active_ads.cmp(&a.active_ads));
    notable.truncate(NOTABLE_ADS);

    Ok(DailyDigest {
        as_of,
        movers: top_movers,
        leaderboard,
        ads: notable,
    })
}

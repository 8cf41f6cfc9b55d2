//! Brand leaderboard and SKU mover ranking
//!
//! The leaderboard combines three normalized signal dimensions with fixed
//! weights; ranking is deterministic: a stable descending sort keeps
//! first-appearance order for tied scores.

use crate::signals::normalized;
use serde::Serialize;

/// Weight of the |7-day price delta| dimension
const WEIGHT_DELTA: f64 = 0.5;
/// Weight of the discounted-SKU-count dimension
const WEIGHT_DISCOUNT: f64 = 0.3;
/// Weight of the ad-surge dimension
const WEIGHT_ADS: f64 = 0.2;

/// Number of leaderboard entries retained
const LEADERBOARD_SIZE: usize = 10;
/// Number of top movers retained
const TOP_MOVERS: usize = 10;

/// Raw signal triple for one candidate brand on one observation date
#[derive(Debug, Clone)]
pub struct BrandSignal {
    pub brand_id: i64,
    pub brand_name: String,

    /// Week-over-week price delta from the brand's example row
    pub delta_pct_7d: f64,

    /// Number of the brand's SKUs discounted today
    pub discounted_sku_count: i64,

    /// Ad-surge indicator as 0.0 / 1.0
    pub ad_surge: f64,
}

/// One leaderboard row: score plus dense 1-based rank
#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub brand_id: i64,
    pub brand_name: String,
    pub score: f64,
    pub rank: u32,
}

/// One price mover: a variant whose week-over-week delta crossed the threshold
#[derive(Debug, Clone, Serialize)]
pub struct MoverEntry {
    pub brand_id: i64,
    pub brand_name: String,
    pub product_title: String,
    pub product_url: String,
    pub sku: Option<String>,
    pub new_price_cents: Option<i64>,
    pub old_price_cents: Option<i64>,
    pub delta_pct_7d: Option<f64>,
    pub discount_pct: f64,
}

/// Ranks candidate brands into the top-10 leaderboard
///
/// Each dimension is min-max normalized across the candidate set
/// independently, then combined with fixed weights. Ties keep the relative
/// order the candidates arrived in.
///
/// # Arguments
///
/// * `candidates` - Signal triples, one per brand with at least one
///   discounted SKU today, in first-appearance order
///
/// # Returns
///
/// At most 10 entries, ordered by descending score, ranks 1..=10
pub fn rank_brands(candidates: &[BrandSignal]) -> Vec<LeaderboardEntry> {
    if candidates.is_empty() {
        return Vec::new();
    }

    let delta_norm = normalized(
        &candidates
            .iter()
            .map(|s| s.delta_pct_7d.abs())
            .collect::<Vec<_>>(),
    );
    let discount_norm = normalized(
        &candidates
            .iter()
            .map(|s| s.discounted_sku_count as f64)
            .collect::<Vec<_>>(),
    );
    let ads_norm = normalized(&candidates.iter().map(|s| s.ad_surge).collect::<Vec<_>>());

    let mut scored: Vec<(&BrandSignal, f64)> = candidates
        .iter()
        .enumerate()
        .map(|(idx, signal)| {
            let score = WEIGHT_DELTA * delta_norm[idx]
                + WEIGHT_DISCOUNT * discount_norm[idx]
                + WEIGHT_ADS * ads_norm[idx];
            (signal, score)
        })
        .collect();

    // sort_by is stable: equal scores keep first-appearance order
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    scored
        .into_iter()
        .take(LEADERBOARD_SIZE)
        .enumerate()
        .map(|(idx, (signal, score))| LeaderboardEntry {
            brand_id: signal.brand_id,
            brand_name: signal.brand_name.clone(),
            score: (score * 10_000.0).round() / 10_000.0,
            rank: idx as u32 + 1,
        })
        .collect()
}

/// Selects the top movers by absolute week-over-week delta
///
/// Entries without a defined delta are dropped; the rest sort by |delta|
/// descending (stable), keeping at most 10.
pub fn top_sku_movers(movers: Vec<MoverEntry>) -> Vec<MoverEntry> {
    let mut defined: Vec<MoverEntry> = movers
        .into_iter()
        .filter(|m| m.delta_pct_7d.is_some())
        .collect();
    defined.sort_by(|a, b| {
        let a_abs = a.delta_pct_7d.unwrap_or(0.0).abs();
        let b_abs = b.delta_pct_7d.unwrap_or(0.0).abs();
        b_abs.partial_cmp(&a_abs).unwrap_or(std::cmp::Ordering::Equal)
    });
    defined.truncate(TOP_MOVERS);
    defined
}

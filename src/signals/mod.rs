//! Pure signal computations over stored time-series rows
//!
//! Every function here is a pure computation: thresholds arrive as an
//! explicit [`SignalThresholds`] value and no ambient process state is read.
//! Prices are integer minor-currency units (cents).

mod ranking;

pub use ranking::{rank_brands, top_sku_movers, BrandSignal, LeaderboardEntry, MoverEntry};

use serde::Deserialize;

/// Tolerance for treating floating-point values as equal
const FLOAT_TOLERANCE: f64 = 1e-9;

/// Thresholds governing signal classification
///
/// Deserializable from the `[signals]` config section; every field carries
/// its documented default so the section may be partial or absent.
#[derive(Debug, Clone, Deserialize)]
pub struct SignalThresholds {
    /// Minimum |week-over-week delta| for a variant to count as a mover
    #[serde(rename = "mover-threshold", default = "default_mover_threshold")]
    pub mover_threshold: f64,

    /// Minimum increase in discount percentage to count as a discount spike
    #[serde(
        rename = "discount-spike-threshold",
        default = "default_discount_spike_threshold"
    )]
    pub discount_spike_threshold: f64,

    /// Active-ad count must reach multiplier x trailing median for a surge
    #[serde(rename = "ad-surge-multiplier", default = "default_ad_surge_multiplier")]
    pub ad_surge_multiplier: f64,

    /// Minimum absolute active-ad increase over the trailing median
    #[serde(rename = "ad-surge-min-delta", default = "default_ad_surge_min_delta")]
    pub ad_surge_min_delta: i64,
}

fn default_mover_threshold() -> f64 {
    0.10
}

fn default_discount_spike_threshold() -> f64 {
    0.10
}

fn default_ad_surge_multiplier() -> f64 {
    2.0
}

fn default_ad_surge_min_delta() -> i64 {
    5
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            mover_threshold: default_mover_threshold(),
            discount_spike_threshold: default_discount_spike_threshold(),
            ad_surge_multiplier: default_ad_surge_multiplier(),
            ad_surge_min_delta: default_ad_surge_min_delta(),
        }
    }
}

/// Relative price change between two observations
///
/// Returns `None` when either observation is absent or the old price is 0.
/// The denominator is clamped to at least 1 cent.
pub fn percent_change(new: Option<i64>, old: Option<i64>) -> Option<f64> {
    match (new, old) {
        (Some(_), Some(0)) | (None, _) | (_, None) => None,
        (Some(new), Some(old)) => Some((new - old) as f64 / old.max(1) as f64),
    }
}

/// Fraction of the compare-at price the current price is discounted by
///
/// Returns 0 unless `0 < price < compare_at`.
pub fn discount_percentage(price: Option<i64>, compare_at: Option<i64>) -> f64 {
    match (price, compare_at) {
        (Some(price), Some(compare_at)) if price > 0 && compare_at > 0 && price < compare_at => {
            (compare_at - price) as f64 / compare_at as f64
        }
        _ => 0.0,
    }
}

/// Whether a week-over-week delta qualifies as a mover
pub fn is_mover(delta_pct_7d: Option<f64>, mover_threshold: f64) -> bool {
    match delta_pct_7d {
        Some(delta) => delta.abs() >= mover_threshold,
        None => false,
    }
}

/// Whether the discount percentage jumped by at least the spike threshold
pub fn discount_spike(previous: f64, current: f64, spike_threshold: f64) -> bool {
    (current - previous) >= spike_threshold
}

/// Whether today's active-ad count sharply exceeds its trailing median
///
/// An empty trailing window can never surge. A zero median falls back to the
/// absolute minimum-delta test alone.
pub fn ad_surge(active_today: i64, trailing: &[i64], thresholds: &SignalThresholds) -> bool {
    if trailing.is_empty() {
        return false;
    }
    let median = median(trailing);
    if median == 0.0 {
        return active_today >= thresholds.ad_surge_min_delta;
    }
    active_today as f64 >= thresholds.ad_surge_multiplier * median
        && active_today as f64 - median >= thresholds.ad_surge_min_delta as f64
}

/// Min-max scales values to [0, 1]
///
/// When all values are equal (within floating tolerance) every output is 0,
/// not 0.5; equal candidates contribute nothing to a ranking dimension.
pub fn normalized(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if (max - min).abs() < FLOAT_TOLERANCE {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - min) / (max - min)).collect()
}

/// The last `days` values of a series
pub fn trailing_window<T>(values: &[T], days: usize) -> &[T] {
    if values.len() <= days {
        values
    } else {
        &values[values.len() - days..]
    }
}

/// Median of an integer series
fn median(values: &[i64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
    } else {
        sorted[mid] as f64
    }
}

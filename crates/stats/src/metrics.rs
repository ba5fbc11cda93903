//! Per-partition metrics.
//!
//! Premiums are stored as fractions on the records; `percent` is the single
//! place they are scaled to percentages.

use cb_auction_core::{AuctionRecord, IndustryStats, PartitionStats};

/// Arithmetic mean of the present values, `None` when there are none.
///
/// Computed as sum over count. A running mean drifts in the last bits, which
/// is enough to flip the second decimal after rounding.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = values
        .into_iter()
        .flatten()
        .fold((0.0_f64, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Round to 2 decimal places, ties to even.
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Fraction to percentage, rounded to 2 decimal places.
#[inline]
pub fn percent(fraction: f64) -> f64 {
    round2(fraction * 100.0)
}

/// Metrics shared by every partition.
pub fn partition_stats(members: &[&AuctionRecord]) -> PartitionStats {
    PartitionStats {
        sample_count: members.len(),
        avg_min_award_price: mean(members.iter().map(|r| r.min_award_price)).map(round2),
        avg_min_premium_pct: mean(members.iter().map(|r| r.min_premium)).map(percent),
    }
}

/// Metrics for an industry partition: the shared set plus mean-clearing figures.
pub fn industry_stats(members: &[&AuctionRecord]) -> IndustryStats {
    IndustryStats {
        base: partition_stats(members),
        avg_award_price: mean(members.iter().map(|r| r.avg_award_price)).map(round2),
        avg_premium_pct: mean(members.iter().map(|r| r.avg_premium)).map(percent),
    }
}

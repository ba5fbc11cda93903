//! Console summary of a statistics run.

use cb_auction_core::{Dimension, Statistics};
use tracing::info;

/// Log partition counts per dimension and one line per trend window.
pub fn log_summary(stats: &Statistics) {
    info!(
        start = %stats.period.start,
        end = %stats.period.end,
        records = stats.period.total_records,
        "data period"
    );

    for dim in Dimension::ALL {
        info!(dimension = dim.key(), partitions = stats.dimensions.partition_count(dim), "dimension");
    }

    for (label, window) in stats.sentiment.iter() {
        info!(
            window = label,
            cases = window.case_count,
            avg_min_premium_pct = window.avg_min_premium_pct,
            trend = %window.trend,
            adjustment = window.adjustment,
            "market sentiment"
        );
    }
}

/// Total number of non-empty partitions across every dimension.
pub fn total_partitions(stats: &Statistics) -> usize {
    Dimension::ALL
        .iter()
        .map(|&dim| stats.dimensions.partition_count(dim))
        .sum()
}

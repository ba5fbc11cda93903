//! Statistics computation for the CB auction statistics system.
//!
//! This crate handles:
//! - Partitioning (discovered categories, range tables, rating groups)
//! - Per-partition metrics (means, percentages, rounding)
//! - The aggregation engine over the eight partitioned dimensions
//! - The recency trend classifier (market sentiment windows)

pub mod metrics;
pub mod partition;
pub mod aggregation;
pub mod trend;
pub mod engine;

pub use aggregation::AggregationEngine;
pub use trend::TrendClassifier;
pub use engine::StatisticsEngine;

//! Aggregation engine.
//!
//! Partitions the auction record set along each dimension and computes
//! per-partition metrics. Every dimension returns its own table; `aggregate`
//! only composes them.

use cb_auction_core::config::{DimensionConfig, RangeBucket};
use cb_auction_core::{
    AuctionRecord, Config, Dimension, DimensionStatistics, Error, IndustryStats, LabeledTable,
    PartitionStats, Result,
};
use tracing::debug;

use crate::metrics::{industry_stats, partition_stats};
use crate::partition::{bucket_by_ranges, group_by_key, group_by_rating};

/// Computes the per-dimension partition tables.
pub struct AggregationEngine {
    dimensions: DimensionConfig,
}

impl AggregationEngine {
    /// Create an aggregation engine from configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            dimensions: config.dimensions.clone(),
        }
    }

    /// Compute every dimension.
    ///
    /// Fails as a whole if any dimension's source field is absent.
    pub fn aggregate(&self, records: &[AuctionRecord]) -> Result<DimensionStatistics> {
        if records.is_empty() {
            return Err(Error::insufficient_data("no auction records to aggregate"));
        }

        Ok(DimensionStatistics {
            industry: self.industry(records)?,
            issue_size: self.ranged(Dimension::IssueSize, records)?,
            paid_in_capital: self.ranged(Dimension::PaidInCapital, records)?,
            tenor: self.tenor(records)?,
            guarantee: self.guarantee(records)?,
            credit_rating: self.credit_rating(records)?,
            conversion_price: self.ranged(Dimension::ConversionPrice, records)?,
            theoretical_price: self.ranged(Dimension::TheoreticalPrice, records)?,
        })
    }

    /// Industry partitions, including mean-clearing metrics.
    pub fn industry(&self, records: &[AuctionRecord]) -> Result<LabeledTable<IndustryStats>> {
        let dim = Dimension::Industry;
        require(dim, dim.field(), records, |r| r.industry.is_some())?;
        require_metrics(dim, records)?;
        require(dim, "avg_award_price", records, |r| r.avg_award_price.is_some())?;
        require(dim, "avg_premium", records, |r| r.avg_premium.is_some())?;

        let table: LabeledTable<IndustryStats> = group_by_key(records, |r| r.industry.as_deref())
            .into_iter()
            .map(|(label, members)| (label.to_string(), industry_stats(&members)))
            .collect();

        debug!(dimension = %dim, partitions = table.len(), "aggregated");
        Ok(table)
    }

    /// Guarantee-status partitions.
    pub fn guarantee(&self, records: &[AuctionRecord]) -> Result<LabeledTable<PartitionStats>> {
        let dim = Dimension::Guarantee;
        require(dim, dim.field(), records, |r| r.guarantee.is_some())?;
        require_metrics(dim, records)?;

        let table: LabeledTable<PartitionStats> = group_by_key(records, |r| r.guarantee.as_deref())
            .into_iter()
            .map(|(label, members)| (label.to_string(), partition_stats(&members)))
            .collect();

        debug!(dimension = %dim, partitions = table.len(), "aggregated");
        Ok(table)
    }

    /// Tenor partitions, ascending by years.
    pub fn tenor(&self, records: &[AuctionRecord]) -> Result<LabeledTable<PartitionStats>> {
        let dim = Dimension::Tenor;
        require(dim, dim.field(), records, |r| r.tenor_years.is_some())?;
        require_metrics(dim, records)?;

        let mut groups = group_by_key(records, |r| r.tenor_years);
        groups.sort_by_key(|(years, _)| *years);

        let table: LabeledTable<PartitionStats> = groups
            .into_iter()
            .map(|(years, members)| {
                (
                    format!("{years}{}", self.dimensions.tenor_suffix),
                    partition_stats(&members),
                )
            })
            .collect();

        debug!(dimension = %dim, partitions = table.len(), "aggregated");
        Ok(table)
    }

    /// Credit-rating group partitions.
    pub fn credit_rating(&self, records: &[AuctionRecord]) -> Result<LabeledTable<PartitionStats>> {
        let dim = Dimension::CreditRating;
        require(dim, dim.field(), records, |r| r.credit_rating.is_some())?;
        require_metrics(dim, records)?;

        let table: LabeledTable<PartitionStats> =
            group_by_rating(records, &self.dimensions.rating_groups)
                .into_iter()
                .map(|(group, members)| (group.label.clone(), partition_stats(&members)))
                .collect();

        debug!(dimension = %dim, partitions = table.len(), "aggregated");
        Ok(table)
    }

    /// Partitions of a range-bucketed dimension.
    ///
    /// Only issue size, paid-in capital, conversion price and theoretical
    /// price have a range table.
    pub fn ranged(&self, dim: Dimension, records: &[AuctionRecord]) -> Result<LabeledTable<PartitionStats>> {
        let buckets = self.range_table(dim).ok_or_else(|| {
            Error::config(format!("dimension {dim} has no range table"))
        })?;
        let value = |r: &AuctionRecord| range_value(dim, r);

        require(dim, dim.field(), records, |r| value(r).is_some())?;
        require_metrics(dim, records)?;

        let table: LabeledTable<PartitionStats> = bucket_by_ranges(records, buckets, value)
            .into_iter()
            .map(|(bucket, members)| (bucket.label.clone(), partition_stats(&members)))
            .collect();

        debug!(dimension = %dim, partitions = table.len(), "aggregated");
        Ok(table)
    }

    fn range_table(&self, dim: Dimension) -> Option<&[RangeBucket]> {
        match dim {
            Dimension::IssueSize => Some(self.dimensions.issue_size.as_slice()),
            Dimension::PaidInCapital => Some(self.dimensions.paid_in_capital.as_slice()),
            Dimension::ConversionPrice => Some(self.dimensions.conversion_price.as_slice()),
            Dimension::TheoreticalPrice => Some(self.dimensions.theoretical_price.as_slice()),
            _ => None,
        }
    }
}

fn range_value(dim: Dimension, record: &AuctionRecord) -> Option<f64> {
    match dim {
        Dimension::IssueSize => record.issue_size,
        Dimension::PaidInCapital => record.paid_in_capital,
        Dimension::ConversionPrice => record.conversion_price,
        Dimension::TheoreticalPrice => record.theoretical_price,
        _ => None,
    }
}

/// Fail with `MissingField` unless at least one record carries the field.
fn require<F>(dim: Dimension, field: &str, records: &[AuctionRecord], present: F) -> Result<()>
where
    F: Fn(&AuctionRecord) -> bool,
{
    if records.iter().any(present) {
        Ok(())
    } else {
        Err(Error::missing_field(dim.key(), field))
    }
}

/// Every dimension reports the lowest-clearing metrics.
fn require_metrics(dim: Dimension, records: &[AuctionRecord]) -> Result<()> {
    require(dim, "min_award_price", records, |r| r.min_award_price.is_some())?;
    require(dim, "min_premium", records, |r| r.min_premium.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use cb_auction_core::CreditRating;
    use chrono::NaiveDate;

    fn record(day: u32, industry: &str, min_premium: f64) -> AuctionRecord {
        AuctionRecord {
            industry: Some(industry.to_string()),
            issue_size: Some(day as f64 * 2.5),
            paid_in_capital: Some(day as f64 * 4.0),
            tenor_years: Some(if day % 2 == 0 { 5 } else { 3 }),
            guarantee: Some(if day % 2 == 0 { "無擔保" } else { "銀行擔保" }.to_string()),
            credit_rating: Some(CreditRating::score((day % 8 + 2) as f64)),
            conversion_price: Some(day as f64 * 30.0),
            theoretical_price: Some(95.0 + day as f64 * 2.0),
            min_award_price: Some(100.0 + day as f64),
            min_premium: Some(min_premium),
            avg_award_price: Some(102.0 + day as f64),
            avg_premium: Some(min_premium + 0.02),
            ..AuctionRecord::new(NaiveDate::from_ymd_opt(2025, 6, day).unwrap())
        }
    }

    fn sample() -> Vec<AuctionRecord> {
        vec![
            record(1, "電子", 0.02),
            record(2, "電子", 0.04),
            record(3, "生技", 0.05),
            record(4, "航運", 0.01),
        ]
    }

    fn engine() -> AggregationEngine {
        AggregationEngine::new(&Config::default())
    }

    #[test]
    fn test_industry_scenario() {
        let table = engine().industry(&sample()).unwrap();

        let labels: Vec<&str> = table.labels().collect();
        assert_eq!(labels, vec!["電子", "生技", "航運"]);

        let electronics = table.get("電子").unwrap();
        assert_eq!(electronics.base.sample_count, 2);
        assert_abs_diff_eq!(electronics.base.avg_min_premium_pct.unwrap(), 3.0, epsilon = 1e-10);
        assert_abs_diff_eq!(electronics.base.avg_min_award_price.unwrap(), 101.5, epsilon = 1e-10);
        assert_abs_diff_eq!(electronics.avg_award_price.unwrap(), 103.5, epsilon = 1e-10);
        assert_abs_diff_eq!(electronics.avg_premium_pct.unwrap(), 5.0, epsilon = 1e-10);
    }

    #[test]
    fn test_sample_counts_sum_to_non_null_count() {
        let mut records = sample();
        records.push(AuctionRecord {
            issue_size: None,
            tenor_years: None,
            guarantee: None,
            ..record(5, "電子", 0.03)
        });
        let stats = engine().aggregate(&records).unwrap();

        let sum = |t: &LabeledTable<PartitionStats>| t.iter().map(|(_, s)| s.sample_count).sum::<usize>();
        assert_eq!(sum(&stats.issue_size), 4);
        assert_eq!(sum(&stats.tenor), 4);
        assert_eq!(sum(&stats.guarantee), 4);
        assert_eq!(sum(&stats.paid_in_capital), 5);
        assert_eq!(sum(&stats.conversion_price), 5);
        assert_eq!(sum(&stats.theoretical_price), 5);
        assert_eq!(
            stats.industry.iter().map(|(_, s)| s.base.sample_count).sum::<usize>(),
            5
        );
    }

    #[test]
    fn test_ranged_buckets_in_table_order_and_empty_omitted() {
        let stats = engine().aggregate(&sample()).unwrap();

        // issue sizes 2.5, 5.0, 7.5, 10.0
        let labels: Vec<&str> = stats.issue_size.labels().collect();
        assert_eq!(labels, vec!["2-5億", "5-10億", "10-15億"]);
        assert_eq!(stats.issue_size.get("5-10億").unwrap().sample_count, 2);
        assert!(!stats.issue_size.contains("<2億"));

        // theoretical prices 97, 99, 101, 103
        let labels: Vec<&str> = stats.theoretical_price.labels().collect();
        assert_eq!(labels, vec!["95-98元", "98-100元", "100-102元", "102-105元"]);
    }

    #[test]
    fn test_tenor_sorted_with_suffix() {
        let stats = engine().aggregate(&sample()).unwrap();
        let labels: Vec<&str> = stats.tenor.labels().collect();
        assert_eq!(labels, vec!["3年", "5年"]);
    }

    #[test]
    fn test_rating_groups() {
        // ratings: day % 8 + 2 -> 3, 4, 5, 6
        let stats = engine().aggregate(&sample()).unwrap();
        let labels: Vec<&str> = stats.credit_rating.labels().collect();
        assert_eq!(labels, vec!["2-3分", "4-5分", "6-7分"]);
        assert_eq!(stats.credit_rating.get("4-5分").unwrap().sample_count, 2);
        assert!(!stats.credit_rating.contains("BBB"));
    }

    #[test]
    fn test_percentages_not_fractions() {
        let stats = engine().aggregate(&sample()).unwrap();
        for (_, s) in stats.issue_size.iter() {
            let pct = s.avg_min_premium_pct.unwrap();
            assert!(pct >= 1.0, "premium {pct} looks like a fraction");
        }
    }

    #[test]
    fn test_missing_field_fails_whole_aggregation() {
        let records: Vec<AuctionRecord> = sample()
            .into_iter()
            .map(|r| AuctionRecord {
                conversion_price: None,
                ..r
            })
            .collect();

        match engine().aggregate(&records) {
            Err(Error::MissingField { dimension, field }) => {
                assert_eq!(dimension, "轉換價");
                assert_eq!(field, "conversion_price");
            }
            other => panic!("expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_metric_field() {
        let records: Vec<AuctionRecord> = sample()
            .into_iter()
            .map(|r| AuctionRecord {
                min_premium: None,
                ..r
            })
            .collect();
        let err = engine().aggregate(&records).unwrap_err();
        assert!(matches!(err, Error::MissingField { ref field, .. } if field == "min_premium"));
    }

    #[test]
    fn test_empty_record_set() {
        let err = engine().aggregate(&[]).unwrap_err();
        assert!(matches!(err, Error::InsufficientData(_)));
    }

    #[test]
    fn test_ranged_rejects_categorical_dimension() {
        assert!(engine().ranged(Dimension::Industry, &sample()).is_err());
    }
}

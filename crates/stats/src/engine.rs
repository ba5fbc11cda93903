//! Statistics engine.
//!
//! Combines the aggregation engine and the trend classifier into the
//! `統計數據` branch of the output document.

use cb_auction_core::{AuctionRecord, Config, DataPeriod, Error, Result, Statistics};
use chrono::NaiveDateTime;
use tracing::info;

use crate::aggregation::AggregationEngine;
use crate::trend::TrendClassifier;

/// Statistics engine.
pub struct StatisticsEngine {
    /// Value written to `資料來源`.
    source_label: String,
    /// Per-dimension partitioning.
    aggregation: AggregationEngine,
    /// Market sentiment windows.
    trend: TrendClassifier,
}

impl StatisticsEngine {
    /// Create a new statistics engine from configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            source_label: config.source.label.clone(),
            aggregation: AggregationEngine::new(config),
            trend: TrendClassifier::new(config),
        }
    }

    /// Compute the full statistics summary.
    ///
    /// `generated_at` is stamped into `更新時間`; the engine never reads the clock.
    pub fn compute(&self, records: &[AuctionRecord], generated_at: NaiveDateTime) -> Result<Statistics> {
        let period = data_period(records)?;
        info!(
            start = %period.start,
            end = %period.end,
            total = period.total_records,
            "computing statistics"
        );

        let dimensions = self.aggregation.aggregate(records)?;
        let sentiment = self.trend.compute(records)?;

        Ok(Statistics {
            source: self.source_label.clone(),
            period,
            updated_at: generated_at,
            dimensions,
            sentiment,
        })
    }
}

/// Date range and size of the record set.
pub fn data_period(records: &[AuctionRecord]) -> Result<DataPeriod> {
    let dates = records.iter().map(|r| r.auction_date);
    let (Some(start), Some(end)) = (dates.clone().min(), dates.max()) else {
        return Err(Error::insufficient_data("no auction records"));
    };
    Ok(DataPeriod {
        start,
        end,
        total_records: records.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use cb_auction_core::{CreditRating, TrendLabel};
    use chrono::NaiveDate;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn record(day: NaiveDate, industry: &str, min_premium: f64) -> AuctionRecord {
        AuctionRecord {
            industry: Some(industry.to_string()),
            issue_size: Some(6.0),
            paid_in_capital: Some(12.0),
            tenor_years: Some(3),
            guarantee: Some("無擔保".to_string()),
            credit_rating: Some(CreditRating::Bbb),
            conversion_price: Some(88.0),
            theoretical_price: Some(101.0),
            min_award_price: Some(104.0),
            min_premium: Some(min_premium),
            avg_award_price: Some(106.0),
            avg_premium: Some(min_premium + 0.02),
            ..AuctionRecord::new(day)
        }
    }

    fn generated_at() -> NaiveDateTime {
        date(11, 4).and_hms_opt(10, 0, 0).unwrap()
    }

    fn sample() -> Vec<AuctionRecord> {
        vec![
            record(date(10, 5), "電子", 0.02),
            record(date(10, 20), "電子", 0.04),
            record(date(3, 1), "生技", 0.06),
            record(date(10, 31), "航運", 0.05),
        ]
    }

    #[test]
    fn test_four_row_scenario() {
        let stats = StatisticsEngine::new(&Config::default())
            .compute(&sample(), generated_at())
            .unwrap();

        assert_eq!(stats.period.start, date(3, 1));
        assert_eq!(stats.period.end, date(10, 31));
        assert_eq!(stats.period.total_records, 4);

        let electronics = stats.dimensions.industry.get("電子").unwrap();
        assert_eq!(electronics.base.sample_count, 2);
        assert_abs_diff_eq!(electronics.base.avg_min_premium_pct.unwrap(), 3.0, epsilon = 1e-10);

        assert_eq!(stats.dimensions.credit_rating.get("BBB").unwrap().sample_count, 4);

        // 30 days back from 10-31: 10-05, 10-20, 10-31 -> 2% | 4%, 5% -> change 2.5
        let month = stats.sentiment.get("近1月").unwrap();
        assert_eq!(month.case_count, 3);
        assert_eq!(month.trend, TrendLabel::StrongRise);
        assert_eq!(stats.sentiment.get("近1年").unwrap().case_count, 4);
    }

    #[test]
    fn test_output_shape() {
        let stats = StatisticsEngine::new(&Config::default())
            .compute(&sample(), generated_at())
            .unwrap();
        let value = serde_json::to_value(&stats).unwrap();

        assert_eq!(value["資料來源"], "04_所有CB競拍資料庫");
        assert_eq!(value["資料期間"]["總筆數"], 4);
        assert_eq!(value["資料期間"]["結束"], "2025-10-31");
        assert_eq!(value["更新時間"], "2025-11-04 10:00:00");

        let dims = value["維度統計"].as_object().unwrap();
        let keys: Vec<&str> = dims.keys().map(String::as_str).collect();
        for key in ["產業", "發行規模", "股本", "年期", "擔保", "信評", "轉換價", "理論價"] {
            assert!(keys.contains(&key), "missing dimension {key}");
        }

        assert_eq!(value["維度統計"]["年期"]["3年"]["樣本數"], 4);
        assert!(value["維度統計"]["發行規模"].get("<2億").is_none());
        assert_eq!(value["市場氛圍"]["近1月"]["趨勢"], "強勢上升");
        assert_eq!(value["市場氛圍"]["近1月"]["開始日期"], "2025-10-01");
    }

    #[test]
    fn test_missing_dimension_aborts_without_partial_output() {
        let records: Vec<AuctionRecord> = sample()
            .into_iter()
            .map(|r| AuctionRecord {
                theoretical_price: None,
                ..r
            })
            .collect();
        let err = StatisticsEngine::new(&Config::default())
            .compute(&records, generated_at())
            .unwrap_err();
        assert!(matches!(err, Error::MissingField { ref dimension, .. } if dimension == "理論價"));
    }

    #[test]
    fn test_empty_input() {
        let err = StatisticsEngine::new(&Config::default())
            .compute(&[], generated_at())
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientData(_)));
    }

    #[test]
    fn test_custom_source_label() {
        let mut config = Config::default();
        config.source.label = "測試來源".to_string();
        let stats = StatisticsEngine::new(&config)
            .compute(&sample(), generated_at())
            .unwrap();
        assert_eq!(stats.source, "測試來源");
    }
}

//! Recency trend classifier (market sentiment).
//!
//! For each trailing window anchored at the latest auction date, the selected
//! records are sorted by date and split by position into an earlier and a
//! later half. The swing in mean lowest-clearing premium between the halves is
//! classified into a direction label plus an advisory price adjustment.

use cb_auction_core::config::{TrendConfig, WindowSpec};
use cb_auction_core::{AuctionRecord, Config, Error, LabeledTable, Result, TrendLabel, TrendWindow};
use chrono::{Days, NaiveDate};
use tracing::debug;

use crate::metrics::{mean, percent};

/// Classifies premium direction over trailing windows.
pub struct TrendClassifier {
    config: TrendConfig,
}

impl TrendClassifier {
    /// Create a classifier from configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.trend.clone(),
        }
    }

    /// Map a half-to-half change (percentage points) to a label and adjustment.
    ///
    /// Thresholds are strict: a change of exactly the strong-rise threshold is
    /// a mild rise.
    pub fn classify(&self, change: f64) -> (TrendLabel, f64) {
        let c = &self.config;
        if change > c.strong_rise_above {
            (TrendLabel::StrongRise, c.strong_rise_adjustment)
        } else if change > c.mild_rise_above {
            (TrendLabel::MildRise, c.mild_rise_adjustment)
        } else if change > c.flat_above {
            (TrendLabel::Flat, c.flat_adjustment)
        } else if change > c.mild_decline_above {
            (TrendLabel::MildDecline, c.mild_decline_adjustment)
        } else {
            (TrendLabel::SharpDecline, c.sharp_decline_adjustment)
        }
    }

    /// Compute every configured window. Empty windows are omitted.
    pub fn compute(&self, records: &[AuctionRecord]) -> Result<LabeledTable<TrendWindow>> {
        let anchor = records
            .iter()
            .map(|r| r.auction_date)
            .max()
            .ok_or_else(|| Error::insufficient_data("no auction records for trend windows"))?;

        if !records.iter().any(|r| r.min_premium.is_some()) {
            return Err(Error::missing_field("市場氛圍", "min_premium"));
        }

        Ok(self.compute_anchored(records, anchor))
    }

    /// Compute every configured window against an explicit anchor date.
    pub fn compute_anchored(&self, records: &[AuctionRecord], anchor: NaiveDate) -> LabeledTable<TrendWindow> {
        let mut table = LabeledTable::new();
        for spec in &self.config.windows {
            match self.window(records, anchor, spec) {
                Some(window) => {
                    debug!(
                        window = %spec.label,
                        cases = window.case_count,
                        trend = %window.trend,
                        "trend window"
                    );
                    table.insert(spec.label.clone(), window);
                }
                None => debug!(window = %spec.label, "trend window empty, omitted"),
            }
        }
        table
    }

    /// Evaluate one window anchored at `anchor`.
    pub fn window(&self, records: &[AuctionRecord], anchor: NaiveDate, spec: &WindowSpec) -> Option<TrendWindow> {
        let start_date = anchor
            .checked_sub_days(Days::new(spec.days.max(0) as u64))
            .unwrap_or(NaiveDate::MIN);

        let mut selected: Vec<&AuctionRecord> = records
            .iter()
            .filter(|r| r.auction_date >= start_date)
            .collect();
        if selected.is_empty() {
            return None;
        }

        // Stable: same-day auctions keep their input order.
        selected.sort_by_key(|r| r.auction_date);

        let mid = selected.len() / 2;
        let (first, second) = selected.split_at(mid);
        let change = half_mean_pct(second) - half_mean_pct(first);
        let (trend, adjustment) = self.classify(change);

        Some(TrendWindow {
            case_count: selected.len(),
            avg_min_premium_pct: mean(selected.iter().map(|r| r.min_premium)).map(percent),
            trend,
            adjustment,
            start_date,
        })
    }
}

/// Mean premium of a half in percent, or 0 when the half has nothing to average.
fn half_mean_pct(half: &[&AuctionRecord]) -> f64 {
    mean(half.iter().map(|r| r.min_premium))
        .map(|m| m * 100.0)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(day: NaiveDate, min_premium: f64) -> AuctionRecord {
        AuctionRecord {
            min_premium: Some(min_premium),
            ..AuctionRecord::new(day)
        }
    }

    fn classifier() -> TrendClassifier {
        TrendClassifier::new(&Config::default())
    }

    #[test]
    fn test_classify_bands() {
        let c = classifier();
        assert_eq!(c.classify(4.0), (TrendLabel::StrongRise, 0.7));
        assert_eq!(c.classify(1.5), (TrendLabel::MildRise, 0.4));
        assert_eq!(c.classify(0.0), (TrendLabel::Flat, 0.0));
        assert_eq!(c.classify(-1.5), (TrendLabel::MildDecline, -0.3));
        assert_eq!(c.classify(-5.0), (TrendLabel::SharpDecline, -0.6));
    }

    #[test]
    fn test_classify_thresholds_are_strict() {
        let c = classifier();
        assert_eq!(c.classify(2.0).0, TrendLabel::MildRise);
        assert_eq!(c.classify(1.0).0, TrendLabel::Flat);
        assert_eq!(c.classify(-1.0).0, TrendLabel::MildDecline);
        assert_eq!(c.classify(-2.0).0, TrendLabel::SharpDecline);
    }

    #[test]
    fn test_thirty_day_window_scenario() {
        // Sorted by date: first half = [0], second half = [1, 2].
        let records = vec![
            record(date(2025, 10, 20), 0.05),
            record(date(2025, 10, 5), 0.01),
            record(date(2025, 10, 31), 0.05),
        ];
        let spec = WindowSpec::new(30, "近1月");
        let window = classifier()
            .window(&records, date(2025, 10, 31), &spec)
            .unwrap();

        assert_eq!(window.case_count, 3);
        assert_eq!(window.trend, TrendLabel::StrongRise);
        assert_abs_diff_eq!(window.adjustment, 0.7, epsilon = 1e-12);
        assert_abs_diff_eq!(window.avg_min_premium_pct.unwrap(), 3.67, epsilon = 1e-10);
        assert_eq!(window.start_date, date(2025, 10, 1));
    }

    #[test]
    fn test_cutoff_is_inclusive() {
        let records = vec![record(date(2025, 10, 1), 0.02), record(date(2025, 10, 31), 0.02)];
        let window = classifier()
            .window(&records, date(2025, 10, 31), &WindowSpec::new(30, "近1月"))
            .unwrap();
        assert_eq!(window.case_count, 2);
    }

    #[test]
    fn test_single_record_window_uses_zero_for_empty_half() {
        // mid = 0: first half empty (0), second half 1.5% -> change 1.5.
        let records = vec![record(date(2025, 10, 31), 0.015)];
        let window = classifier()
            .window(&records, date(2025, 10, 31), &WindowSpec::new(30, "近1月"))
            .unwrap();
        assert_eq!(window.case_count, 1);
        assert_eq!(window.trend, TrendLabel::MildRise);
    }

    #[test]
    fn test_half_without_premiums_counts_as_zero() {
        let records = vec![
            AuctionRecord::new(date(2025, 10, 1)),
            AuctionRecord::new(date(2025, 10, 2)),
            record(date(2025, 10, 30), 0.015),
            record(date(2025, 10, 31), 0.015),
        ];
        let window = classifier()
            .window(&records, date(2025, 10, 31), &WindowSpec::new(30, "近1月"))
            .unwrap();

        // first half has members but no premiums: 1.5 - 0 = 1.5
        assert_eq!(window.case_count, 4);
        assert_eq!(window.trend, TrendLabel::MildRise);
        assert_abs_diff_eq!(window.adjustment, 0.4, epsilon = 1e-12);
        assert_abs_diff_eq!(window.avg_min_premium_pct.unwrap(), 1.5, epsilon = 1e-10);
    }

    #[test]
    fn test_anchor_is_latest_date_not_today() {
        let records = vec![record(date(2020, 1, 10), 0.03), record(date(2020, 1, 20), 0.03)];
        let table = classifier().compute(&records).unwrap();
        let month = table.get("近1月").unwrap();
        assert_eq!(month.case_count, 2);
        assert_eq!(month.start_date, date(2019, 12, 21));
        assert_eq!(month.trend, TrendLabel::Flat);
    }

    #[test]
    fn test_empty_windows_are_omitted() {
        let records = vec![record(date(2023, 1, 1), 0.02), record(date(2025, 6, 1), 0.04)];

        // Anchored well after every record: only the one-year window reaches back.
        let table = classifier().compute_anchored(&records, date(2026, 3, 1));
        let labels: Vec<&str> = table.labels().collect();
        assert_eq!(labels, vec!["近1年"]);
        assert_eq!(table.get("近1年").unwrap().case_count, 1);

        let table = classifier().compute_anchored(&records, date(2027, 1, 1));
        assert!(table.is_empty());
        assert!(!table.contains("近1年"));
    }

    #[test]
    fn test_empty_window_is_none() {
        let records = vec![record(date(2023, 1, 1), 0.02)];
        let spec = WindowSpec::new(365, "近1年");
        assert!(classifier().window(&records, date(2025, 1, 1), &spec).is_none());
        assert!(classifier().window(&[], date(2025, 1, 1), &spec).is_none());
    }

    #[test]
    fn test_window_order_follows_config() {
        let records = vec![record(date(2025, 1, 1), 0.02), record(date(2025, 10, 31), 0.04)];
        let table = classifier().compute(&records).unwrap();
        let labels: Vec<&str> = table.labels().collect();
        assert_eq!(labels, vec!["近1月", "近3月", "近6月", "近1年"]);
        assert_eq!(table.get("近1年").unwrap().case_count, 2);
        assert_eq!(table.get("近6月").unwrap().case_count, 1);
    }

    #[test]
    fn test_missing_premiums_is_error() {
        let records = vec![AuctionRecord::new(date(2025, 1, 1))];
        let err = classifier().compute(&records).unwrap_err();
        assert!(matches!(err, Error::MissingField { .. }));
    }

    #[test]
    fn test_empty_record_set_is_error() {
        let err = classifier().compute(&[]).unwrap_err();
        assert!(matches!(err, Error::InsufficientData(_)));
    }
}

//! Configuration structures for the CB auction statistics system.
//!
//! Defaults reproduce the production range table, rating groups and trend
//! windows. A TOML file may override any section; omitted sections keep their
//! defaults.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::CreditRating;

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source labelling.
    pub source: SourceConfig,
    /// Partition definitions for the fixed dimensions.
    pub dimensions: DimensionConfig,
    /// Trailing-window sentiment configuration.
    pub trend: TrendConfig,
    /// Output document configuration.
    pub output: OutputConfig,
}

impl Config {
    /// Parse a TOML document and validate it.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(text).map_err(|e| Error::config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.source.auction_sheet.trim().is_empty() || self.source.instrument_sheet.trim().is_empty() {
            return Err(Error::config("source: sheet names must not be empty"));
        }

        validate_ranges("dimensions.issue_size", &self.dimensions.issue_size)?;
        validate_ranges("dimensions.paid_in_capital", &self.dimensions.paid_in_capital)?;
        validate_ranges("dimensions.conversion_price", &self.dimensions.conversion_price)?;
        validate_ranges("dimensions.theoretical_price", &self.dimensions.theoretical_price)?;

        for group in &self.dimensions.rating_groups {
            if group.label.trim().is_empty() {
                return Err(Error::config("rating group with empty label"));
            }
        }
        ensure_unique_labels(
            "dimensions.rating_groups",
            self.dimensions.rating_groups.iter().map(|g| g.label.as_str()),
        )?;

        self.trend.validate()
    }
}

/// Source labelling and workbook sheet names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Value written to `資料來源`.
    pub label: String,
    /// Worksheet holding the auction history.
    pub auction_sheet: String,
    /// Worksheet holding instrument names. A dated copy (`<name>_YYYYMMDD`)
    /// is accepted when the exact name is absent.
    pub instrument_sheet: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            label: "04_所有CB競拍資料庫".to_string(),
            auction_sheet: "04_所有CB競拍資料庫".to_string(),
            instrument_sheet: "00_CB代號名稱過濾及掛牌高低".to_string(),
        }
    }
}

/// One half-open range bucket: `lower <= v < upper`.
///
/// A missing `lower` means unbounded below, a missing `upper` unbounded above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeBucket {
    pub label: String,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl RangeBucket {
    /// Create a bucket.
    pub fn new(label: impl Into<String>, lower: Option<f64>, upper: Option<f64>) -> Self {
        Self {
            label: label.into(),
            lower,
            upper,
        }
    }

    /// Whether `value` falls inside the bucket.
    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        self.lower.map_or(true, |lo| value >= lo) && self.upper.map_or(true, |hi| value < hi)
    }
}

/// Build a bucket table from ascending edges.
///
/// `edges = [2, 5]` with labels `["<2", "2-5", ">=5"]` gives `(-inf,2) [2,5) [5,inf)`.
fn buckets_from_edges(edges: &[f64], labels: &[&str]) -> Vec<RangeBucket> {
    debug_assert_eq!(labels.len(), edges.len() + 1);
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let lower = if i == 0 { None } else { Some(edges[i - 1]) };
            let upper = edges.get(i).copied();
            RangeBucket::new(*label, lower, upper)
        })
        .collect()
}

fn validate_ranges(name: &str, buckets: &[RangeBucket]) -> Result<()> {
    if buckets.is_empty() {
        return Err(Error::config(format!("{name}: no buckets defined")));
    }
    let last = buckets.len() - 1;
    for (i, bucket) in buckets.iter().enumerate() {
        if bucket.label.trim().is_empty() {
            return Err(Error::config(format!("{name}: bucket {i} has an empty label")));
        }
        if i > 0 && bucket.lower.is_none() {
            return Err(Error::config(format!(
                "{name}: only the first bucket may be unbounded below ('{}')",
                bucket.label
            )));
        }
        if i < last && bucket.upper.is_none() {
            return Err(Error::config(format!(
                "{name}: only the last bucket may be unbounded above ('{}')",
                bucket.label
            )));
        }
        if let (Some(lo), Some(hi)) = (bucket.lower, bucket.upper) {
            if lo >= hi {
                return Err(Error::config(format!(
                    "{name}: bucket '{}' has lower >= upper",
                    bucket.label
                )));
            }
        }
        if i > 0 && buckets[i - 1].upper != bucket.lower {
            return Err(Error::config(format!(
                "{name}: bucket '{}' does not start where '{}' ends",
                bucket.label,
                buckets[i - 1].label
            )));
        }
    }
    ensure_unique_labels(name, buckets.iter().map(|b| b.label.as_str()))
}

/// Labels become JSON keys, so a repeat would overwrite an earlier entry.
fn ensure_unique_labels<'a>(name: &str, labels: impl IntoIterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for label in labels {
        if !seen.insert(label) {
            return Err(Error::config(format!("{name}: duplicate label '{label}'")));
        }
    }
    Ok(())
}

/// Membership rule of a credit-rating group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RatingRule {
    /// Rating equals exactly one of the two scores. Scores strictly between
    /// them are not members.
    Pair { low: f64, high: f64 },
    /// Rating is the "BBB" category.
    Bbb,
}

/// A named credit-rating group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingGroup {
    pub label: String,
    #[serde(flatten)]
    pub rule: RatingRule,
}

impl RatingGroup {
    /// Group matching exactly `low` and `high`.
    pub fn pair(label: impl Into<String>, low: f64, high: f64) -> Self {
        Self {
            label: label.into(),
            rule: RatingRule::Pair { low, high },
        }
    }

    /// Group matching the "BBB" category.
    pub fn bbb() -> Self {
        Self {
            label: CreditRating::BBB.to_string(),
            rule: RatingRule::Bbb,
        }
    }

    /// Whether `rating` belongs to the group.
    pub fn matches(&self, rating: &CreditRating) -> bool {
        match (&self.rule, rating) {
            (RatingRule::Pair { low, high }, CreditRating::Score(s)) => {
                let s = s.into_inner();
                s == *low || s == *high
            }
            (RatingRule::Bbb, CreditRating::Bbb) => true,
            _ => false,
        }
    }
}

/// Partition definitions for the fixed (non-discovered) dimensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionConfig {
    /// Issue size buckets (億).
    pub issue_size: Vec<RangeBucket>,
    /// Paid-in capital buckets (億).
    pub paid_in_capital: Vec<RangeBucket>,
    /// Conversion price buckets (元).
    pub conversion_price: Vec<RangeBucket>,
    /// Theoretical price buckets (元).
    pub theoretical_price: Vec<RangeBucket>,
    /// Credit rating groups.
    pub rating_groups: Vec<RatingGroup>,
    /// Suffix appended to tenor labels.
    pub tenor_suffix: String,
}

impl Default for DimensionConfig {
    fn default() -> Self {
        Self {
            issue_size: buckets_from_edges(
                &[2.0, 5.0, 10.0, 15.0, 20.0],
                &["<2億", "2-5億", "5-10億", "10-15億", "15-20億", ">20億"],
            ),
            paid_in_capital: buckets_from_edges(
                &[3.0, 6.0, 10.0, 15.0, 20.0],
                &["<3億", "3-6億", "6-10億", "10-15億", "15-20億", ">20億"],
            ),
            conversion_price: buckets_from_edges(
                &[20.0, 50.0, 100.0, 150.0, 200.0],
                &["<20元", "20-50元", "50-100元", "100-150元", "150-200元", ">200元"],
            ),
            theoretical_price: buckets_from_edges(
                &[85.0, 90.0, 95.0, 98.0, 100.0, 102.0, 105.0, 110.0],
                &[
                    "<85元", "85-90元", "90-95元", "95-98元", "98-100元", "100-102元", "102-105元",
                    "105-110元", ">110元",
                ],
            ),
            rating_groups: vec![
                RatingGroup::pair("2-3分", 2.0, 3.0),
                RatingGroup::pair("4-5分", 4.0, 5.0),
                RatingGroup::pair("6-7分", 6.0, 7.0),
                RatingGroup::pair("8-9分", 8.0, 9.0),
                RatingGroup::bbb(),
            ],
            tenor_suffix: "年".to_string(),
        }
    }
}

/// One trailing window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSpec {
    /// Window length in days.
    pub days: i64,
    /// Output key under `市場氛圍`.
    pub label: String,
}

impl WindowSpec {
    pub fn new(days: i64, label: impl Into<String>) -> Self {
        Self {
            days,
            label: label.into(),
        }
    }
}

/// Trend classification configuration.
///
/// `change` (second-half mean premium minus first-half, in percentage points)
/// is compared with strict `>` against the thresholds in descending order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Trailing windows, in output order.
    pub windows: Vec<WindowSpec>,
    /// `change > strong_rise_above` is a strong rise.
    pub strong_rise_above: f64,
    /// `change > mild_rise_above` is a mild rise.
    pub mild_rise_above: f64,
    /// `change > flat_above` is flat.
    pub flat_above: f64,
    /// `change > mild_decline_above` is a mild decline; anything lower is sharp.
    pub mild_decline_above: f64,
    pub strong_rise_adjustment: f64,
    pub mild_rise_adjustment: f64,
    pub flat_adjustment: f64,
    pub mild_decline_adjustment: f64,
    pub sharp_decline_adjustment: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            windows: vec![
                WindowSpec::new(30, "近1月"),
                WindowSpec::new(90, "近3月"),
                WindowSpec::new(180, "近6月"),
                WindowSpec::new(365, "近1年"),
            ],
            strong_rise_above: 2.0,
            mild_rise_above: 1.0,
            flat_above: -1.0,
            mild_decline_above: -2.0,
            strong_rise_adjustment: 0.7,
            mild_rise_adjustment: 0.4,
            flat_adjustment: 0.0,
            mild_decline_adjustment: -0.3,
            sharp_decline_adjustment: -0.6,
        }
    }
}

impl TrendConfig {
    fn validate(&self) -> Result<()> {
        if self.windows.is_empty() {
            return Err(Error::config("trend.windows: at least one window is required"));
        }
        for w in &self.windows {
            if w.days < 0 {
                return Err(Error::config(format!(
                    "trend.windows: '{}' has a negative length",
                    w.label
                )));
            }
            if w.label.trim().is_empty() {
                return Err(Error::config("trend.windows: empty label"));
            }
        }
        ensure_unique_labels("trend.windows", self.windows.iter().map(|w| w.label.as_str()))?;
        let thresholds = [
            self.strong_rise_above,
            self.mild_rise_above,
            self.flat_above,
            self.mild_decline_above,
        ];
        if thresholds.windows(2).any(|t| t[0] <= t[1]) {
            return Err(Error::config(
                "trend thresholds must be strictly descending (strong > mild > flat > decline)",
            ));
        }
        Ok(())
    }
}

/// Output document configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output path.
    pub path: String,
    /// Pretty-print (two-space indent).
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "cb_data_integrated.json".to_string(),
            pretty: true,
        }
    }
}

//! Core data types for the CB auction statistics system.
//!
//! Input records (`AuctionRecord`, `InstrumentRecord`) and the output
//! fragments produced by the statistics engine. Output types serialize with the
//! key names the presentation layer reads.

use chrono::{NaiveDate, NaiveDateTime};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize, Serializer};

use crate::table::LabeledTable;

/// Timestamp format used for `更新時間`.
pub const UPDATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A partitioned dimension of the auction record set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Industry,
    IssueSize,
    PaidInCapital,
    Tenor,
    Guarantee,
    CreditRating,
    ConversionPrice,
    TheoreticalPrice,
}

impl Dimension {
    /// All partitioned dimensions, in output order.
    pub const ALL: [Dimension; 8] = [
        Dimension::Industry,
        Dimension::IssueSize,
        Dimension::PaidInCapital,
        Dimension::Tenor,
        Dimension::Guarantee,
        Dimension::CreditRating,
        Dimension::ConversionPrice,
        Dimension::TheoreticalPrice,
    ];

    /// Output key under `維度統計`.
    pub fn key(self) -> &'static str {
        match self {
            Dimension::Industry => "產業",
            Dimension::IssueSize => "發行規模",
            Dimension::PaidInCapital => "股本",
            Dimension::Tenor => "年期",
            Dimension::Guarantee => "擔保",
            Dimension::CreditRating => "信評",
            Dimension::ConversionPrice => "轉換價",
            Dimension::TheoreticalPrice => "理論價",
        }
    }

    /// Name of the `AuctionRecord` field the dimension partitions on.
    pub fn field(self) -> &'static str {
        match self {
            Dimension::Industry => "industry",
            Dimension::IssueSize => "issue_size",
            Dimension::PaidInCapital => "paid_in_capital",
            Dimension::Tenor => "tenor_years",
            Dimension::Guarantee => "guarantee",
            Dimension::CreditRating => "credit_rating",
            Dimension::ConversionPrice => "conversion_price",
            Dimension::TheoreticalPrice => "theoretical_price",
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Credit rating of an issuance.
///
/// Source sheets mix numeric scores (normally integers 2-9) with the text
/// category "BBB".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RatingRepr", into = "RatingRepr")]
pub enum CreditRating {
    /// Numeric score.
    Score(OrderedFloat<f64>),
    /// The "BBB" category.
    Bbb,
    /// Any other text value.
    Other(String),
}

impl CreditRating {
    /// Text form of the `Bbb` category.
    pub const BBB: &'static str = "BBB";

    /// Build a numeric rating.
    pub fn score(value: f64) -> Self {
        CreditRating::Score(OrderedFloat(value))
    }

    /// Interpret a raw cell value.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw == Self::BBB {
            return CreditRating::Bbb;
        }
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => CreditRating::score(v),
            _ => CreditRating::Other(raw.to_string()),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RatingRepr {
    Score(f64),
    Text(String),
}

impl From<RatingRepr> for CreditRating {
    fn from(repr: RatingRepr) -> Self {
        match repr {
            RatingRepr::Score(v) => CreditRating::score(v),
            RatingRepr::Text(s) => CreditRating::parse(&s),
        }
    }
}

impl From<CreditRating> for RatingRepr {
    fn from(rating: CreditRating) -> Self {
        match rating {
            CreditRating::Score(s) => RatingRepr::Score(s.into_inner()),
            CreditRating::Bbb => RatingRepr::Text(CreditRating::BBB.to_string()),
            CreditRating::Other(s) => RatingRepr::Text(s),
        }
    }
}

/// One completed competitive auction for one CB issuance.
///
/// Premiums are fractions (0.03 = 3%). Everything except the auction date may
/// be null in the source sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionRecord {
    /// Auction (bid opening) date.
    pub auction_date: NaiveDate,
    /// Industry label.
    pub industry: Option<String>,
    /// Issue size (hundred-million).
    pub issue_size: Option<f64>,
    /// Paid-in capital (hundred-million).
    pub paid_in_capital: Option<f64>,
    /// Tenor in years.
    pub tenor_years: Option<u32>,
    /// Guarantee status (descriptive label).
    pub guarantee: Option<String>,
    /// Credit rating.
    pub credit_rating: Option<CreditRating>,
    /// Conversion price.
    pub conversion_price: Option<f64>,
    /// Theoretical price.
    pub theoretical_price: Option<f64>,
    /// Lowest clearing price.
    pub min_award_price: Option<f64>,
    /// Premium of the lowest clearing price (fraction).
    pub min_premium: Option<f64>,
    /// Mean clearing price.
    pub avg_award_price: Option<f64>,
    /// Premium of the mean clearing price (fraction).
    pub avg_premium: Option<f64>,
}

impl AuctionRecord {
    /// Create a record with only the auction date set.
    pub fn new(auction_date: NaiveDate) -> Self {
        Self {
            auction_date,
            industry: None,
            issue_size: None,
            paid_in_capital: None,
            tenor_years: None,
            guarantee: None,
            credit_rating: None,
            conversion_price: None,
            theoretical_price: None,
            min_award_price: None,
            min_premium: None,
            avg_award_price: None,
            avg_premium: None,
        }
    }
}

/// Static registry entry for one listed CB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentRecord {
    /// Underlying stock code.
    #[serde(rename = "股票代號")]
    pub stock_code: i64,
    /// CB code.
    #[serde(rename = "代號")]
    pub code: i64,
    /// Display name.
    #[serde(rename = "名稱")]
    pub name: String,
    /// Listing-day high.
    #[serde(rename = "掛牌最高")]
    pub listing_high: Option<f64>,
    /// Listing-day low.
    #[serde(rename = "掛牌最低")]
    pub listing_low: Option<f64>,
    /// Declared use of proceeds.
    #[serde(rename = "資金用途")]
    pub use_of_proceeds: Option<String>,
}

/// Metrics for one partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionStats {
    /// Number of member records.
    #[serde(rename = "樣本數")]
    pub sample_count: usize,
    /// Mean lowest clearing price, 2dp.
    #[serde(rename = "平均最低得標", skip_serializing_if = "Option::is_none")]
    pub avg_min_award_price: Option<f64>,
    /// Mean lowest-clearing premium in percent, 2dp.
    #[serde(rename = "平均最低溢價", skip_serializing_if = "Option::is_none")]
    pub avg_min_premium_pct: Option<f64>,
}

/// Metrics for one industry partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryStats {
    #[serde(flatten)]
    pub base: PartitionStats,
    /// Mean of mean clearing prices, 2dp.
    #[serde(rename = "平均得標價", skip_serializing_if = "Option::is_none")]
    pub avg_award_price: Option<f64>,
    /// Mean of mean-clearing premiums in percent, 2dp.
    #[serde(rename = "平均溢價", skip_serializing_if = "Option::is_none")]
    pub avg_premium_pct: Option<f64>,
}

/// Per-dimension partition tables (`維度統計`).
#[derive(Debug, Clone, Default, Serialize)]
pub struct DimensionStatistics {
    #[serde(rename = "產業")]
    pub industry: LabeledTable<IndustryStats>,
    #[serde(rename = "發行規模")]
    pub issue_size: LabeledTable<PartitionStats>,
    #[serde(rename = "股本")]
    pub paid_in_capital: LabeledTable<PartitionStats>,
    #[serde(rename = "年期")]
    pub tenor: LabeledTable<PartitionStats>,
    #[serde(rename = "擔保")]
    pub guarantee: LabeledTable<PartitionStats>,
    #[serde(rename = "信評")]
    pub credit_rating: LabeledTable<PartitionStats>,
    #[serde(rename = "轉換價")]
    pub conversion_price: LabeledTable<PartitionStats>,
    #[serde(rename = "理論價")]
    pub theoretical_price: LabeledTable<PartitionStats>,
}

impl DimensionStatistics {
    /// Number of partitions emitted for a dimension.
    pub fn partition_count(&self, dimension: Dimension) -> usize {
        match dimension {
            Dimension::Industry => self.industry.len(),
            Dimension::IssueSize => self.issue_size.len(),
            Dimension::PaidInCapital => self.paid_in_capital.len(),
            Dimension::Tenor => self.tenor.len(),
            Dimension::Guarantee => self.guarantee.len(),
            Dimension::CreditRating => self.credit_rating.len(),
            Dimension::ConversionPrice => self.conversion_price.len(),
            Dimension::TheoreticalPrice => self.theoretical_price.len(),
        }
    }
}

/// Direction of premium levels within a trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendLabel {
    #[serde(rename = "強勢上升")]
    StrongRise,
    #[serde(rename = "溫和上升")]
    MildRise,
    #[serde(rename = "平穩")]
    Flat,
    #[serde(rename = "溫和下降")]
    MildDecline,
    #[serde(rename = "急劇下降")]
    SharpDecline,
}

impl TrendLabel {
    /// Display text.
    pub fn as_str(self) -> &'static str {
        match self {
            TrendLabel::StrongRise => "強勢上升",
            TrendLabel::MildRise => "溫和上升",
            TrendLabel::Flat => "平穩",
            TrendLabel::MildDecline => "溫和下降",
            TrendLabel::SharpDecline => "急劇下降",
        }
    }
}

impl std::fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Market sentiment over one trailing window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendWindow {
    /// Records in the window.
    #[serde(rename = "案例數")]
    pub case_count: usize,
    /// Mean lowest-clearing premium over the whole window, percent, 2dp.
    #[serde(rename = "平均最低溢價", skip_serializing_if = "Option::is_none")]
    pub avg_min_premium_pct: Option<f64>,
    /// Classified direction.
    #[serde(rename = "趨勢")]
    pub trend: TrendLabel,
    /// Advisory premium adjustment for pricing suggestions.
    #[serde(rename = "建議調整")]
    pub adjustment: f64,
    /// First date covered by the window.
    #[serde(rename = "開始日期")]
    pub start_date: NaiveDate,
}

/// Date range and size of the input record set (`資料期間`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPeriod {
    #[serde(rename = "開始")]
    pub start: NaiveDate,
    #[serde(rename = "結束")]
    pub end: NaiveDate,
    #[serde(rename = "總筆數")]
    pub total_records: usize,
}

/// The complete statistics branch of the output document (`統計數據`).
#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    #[serde(rename = "資料來源")]
    pub source: String,
    #[serde(rename = "資料期間")]
    pub period: DataPeriod,
    #[serde(rename = "更新時間", serialize_with = "serialize_updated_at")]
    pub updated_at: NaiveDateTime,
    #[serde(rename = "維度統計")]
    pub dimensions: DimensionStatistics,
    #[serde(rename = "市場氛圍")]
    pub sentiment: LabeledTable<TrendWindow>,
}

fn serialize_updated_at<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&ts.format(UPDATED_AT_FORMAT))
}

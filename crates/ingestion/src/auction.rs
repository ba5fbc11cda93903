//! Loader for the auction history sheet (`04_所有CB競拍資料庫`).

use std::fs::File;
use std::io::Read;
use std::path::Path;

use cb_auction_core::{AuctionRecord, CreditRating, Result};
use calamine::{Data, Range};
use csv::StringRecord;
use tracing::info;

use crate::parse::{parse_date, parse_opt_f64, parse_opt_u32};
use crate::sheet::{read_sheet, HeaderMap, LoadedSheet};
use crate::workbook::read_range;

/// Sheet name used in error messages.
pub const AUCTION_SHEET: &str = "04_所有CB競拍資料庫";

/// Column headers of the auction sheet.
pub mod columns {
    pub const AUCTION_DATE: &str = "開標日期";
    pub const INDUSTRY: &str = "產業分類";
    pub const ISSUE_SIZE: &str = "發行規模";
    pub const PAID_IN_CAPITAL: &str = "股本";
    pub const TENOR: &str = "年期";
    pub const GUARANTEE: &str = "擔保";
    pub const CREDIT_RATING: &str = "信評";
    pub const CONVERSION_PRICE: &str = "轉換價";
    pub const THEORETICAL_PRICE: &str = "理論價";
    pub const MIN_AWARD_PRICE: &str = "最低得標";
    pub const MIN_PREMIUM: &str = "最低溢價";
    pub const AVG_AWARD_PRICE: &str = "平均得標";
    pub const AVG_PREMIUM: &str = "平均溢價";

    /// Every column the statistics need.
    pub const REQUIRED: [&str; 13] = [
        AUCTION_DATE,
        INDUSTRY,
        ISSUE_SIZE,
        PAID_IN_CAPITAL,
        TENOR,
        GUARANTEE,
        CREDIT_RATING,
        CONVERSION_PRICE,
        THEORETICAL_PRICE,
        MIN_AWARD_PRICE,
        MIN_PREMIUM,
        AVG_AWARD_PRICE,
        AVG_PREMIUM,
    ];
}

/// Loads `AuctionRecord`s from the auction sheet (CSV export or workbook).
pub struct AuctionLoader;

impl AuctionLoader {
    /// Load from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<LoadedSheet<AuctionRecord>> {
        let sheet = read_sheet(reader, AUCTION_SHEET, &columns::REQUIRED, parse_row)?;
        info!(
            rows_read = sheet.rows_read,
            rows_used = sheet.rows_used(),
            "loaded auction records"
        );
        Ok(sheet)
    }

    /// Load from a CSV file path.
    pub fn from_path(path: &Path) -> Result<LoadedSheet<AuctionRecord>> {
        Self::from_reader(File::open(path)?)
    }

    /// Load from a worksheet read out of a workbook.
    pub fn from_range(range: &Range<Data>) -> Result<LoadedSheet<AuctionRecord>> {
        let sheet = read_range(range, AUCTION_SHEET, &columns::REQUIRED, parse_row)?;
        info!(
            rows_read = sheet.rows_read,
            rows_used = sheet.rows_used(),
            "loaded auction records from workbook"
        );
        Ok(sheet)
    }
}

fn parse_row(record: &StringRecord, headers: &HeaderMap) -> std::result::Result<AuctionRecord, String> {
    use columns::*;

    let auction_date = parse_date(headers.require(record, AUCTION_DATE)?)?;
    let f64_col = |name: &str| parse_opt_f64(headers.get(record, name));

    Ok(AuctionRecord {
        auction_date,
        industry: headers.get(record, INDUSTRY).map(str::to_string),
        issue_size: f64_col(ISSUE_SIZE),
        paid_in_capital: f64_col(PAID_IN_CAPITAL),
        tenor_years: parse_opt_u32(headers.get(record, TENOR)),
        guarantee: headers.get(record, GUARANTEE).map(str::to_string),
        credit_rating: headers.get(record, CREDIT_RATING).map(CreditRating::parse),
        conversion_price: f64_col(CONVERSION_PRICE),
        theoretical_price: f64_col(THEORETICAL_PRICE),
        min_award_price: f64_col(MIN_AWARD_PRICE),
        min_premium: f64_col(MIN_PREMIUM),
        avg_award_price: f64_col(AVG_AWARD_PRICE),
        avg_premium: f64_col(AVG_PREMIUM),
    })
}

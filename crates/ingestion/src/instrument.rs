//! Loader for the instrument name sheet (`00_CB代號名稱過濾及掛牌高低`).

use std::fs::File;
use std::io::Read;
use std::path::Path;

use cb_auction_core::{InstrumentRecord, Result};
use calamine::{Data, Range};
use csv::StringRecord;
use tracing::info;

use crate::parse::{parse_code, parse_opt_f64};
use crate::sheet::{read_sheet, HeaderMap, LoadedSheet};
use crate::workbook::read_range;

/// Sheet name used in error messages.
pub const INSTRUMENT_SHEET: &str = "00_CB代號名稱過濾及掛牌高低";

/// Column headers of the instrument sheet.
pub mod columns {
    pub const STOCK_CODE: &str = "股票代號";
    pub const CODE: &str = "代號";
    pub const NAME: &str = "名稱";
    pub const LISTING_HIGH: &str = "掛牌最高";
    pub const LISTING_LOW: &str = "掛牌最低";
    pub const USE_OF_PROCEEDS: &str = "資金用途";

    pub const REQUIRED: [&str; 6] = [STOCK_CODE, CODE, NAME, LISTING_HIGH, LISTING_LOW, USE_OF_PROCEEDS];
}

/// Loads `InstrumentRecord`s from the instrument sheet (CSV export or workbook).
pub struct InstrumentLoader;

impl InstrumentLoader {
    /// Load from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<LoadedSheet<InstrumentRecord>> {
        let sheet = read_sheet(reader, INSTRUMENT_SHEET, &columns::REQUIRED, parse_row)?;
        info!(
            rows_read = sheet.rows_read,
            rows_used = sheet.rows_used(),
            "loaded instrument records"
        );
        Ok(sheet)
    }

    /// Load from a CSV file path.
    pub fn from_path(path: &Path) -> Result<LoadedSheet<InstrumentRecord>> {
        Self::from_reader(File::open(path)?)
    }

    /// Load from a worksheet read out of a workbook.
    pub fn from_range(range: &Range<Data>) -> Result<LoadedSheet<InstrumentRecord>> {
        let sheet = read_range(range, INSTRUMENT_SHEET, &columns::REQUIRED, parse_row)?;
        info!(
            rows_read = sheet.rows_read,
            rows_used = sheet.rows_used(),
            "loaded instrument records from workbook"
        );
        Ok(sheet)
    }
}

fn parse_row(record: &StringRecord, headers: &HeaderMap) -> std::result::Result<InstrumentRecord, String> {
    use columns::*;

    Ok(InstrumentRecord {
        stock_code: parse_code(headers.require(record, STOCK_CODE)?)?,
        code: parse_code(headers.require(record, CODE)?)?,
        name: headers.require(record, NAME)?.to_string(),
        listing_high: parse_opt_f64(headers.get(record, LISTING_HIGH)),
        listing_low: parse_opt_f64(headers.get(record, LISTING_LOW)),
        use_of_proceeds: headers.get(record, USE_OF_PROCEEDS).map(str::to_string),
    })
}

//! Cell-level value coercion.
//!
//! Spreadsheet exports are loose about formatting: dates may carry a time part,
//! numbers may carry thousands separators, premiums may be written as
//! percentages, and integer columns may come through as `5.0`. Unusable cells
//! become `None` rather than failing the row.

use chrono::{NaiveDate, NaiveDateTime};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Parse a date cell.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    let s = s.trim();
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected YYYY-MM-DD, YYYY/MM/DD or YYYYMMDD (optionally with a time)."
    ))
}

/// Parse a decimal cell. A trailing `%` divides by 100.
pub fn parse_opt_f64(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    let (body, scale) = match s.strip_suffix('%') {
        Some(body) => (body.trim(), 0.01),
        None => (s, 1.0),
    };
    let cleaned: String = body.chars().filter(|c| *c != ',').collect();
    let v = cleaned.parse::<f64>().ok()? * scale;
    if v.is_finite() {
        Some(v)
    } else {
        None
    }
}

/// Parse a non-negative integral cell, accepting integral floats such as `5.0`.
pub fn parse_opt_u32(s: Option<&str>) -> Option<u32> {
    let s = s?.trim();
    if let Ok(v) = s.parse::<u32>() {
        return Some(v);
    }
    let v = parse_opt_f64(Some(s))?;
    if v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 {
        Some(v as u32)
    } else {
        None
    }
}

/// Parse a code cell (stock or CB code), accepting integral floats.
pub fn parse_code(s: &str) -> Result<i64, String> {
    let s = s.trim();
    if let Ok(v) = s.parse::<i64>() {
        return Ok(v);
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 => Ok(v as i64),
        _ => Err(format!("Invalid code '{s}'.")),
    }
}

/// Normalize a header cell: trim and strip a UTF-8 BOM.
pub fn normalize_header_name(name: &str) -> String {
    // Excel writes a BOM before the first header of UTF-8 CSVs.
    name.trim().trim_start_matches('\u{feff}').trim().to_string()
}

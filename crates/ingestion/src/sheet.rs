//! Shared sheet reading.
//!
//! Both source sheets go through the same steps: read headers, check the
//! required columns, then hand each record to a row parser. Rows the parser
//! rejects are collected as `RowError`s instead of aborting the load.

use std::collections::HashMap;
use std::io::Read;

use cb_auction_core::{Error, Result};
use csv::StringRecord;
use tracing::{debug, warn};

use crate::parse::normalize_header_name;

/// A row that could not be used.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    /// 1-based line (CSV) or row (workbook) where the record starts.
    pub line: usize,
    pub message: String,
}

impl From<RowError> for Error {
    fn from(e: RowError) -> Self {
        Error::row(e.line, e.message)
    }
}

/// Result of loading one sheet.
#[derive(Debug, Clone)]
pub struct LoadedSheet<T> {
    /// Parsed records, in file order.
    pub records: Vec<T>,
    /// Rows that were skipped.
    pub row_errors: Vec<RowError>,
    /// Data rows read (excluding the header).
    pub rows_read: usize,
}

impl<T> LoadedSheet<T> {
    /// Number of rows kept.
    pub fn rows_used(&self) -> usize {
        self.records.len()
    }

    /// Fail on the first skipped row instead of dropping it.
    pub fn into_strict(self) -> Result<Self> {
        match self.row_errors.first() {
            Some(first) => Err(first.clone().into()),
            None => Ok(self),
        }
    }
}

/// Column lookup for one sheet.
pub struct HeaderMap {
    columns: HashMap<String, usize>,
}

impl HeaderMap {
    fn new(headers: &StringRecord) -> Self {
        let columns = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (normalize_header_name(name), idx))
            .collect();
        Self { columns }
    }

    fn ensure_columns(&self, sheet: &str, required: &[&str]) -> Result<()> {
        for name in required {
            if !self.columns.contains_key(*name) {
                return Err(Error::missing_field(sheet, *name));
            }
        }
        Ok(())
    }

    /// Non-empty trimmed cell, if the column exists.
    pub fn get<'a>(&self, record: &'a StringRecord, name: &str) -> Option<&'a str> {
        let idx = self.columns.get(name)?;
        record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
    }

    /// Non-empty trimmed cell, or a row-level message.
    pub fn require<'a>(&self, record: &'a StringRecord, name: &str) -> std::result::Result<&'a str, String> {
        self.get(record, name)
            .ok_or_else(|| format!("Missing required value: `{name}`"))
    }
}

/// Read a CSV sheet, validating `required` headers and parsing each row.
pub fn read_sheet<R, T, F>(reader: R, sheet: &str, required: &[&str], parse_row: F) -> Result<LoadedSheet<T>>
where
    R: Read,
    F: FnMut(&StringRecord, &HeaderMap) -> std::result::Result<T, String>,
{
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let rows = reader.records().enumerate().map(|(idx, result)| match result {
        Ok(record) => (record_line(record.position(), idx), Ok(record)),
        Err(e) => (record_line(e.position(), idx), Err(format!("CSV parse error: {e}"))),
    });

    collect_rows(sheet, &headers, required, rows, parse_row)
}

/// Line where a record starts; a quoted cell may span several lines.
fn record_line(position: Option<&csv::Position>, idx: usize) -> usize {
    // Without a position, assume one line per record after the header.
    position.map_or(idx + 2, |p| p.line() as usize)
}

/// Validate `required` against `headers`, then parse every `(line, row)`.
///
/// Shared by the CSV and workbook readers.
pub fn collect_rows<I, T, F>(
    sheet: &str,
    headers: &StringRecord,
    required: &[&str],
    rows: I,
    mut parse_row: F,
) -> Result<LoadedSheet<T>>
where
    I: IntoIterator<Item = (usize, std::result::Result<StringRecord, String>)>,
    F: FnMut(&StringRecord, &HeaderMap) -> std::result::Result<T, String>,
{
    let headers = HeaderMap::new(headers);
    headers.ensure_columns(sheet, required)?;

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (line, row) in rows {
        rows_read += 1;
        match row.and_then(|record| parse_row(&record, &headers)) {
            Ok(parsed) => records.push(parsed),
            Err(message) => {
                warn!(sheet, line, %message, "skipping row");
                row_errors.push(RowError { line, message });
            }
        }
    }

    if records.is_empty() {
        return Err(Error::insufficient_data(format!(
            "sheet {sheet}: no usable rows ({rows_read} read)"
        )));
    }

    debug!(sheet, rows_read, rows_used = records.len(), skipped = row_errors.len(), "sheet loaded");

    Ok(LoadedSheet {
        records,
        row_errors,
        rows_read,
    })
}

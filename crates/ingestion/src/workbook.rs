//! Workbook input (`.xlsx`, `.xls`, `.ods`).
//!
//! Worksheets are looked up by name and their cells rendered to text, so rows
//! go through the same header map and row parsers as the CSV exports.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{open_workbook_auto, Data, DataType, Range, Reader, Sheets};
use cb_auction_core::{Error, Result};
use csv::StringRecord;
use tracing::{debug, info};

use crate::sheet::{collect_rows, HeaderMap, LoadedSheet};

/// An open workbook holding the source sheets.
pub struct Workbook {
    sheets: Sheets<BufReader<File>>,
}

impl std::fmt::Debug for Workbook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workbook").finish_non_exhaustive()
    }
}

impl Workbook {
    /// Open a workbook, detecting the format from the extension.
    pub fn open(path: &Path) -> Result<Self> {
        let sheets = open_workbook_auto(path)?;
        info!(path = %path.display(), sheets = sheets.sheet_names().len(), "workbook opened");
        Ok(Self { sheets })
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names()
    }

    /// The worksheet called `name`, or its newest dated copy (`name_YYYYMMDD`).
    pub fn sheet(&mut self, name: &str) -> Result<Range<Data>> {
        let names = self.sheets.sheet_names();
        let resolved = resolve_sheet_name(&names, name)
            .ok_or_else(|| {
                Error::data(format!(
                    "workbook has no sheet named '{name}' (found: {})",
                    names.join(", ")
                ))
            })?
            .to_string();
        debug!(requested = name, sheet = %resolved, "reading worksheet");
        Ok(self.sheets.worksheet_range(&resolved)?)
    }
}

/// Exact match first, then the greatest `wanted_<suffix>` name.
pub fn resolve_sheet_name<'a>(names: &'a [String], wanted: &str) -> Option<&'a str> {
    if let Some(exact) = names.iter().find(|n| n.as_str() == wanted) {
        return Some(exact.as_str());
    }
    names
        .iter()
        .filter(|n| n.strip_prefix(wanted).is_some_and(|rest| rest.starts_with('_')))
        .map(String::as_str)
        .max()
}

/// Parse a worksheet whose first row holds the headers.
///
/// Blank rows are skipped. Row numbers in `RowError`s are worksheet rows.
pub fn read_range<T, F>(range: &Range<Data>, sheet: &str, required: &[&str], parse_row: F) -> Result<LoadedSheet<T>>
where
    F: FnMut(&StringRecord, &HeaderMap) -> std::result::Result<T, String>,
{
    let first_row = range.start().map_or(0, |(row, _)| row as usize);
    let mut rows = range.rows().enumerate();

    let headers = match rows.next() {
        Some((_, cells)) => to_record(cells),
        None => {
            return Err(Error::insufficient_data(format!("sheet {sheet}: worksheet is empty")));
        }
    };

    let records = rows
        .filter(|(_, cells)| cells.iter().any(|c| !matches!(c, Data::Empty)))
        .map(|(idx, cells)| (first_row + idx + 1, Ok(to_record(cells))));

    collect_rows(sheet, &headers, required, records, parse_row)
}

fn to_record(cells: &[Data]) -> StringRecord {
    cells.iter().map(cell_text).collect()
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Float(v) => v.to_string(),
        Data::Int(v) => v.to_string(),
        Data::Bool(v) => v.to_string(),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default(),
    }
}

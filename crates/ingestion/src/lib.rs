//! Data ingestion and normalization for the CB auction statistics system.
//!
//! This crate handles:
//! - Reading the auction and instrument sheets from a workbook or CSV exports
//! - Required-column validation (fatal)
//! - Cell coercion (dates, decimals, percentages, integral codes)
//! - Row-level error collection for unusable rows

pub mod auction;
pub mod instrument;
pub mod parse;
pub mod sheet;
pub mod workbook;

pub use auction::AuctionLoader;
pub use instrument::InstrumentLoader;
pub use sheet::{LoadedSheet, RowError};
pub use workbook::Workbook;

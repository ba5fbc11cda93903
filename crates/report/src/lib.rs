//! Output assembly for the CB auction statistics system.
//!
//! This crate handles:
//! - The instrument registry (`CB資料庫`)
//! - Merging statistics and registry into one document
//! - Writing the document as UTF-8 JSON
//! - Logging a run summary

pub mod document;
pub mod registry;
pub mod summary;
pub mod writer;

pub use document::IntegratedDocument;
pub use registry::InstrumentRegistry;
pub use summary::log_summary;
pub use writer::write_json;

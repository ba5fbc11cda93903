//! Core types and configuration for the CB auction statistics system.
//!
//! This crate provides shared types used across all other crates:
//! - Auction and instrument records
//! - Output fragments (partition metrics, trend windows, statistics)
//! - Configuration structures (range tables, rating groups, trend windows)
//! - Common error types

pub mod config;
pub mod error;
pub mod table;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use table::LabeledTable;
pub use types::*;

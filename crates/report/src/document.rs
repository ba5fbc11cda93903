//! Integrated output document.

use cb_auction_core::Statistics;
use serde::Serialize;

use crate::registry::InstrumentRegistry;

/// The file consumed by the presentation layer: statistics plus registry.
#[derive(Debug, Clone, Serialize)]
pub struct IntegratedDocument {
    #[serde(rename = "統計數據")]
    pub statistics: Statistics,
    #[serde(rename = "CB資料庫")]
    pub registry: InstrumentRegistry,
}

impl IntegratedDocument {
    pub fn assemble(statistics: Statistics, registry: InstrumentRegistry) -> Self {
        Self { statistics, registry }
    }
}

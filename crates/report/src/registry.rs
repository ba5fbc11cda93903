//! Instrument registry (`CB資料庫`).

use cb_auction_core::{InstrumentRecord, LabeledTable};
use serde::Serialize;
use tracing::{debug, info};

/// Lookup table from CB code to its static metadata.
///
/// Serialized as a JSON object keyed by the decimal code, in sheet order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct InstrumentRegistry {
    entries: LabeledTable<InstrumentRecord>,
}

impl InstrumentRegistry {
    /// Build the registry from loaded instrument rows.
    ///
    /// A code seen twice keeps its first position but takes the later row.
    pub fn build<I>(records: I) -> Self
    where
        I: IntoIterator<Item = InstrumentRecord>,
    {
        let mut entries = LabeledTable::new();
        let mut replaced = 0usize;
        for record in records {
            let code = record.code.to_string();
            if entries.insert(code.clone(), record).is_some() {
                debug!(code = %code, "duplicate instrument code, later row wins");
                replaced += 1;
            }
        }
        info!(instruments = entries.len(), replaced, "instrument registry built");
        Self { entries }
    }

    pub fn get(&self, code: i64) -> Option<&InstrumentRecord> {
        self.entries.get(&code.to_string())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered codes in sheet order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.entries.labels()
    }
}

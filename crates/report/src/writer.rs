//! JSON file writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use cb_auction_core::Result;
use serde::Serialize;
use tracing::info;

/// Serialize `doc` to `path` as UTF-8 JSON, returning the file size in bytes.
///
/// Non-ASCII text is written as-is. `pretty` selects two-space indentation.
pub fn write_json<T: Serialize>(path: &Path, doc: &T, pretty: bool) -> Result<u64> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    if pretty {
        serde_json::to_writer_pretty(&mut writer, doc)?;
    } else {
        serde_json::to_writer(&mut writer, doc)?;
    }
    writer.flush()?;

    let bytes = std::fs::metadata(path)?.len();
    info!(path = %path.display(), bytes, "document written");
    Ok(bytes)
}

//! JSON-Lines output

use crate::output::Record;
use crate::ScrapeError;
use std::io::Write;

/// Writes one compact JSON object per record, one record per line
pub fn write_jsonl<W: Write>(mut writer: W, records: &[Record]) -> Result<(), ScrapeError> {
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

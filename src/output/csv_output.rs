//! CSV output

use crate::output::Record;
use crate::ScrapeError;
use std::collections::BTreeSet;
use std::io::Write;

/// Writes records as CSV
///
/// The header is the sorted union of every key seen across all records; a key
/// missing from a record renders as an empty cell. No records means no output
/// at all, not even a header.
pub fn write_csv<W: Write>(writer: W, records: &[Record]) -> Result<(), ScrapeError> {
    if records.is_empty() {
        return Ok(());
    }

    let header: Vec<&str> = records
        .iter()
        .flat_map(|record| record.keys())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(&header)?;

    for record in records {
        csv_writer.write_record(header.iter().map(|key| record.get(key).unwrap_or("")))?;
    }

    csv_writer.flush()?;
    Ok(())
}

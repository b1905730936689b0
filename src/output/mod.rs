//! Output module for persisting scraped records
//!
//! This module handles:
//! - The record type shared by successful and failed fetches
//! - CSV and JSON-Lines encodings
//! - Timestamped output paths for watch mode
//! - Per-pass statistics

mod csv_output;
mod jsonl;
mod record;
pub mod stats;

pub use csv_output::write_csv;
pub use jsonl::write_jsonl;
pub use record::{utc_timestamp, Record, ERROR_KEY, TIMESTAMP_KEY, URL_KEY};
pub use stats::PassStatistics;

use crate::config::OutputFormat;
use crate::ScrapeError;
use chrono::{DateTime, Utc};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Writes a batch of records to `path`, replacing any existing file
///
/// Missing parent directories are created first.
pub fn write_records(path: &Path, format: OutputFormat, records: &[Record]) -> Result<(), ScrapeError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let writer = BufWriter::new(File::create(path)?);
    match format {
        OutputFormat::Csv => write_csv(writer, records),
        OutputFormat::JsonLines => write_jsonl(writer, records),
    }
}

/// Derives the per-pass output path used in watch mode
///
/// `out/data.csv` becomes `out/data_20240101_120000.csv`.
pub fn timestamped_path(path: &Path, at: DateTime<Utc>) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut file_name = format!("{}_{}", stem, at.format("%Y%m%d_%H%M%S"));
    if let Some(ext) = path.extension() {
        file_name.push('.');
        file_name.push_str(&ext.to_string_lossy());
    }
    path.with_file_name(file_name)
}

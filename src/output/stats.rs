//! Per-pass statistics
//!
//! Computed from the records of a single pass and logged when the pass ends.

use crate::output::Record;
use std::collections::BTreeMap;
use std::fmt;

/// Summary of one scraping pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassStatistics {
    /// Records produced (one per attempted URL)
    pub total: usize,

    /// Records carrying extracted fields
    pub succeeded: usize,

    /// Error records grouped by failure kind (`robots`, `bad_status`, ...)
    pub failures: BTreeMap<String, usize>,
}

impl PassStatistics {
    pub fn from_records(records: &[Record]) -> Self {
        let mut stats = Self {
            total: records.len(),
            ..Self::default()
        };

        for record in records {
            match record.error() {
                Some(error) => {
                    let kind = error.split(':').next().unwrap_or(error);
                    *stats.failures.entry(kind.to_string()).or_insert(0) += 1;
                }
                None => stats.succeeded += 1,
            }
        }

        stats
    }

    pub fn failed(&self) -> usize {
        self.total - self.succeeded
    }

    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.succeeded as f64 / self.total as f64) * 100.0
        }
    }

    /// Emits the summary through `tracing`
    pub fn log(&self, pass: u64) {
        tracing::info!(
            "Pass {} finished: {} records, {} ok, {} failed ({:.1}% success)",
            pass,
            self.total,
            self.succeeded,
            self.failed(),
            self.success_rate()
        );
        for (kind, count) in &self.failures {
            tracing::debug!("  {}: {}", kind, count);
        }
    }
}

impl fmt::Display for PassStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} succeeded", self.succeeded, self.total)?;
        if !self.failures.is_empty() {
            let parts: Vec<String> = self
                .failures
                .iter()
                .map(|(kind, count)| format!("{}={}", kind, count))
                .collect();
            write!(f, " ({})", parts.join(", "))?;
        }
        Ok(())
    }
}

//! Parsing statistics and result structures for E-Prime tables

use serde::Serialize;

/// Parsed rows with basic statistics
#[derive(Debug, Clone)]
pub struct ParseResult<T> {
    /// Successfully parsed trial records, in file order
    pub trials: Vec<T>,

    /// Basic parsing statistics
    pub stats: ParseStats,
}

/// Simple parsing statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseStats {
    /// Total number of data rows encountered
    pub total_records: usize,

    /// Number of rows turned into trials
    pub trials_parsed: usize,

    /// Number of rows dropped due to errors
    pub records_skipped: usize,

    /// List of row errors for reporting
    pub errors: Vec<String>,
}

impl ParseStats {
    /// Create new empty statistics
    pub fn new() -> Self {
        Self {
            total_records: 0,
            trials_parsed: 0,
            records_skipped: 0,
            errors: Vec::new(),
        }
    }

    /// Record a dropped row; `record` is 1-based
    pub fn record_skipped(&mut self, record: usize, reason: impl std::fmt::Display) {
        self.records_skipped += 1;
        self.errors.push(format!("Record {}: {}", record, reason));
    }

    /// Calculate success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_records == 0 {
            0.0
        } else {
            (self.trials_parsed as f64 / self.total_records as f64) * 100.0
        }
    }

    /// Check if parsing was mostly successful (>90% success rate)
    pub fn is_successful(&self) -> bool {
        self.success_rate() > 90.0
    }
}

impl Default for ParseStats {
    fn default() -> Self {
        Self::new()
    }
}

//! Reader for E-Prime "table" exports
//!
//! E-Prime writes one row per trial to a tab-delimited text file whose first
//! line names the columns. Column names vary between experiment versions
//! (`Problem.RT[Trial]` vs `Problem.RT`), rows can be ragged, and individual
//! cells are sometimes blank when a procedure was skipped. This module turns
//! such a file into typed rows while keeping conversions going past bad rows.
//!
//! ## Architecture
//!
//! - [`table`] - File reading and the row parsing loop
//! - [`column_mapping`] - Header lookup with fallback chains
//! - [`field_parsers`] - Typed field extraction with missing/invalid classification
//! - [`subject`] - Subject identifiers derived from the log file name
//! - [`stats`] - Parsing statistics and result structures
//!
//! ## Usage
//!
//! ```rust,no_run
//! use eprime2spm::app::services::eprime_table::{field_parsers, EprimeTable};
//!
//! # fn example() -> eprime2spm::Result<()> {
//! let table = EprimeTable::from_path(std::path::Path::new("subject-01.txt"))?;
//! let onset = table.column(&["Problem.OnsetTime[Trial]", "Problem.OnsetTime"])?;
//!
//! let result = table.parse_rows(|record| field_parsers::parse_int(record, &onset));
//! println!("Parsed {} of {} rows", result.stats.trials_parsed, result.stats.total_records);
//! # Ok(())
//! # }
//! ```

pub mod column_mapping;
pub mod field_parsers;
pub mod stats;
pub mod subject;
pub mod table;

#[cfg(test)]
pub mod tests;

// Re-export main types for easy access
pub use column_mapping::{Column, ColumnMapping};
pub use field_parsers::{FieldError, FieldResult};
pub use stats::{ParseResult, ParseStats};
pub use subject::{PartIndex, SubjectRule};
pub use table::EprimeTable;

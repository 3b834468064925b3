//! Tab-delimited E-Prime table reading and the row parsing loop

use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

use super::column_mapping::{Column, ColumnMapping};
use super::field_parsers::FieldResult;
use super::stats::{ParseResult, ParseStats};
use super::subject::file_name;
use crate::{Error, Result};
use csv::{ReaderBuilder, StringRecord, Trim};

/// An E-Prime table held in memory
///
/// Every cell is trimmed. Rows may be shorter than the header; that only
/// becomes an error for the row when a study asks for a missing cell.
#[derive(Debug, Clone)]
pub struct EprimeTable {
    mapping: ColumnMapping,
    rows: Vec<StringRecord>,
}

impl EprimeTable {
    /// Read a table from disk
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = file_name(path)
            .map(str::to_string)
            .unwrap_or_else(|_| path.display().to_string());

        let file = std::fs::File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::file_not_found(path.display().to_string())
            } else {
                Error::io(format!("Failed to open {}", path.display()), e)
            }
        })?;

        Self::from_reader(file, name)
    }

    /// Read a table from any reader; `source` names it in diagnostics
    pub fn from_reader<R: Read>(reader: R, source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(b'\t')
            .quoting(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|e| {
                Error::csv_parsing(&source, "Failed to read header row", Some(e))
            })?
            .clone();

        if headers.iter().all(str::is_empty) {
            return Err(Error::table_format(&source, "missing header row"));
        }

        let mapping = ColumnMapping::analyze(&headers, &source);

        let mut rows = Vec::new();
        for (line, result) in csv_reader.records().enumerate() {
            let record = result.map_err(|e| {
                Error::csv_parsing(&source, format!("Unreadable row {}", line + 1), Some(e))
            })?;
            rows.push(record);
        }

        debug!(
            "{}: {} columns, {} rows",
            source,
            mapping.headers.len(),
            rows.len()
        );

        Ok(Self { mapping, rows })
    }

    /// File name the table was read from
    pub fn source(&self) -> &str {
        &self.mapping.source
    }

    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    pub fn rows(&self) -> &[StringRecord] {
        &self.rows
    }

    /// Resolve a required column through its fallback chain
    pub fn column(&self, candidates: &[&str]) -> Result<Column> {
        self.mapping.resolve(candidates)
    }

    /// Resolve an optional column through its fallback chain
    pub fn optional_column(&self, candidates: &[&str]) -> Option<Column> {
        self.mapping.resolve_optional(candidates)
    }

    /// Run `parse` over every data row, dropping the rows it rejects
    ///
    /// Rejected rows are logged and recorded as `Record N: reason`, where N
    /// counts data rows from 1.
    pub fn parse_rows<T, F>(&self, mut parse: F) -> ParseResult<T>
    where
        F: FnMut(&StringRecord) -> FieldResult<T>,
    {
        let mut stats = ParseStats::new();
        let mut trials = Vec::with_capacity(self.rows.len());

        for record in &self.rows {
            stats.total_records += 1;

            match parse(record) {
                Ok(trial) => {
                    trials.push(trial);
                    stats.trials_parsed += 1;
                }
                Err(e) => {
                    warn!(
                        "{}: skipping record {}: {}",
                        self.source(),
                        stats.total_records,
                        e
                    );
                    stats.record_skipped(stats.total_records, e);
                }
            }
        }

        ParseResult { trials, stats }
    }
}

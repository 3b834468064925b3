//! Widening of EEG trigger codes
//!
//! Amplifier exports mark an event with a trigger code on a single sample.
//! Some analysis tools need the code held for a while, so every sample where
//! a listed code appears is stretched over the following samples.

use crate::{Error, Result};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::io::{Read, Write};
use tracing::{debug, info};

/// Name of the trigger column
pub const TRIGGER_COLUMN: &str = "Trigger";

/// How far each trigger is stretched
#[derive(Debug, Clone, PartialEq)]
pub struct WidenSpec {
    /// Trigger codes to widen, processed in order
    pub triggers: Vec<f64>,
    /// Sampling rate (Hz)
    pub fs: u32,
    /// Hold time (s)
    pub change_length: u32,
}

impl WidenSpec {
    /// Samples following a start that take the start's code
    pub fn length(&self) -> usize {
        self.fs as usize * self.change_length as usize
    }
}

/// Result of widening one file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidenSummary {
    pub rows: usize,
    pub starts: usize,
    pub rows_changed: usize,
}

fn cell_value(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok()
}

/// Widen triggers in `headers`/`rows` in place
///
/// For each trigger in turn, the rows holding it are found first and then
/// each such row and the `length` rows after it are set to the row's text.
/// Rows past the end of the table are ignored.
pub fn widen_rows(
    headers: &StringRecord,
    rows: &mut [StringRecord],
    spec: &WidenSpec,
    source: &str,
) -> Result<WidenSummary> {
    let column = headers
        .iter()
        .position(|h| h.trim() == TRIGGER_COLUMN)
        .ok_or_else(|| Error::missing_column(source, &[TRIGGER_COLUMN]))?;

    let length = spec.length();
    let mut summary = WidenSummary {
        rows: rows.len(),
        ..WidenSummary::default()
    };

    for &trigger in &spec.triggers {
        let starts: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.get(column).and_then(cell_value) == Some(trigger))
            .map(|(index, _)| index)
            .collect();
        debug!("{}: trigger {} starts at {} rows", source, trigger, starts.len());
        summary.starts += starts.len();

        for start in starts {
            let Some(text) = rows[start].get(column).map(str::to_string) else {
                continue;
            };
            let end = (start + length).min(rows.len().saturating_sub(1));
            for row in &mut rows[start + 1..=end] {
                if row.get(column) != Some(text.as_str()) {
                    *row = replace_field(row, column, &text);
                    summary.rows_changed += 1;
                }
            }
        }
    }

    Ok(summary)
}

fn replace_field(row: &StringRecord, column: usize, value: &str) -> StringRecord {
    let mut fields: Vec<&str> = row.iter().collect();
    if fields.len() <= column {
        fields.resize(column + 1, "");
    }
    fields[column] = value;
    StringRecord::from(fields)
}

/// Read a CSV, widen its triggers and write it to `writer`
pub fn widen_triggers<R: Read, W: Write>(
    reader: R,
    writer: W,
    spec: &WidenSpec,
    source: &str,
) -> Result<WidenSummary> {
    let mut csv_reader = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = csv_reader
        .headers()
        .map_err(|e| Error::csv_parsing(source, "failed to read header", Some(e)))?
        .clone();

    let mut rows = Vec::new();
    for (index, record) in csv_reader.records().enumerate() {
        let record = record.map_err(|e| {
            Error::csv_parsing(source, format!("failed to read row {}", index + 1), Some(e))
        })?;
        rows.push(record);
    }

    let summary = widen_rows(&headers, &mut rows, spec, source)?;

    let mut csv_writer = WriterBuilder::new().flexible(true).from_writer(writer);
    csv_writer
        .write_record(&headers)
        .map_err(|e| Error::csv_parsing(source, "failed to write header", Some(e)))?;
    for row in &rows {
        csv_writer
            .write_record(row)
            .map_err(|e| Error::csv_parsing(source, "failed to write row", Some(e)))?;
    }
    csv_writer
        .flush()
        .map_err(|e| Error::io(format!("Failed to flush output for {}", source), e))?;

    info!(
        "{}: widened {} trigger starts, {} rows changed",
        source, summary.starts, summary.rows_changed
    );
    Ok(summary)
}

//! Test utilities for E-Prime table tests
//!
//! Shared helpers for building small tab-delimited tables in memory or on disk.

use std::io::Write;
use tempfile::NamedTempFile;

use super::EprimeTable;


/// Join rows of cells into tab-delimited text
pub fn tsv(rows: &[&[&str]]) -> String {
    rows.iter()
        .map(|row| row.join("\t"))
        .collect::<Vec<_>>()
        .join("\n")
        + "\n"
}

/// Build an in-memory table
pub fn table_from(rows: &[&[&str]]) -> EprimeTable {
    EprimeTable::from_reader(tsv(rows).as_bytes(), "test.txt").unwrap()
}

/// Helper to create a temporary file with given content
pub fn create_temp_file(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    write!(temp_file, "{}", content).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

//! Test utilities for study converters
//!
//! Every study test builds a small log in memory under a realistic file name,
//! since the file name carries the subject id.

use super::{ConversionContext, Study};
use crate::app::models::StudyOutput;
use crate::app::services::eprime_table::tests::tsv;
use crate::app::services::eprime_table::EprimeTable;

/// Turn a list of displayable cells into a row
macro_rules! row {
    ($($cell:expr),* $(,)?) => {
        vec![$($cell.to_string()),*]
    };
}

// Test modules
mod bar_tests;
mod discourse_tests;
mod inst_tests;
mod roi_tests;
mod words_tests;

/// Build a table from a header row and data rows
pub fn table(source: &str, headers: &[&str], rows: &[Vec<String>]) -> EprimeTable {
    let mut all: Vec<Vec<&str>> = vec![headers.to_vec()];
    all.extend(rows.iter().map(|row| row.iter().map(String::as_str).collect()));
    let refs: Vec<&[&str]> = all.iter().map(Vec::as_slice).collect();
    EprimeTable::from_reader(tsv(&refs).as_bytes(), source).unwrap()
}

/// Context for `file` with the study's default timing
pub fn context(file: &str, study: Study) -> ConversionContext {
    ConversionContext::new(file, study.default_timing())
}

/// Convert an in-memory table
pub fn convert(study: Study, file: &str, headers: &[&str], rows: &[Vec<String>]) -> StudyOutput {
    let table = table(file, headers, rows);
    study.convert(&table, &context(file, study)).unwrap()
}

/// Contents of a rendered file, panicking with the available names if absent
pub fn text<'a>(output: &'a StudyOutput, name: &str) -> &'a str {
    match output.file(name) {
        Some(file) => &file.contents,
        None => panic!(
            "no output named {}; have {:?}",
            name,
            output.files.iter().map(|f| &f.name).collect::<Vec<_>>()
        ),
    }
}

/// Lines of a rendered file
pub fn lines<'a>(output: &'a StudyOutput, name: &str) -> Vec<&'a str> {
    text(output, name).lines().collect()
}

//! Field parsing utilities for E-Prime rows
//!
//! A row can fail in two distinct ways: it is too short to contain the column
//! at all, or the cell is there but cannot be read as the expected type. Some
//! studies react differently to the two (the logic-reasoning task retries an
//! unreadable row against its block-level columns), so the distinction is
//! kept in [`FieldError`].

use super::column_mapping::Column;
use csv::StringRecord;

/// Why a row could not be turned into a trial
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    /// Row is too short to hold the column
    #[error("no value for column '{column}'")]
    Missing { column: String },

    /// Cell is present but unreadable
    #[error("invalid value '{value}' for column '{column}'")]
    Invalid { column: String, value: String },

    /// Row is readable but rejected by the study's rules
    #[error("{0}")]
    Rejected(String),
}

impl FieldError {
    /// Create a rejection with a study-specific reason
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing { .. })
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid { .. })
    }
}

/// Result type for field-level parsing
pub type FieldResult<T> = std::result::Result<T, FieldError>;

/// Get the raw (trimmed) text of a field
pub fn get_field<'a>(record: &'a StringRecord, column: &Column) -> FieldResult<&'a str> {
    record
        .get(column.index)
        .map(str::trim)
        .ok_or_else(|| FieldError::Missing {
            column: column.name.clone(),
        })
}

/// Parse an integer field; blank cells are invalid
pub fn parse_int(record: &StringRecord, column: &Column) -> FieldResult<i64> {
    let value = get_field(record, column)?;
    value.parse::<i64>().map_err(|_| FieldError::Invalid {
        column: column.name.clone(),
        value: value.to_string(),
    })
}

/// Parse a text field; blank cells are accepted
pub fn parse_string(record: &StringRecord, column: &Column) -> FieldResult<String> {
    get_field(record, column).map(str::to_string)
}

/// Parse a 0/1 accuracy flag
pub fn parse_flag(record: &StringRecord, column: &Column) -> FieldResult<bool> {
    parse_int(record, column).map(|value| value == 1)
}

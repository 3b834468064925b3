//! Header lookup for E-Prime tables
//!
//! E-Prime suffixes column names with the procedure level they were logged at
//! (`[Trial]`, `[Block]`, `[Session]`), and which suffix appears depends on how
//! the experiment was built. Studies therefore ask for a chain of candidate
//! names and take the first one present.

use crate::{Error, Result};
use csv::StringRecord;
use std::collections::HashMap;
use tracing::warn;

/// A resolved column: its position in the row and the header name it matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub index: usize,
    pub name: String,
}

/// Column name to index mapping for one table
#[derive(Debug, Clone)]
pub struct ColumnMapping {
    /// Column name to index mapping; the first occurrence of a name wins
    pub name_to_index: HashMap<String, usize>,

    /// Header names in file order
    pub headers: Vec<String>,

    /// File the header came from, for error messages
    pub source: String,
}

impl ColumnMapping {
    /// Build the mapping from a header record
    pub fn analyze(headers: &StringRecord, source: impl Into<String>) -> Self {
        let mut name_to_index = HashMap::new();
        let mut names = Vec::with_capacity(headers.len());

        for (index, header) in headers.iter().enumerate() {
            let column_name = header.trim().to_string();
            name_to_index.entry(column_name.clone()).or_insert(index);
            names.push(column_name);
        }

        ColumnMapping {
            name_to_index,
            headers: names,
            source: source.into(),
        }
    }

    /// Get the index for a given column name
    pub fn get_index(&self, column_name: &str) -> Option<usize> {
        self.name_to_index.get(column_name).copied()
    }

    /// Check if a column exists in the mapping
    pub fn has_column(&self, column_name: &str) -> bool {
        self.name_to_index.contains_key(column_name)
    }

    /// Resolve the first present name of a fallback chain
    ///
    /// Falling back past the preferred name is logged. When no candidate is
    /// present the conversion cannot proceed and `MissingColumn` is returned.
    pub fn resolve(&self, candidates: &[&str]) -> Result<Column> {
        self.resolve_optional(candidates)
            .ok_or_else(|| Error::missing_column(&self.source, candidates))
    }

    /// Like [`ColumnMapping::resolve`] but absence is not an error
    pub fn resolve_optional(&self, candidates: &[&str]) -> Option<Column> {
        for (position, name) in candidates.iter().enumerate() {
            if let Some(index) = self.get_index(name) {
                if position > 0 {
                    warn!(
                        "{}: could not find '{}', using '{}'",
                        self.source, candidates[0], name
                    );
                }
                return Some(Column {
                    index,
                    name: (*name).to_string(),
                });
            }
        }
        None
    }

    /// Number of distinct column names
    pub fn len(&self) -> usize {
        self.name_to_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.name_to_index.is_empty()
    }
}

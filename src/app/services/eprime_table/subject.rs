//! Subject identifiers derived from log file names
//!
//! Each lab named its E-Prime exports differently (`bar-12-1.txt`,
//! `07_discourse.txt`, `ROI-scan-A-x-y-115.txt`), so each study declares how its
//! subject id is cut out of the name. Only the file name is considered, never
//! the directory it sits in.

use crate::{Error, Result};
use std::path::Path;

/// Which part of a split name to take
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartIndex {
    Nth(usize),
    Last,
}

/// How a study extracts its subject identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectRule {
    /// `name.split(delimiter)[index]` over the full file name
    Split { delimiter: char, index: usize },

    /// Split the part of the name before the first `.`
    StemSplit { delimiter: char, index: PartIndex },

    /// The first `n` characters of the file name
    Prefix(usize),
}

impl SubjectRule {
    /// Extract the subject id from a path's file name
    pub fn extract(&self, path: &Path) -> Result<String> {
        let name = file_name(path)?;

        let subject = match *self {
            SubjectRule::Split { delimiter, index } => name.split(delimiter).nth(index),
            SubjectRule::StemSplit { delimiter, index } => {
                let stem = name.split('.').next().unwrap_or_default();
                let mut parts = stem.split(delimiter);
                match index {
                    PartIndex::Nth(n) => parts.nth(n),
                    PartIndex::Last => parts.next_back(),
                }
            }
            SubjectRule::Prefix(n) => match name.char_indices().nth(n) {
                Some((end, _)) => Some(&name[..end]),
                None if name.chars().count() == n => Some(name),
                None => None,
            },
        };

        match subject {
            Some(subject) if !subject.is_empty() => Ok(subject.to_string()),
            _ => Err(Error::subject(name, format!("name does not match {}", self))),
        }
    }

    /// Resolve the subject, preferring an explicit override
    pub fn resolve(&self, path: &Path, subject_override: Option<&str>) -> Result<String> {
        match subject_override {
            Some(subject) if !subject.trim().is_empty() => Ok(subject.trim().to_string()),
            _ => self.extract(path),
        }
    }
}

impl std::fmt::Display for SubjectRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubjectRule::Split { delimiter, index } => {
                write!(f, "part {} of the name split on '{}'", index, delimiter)
            }
            SubjectRule::StemSplit {
                delimiter,
                index: PartIndex::Nth(n),
            } => write!(f, "part {} of the stem split on '{}'", n, delimiter),
            SubjectRule::StemSplit {
                delimiter,
                index: PartIndex::Last,
            } => write!(f, "last part of the stem split on '{}'", delimiter),
            SubjectRule::Prefix(n) => write!(f, "the first {} characters", n),
        }
    }
}

/// File name of a path as UTF-8
pub fn file_name(path: &Path) -> Result<&str> {
    path.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| Error::subject(path.display().to_string(), "path has no UTF-8 file name"))
}

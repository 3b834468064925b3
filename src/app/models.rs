//! Data models shared by the study converters
//!
//! Converters never write to disk themselves. They describe SPM sessions with
//! [`Regressor`] and [`SessionBlock`] and hand back rendered [`OutputFile`]s in
//! a [`StudyOutput`], which the CLI layer then writes.

use crate::app::services::eprime_table::ParseStats;

// =============================================================================
// SPM Conditions
// =============================================================================

/// One SPM condition: a `names{i}` entry with its onsets and durations (s)
#[derive(Debug, Clone, PartialEq)]
pub struct Regressor {
    pub name: String,
    pub onsets: Vec<f64>,
    pub durations: Vec<f64>,
}

impl Regressor {
    /// Create a regressor from parallel onset and duration lists
    pub fn new(name: impl Into<String>, onsets: Vec<f64>, durations: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            onsets,
            durations,
        }
    }

    /// Build a regressor by projecting each trial to an onset and a duration
    pub fn from_trials<'a, T: 'a>(
        name: impl Into<String>,
        trials: impl IntoIterator<Item = &'a T>,
        onset: impl Fn(&T) -> f64,
        duration: impl Fn(&T) -> f64,
    ) -> Self {
        let (onsets, durations) = trials
            .into_iter()
            .map(|trial| (onset(trial), duration(trial)))
            .unzip();
        Self::new(name, onsets, durations)
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.onsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.onsets.is_empty()
    }
}

/// One SPM session: the regressors saved to one `.mat` file
#[derive(Debug, Clone, PartialEq)]
pub struct SessionBlock {
    /// Block number as logged (used in the `.mat` name)
    pub number: i64,
    pub regressors: Vec<Regressor>,
}

impl SessionBlock {
    pub fn new(number: i64) -> Self {
        Self {
            number,
            regressors: Vec::new(),
        }
    }

    pub fn push(&mut self, regressor: Regressor) {
        self.regressors.push(regressor);
    }

    /// Push only when the regressor has events
    pub fn push_non_empty(&mut self, regressor: Regressor) -> bool {
        if regressor.is_empty() {
            false
        } else {
            self.regressors.push(regressor);
            true
        }
    }

    /// Find a regressor by name
    pub fn regressor(&self, name: &str) -> Option<&Regressor> {
        self.regressors.iter().find(|r| r.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.regressors.iter().map(|r| r.name.as_str()).collect()
    }
}

// =============================================================================
// Conversion Results
// =============================================================================

/// A rendered output file, named relative to the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub name: String,
    pub contents: String,
}

impl OutputFile {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

/// The result of converting one log file
#[derive(Debug, Clone)]
pub struct StudyOutput {
    pub subject: String,
    pub files: Vec<OutputFile>,
    pub stats: ParseStats,
    /// Trials that survived parsing (and block filtering)
    pub trials: usize,
    /// Sessions described
    pub blocks: usize,
}

impl StudyOutput {
    pub fn new(subject: impl Into<String>, stats: ParseStats) -> Self {
        Self {
            subject: subject.into(),
            files: Vec::new(),
            stats,
            trials: 0,
            blocks: 0,
        }
    }

    pub fn add_file(&mut self, name: impl Into<String>, contents: impl Into<String>) {
        self.files.push(OutputFile::new(name, contents));
    }

    /// Look up a rendered file by name
    pub fn file(&self, name: &str) -> Option<&OutputFile> {
        self.files.iter().find(|f| f.name == name)
    }

    /// Total bytes across rendered files
    pub fn total_bytes(&self) -> usize {
        self.files.iter().map(|f| f.contents.len()).sum()
    }
}

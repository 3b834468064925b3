//! eprime2spm Library
//!
//! A Rust library for converting E-Prime behavioral task logs (tab-delimited
//! "table" exports) into SPM multiple-condition session scripts.
//!
//! This library provides tools for:
//! - Reading E-Prime table exports with header lookup and fallback column names
//! - Parsing rows into study-specific trial records with row-level recovery
//! - Anchoring blocks to their first trial and computing relative onsets
//! - Rendering `names/onsets/durations` session scripts and contrast tables
//! - Generating global contrast vectors from inclusion matrices
//! - Parsing xjView cluster reports and widening EEG trigger codes

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod cluster_report;
        pub mod contrasts;
        pub mod eprime_table;
        pub mod spm_writer;
        pub mod summary;
        pub mod timing;
        pub mod triggers;
    }
    pub mod studies;
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{OutputFile, Regressor, SessionBlock, StudyOutput};
pub use app::studies::Study;
pub use config::Config;

/// Result type alias for eprime2spm
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for conversion, report and configuration operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV/TSV reading or writing error
    #[error("CSV parsing error in file '{file}': {message}")]
    CsvParsing {
        file: String,
        message: String,
        #[source]
        source: Option<csv::Error>,
    },

    /// The log file is not a usable E-Prime table
    #[error("Table format error in file '{file}': {message}")]
    TableFormat { file: String, message: String },

    /// None of the candidate names of a required column is in the header
    #[error("Missing column in file '{file}': none of [{candidates}] found")]
    MissingColumn { file: String, candidates: String },

    /// Subject identifier could not be derived from the file name
    #[error("Cannot derive subject from '{file}': {message}")]
    Subject { file: String, message: String },

    /// Every row was dropped
    #[error("No usable trials in file '{file}'")]
    NoTrials { file: String },

    /// Trials of one block disagree on block-level values
    #[error("Inconsistent block {block}: {message}")]
    InconsistentBlock { block: i64, message: String },

    /// Trial type outside the known set
    #[error("Invalid trial type '{value}' in file '{file}'")]
    InvalidTrialType { file: String, value: String },

    /// Block plan file is malformed
    #[error("Block plan error in file '{file}': {message}")]
    BlockPlan { file: String, message: String },

    /// Contrast or inclusion matrix file is malformed
    #[error("Contrast error: {message}")]
    Contrast { message: String },

    /// Cluster report is malformed
    #[error("Cluster report error: {message}")]
    Report { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Configuration file could not be deserialized
    #[error("Failed to parse config file '{path}'")]
    ConfigParsing {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// Data validation error
    #[error("Data validation error: {message}")]
    DataValidation { message: String },

    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// Directory traversal error
    #[error("Directory traversal error: {message}")]
    DirectoryTraversal {
        message: String,
        #[source]
        source: walkdir::Error,
    },

    /// Invalid glob pattern for input discovery
    #[error("Invalid input pattern '{pattern}'")]
    InputPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// Two inputs would write the same output file
    #[error("Output collision: '{path}' would be written by more than one input")]
    OutputCollision { path: String },

    /// Output file exists and overwriting is disabled
    #[error("Output file already exists: {path} (use --force to overwrite)")]
    OutputExists { path: String },

    /// Processing interrupted
    #[error("Processing interrupted: {reason}")]
    ProcessingInterrupted { reason: String },

    /// Unknown study name
    #[error("Unknown study: {name}")]
    UnknownStudy { name: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a CSV parsing error with context
    pub fn csv_parsing(
        file: impl Into<String>,
        message: impl Into<String>,
        source: Option<csv::Error>,
    ) -> Self {
        Self::CsvParsing {
            file: file.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a table format error
    pub fn table_format(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TableFormat {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create a missing column error from the candidate names that were tried
    pub fn missing_column(file: impl Into<String>, candidates: &[&str]) -> Self {
        Self::MissingColumn {
            file: file.into(),
            candidates: candidates.join(", "),
        }
    }

    /// Create a subject extraction error
    pub fn subject(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Subject {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create a no-trials error
    pub fn no_trials(file: impl Into<String>) -> Self {
        Self::NoTrials { file: file.into() }
    }

    /// Create an inconsistent block error
    pub fn inconsistent_block(block: i64, message: impl Into<String>) -> Self {
        Self::InconsistentBlock {
            block,
            message: message.into(),
        }
    }

    /// Create an invalid trial type error
    pub fn invalid_trial_type(file: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidTrialType {
            file: file.into(),
            value: value.into(),
        }
    }

    /// Create a block plan error
    pub fn block_plan(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BlockPlan {
            file: file.into(),
            message: message.into(),
        }
    }

    /// Create a contrast error
    pub fn contrast(message: impl Into<String>) -> Self {
        Self::Contrast {
            message: message.into(),
        }
    }

    /// Create a cluster report error
    pub fn report(message: impl Into<String>) -> Self {
        Self::Report {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a data validation error
    pub fn data_validation(message: impl Into<String>) -> Self {
        Self::DataValidation {
            message: message.into(),
        }
    }

    /// Create a file not found error
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a directory traversal error
    pub fn directory_traversal(message: impl Into<String>, source: walkdir::Error) -> Self {
        Self::DirectoryTraversal {
            message: message.into(),
            source,
        }
    }

    /// Create an output collision error
    pub fn output_collision(path: impl Into<String>) -> Self {
        Self::OutputCollision { path: path.into() }
    }

    /// Create an output exists error
    pub fn output_exists(path: impl Into<String>) -> Self {
        Self::OutputExists { path: path.into() }
    }

    /// Create a processing interrupted error
    pub fn processing_interrupted(reason: impl Into<String>) -> Self {
        Self::ProcessingInterrupted {
            reason: reason.into(),
        }
    }

    /// Create an unknown study error
    pub fn unknown_study(name: impl Into<String>) -> Self {
        Self::UnknownStudy { name: name.into() }
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<csv::Error> for Error {
    fn from(error: csv::Error) -> Self {
        Self::CsvParsing {
            file: "unknown".to_string(),
            message: "CSV parsing failed".to_string(),
            source: Some(error),
        }
    }
}

impl From<walkdir::Error> for Error {
    fn from(error: walkdir::Error) -> Self {
        Self::DirectoryTraversal {
            message: "Directory traversal failed".to_string(),
            source: error,
        }
    }
}

impl From<glob::PatternError> for Error {
    fn from(error: glob::PatternError) -> Self {
        Self::InputPattern {
            pattern: "unknown".to_string(),
            source: error,
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Self::ConfigParsing {
            path: "unknown".to_string(),
            source: error,
        }
    }
}

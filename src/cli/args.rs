//! Command-line argument definitions for eprime2spm
//!
//! This module defines the complete CLI interface using the clap derive API.

use crate::app::studies::Study;
use crate::constants::MAX_WORKERS;
use crate::{Error, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;

/// CLI arguments for the E-Prime to SPM converter
///
/// Converts E-Prime table exports into SPM multiple-condition session
/// scripts, and provides the contrast, cluster report and trigger utilities
/// used around them.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "eprime2spm",
    version,
    about = "Convert E-Prime behavioral task logs into SPM session scripts",
    long_about = "Reads tab-delimited E-Prime table exports, groups trials into \
                  scanning sessions and writes SPM names/onsets/durations scripts, \
                  contrast tables and behavioral summaries for each subject."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Convert E-Prime logs of one study into SPM session files
    Convert(ConvertArgs),
    /// Spread session contrasts over four sessions using an inclusion matrix
    Contrasts(ContrastsArgs),
    /// Turn an xjView cluster report into a table
    Report(ReportArgs),
    /// Hold EEG trigger codes over the following samples
    WidenTriggers(WidenTriggersArgs),
    /// List the supported studies and their defaults
    Studies(StudiesArgs),
}

/// Arguments for the convert command
#[derive(Debug, Clone, Parser)]
pub struct ConvertArgs {
    /// Study whose conversion rules apply to every input
    #[arg(short = 's', long = "study", value_enum, help = "Study of the input logs")]
    pub study: Study,

    /// Input logs
    ///
    /// Each input may be a file, a glob pattern such as 'logs/*.txt' or a
    /// directory, which is searched recursively for .txt files.
    #[arg(value_name = "INPUT", required = true, help = "Log files, glob patterns or directories")]
    pub inputs: Vec<PathBuf>,

    /// Directory for the generated files
    ///
    /// Defaults to the configured output directory, or the current directory.
    #[arg(
        short = 'o',
        long = "output",
        value_name = "DIR",
        help = "Directory for generated files"
    )]
    pub output_dir: Option<PathBuf>,

    /// Subject id to use instead of the one in the file name
    #[arg(long = "subject", value_name = "ID", help = "Override the subject id")]
    pub subject: Option<String>,

    /// Block plan for roi-dcm
    ///
    /// One '<scans> <True|False>' line per block. Defaults to blocks.txt next
    /// to the input log.
    #[arg(long = "blocks", value_name = "FILE", help = "Block plan for roi-dcm")]
    pub block_plan: Option<PathBuf>,

    /// Path to configuration file
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    pub config_file: Option<PathBuf>,

    /// Number of files converted concurrently
    #[arg(
        short = 'j',
        long = "workers",
        value_name = "COUNT",
        help = "Number of files converted concurrently"
    )]
    pub workers: Option<usize>,

    /// Force overwrite of existing output files
    #[arg(long = "force", help = "Overwrite existing output files")]
    pub force_overwrite: bool,

    /// Convert without writing anything
    #[arg(
        long = "dry-run",
        help = "Show what would be written without creating files"
    )]
    pub dry_run: bool,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Only show errors
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Output format of the conversion summary
    #[arg(
        long = "output-format",
        value_enum,
        default_value = "human",
        help = "Output format for results"
    )]
    pub output_format: OutputFormat,
}

/// Arguments for the contrasts command
#[derive(Debug, Clone, Parser)]
pub struct ContrastsArgs {
    /// File of 'name : w w w' lines
    #[arg(value_name = "CONTRAST_FILE")]
    pub contrast_file: PathBuf,

    /// Whitespace-separated inclusion matrix, one row per session
    #[arg(value_name = "INCLUSION_MATRIX")]
    pub matrix_file: PathBuf,

    /// Output file; stdout when omitted
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_file: Option<PathBuf>,

    #[arg(long = "force", help = "Overwrite an existing output file")]
    pub force_overwrite: bool,

    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Arguments for the report command
#[derive(Debug, Clone, Parser)]
pub struct ReportArgs {
    /// xjView report text
    #[arg(value_name = "REPORT_FILE")]
    pub report_file: PathBuf,

    /// Output file; stdout when omitted
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_file: Option<PathBuf>,

    #[arg(long = "force", help = "Overwrite an existing output file")]
    pub force_overwrite: bool,

    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Arguments for the widen-triggers command
#[derive(Debug, Clone, Parser)]
pub struct WidenTriggersArgs {
    /// CSV export with a Trigger column
    #[arg(value_name = "CSV")]
    pub input: PathBuf,

    /// Trigger codes to widen, comma separated
    #[arg(long = "triggers", value_name = "LIST")]
    pub triggers: TriggerList,

    /// Sampling rate (Hz)
    #[arg(long = "fs", value_name = "HZ")]
    pub fs: u32,

    /// Hold time (s)
    #[arg(long = "change-length", value_name = "SECONDS", default_value_t = 1)]
    pub change_length: u32,

    /// Widened CSV
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_file: PathBuf,

    #[arg(long = "force", help = "Overwrite an existing output file")]
    pub force_overwrite: bool,

    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Arguments for the studies command
#[derive(Debug, Clone, Parser)]
pub struct StudiesArgs {
    #[arg(long = "output-format", value_enum, default_value = "human")]
    pub output_format: OutputFormat,
}

/// Output format options for machine-readable results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON format for scripting
    Json,
    /// CSV format for data analysis
    Csv,
}

/// Wrapper for parsing comma-separated trigger codes
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerList {
    pub codes: Vec<f64>,
}

impl FromStr for TriggerList {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let codes = s
            .split(',')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(|code| {
                code.parse::<f64>()
                    .map_err(|_| Error::data_validation(format!("Invalid trigger code '{}'", code)))
            })
            .collect::<Result<Vec<f64>>>()?;

        if codes.is_empty() {
            return Err(Error::data_validation("Trigger list cannot be empty"));
        }
        Ok(TriggerList { codes })
    }
}

/// Map `-v` counts to a level; `quiet` wins
fn log_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

impl ConvertArgs {
    /// Validate the convert command arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            return Err(Error::configuration("At least one input is required"));
        }

        if let Some(workers) = self.workers {
            if workers == 0 || workers > MAX_WORKERS {
                return Err(Error::configuration(format!(
                    "Number of workers must be between 1 and {}",
                    MAX_WORKERS
                )));
            }
        }

        if let Some(subject) = &self.subject {
            if subject.trim().is_empty() {
                return Err(Error::configuration("Subject id cannot be empty"));
            }
        }

        if self.block_plan.is_some() && self.study != Study::RoiDcm {
            return Err(Error::configuration(format!(
                "--blocks only applies to {}, not {}",
                Study::RoiDcm,
                self.study
            )));
        }

        if let Some(plan) = &self.block_plan {
            if !plan.is_file() {
                return Err(Error::file_not_found(plan.display().to_string()));
            }
        }

        if let Some(config_file) = &self.config_file {
            if !config_file.exists() {
                return Err(Error::configuration(format!(
                    "Config file does not exist: {}",
                    config_file.display()
                )));
            }
        }

        Ok(())
    }

    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        log_level(self.verbose, self.quiet)
    }

    /// Progress bars are shown for human output outside quiet mode
    pub fn show_progress(&self) -> bool {
        !self.quiet && self.output_format == OutputFormat::Human
    }
}

impl ContrastsArgs {
    pub fn get_log_level(&self) -> &'static str {
        log_level(self.verbose, false)
    }
}

impl ReportArgs {
    pub fn get_log_level(&self) -> &'static str {
        log_level(self.verbose, false)
    }
}

impl WidenTriggersArgs {
    pub fn validate(&self) -> Result<()> {
        if self.fs == 0 {
            return Err(Error::configuration("Sampling rate must be greater than 0"));
        }
        if self.input == self.output_file {
            return Err(Error::configuration(
                "Output file must differ from the input file",
            ));
        }
        Ok(())
    }

    pub fn get_log_level(&self) -> &'static str {
        log_level(self.verbose, false)
    }
}

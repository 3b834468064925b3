//! Configuration management and validation.
//!
//! Settings come from three layers, each overriding the previous one:
//! the TOML config file, `EPRIME2SPM_*` environment variables and finally
//! command-line flags (applied by the CLI through the `with_*` builders).

use crate::app::services::timing::Timing;
use crate::constants::{CONFIG_DIR_NAME, CONFIG_FILE_NAME, ENV_OUTPUT_DIR, ENV_WORKERS, MAX_WORKERS};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where and how output files are written
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output directory; the current directory when unset
    pub directory: Option<PathBuf>,

    /// Replace existing output files
    pub overwrite: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Number of files converted concurrently
    pub workers: usize,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get().clamp(1, MAX_WORKERS),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level when neither `RUST_LOG` nor `-v`/`-q` is given
    pub level: Option<String>,
}

/// Per-study replacement of the built-in scanner timing
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingOverride {
    pub tr_ms: Option<u32>,
    pub offset_scans: Option<u32>,
}

impl TimingOverride {
    /// Apply the set fields on top of `base`
    pub fn apply(&self, base: Timing) -> Timing {
        Timing::new(
            self.tr_ms.unwrap_or(base.tr_ms),
            self.offset_scans.unwrap_or(base.offset_scans),
        )
    }
}

/// Global configuration for conversions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub performance: PerformanceConfig,
    pub logging: LoggingConfig,

    /// Timing overrides keyed by study name (`[studies.task-switching]`)
    pub studies: HashMap<String, TimingOverride>,
}

impl Config {
    /// `<config dir>/eprime2spm/config.toml`, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::file_not_found(path.display().to_string())
            } else {
                Error::io(format!("Failed to read config file {}", path.display()), e)
            }
        })?;
        Self::from_toml(&contents).map_err(|e| match e {
            Error::ConfigParsing { source, .. } => Error::ConfigParsing {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load the file layer
    ///
    /// An explicit path must exist. The default location is optional and
    /// silently skipped when absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            debug!("Loading configuration from {}", path.display());
            return Self::from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.is_file() => {
                debug!("Loading configuration from {}", path.display());
                Self::from_file(&path)
            }
            _ => {
                debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load the file layer then the process environment
    pub fn load_layered(explicit: Option<&Path>) -> Result<Self> {
        Self::load(explicit)?.with_env(|key| std::env::var(key).ok())
    }

    /// Apply the environment layer through `lookup`
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(dir) = lookup(ENV_OUTPUT_DIR).filter(|v| !v.trim().is_empty()) {
            debug!("{} overrides output directory", ENV_OUTPUT_DIR);
            self.output.directory = Some(PathBuf::from(dir));
        }

        if let Some(workers) = lookup(ENV_WORKERS) {
            let parsed = workers.trim().parse::<usize>().map_err(|_| {
                Error::configuration(format!("{} must be a number, got '{}'", ENV_WORKERS, workers))
            })?;
            debug!("{} overrides worker count", ENV_WORKERS);
            self.performance.workers = parsed;
        }

        Ok(self)
    }

    pub fn with_output_dir(mut self, directory: PathBuf) -> Self {
        self.output.directory = Some(directory);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.performance.workers = workers;
        self
    }

    pub fn with_overwrite(mut self) -> Self {
        self.output.overwrite = true;
        self
    }

    /// Output directory, defaulting to the current directory
    pub fn output_dir(&self) -> PathBuf {
        self.output
            .directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Timing for `study`, with any configured override applied
    pub fn timing_for(&self, study: &str, base: Timing) -> Timing {
        self.studies
            .get(study)
            .map_or(base, |timing| timing.apply(base))
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.performance.workers == 0 || self.performance.workers > MAX_WORKERS {
            return Err(Error::configuration(format!(
                "workers must be between 1 and {}, got {}",
                MAX_WORKERS, self.performance.workers
            )));
        }

        if let Some(level) = &self.logging.level {
            const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
            if !LEVELS.contains(&level.to_lowercase().as_str()) {
                return Err(Error::configuration(format!("unknown log level '{}'", level)));
            }
        }

        for (study, timing) in &self.studies {
            if timing.tr_ms == Some(0) {
                return Err(Error::configuration(format!(
                    "studies.{}.tr_ms must be positive",
                    study
                )));
            }
        }

        Ok(())
    }
}

//! Shared components for CLI commands
//!
//! This module contains logging setup, configuration layering, input
//! discovery and progress helpers used across the command implementations.

use crate::cli::args::ConvertArgs;
use crate::config::Config;
use crate::constants::INPUT_EXTENSION;
use crate::{Error, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Set up structured logging on stderr
///
/// `RUST_LOG` takes precedence over `level`. Quiet mode uses the compact
/// formatter without timestamps.
pub fn setup_logging(level: &str, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("eprime2spm={}", level)));

    // try_init: a second command in the same process keeps the first subscriber
    let initialized = if quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };

    if initialized.is_ok() {
        debug!("Logging initialized at level: {}", level);
    }
}

/// Log level for the convert command
///
/// Explicit `-v`/`-q` flags win; otherwise the configured level applies.
pub fn effective_log_level(args: &ConvertArgs, config: &Config) -> String {
    if args.quiet || args.verbose > 0 {
        return args.get_log_level().to_string();
    }
    config
        .logging
        .level
        .as_ref()
        .map(|level| level.to_lowercase())
        .unwrap_or_else(|| args.get_log_level().to_string())
}

/// Load configuration using layered approach (file -> env -> args)
pub fn load_configuration(args: &ConvertArgs) -> Result<Config> {
    let config = Config::load_layered(args.config_file.as_deref())?;
    let config = apply_cli_overrides(config, args);
    config.validate()?;
    Ok(config)
}

/// Apply CLI argument overrides to configuration
pub fn apply_cli_overrides(mut config: Config, args: &ConvertArgs) -> Config {
    if let Some(dir) = &args.output_dir {
        config = config.with_output_dir(dir.clone());
    }
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }
    if args.force_overwrite {
        config = config.with_overwrite();
    }
    config
}

/// Expand inputs into a sorted, de-duplicated list of log files
///
/// An input is used as-is when it is a file, walked recursively for `.txt`
/// files when it is a directory, and expanded with `glob` otherwise.
pub fn discover_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_file() {
            files.push(input.clone());
        } else if input.is_dir() {
            let found = discover_directory(input)?;
            if found.is_empty() {
                warn!("No .{} files found in {}", INPUT_EXTENSION, input.display());
            }
            files.extend(found);
        } else {
            let found = discover_pattern(input)?;
            if found.is_empty() {
                return Err(Error::file_not_found(input.display().to_string()));
            }
            files.extend(found);
        }
    }

    files.sort();
    files.dedup();

    debug!("Discovered {} input files", files.len());
    for file in &files {
        debug!("  Found: {}", file.display());
    }

    Ok(files)
}

fn discover_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry.map_err(|e| {
            Error::directory_traversal(format!("Failed to walk {}", dir.display()), e)
        })?;
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some(INPUT_EXTENSION) {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

fn discover_pattern(pattern: &Path) -> Result<Vec<PathBuf>> {
    let text = pattern.to_string_lossy();
    let paths = glob::glob(&text).map_err(|source| Error::InputPattern {
        pattern: text.to_string(),
        source,
    })?;

    let mut files = Vec::new();
    for path in paths {
        match path {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => warn!("Skipping unreadable path {}: {}", e.path().display(), e),
        }
    }
    info!("Pattern '{}' matched {} files", text, files.len());
    Ok(files)
}

/// Create a progress bar with appropriate styling
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(message.to_string());
    pb
}

/// Format a byte count in human-readable form
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

/// Refuse to replace an existing output file unless `overwrite` is set
pub fn ensure_writable(path: &Path, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        return Err(Error::output_exists(path.display().to_string()));
    }
    Ok(())
}

/// Write `contents` to `path`, or to stdout when no path is given
pub fn write_text_output(path: Option<&Path>, contents: &str, overwrite: bool) -> Result<()> {
    match path {
        Some(path) => {
            ensure_writable(path, overwrite)?;
            std::fs::write(path, contents)
                .map_err(|e| Error::io(format!("Failed to write {}", path.display()), e))?;
            info!("Wrote {}", path.display());
        }
        None => print!("{}", contents),
    }
    Ok(())
}

/// Read a whole text file with the path in the error
pub fn read_text_input(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(Error::file_not_found(path.display().to_string()));
    }
    std::fs::read_to_string(path)
        .map_err(|e| Error::io(format!("Failed to read {}", path.display()), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::studies::Study;
    use crate::cli::args::OutputFormat;
    use std::fs;
    use tempfile::TempDir;

    fn args() -> ConvertArgs {
        ConvertArgs {
            study: Study::Bar,
            inputs: vec![PathBuf::from("a.txt")],
            output_dir: None,
            subject: None,
            block_plan: None,
            config_file: None,
            workers: None,
            force_overwrite: false,
            dry_run: false,
            verbose: 0,
            quiet: false,
            output_format: OutputFormat::Human,
        }
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1048576), "1.00 MB");
    }

    #[test]
    fn test_cli_overrides() {
        let mut args = args();
        args.output_dir = Some(PathBuf::from("/out"));
        args.workers = Some(3);
        args.force_overwrite = true;

        let config = apply_cli_overrides(Config::default(), &args);
        assert_eq!(config.output_dir(), PathBuf::from("/out"));
        assert_eq!(config.performance.workers, 3);
        assert!(config.output.overwrite);

        let config = apply_cli_overrides(Config::default(), &super::tests::args());
        assert!(!config.output.overwrite);
        assert_eq!(config.output_dir(), PathBuf::from("."));
    }

    #[test]
    fn test_effective_log_level() {
        let mut config = Config::default();
        config.logging.level = Some("DEBUG".to_string());

        let mut args = args();
        assert_eq!(effective_log_level(&args, &config), "debug");

        args.verbose = 3;
        assert_eq!(effective_log_level(&args, &config), "trace");

        assert_eq!(effective_log_level(&super::tests::args(), &Config::default()), "warn");
    }

    #[test]
    fn test_discover_inputs() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("s01");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("b.txt"), "").unwrap();
        fs::write(nested.join("a.txt"), "").unwrap();
        fs::write(nested.join("notes.md"), "").unwrap();

        let files = discover_inputs(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(files, vec![dir.path().join("b.txt"), nested.join("a.txt")]);

        // A file listed twice is converted once
        let single = dir.path().join("b.txt");
        let files = discover_inputs(&[single.clone(), single.clone()]).unwrap();
        assert_eq!(files, vec![single]);

        let pattern = dir.path().join("s01").join("*.txt");
        let files = discover_inputs(&[pattern]).unwrap();
        assert_eq!(files, vec![nested.join("a.txt")]);
    }

    #[test]
    fn test_discover_missing_input() {
        let dir = TempDir::new().unwrap();
        let err = discover_inputs(&[dir.path().join("missing.txt")]).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[test]
    fn test_write_text_output_keeps_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.txt");
        fs::write(&path, "previous\n").unwrap();

        let err = write_text_output(Some(&path), "new\n", false).unwrap_err();
        assert!(matches!(err, Error::OutputExists { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "previous\n");

        write_text_output(Some(&path), "new\n", true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
    }

    #[test]
    fn test_read_text_input_missing() {
        let err = read_text_input(Path::new("/nonexistent/contrasts.txt")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }
}

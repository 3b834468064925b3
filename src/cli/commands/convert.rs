//! Convert command implementation
//!
//! Discovers the input logs, converts them concurrently on the blocking
//! pool, checks the planned outputs for collisions and existing files, then
//! writes everything and prints a summary.

use super::shared::{
    create_progress_bar, discover_inputs, effective_log_level, format_size, load_configuration,
    setup_logging,
};
use crate::app::models::StudyOutput;
use crate::app::services::eprime_table::ParseStats;
use crate::app::studies::{ConversionContext, Study};
use crate::cli::args::{ConvertArgs, OutputFormat};
use crate::config::Config;
use crate::{Error, Result};
use colored::*;
use futures::stream::{self, StreamExt};
use indicatif::HumanDuration;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Outcome of converting one input
#[derive(Debug)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub result: Result<StudyOutput>,
}

/// Per-input summary of a successful conversion
#[derive(Debug, Clone, Serialize)]
pub struct InputSummary {
    pub input: PathBuf,
    pub subject: String,
    pub trials: usize,
    pub blocks: usize,
    pub stats: ParseStats,
}

impl InputSummary {
    fn new(input: &Path, output: &StudyOutput) -> Self {
        Self {
            input: input.to_path_buf(),
            subject: output.subject.clone(),
            trials: output.trials,
            blocks: output.blocks,
            stats: output.stats.clone(),
        }
    }
}

/// Statistics for one convert run
#[derive(Debug, Clone, Default)]
pub struct ConvertStats {
    pub study: Option<Study>,
    pub files_converted: usize,
    pub files_failed: usize,
    pub trials: usize,
    pub records_skipped: usize,
    pub converted: Vec<InputSummary>,
    /// Written (or planned, in a dry run) files and their sizes
    pub outputs: Vec<(PathBuf, u64)>,
    pub failures: Vec<(PathBuf, String)>,
    pub dry_run: bool,
    pub processing_time: Duration,
}

impl ConvertStats {
    pub fn total_output_size(&self) -> u64 {
        self.outputs.iter().map(|(_, size)| size).sum()
    }
}

/// Convert command runner
pub async fn run_convert(args: ConvertArgs, cancellation_token: CancellationToken) -> Result<ConvertStats> {
    let start_time = Instant::now();

    args.validate()?;
    let config = load_configuration(&args)?;
    setup_logging(&effective_log_level(&args, &config), args.quiet);

    info!("Starting {} conversion", args.study);
    debug!("Convert arguments: {:?}", args);
    debug!("Loaded configuration: {:?}", config);

    let inputs = discover_inputs(&args.inputs)?;
    if inputs.is_empty() {
        return Err(Error::configuration("No input logs found"));
    }
    if args.subject.is_some() && inputs.len() > 1 {
        return Err(Error::configuration(format!(
            "--subject applies to a single input, but {} were found",
            inputs.len()
        )));
    }

    let outcomes = convert_all(&args, &config, inputs, cancellation_token).await?;

    let mut stats = ConvertStats {
        study: Some(args.study),
        dry_run: args.dry_run,
        ..Default::default()
    };
    let mut converted = Vec::new();
    let mut first_error = None;
    for outcome in outcomes {
        match outcome.result {
            Ok(output) => {
                stats.files_converted += 1;
                stats.trials += output.trials;
                stats.records_skipped += output.stats.records_skipped;
                stats.converted.push(InputSummary::new(&outcome.input, &output));
                converted.push((outcome.input, output));
            }
            Err(e) => {
                error!("Failed to convert {}: {:#}", outcome.input.display(), e);
                stats.files_failed += 1;
                stats.failures.push((outcome.input, e.to_string()));
                first_error.get_or_insert(e);
            }
        }
    }

    if converted.is_empty() {
        return Err(match first_error {
            Some(e) if stats.files_failed == 1 => e,
            _ => Error::data_validation(format!(
                "None of the {} inputs could be converted",
                stats.files_failed
            )),
        });
    }

    let output_dir = config.output_dir();
    let planned = plan_outputs(&output_dir, &converted)?;
    check_existing(&planned, config.output.overwrite)?;
    stats.outputs = write_outputs(&output_dir, &planned, args.dry_run)?;

    stats.processing_time = start_time.elapsed();
    generate_final_report(args.output_format, &stats)?;
    Ok(stats)
}

/// Convert every input with at most `workers` conversions in flight
async fn convert_all(
    args: &ConvertArgs,
    config: &Config,
    inputs: Vec<PathBuf>,
    cancellation_token: CancellationToken,
) -> Result<Vec<FileOutcome>> {
    let workers = config.performance.workers.min(inputs.len()).max(1);
    let timing = config.timing_for(args.study.name(), args.study.default_timing());
    info!(
        "Converting {} files with {} workers (TR {} ms, {} lead-in scans)",
        inputs.len(),
        workers,
        timing.tr_ms,
        timing.offset_scans
    );

    let progress_bar = if args.show_progress() && inputs.len() > 1 {
        Some(create_progress_bar(
            inputs.len() as u64,
            &format!("Converting {} logs", args.study),
        ))
    } else {
        None
    };

    let study = args.study;
    let conversions = stream::iter(inputs)
        .map(|input| {
            let ctx = ConversionContext::new(input.clone(), timing)
                .with_subject(args.subject.clone())
                .with_block_plan(args.block_plan.clone());
            async move {
                let result = task::spawn_blocking(move || study.convert_file(&ctx))
                    .await
                    .unwrap_or_else(|e| {
                        Err(Error::processing_interrupted(format!(
                            "Conversion task failed: {}",
                            e
                        )))
                    });
                FileOutcome { input, result }
            }
        })
        .buffer_unordered(workers)
        .inspect(|outcome| {
            if let Some(pb) = &progress_bar {
                pb.inc(1);
            }
            match &outcome.result {
                Ok(output) if !output.stats.is_successful() => warn!(
                    "{}: only {:.1}% of rows were usable",
                    outcome.input.display(),
                    output.stats.success_rate()
                ),
                Ok(output) => debug!(
                    "Converted {}: {} trials, {} skipped rows",
                    outcome.input.display(),
                    output.trials,
                    output.stats.records_skipped
                ),
                Err(e) => debug!("Conversion of {} failed: {}", outcome.input.display(), e),
            }
        })
        .collect::<Vec<_>>();

    // Cancellation is polled first so an already-cancelled run never converts
    let mut outcomes = tokio::select! {
        biased;
        _ = cancellation_token.cancelled() => {
            if let Some(pb) = &progress_bar {
                pb.abandon_with_message("Cancelled");
            }
            return Err(Error::processing_interrupted("Conversion cancelled by user"));
        }
        outcomes = conversions => outcomes,
    };

    if let Some(pb) = &progress_bar {
        pb.finish_with_message("Conversion complete");
    }

    outcomes.sort_by(|a, b| a.input.cmp(&b.input));
    Ok(outcomes)
}

/// A file ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedOutput {
    pub target: PathBuf,
    pub input: PathBuf,
    pub contents: String,
}

/// Resolve every output file to its target path
///
/// Two inputs producing the same target is an error; nothing is written.
pub fn plan_outputs(output_dir: &Path, converted: &[(PathBuf, StudyOutput)]) -> Result<Vec<PlannedOutput>> {
    let mut owners: HashMap<PathBuf, &Path> = HashMap::new();
    let mut planned = Vec::new();

    for (input, output) in converted {
        for file in &output.files {
            let target = output_dir.join(&file.name);
            if let Some(owner) = owners.insert(target.clone(), input) {
                warn!(
                    "{} is produced by both {} and {}",
                    target.display(),
                    owner.display(),
                    input.display()
                );
                return Err(Error::output_collision(target.display().to_string()));
            }
            planned.push(PlannedOutput {
                target,
                input: input.clone(),
                contents: file.contents.clone(),
            });
        }
    }

    Ok(planned)
}

/// Refuse to replace existing files unless overwriting is enabled
pub fn check_existing(planned: &[PlannedOutput], overwrite: bool) -> Result<()> {
    if overwrite {
        return Ok(());
    }
    match planned.iter().find(|output| output.target.exists()) {
        Some(output) => Err(Error::output_exists(output.target.display().to_string())),
        None => Ok(()),
    }
}

fn write_outputs(output_dir: &Path, planned: &[PlannedOutput], dry_run: bool) -> Result<Vec<(PathBuf, u64)>> {
    if dry_run {
        info!("Performing dry run - no files will be created");
    } else if !planned.is_empty() {
        std::fs::create_dir_all(output_dir).map_err(|e| {
            Error::io(
                format!("Failed to create output directory {}", output_dir.display()),
                e,
            )
        })?;
    }

    let mut written = Vec::with_capacity(planned.len());
    for output in planned {
        if dry_run {
            info!("Would write: {}", output.target.display());
        } else {
            std::fs::write(&output.target, &output.contents).map_err(|e| {
                Error::io(format!("Failed to write {}", output.target.display()), e)
            })?;
            debug!("Wrote {} (from {})", output.target.display(), output.input.display());
        }
        written.push((output.target.clone(), output.contents.len() as u64));
    }
    Ok(written)
}

/// Generate final conversion report
fn generate_final_report(format: OutputFormat, stats: &ConvertStats) -> Result<()> {
    match format {
        OutputFormat::Human => generate_human_report(stats),
        OutputFormat::Json => generate_json_report(stats),
        OutputFormat::Csv => generate_csv_report(stats),
    }
}

fn generate_human_report(stats: &ConvertStats) -> Result<()> {
    let heading = if stats.dry_run {
        "Dry run complete"
    } else {
        "Conversion complete"
    };
    println!("\n{}", heading.bright_green().bold());
    if let Some(study) = stats.study {
        println!("  {} {}", "Study:".bright_cyan(), study);
    }
    println!(
        "  {} {} converted, {} failed",
        "Files:".bright_cyan(),
        stats.files_converted.to_string().bright_white().bold(),
        stats.files_failed
    );
    println!("  {} {}", "Trials:".bright_cyan(), stats.trials);
    if stats.records_skipped > 0 {
        println!(
            "  {} {}",
            "Skipped rows:".bright_yellow(),
            stats.records_skipped
        );
    }
    println!(
        "  {} {} ({})",
        "Outputs:".bright_cyan(),
        stats.outputs.len(),
        format_size(stats.total_output_size())
    );
    println!(
        "  {} {}",
        "Time:".bright_cyan(),
        HumanDuration(stats.processing_time)
    );

    for (path, size) in &stats.outputs {
        println!("    {} ({})", path.display(), format_size(*size));
    }
    for (input, message) in &stats.failures {
        println!("  {} {}: {}", "Failed".bright_red(), input.display(), message);
    }
    println!();
    Ok(())
}

fn generate_json_report(stats: &ConvertStats) -> Result<()> {
    let text = serde_json::to_string_pretty(&json_report(stats))
        .map_err(|e| Error::io("Failed to render JSON report", e.into()))?;
    println!("{}", text);
    Ok(())
}

fn json_report(stats: &ConvertStats) -> serde_json::Value {
    serde_json::json!({
        "study": stats.study.map(|s| s.name()),
        "dry_run": stats.dry_run,
        "files_converted": stats.files_converted,
        "files_failed": stats.files_failed,
        "trials": stats.trials,
        "records_skipped": stats.records_skipped,
        "inputs": stats.converted,
        "processing_time_seconds": stats.processing_time.as_secs_f64(),
        "total_output_size_bytes": stats.total_output_size(),
        "outputs": stats.outputs.iter().map(|(path, size)| {
            serde_json::json!({
                "path": path.display().to_string(),
                "size_bytes": size
            })
        }).collect::<Vec<_>>(),
        "failures": stats.failures.iter().map(|(input, message)| {
            serde_json::json!({
                "input": input.display().to_string(),
                "error": message
            })
        }).collect::<Vec<_>>()
    })
}

fn generate_csv_report(stats: &ConvertStats) -> Result<()> {
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    writer.write_record(["path", "size_bytes", "status"])?;
    for (path, size) in &stats.outputs {
        let status = if stats.dry_run { "planned" } else { "written" };
        writer.write_record([path.display().to_string(), size.to_string(), status.to_string()])?;
    }
    for (input, message) in &stats.failures {
        writer.write_record([input.display().to_string(), String::new(), format!("failed: {}", message)])?;
    }
    writer
        .flush()
        .map_err(|e| Error::io("Failed to flush CSV report", e))?;
    Ok(())
}

//! Studies command: lists the supported paradigms

use crate::app::studies::Study;
use crate::cli::args::{OutputFormat, StudiesArgs};
use crate::{Error, Result};
use colored::*;

/// One line per study with its default timing and subject rule
pub async fn run_studies(args: StudiesArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => print_human(),
        OutputFormat::Json => println!("{}", studies_json()?),
        OutputFormat::Csv => print_csv()?,
    }
    Ok(())
}

fn subject_rule_text(study: Study) -> String {
    study
        .subject_rule()
        .map(|rule| rule.to_string())
        .unwrap_or_else(|| "none (file stem)".to_string())
}

fn print_human() {
    println!("{}", "Supported studies".bright_green().bold());
    for study in Study::ALL {
        let timing = study.default_timing();
        println!("  {:<16} {}", study.name().bright_cyan(), study.description());
        println!(
            "  {:<16} TR {} ms, {} lead-in scans; subject: {}",
            "",
            timing.tr_ms,
            timing.offset_scans,
            subject_rule_text(study)
        );
    }
}

/// JSON listing of every study
pub fn studies_json() -> Result<String> {
    let studies: Vec<serde_json::Value> = Study::ALL
        .iter()
        .map(|&study| {
            let timing = study.default_timing();
            serde_json::json!({
                "name": study.name(),
                "description": study.description(),
                "tr_ms": timing.tr_ms,
                "offset_scans": timing.offset_scans,
                "subject_rule": study.subject_rule().map(|rule| rule.to_string()),
            })
        })
        .collect();

    serde_json::to_string_pretty(&studies)
        .map_err(|e| Error::io("Failed to render JSON listing", e.into()))
}

fn print_csv() -> Result<()> {
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    writer.write_record(["name", "tr_ms", "offset_scans", "subject_rule", "description"])?;
    for study in Study::ALL {
        let timing = study.default_timing();
        writer.write_record([
            study.name().to_string(),
            timing.tr_ms.to_string(),
            timing.offset_scans.to_string(),
            subject_rule_text(study),
            study.description().to_string(),
        ])?;
    }
    writer
        .flush()
        .map_err(|e| Error::io("Failed to flush CSV listing", e))
}

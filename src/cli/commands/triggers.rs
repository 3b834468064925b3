//! Widen-triggers command

use super::shared::{ensure_writable, setup_logging};
use crate::app::services::triggers::{WidenSpec, WidenSummary, widen_triggers};
use crate::cli::args::WidenTriggersArgs;
use crate::{Error, Result};
use std::fs::File;
use std::io::BufReader;
use tracing::info;

/// Hold each listed trigger code over the following samples and write the result
pub async fn run_widen_triggers(args: WidenTriggersArgs) -> Result<WidenSummary> {
    setup_logging(args.get_log_level(), false);
    args.validate()?;

    let spec = WidenSpec {
        triggers: args.triggers.codes.clone(),
        fs: args.fs,
        change_length: args.change_length,
    };
    info!(
        "Widening triggers {:?} in {} over {} samples",
        spec.triggers,
        args.input.display(),
        spec.length()
    );

    ensure_writable(&args.output_file, args.force_overwrite)?;

    let source = args.input.display().to_string();
    let input = File::open(&args.input).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::file_not_found(source.clone())
        } else {
            Error::io(format!("Failed to open {}", source), e)
        }
    })?;

    // Widen in memory so a bad input leaves any existing output untouched
    let mut widened = Vec::new();
    let summary = widen_triggers(BufReader::new(input), &mut widened, &spec, &source)?;
    std::fs::write(&args.output_file, widened).map_err(|e| {
        Error::io(format!("Failed to write {}", args.output_file.display()), e)
    })?;

    info!(
        "{} rows, {} trigger starts, {} rows changed; wrote {}",
        summary.rows,
        summary.starts,
        summary.rows_changed,
        args.output_file.display()
    );
    Ok(summary)
}

//! Command implementations for the eprime2spm CLI
//!
//! Each subcommand lives in its own module; `shared` holds logging setup,
//! configuration layering and input discovery.

pub mod contrasts;
pub mod convert;
pub mod report;
pub mod shared;
pub mod studies;
pub mod triggers;

pub use convert::ConvertStats;

use crate::cli::args::{Args, Commands};
use crate::{Error, Result};
use tokio_util::sync::CancellationToken;

/// Dispatch to the selected subcommand
///
/// Only `convert` runs long enough to observe cancellation; the other
/// commands finish or fail on their own.
pub async fn run(args: Args, cancellation_token: CancellationToken) -> Result<()> {
    let Some(command) = args.command else {
        return Err(Error::configuration("No command given"));
    };

    match command {
        Commands::Convert(convert_args) => {
            convert::run_convert(convert_args, cancellation_token).await?;
        }
        Commands::Contrasts(contrasts_args) => contrasts::run_contrasts(contrasts_args).await?,
        Commands::Report(report_args) => report::run_report(report_args).await?,
        Commands::WidenTriggers(widen_args) => {
            triggers::run_widen_triggers(widen_args).await?;
        }
        Commands::Studies(studies_args) => studies::run_studies(studies_args).await?,
    }
    Ok(())
}

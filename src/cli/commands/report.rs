//! Cluster report command

use super::shared::{read_text_input, setup_logging, write_text_output};
use crate::Result;
use crate::app::services::cluster_report::{parse_report, render_table};
use crate::cli::args::ReportArgs;
use tracing::{info, warn};

/// Turn an xjView cluster report into a tab-separated table
pub async fn run_report(args: ReportArgs) -> Result<()> {
    setup_logging(args.get_log_level(), false);

    let clusters = parse_report(&read_text_input(&args.report_file)?)?;
    if clusters.is_empty() {
        warn!("No clusters found in {}", args.report_file.display());
    } else {
        info!("Parsed {} clusters", clusters.len());
    }

    let table = render_table(&clusters)?;
    write_text_output(args.output_file.as_deref(), &table, args.force_overwrite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::services::cluster_report::TABLE_HEADER;
    use std::fs;
    use tempfile::TempDir;

    const REPORT: &str = "\
Cluster 1
Number of voxels: 200
Peak MNI coordinate: -42 18 24
Peak intensity: 5.1250
50 brodmann area 9
----
";

    #[tokio::test]
    async fn test_report_written_to_file() {
        let dir = TempDir::new().unwrap();
        let report_file = dir.path().join("report.txt");
        let output_file = dir.path().join("table.tsv");
        fs::write(&report_file, REPORT).unwrap();

        run_report(ReportArgs {
            report_file,
            output_file: Some(output_file.clone()),
            force_overwrite: false,
            verbose: 0,
        })
        .await
        .unwrap();

        let text = fs::read_to_string(output_file).unwrap();
        assert_eq!(text.lines().next(), Some(TABLE_HEADER));
        assert_eq!(text.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_existing_table_is_kept() {
        let dir = TempDir::new().unwrap();
        let report_file = dir.path().join("report.txt");
        let output_file = dir.path().join("table.tsv");
        fs::write(&report_file, REPORT).unwrap();
        fs::write(&output_file, "old table\n").unwrap();

        let result = run_report(ReportArgs {
            report_file,
            output_file: Some(output_file.clone()),
            force_overwrite: false,
            verbose: 0,
        })
        .await;
        assert!(matches!(result, Err(crate::Error::OutputExists { .. })));
        assert_eq!(fs::read_to_string(output_file).unwrap(), "old table\n");
    }
}

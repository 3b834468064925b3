//! Global contrasts command

use super::shared::{read_text_input, setup_logging, write_text_output};
use crate::Result;
use crate::app::services::contrasts::{InclusionMatrix, parse_contrast_file, render_global_contrasts};
use crate::cli::args::ContrastsArgs;
use tracing::info;

/// Spread session contrasts over the four sessions of the inclusion matrix
pub async fn run_contrasts(args: ContrastsArgs) -> Result<()> {
    setup_logging(args.get_log_level(), false);

    let contrasts = parse_contrast_file(&read_text_input(&args.contrast_file)?)?;
    let matrix = InclusionMatrix::parse(&read_text_input(&args.matrix_file)?)?;
    info!(
        "Read {} contrasts from {}",
        contrasts.len(),
        args.contrast_file.display()
    );

    let rendered = render_global_contrasts(&contrasts, &matrix)?;
    write_text_output(args.output_file.as_deref(), &rendered, args.force_overwrite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_contrasts_written_to_file() {
        let dir = TempDir::new().unwrap();
        let contrast_file = dir.path().join("contrasts.txt");
        let matrix_file = dir.path().join("matrix.txt");
        let output_file = dir.path().join("global.txt");
        fs::write(&contrast_file, "A : 1 0 0 0 0\n").unwrap();
        fs::write(&matrix_file, "1 1 1 1\n1 1 1 1\n1 1 1 1\n1 1 1 1\n").unwrap();

        run_contrasts(ContrastsArgs {
            contrast_file,
            matrix_file,
            output_file: Some(output_file.clone()),
            force_overwrite: false,
            verbose: 0,
        })
        .await
        .unwrap();

        let text = fs::read_to_string(output_file).unwrap();
        assert!(text.starts_with("A  : "));
        assert_eq!(text.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_missing_matrix() {
        let dir = TempDir::new().unwrap();
        let contrast_file = dir.path().join("contrasts.txt");
        fs::write(&contrast_file, "A : 1 0 0 0 0\n").unwrap();

        let result = run_contrasts(ContrastsArgs {
            contrast_file,
            matrix_file: dir.path().join("missing.txt"),
            output_file: None,
            force_overwrite: false,
            verbose: 0,
        })
        .await;
        assert!(matches!(result, Err(crate::Error::FileNotFound { .. })));
    }

    #[tokio::test]
    async fn test_existing_output_needs_force() {
        let dir = TempDir::new().unwrap();
        let contrast_file = dir.path().join("contrasts.txt");
        let matrix_file = dir.path().join("matrix.txt");
        let output_file = dir.path().join("global.txt");
        fs::write(&contrast_file, "A : 1 0 0 0 0\n").unwrap();
        fs::write(&matrix_file, "1 1 1 1\n1 1 1 1\n1 1 1 1\n1 1 1 1\n").unwrap();
        fs::write(&output_file, "keep me\n").unwrap();

        let args = ContrastsArgs {
            contrast_file,
            matrix_file,
            output_file: Some(output_file.clone()),
            force_overwrite: false,
            verbose: 0,
        };
        let result = run_contrasts(args.clone()).await;
        assert!(matches!(result, Err(crate::Error::OutputExists { .. })));
        assert_eq!(fs::read_to_string(&output_file).unwrap(), "keep me\n");

        run_contrasts(ContrastsArgs {
            force_overwrite: true,
            ..args
        })
        .await
        .unwrap();
        assert!(fs::read_to_string(&output_file).unwrap().starts_with("A  : "));
    }
}

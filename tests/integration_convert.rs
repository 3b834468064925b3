//! End-to-end conversion of E-Prime logs on disk
//!
//! These tests write small recall/rotate logs into a temporary directory and
//! run the convert command the way the binary does.

use eprime2spm::Error;
use eprime2spm::app::studies::Study;
use eprime2spm::cli::args::{ConvertArgs, OutputFormat};
use eprime2spm::cli::commands::convert::run_convert;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const HEADER: &str = "Delay1[Trial]\tDelay2[Trial]\tBlockNum\tPracticed\tEncoding.OnsetTime\tEncoding.RT\t\
                      Execution.OnsetTime\tExecution.RT\tRecallProbe.OnsetTime\tRecallProbe.RT\tRecallProbe.ACC\t\
                      RotationProbe.OnsetTime\tRotationProbe.RT\tRotationProbe.ACC\tOperator1[Trial]";

const ROWS: [&str; 4] = [
    "1500\t2500\t1\tYes\t10000\t1200\t15000\t900\t20000\t800\t1\t\t\t\tRECALL",
    "1500\t2500\t1\tNo\t22000\t1000\t27000\t1100\t\t\t\t32000\t700\t1\tROTATE",
    "1500\t2500\t1\tYes\t34000\t1300\t39000\t1000\t44000\t600\t0\t\t\t\tRECALL",
    "1500\t2500\t2\tNo\t60000\t1000\t65000\t800\t\t\t\t70000\t900\t1\tROTATE",
];

fn write_log(dir: &Path, subject: u32) -> PathBuf {
    let path = dir.join(format!("ROI-fMRI-2015-S1-run-{}.txt", subject));
    let mut text = String::from(HEADER);
    text.push('\n');
    for row in ROWS {
        text.push_str(row);
        text.push('\n');
    }
    fs::write(&path, text).unwrap();
    path
}

fn convert_args(study: Study, inputs: Vec<PathBuf>, output_dir: &Path) -> ConvertArgs {
    ConvertArgs {
        study,
        inputs,
        output_dir: Some(output_dir.to_path_buf()),
        subject: None,
        block_plan: None,
        config_file: None,
        workers: Some(4),
        force_overwrite: false,
        dry_run: false,
        verbose: 0,
        quiet: true,
        output_format: OutputFormat::Json,
    }
}

#[tokio::test]
async fn test_convert_directory_of_subjects() {
    let dir = TempDir::new().unwrap();
    let logs = dir.path().join("logs");
    fs::create_dir_all(&logs).unwrap();
    write_log(&logs, 23);
    write_log(&logs, 24);
    let out = dir.path().join("spm");

    let stats = run_convert(convert_args(Study::Roi, vec![logs], &out), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(stats.files_converted, 2);
    assert_eq!(stats.files_failed, 0);
    assert_eq!(stats.trials, 8);
    for subject in ["23", "24"] {
        let script = fs::read_to_string(out.join(format!("s{}_sessions.m", subject))).unwrap();
        assert!(script.starts_with("names=cell(1,9);\n"));
        assert!(script.contains("save('session2.mat', 'names', 'onsets', 'durations');"));
        assert!(out.join(format!("s{}_contrasts.txt", subject)).is_file());
    }
}

#[tokio::test]
async fn test_glob_input_and_subject_override() {
    let dir = TempDir::new().unwrap();
    write_log(dir.path(), 23);
    let out = dir.path().join("spm");

    let pattern = dir.path().join("ROI-*.txt");
    let mut args = convert_args(Study::Roi, vec![pattern], &out);
    args.subject = Some("pilot".to_string());
    run_convert(args, CancellationToken::new()).await.unwrap();

    assert!(out.join("spilot_sessions.m").is_file());
    assert!(!out.join("s23_sessions.m").exists());
}

#[tokio::test]
async fn test_shared_block_regressor_files_collide() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("blocks.txt"), "10 True\n8 True\n").unwrap();
    let first = write_log(dir.path(), 23);
    let second = write_log(dir.path(), 24);
    let out = dir.path().join("spm");

    let err = run_convert(
        convert_args(Study::RoiDcm, vec![first.clone(), second], &out),
        CancellationToken::new(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::OutputCollision { .. }));
    assert!(!out.exists());

    // One subject at a time converts cleanly
    let stats = run_convert(convert_args(Study::RoiDcm, vec![first], &out), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(stats.outputs.len(), 3);
    assert!(out.join("s23_dcm_sessions.m").is_file());
}

#[tokio::test]
async fn test_missing_columns_fail_single_input() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("ROI-fMRI-2015-S1-run-23.txt");
    fs::write(&input, "BlockNum\tPracticed\n1\tYes\n").unwrap();

    let err = run_convert(
        convert_args(Study::Roi, vec![input], &dir.path().join("spm")),
        CancellationToken::new(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::MissingColumn { .. }));
}

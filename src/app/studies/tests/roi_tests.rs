//! Recall/rotate operator conversion tests: factorial, per-event and DCM

use super::super::roi::dcm::{BLOCK_REGRESSORS_FILE, SHORTFORM_REGRESSORS_FILE};
use super::super::roi::{parse_trials, Operator};
use super::super::{ConversionContext, Study};
use super::{context, convert, lines, table, text};
use crate::constants::ROI_CONTRASTS;
use crate::Error;
use std::fs;
use tempfile::TempDir;

const FILE: &str = "ROI-fMRI-2015-S1-run-23.txt";

const HEADERS: [&str; 15] = [
    "Delay1[Trial]",
    "Delay2[Trial]",
    "BlockNum",
    "Practiced",
    "Encoding.OnsetTime",
    "Encoding.RT",
    "Execution.OnsetTime",
    "Execution.RT",
    "RecallProbe.OnsetTime",
    "RecallProbe.RT",
    "RecallProbe.ACC",
    "RotationProbe.OnsetTime",
    "RotationProbe.RT",
    "RotationProbe.ACC",
    "Operator1[Trial]",
];

fn rows() -> Vec<Vec<String>> {
    vec![
        row![1500, 2500, 1, "Yes", 10000, 1200, 15000, 900, 20000, 800, 1, "", "", "", "RECALL"],
        row![1500, 2500, 1, "No", 22000, 1000, 27000, 1100, "", "", "", 32000, 700, 1, "ROTATE"],
        row![1500, 2500, 1, "Yes", 34000, 1300, 39000, 1000, 44000, 600, 0, "", "", "", "RECALL"],
        row![1500, 2500, 2, "No", 60000, 1000, 65000, 800, "", "", "", 70000, 900, 1, "ROTATE"],
    ]
}

#[test]
fn test_probe_columns_follow_operator() {
    let log = table(FILE, &HEADERS, &rows());
    let result = parse_trials(&log).unwrap();

    let probes: Vec<(Operator, i64, i64)> = result
        .trials
        .iter()
        .map(|t| (t.operator, t.phases.probe.onset, t.phases.accuracy))
        .collect();
    assert_eq!(
        probes,
        vec![
            (Operator::Recall, 20000, 1),
            (Operator::Rotate, 32000, 1),
            (Operator::Recall, 44000, 0),
            (Operator::Rotate, 70000, 1),
        ]
    );
}

#[test]
fn test_unknown_operator_is_fatal() {
    let mut rows = rows();
    rows.push(row![1500, 2500, 2, "No", 80000, 1000, 85000, 800, 90000, 500, 1, "", "", "", "SHIFT"]);
    let log = table(FILE, &HEADERS, &rows);

    let err = Study::Roi.convert(&log, &context(FILE, Study::Roi)).unwrap_err();
    assert!(matches!(err, Error::InvalidTrialType { ref value, .. } if value == "SHIFT"));
}

#[test]
fn test_unreadable_row_with_unknown_operator_is_dropped() {
    let mut rows = rows();
    rows.insert(0, row!["", "", 0, "", "", "", "", "", "", "", "", "", "", "", ""]);
    let log = table(FILE, &HEADERS, &rows);

    let result = parse_trials(&log).unwrap();
    assert_eq!(result.trials.len(), 4);
    assert_eq!(result.stats.records_skipped, 1);
}

#[test]
fn test_factorial_sessions() {
    let output = convert(Study::Roi, FILE, &HEADERS, &rows());

    assert_eq!(output.subject, "23");
    let expected_block1 = "\
names=cell(1,9);
onsets=cell(1,9);
durations=cell(1,9);
names{1}='recall/Encoding/Practiced';
onsets{1}=[4.0];
durations{1}=[1.2];
names{2}='recall/Execution/Practiced';
onsets{2}=[9.0];
durations{2}=[0.9];
names{3}='recall/Probe';
onsets{3}=[14.0];
durations{3}=[0.8];
names{4}='rotate/Encoding/Novel';
onsets{4}=[16.0];
durations{4}=[1.0];
names{5}='rotate/Execution/Novel';
onsets{5}=[21.0];
durations{5}=[1.1];
names{6}='rotate/Probe';
onsets{6}=[26.0];
durations{6}=[0.7];
names{7}='Encoding/Error';
onsets{7}=[28.0];
durations{7}=[1.3];
names{8}='Execution/Error';
onsets{8}=[33.0];
durations{8}=[1.0];
names{9}='Probe/Error';
onsets{9}=[38.0];
durations{9}=[0.6];
save('session1.mat', 'names', 'onsets', 'durations');
";
    let script = text(&output, "s23_sessions.m");
    assert!(script.starts_with(expected_block1));
    assert!(script.ends_with(
        "names{3}='rotate/Probe';\nonsets{3}=[14.0];\ndurations{3}=[0.9];\n\
         save('session2.mat', 'names', 'onsets', 'durations');\n"
    ));
}

#[test]
fn test_factorial_contrasts() {
    let output = convert(Study::Roi, FILE, &HEADERS, &rows());
    let contrasts = lines(&output, "s23_contrasts.txt");

    assert_eq!(contrasts.len(), ROI_CONTRASTS.len());
    assert_eq!(contrasts[0], "ReIP : [1.0 0 0 0 0 0 0 0 0 0 0 0]");
    assert_eq!(contrasts[4], "ReR : [0 0 1.0 0 0 0 0 0 0 0 0 0]");
    assert_eq!(contrasts[7], "RoIN : [0 0 0 0.5 0 0 0 0 0 0.5 0 0]");
    assert_eq!(
        contrasts[10],
        "Re > Ro : [0.33 0.33 0.33 -0.17 -0.17 -0.17 0 0 0 -0.17 -0.17 -0.17]"
    );
}

#[test]
fn test_event_sessions() {
    let output = convert(Study::RoiGnb, FILE, &HEADERS, &rows());
    let script = text(&output, "s23_sessions_gnb.m");

    assert!(script.starts_with("names=cell(1,9);\n"));
    assert!(script.contains("names{1}='Encoding_recall_Practiced_1';\nonsets{1}=[4.0];\ndurations{1}=[1.2];"));
    assert!(script.contains("names{2}='Encoding_rotate_Novel_1';\nonsets{2}=[16.0];"));
    assert!(script.contains("names{3}='recall/Execution/Practiced';"));
    assert!(script.contains("names{4}='rotate/Execution/Novel';"));
    assert!(script.contains("names{5}='recall/Probe';"));
    assert!(script.contains("names{6}='rotate/Probe';"));
    // Numbering carries over into the next block
    assert!(script.contains("names{1}='Encoding_rotate_Novel_2';\nonsets{1}=[4.0];"));
}

#[test]
fn test_event_contrasts() {
    let output = convert(Study::RoiGnb, FILE, &HEADERS, &rows());

    assert_eq!(
        lines(&output, "s23_contrasts_gnb.txt"),
        vec![
            "Encoding/Error : 0 0 0 0 0 0 1.0 0 0 0 0 0",
            "Encoding_recall_Practiced_1 : 1.0 0 0 0 0 0 0 0 0 0 0 0",
            "Encoding_rotate_Novel_1 : 0 1.0 0 0 0 0 0 0 0 0 0 0",
            "Encoding_rotate_Novel_2 : 0 0 0 0 0 0 0 0 0 1.0 0 0",
            "Execution/Error : 0 0 0 0 0 0 0 1.0 0 0 0 0",
            "Probe/Error : 0 0 0 0 0 0 0 0 1.0 0 0 0",
            "recall/Execution/Practiced : 0 0 1.0 0 0 0 0 0 0 0 0 0",
            "recall/Probe : 0 0 0 0 1.0 0 0 0 0 0 0 0",
            "rotate/Execution/Novel : 0 0 0 0.5 0 0 0 0 0 0 0.5 0",
            "rotate/Probe : 0 0 0 0 0 0.5 0 0 0 0 0 0.5",
        ]
    );
}

fn dcm_context(dir: &TempDir, plan: &str) -> ConversionContext {
    let plan_path = dir.path().join("blocks.txt");
    fs::write(&plan_path, plan).unwrap();
    context(FILE, Study::RoiDcm).with_block_plan(Some(plan_path))
}

#[test]
fn test_concatenated_session() {
    let dir = TempDir::new().unwrap();
    let ctx = dcm_context(&dir, "10 True\n8 True\n");
    let log = table(FILE, &HEADERS, &rows());
    let output = Study::RoiDcm.convert(&log, &ctx).unwrap();

    // Block 2 is shifted by the 9 usable scans of block 1
    let expected = "\
names=cell(1,5);
onsets=cell(1,5);
durations=cell(1,5);
names{1}='VisualStimulus';
onsets{1}=[4.0, 9.0, 14.0, 16.0, 21.0, 26.0, 28.0, 33.0, 38.0, 22.0, 27.0, 32.0];
durations{1}=[1.2, 0.9, 0.8, 1.0, 1.1, 0.7, 1.3, 1.0, 0.6, 1.0, 0.8, 0.9];
names{2}='Encoding_recall';
onsets{2}=[4.0];
durations{2}=[1.2];
names{3}='Execution_recall';
onsets{3}=[9.0];
durations{3}=[0.9];
names{4}='Encoding_rotate';
onsets{4}=[16.0, 22.0];
durations{4}=[1.0, 1.0];
names{5}='Execution_rotate';
onsets{5}=[21.0, 27.0];
durations{5}=[1.1, 0.8];
save('dcm_session.mat', 'names', 'onsets', 'durations');
";
    assert_eq!(text(&output, "s23_dcm_sessions.m"), expected);

    let full = lines(&output, BLOCK_REGRESSORS_FILE);
    assert_eq!(full.len(), 16);
    assert_eq!(full[8], "1\t0\t");
    assert_eq!(full[9], "0\t1\t");
    let short = lines(&output, SHORTFORM_REGRESSORS_FILE);
    assert_eq!(short[0], "1\t");
    assert_eq!(short[15], "0\t");
}

#[test]
fn test_dropped_block_trials_removed() {
    let dir = TempDir::new().unwrap();
    let ctx = dcm_context(&dir, "10 True\n8 False\n");
    let log = table(FILE, &HEADERS, &rows());
    let output = Study::RoiDcm.convert(&log, &ctx).unwrap();

    assert_eq!(output.trials, 3);
    let script = text(&output, "s23_dcm_sessions.m");
    assert!(script.contains("names{4}='Encoding_rotate';\nonsets{4}=[16.0];"));
    assert_eq!(lines(&output, BLOCK_REGRESSORS_FILE).len(), 9);
}

#[test]
fn test_missing_block_plan() {
    let dir = TempDir::new().unwrap();
    let ctx = context(FILE, Study::RoiDcm).with_block_plan(Some(dir.path().join("blocks.txt")));
    let log = table(FILE, &HEADERS, &rows());

    let err = Study::RoiDcm.convert(&log, &ctx).unwrap_err();
    assert!(matches!(err, Error::FileNotFound { .. }));
}

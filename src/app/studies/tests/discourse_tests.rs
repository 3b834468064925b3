//! Discourse comprehension conversion tests

use super::super::discourse::DiscourseConverter;
use super::super::Study;
use super::{convert, table, text};

const HEADERS: [&str; 7] = [
    "Block1Probe.OnsetTime",
    "Block1Probe.RT",
    "Block1Probe.ACC",
    "Block2Probe.OnsetTime",
    "Block2Probe.RT",
    "Block2Probe.ACC",
    "Condition",
];

fn rows() -> Vec<Vec<String>> {
    vec![
        row![30000, 1200, 1, "", "", "", "supporting"],
        row![60000, 0, 0, "", "", "", "neutral"],
        row!["", "", "", 130000, 900, 1, "neutral"],
    ]
}

#[test]
fn test_block_taken_from_probe_columns() {
    let output = convert(Study::Discourse, "07_discourse.txt", &HEADERS, &rows());

    assert_eq!(output.subject, "07");
    assert_eq!(output.blocks, 2);

    let expected_block2 = "\
names=cell(1,3);
onsets=cell(1,3);
durations=cell(1,3);
names{1}='Context neutral';
onsets{1}=[0.0];
durations{1}=[9.0];
names{2}='Critical neutral';
onsets{2}=[15.0];
durations{2}=[4.0];
names{3}='Probe neutral';
onsets{3}=[24.0];
durations{3}=[0.9];
save('session2.mat', 'names', 'onsets', 'durations');

";
    assert!(text(&output, "s07_sessions.m").ends_with(expected_block2));
}

#[test]
fn test_derived_phases_and_errors() {
    let output = convert(Study::Discourse, "07_discourse.txt", &HEADERS, &rows());
    let script = text(&output, "s07_sessions.m");

    assert!(script.starts_with("names=cell(1,9);\n"));
    assert!(script.contains("names{1}='Context supporting';\nonsets{1}=[0.0];\ndurations{1}=[9.0];"));
    assert!(script.contains("names{4}='Critical neutral';\nonsets{4}=[45.0];\ndurations{4}=[4.0];"));
    // Probe timeout becomes the probe display time
    assert!(script.contains("names{6}='Probe neutral';\nonsets{6}=[54.0];\ndurations{6}=[3.0];"));
    assert!(script.contains("names{7}='Context (Error)';\nonsets{7}=[30.0];"));
    assert!(script.contains("names{9}='Probe (Error)';"));
    assert!(script.contains("save('session1.mat', 'names', 'onsets', 'durations');\n\n"));
}

#[test]
fn test_error_regressors_skipped_without_errors() {
    let rows = vec![row![30000, 1200, 1, "", "", "", "supporting"]];
    let output = convert(Study::Discourse, "11_discourse.txt", &HEADERS, &rows);
    let script = text(&output, "s11_sessions.m");

    assert!(script.starts_with("names=cell(1,3);\n"));
    assert!(!script.contains("(Error)"));
}

#[test]
fn test_short_row_is_not_routed_to_block_two() {
    let headers = [
        "Condition",
        "Block2Probe.OnsetTime",
        "Block2Probe.RT",
        "Block2Probe.ACC",
        "Block1Probe.OnsetTime",
        "Block1Probe.RT",
        "Block1Probe.ACC",
    ];
    let rows = vec![
        row!["neutral", 130000, 900, 1, "", "", ""],
        row!["neutral", 140000, 900, 1],
    ];
    let log = table("07_discourse.txt", &headers, &rows);

    let result = DiscourseConverter.parse_trials(&log).unwrap();
    assert_eq!(result.trials.len(), 1);
    assert_eq!(result.trials[0].block, 2);
    assert_eq!(result.trials[0].probe_onset, 130000);
    assert_eq!(result.stats.records_skipped, 1);
    assert!(result.stats.errors[0].contains("Block1Probe.OnsetTime"));
}

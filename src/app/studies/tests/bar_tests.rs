//! Logic reasoning conversion tests

use super::super::bar::{BarConverter, BarVariant};
use super::super::Study;
use super::{context, convert, lines, table, text};
use crate::Error;

const TRIAL_HEADERS: [&str; 9] = [
    "BlockNum",
    "Problem.OnsetTime[Trial]",
    "Problem.RT[Trial]",
    "Choice.OnsetTime[Trial]",
    "Choice.RT[Trial]",
    "Choice.ACC[Trial]",
    "Logic[Trial]",
    "Rules[Trial]",
    "NumRules[Trial]",
];

const BLOCK_HEADERS: [&str; 8] = [
    "Problem.OnsetTime[Block]",
    "Problem.RT[Block]",
    "Choice.OnsetTime[Block]",
    "Choice.RT[Block]",
    "Choice.ACC[Block]",
    "Logic[Block]",
    "Rules[Block]",
    "NumRules[Block]",
];

fn headers() -> Vec<&'static str> {
    TRIAL_HEADERS.iter().chain(BLOCK_HEADERS.iter()).copied().collect()
}

/// A trial-level row with two rules and blank block-level cells
fn trial(block: i64, p_on: i64, p_rt: i64, c_on: i64, c_rt: i64, acc: i64, logic: &str, rules: &str) -> Vec<String> {
    let mut cells = row![block, p_on, p_rt, c_on, c_rt, acc, logic, rules, 2];
    cells.extend(std::iter::repeat(String::new()).take(BLOCK_HEADERS.len()));
    cells
}

/// The block-level special problem; its trial-level cells are blank
fn special(p_on: i64, p_rt: i64, c_on: i64, c_rt: i64, logic: &str, rules: &str) -> Vec<String> {
    let mut cells: Vec<String> = std::iter::repeat(String::new()).take(TRIAL_HEADERS.len()).collect();
    cells.extend(row![p_on, p_rt, c_on, c_rt, 1, logic, rules, 3]);
    cells
}

#[test]
fn test_standard_sessions() {
    let rows = vec![
        trial(1, 10000, 5000, 16000, 1000, 1, "Logic", "Low"),
        trial(1, 30000, 0, 61000, 0, 0, "Non-Logic", "High"),
        trial(2, 100000, 4000, 105000, 800, 1, "Logic", "Low"),
        special(120000, 3000, 124000, 900, "Logic", "High"),
        row![1],
    ];
    let output = convert(Study::Bar, "bar-12-1.txt", &headers(), &rows);

    assert_eq!(output.subject, "12");
    assert_eq!(output.trials, 4);
    assert_eq!(output.blocks, 2);
    assert_eq!(output.stats.records_skipped, 1);

    let expected = "\
names=cell(1,4);
onsets=cell(1,4);
durations=cell(1,4);
names{1}='Problem/High/Non-Logic';
onsets{1}=[24.0];
durations{1}=[30.0];
names{2}='Problem/Low/Logic';
onsets{2}=[4.0];
durations{2}=[5.0];
names{3}='Choice/High/Non-Logic';
onsets{3}=[55.0];
durations{3}=[4.0];
names{4}='Choice/Low/Logic';
onsets{4}=[10.0];
durations{4}=[1.0];
save('session1.mat', 'names', 'onsets', 'durations');
names=cell(1,4);
onsets=cell(1,4);
durations=cell(1,4);
names{1}='Problem/Low/Logic';
onsets{1}=[4.0];
durations{1}=[4.0];
names{2}='Problem/High/Logic';
onsets{2}=[24.0];
durations{2}=[3.0];
names{3}='Choice/Low/Logic';
onsets{3}=[9.0];
durations{3}=[0.8];
names{4}='Choice/High/Logic';
onsets{4}=[28.0];
durations{4}=[0.9];
save('session2.mat', 'names', 'onsets', 'durations');
";
    assert_eq!(text(&output, "s12_sessions.m"), expected);
}

#[test]
fn test_onsets_round_half_away_from_zero() {
    let rows = vec![
        trial(1, 10000, 1000, 14500, 1000, 1, "Logic", "Low"),
        trial(1, 20500, 1000, 25000, 1000, 1, "Logic", "Low"),
    ];
    let output = convert(Study::Bar, "bar-3-1.txt", &headers(), &rows);
    let script = text(&output, "s3_sessions.m");

    // Anchor 6000: 14.5 s rounds to 15.0, 8.5 s to 9.0
    assert!(script.contains("onsets{1}=[4.0, 15.0];"));
    assert!(script.contains("onsets{2}=[9.0, 19.0];"));
}

#[test]
fn test_mean_rt_variant() {
    let rows = vec![
        trial(1, 10000, 2000, 13000, 1000, 1, "Logic", "Low"),
        trial(3, 200000, 4000, 205000, 0, 0, "Non-Logic", "High"),
        special(300000, 3000, 304000, 500, "Logic", "High"),
    ];
    let output = convert(Study::BarMeanRt, "bar-07-2.txt", &headers(), &rows);

    let behavioral = lines(&output, "07_behavioral_data.txt");
    assert_eq!(
        behavioral,
        vec![
            "Subject\tBlock\tNumRules\tRules\tLogic\tProblem\tChoice\tAccuracy",
            "07\t1\t2\tLow\tLogic\t2000\t1000\t1",
            "07\t3\t2\tHigh\tNon-Logic\t4000\t4000\t0",
            "07\t2\t3\tHigh\tLogic\t3000\t500\t1",
        ]
    );

    let script = text(&output, "s07_sessions_mean_rt.m");
    // The special problem is its own block 2, anchored at its own onset
    assert!(script.contains("save('session2.mat', 'names', 'onsets', 'durations');"));
    assert!(script.contains("names{1}='Problem/High/Logic';\nonsets{1}=[4.0];\ndurations{1}=[3.0];"));
    // Problem durations are the mean problem RT of the whole file
    assert!(script.contains("names{1}='Problem/Low/Logic';\nonsets{1}=[4.0];\ndurations{1}=[3.0];"));
    assert!(script.contains("names{2}='Choice/Low/Logic';\nonsets{2}=[7.0];\ndurations{2}=[1.0];"));
    assert_eq!(output.blocks, 3);
}

#[test]
fn test_missing_special_group_drops_unreadable_rows() {
    let rows = vec![
        row![1, 10000, 1000, 12000, 500, 1, "Logic", "Low", 2],
        row![1, "", "", "", "", "", "", "", ""],
    ];
    let output = convert(Study::Bar, "bar-5-1.txt", &TRIAL_HEADERS, &rows);

    assert_eq!(output.trials, 1);
    assert_eq!(output.stats.records_skipped, 1);
}

#[test]
fn test_bare_column_fallback() {
    let headers = [
        "BlockNum",
        "Problem.OnsetTime",
        "Problem.RT",
        "Choice.OnsetTime",
        "Choice.RT",
        "Choice.ACC",
        "Logic",
        "Rules",
        "NumRules",
    ];
    let rows = vec![row![4, 10000, 1000, 12000, 500, 1, "Logic", "High", 2]];
    let output = convert(Study::Bar, "bar-5-1.txt", &headers, &rows);

    assert!(text(&output, "s5_sessions.m").contains("names{1}='Problem/High/Logic';"));
}

#[test]
fn test_strict_requires_exact_columns() {
    let mut strict_headers = headers();
    strict_headers.push("Delay1[Trial]");
    let rows = vec![trial(1, 10000, 1000, 12000, 500, 1, "Logic", "Low")];

    // Delay2[Trial] is missing
    let log = table("bar_31_a.txt", &strict_headers, &rows);
    let converter = BarConverter::new(BarVariant::Strict);
    let err = converter.parse_trials(&log).unwrap_err();
    assert!(matches!(err, Error::MissingColumn { .. }));

    strict_headers.push("Delay2[Trial]");
    let rows: Vec<Vec<String>> = rows
        .into_iter()
        .map(|mut cells| {
            cells.extend(row![0, 0]);
            cells
        })
        .collect();
    let log = table("bar_31_a.txt", &strict_headers, &rows);
    let output = Study::BarStrict
        .convert(&log, &context("bar_31_a.txt", Study::BarStrict))
        .unwrap();
    assert_eq!(output.subject, "31");
    assert!(output.file("s31_sessions.m").is_some());
}

#[test]
fn test_no_trials_is_error() {
    let log = table("bar-9-1.txt", &headers(), &[row![1]]);
    let err = Study::Bar
        .convert(&log, &context("bar-9-1.txt", Study::Bar))
        .unwrap_err();
    assert!(matches!(err, Error::NoTrials { .. }));
}

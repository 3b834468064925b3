//! Word choice conversion tests

use super::super::words::WordsConverter;
use super::super::Study;
use super::{convert, table, text};

const HEADERS: [&str; 7] = [
    "Choice1.OnsetTime",
    "Choice1.RT",
    "Choice1.ACC",
    "Choice1.RESP",
    "Condition",
    "Choice1Type",
    "Choice2Type",
];

fn rows() -> Vec<Vec<String>> {
    vec![
        row![10000, 700, 1, "g", "LowLit", "Lit", "Met"],
        row![20000, 900, 0, "g", "MetLit", "MetRel", "LitRel"],
        row![30000, 800, 1, "y", "MetLit", "MetRel", "LitRel"],
        row![40000, 600, 1, "x", "MetLit", "MetRel", "LitRel"],
        row![50000, 500, 0, "g", "HighLit", "Lit", "Met"],
        row![60000, 500, 1, "g", "MetLit", "Other", "LitRel"],
    ]
}

#[test]
fn test_ambiguous_trials_take_chosen_category() {
    let log = table("03_words.txt", &HEADERS, &rows());
    let result = WordsConverter.parse_trials(&log).unwrap();

    let conditions: Vec<(&str, i64)> = result
        .trials
        .iter()
        .map(|t| (t.condition.as_str(), t.accuracy))
        .collect();
    assert_eq!(
        conditions,
        vec![
            ("LowLit", 1),
            ("MetChosen", 1),
            ("LitChosen", 1),
            ("MetLit", 0),
            ("HighLit", 0),
        ]
    );
    // An unknown chosen option rejects the row
    assert_eq!(result.stats.records_skipped, 1);
    assert!(result.stats.errors[0].contains("Other"));
}

#[test]
fn test_word_sessions() {
    let output = convert(Study::Words, "03_words.txt", &HEADERS, &rows());

    let expected = "\
names=cell(1,8);
onsets=cell(1,8);
durations=cell(1,8);
names{1}='Prime LowLit';
onsets{1}=[0.0];
durations{1}=[2.0];
names{2}='Choice LowLit';
onsets{2}=[4.0];
durations{2}=[2.0];
names{3}='Prime LitChosen';
onsets{3}=[20.0];
durations{3}=[2.0];
names{4}='Choice LitChosen';
onsets{4}=[24.0];
durations{4}=[2.0];
names{5}='Prime MetChosen';
onsets{5}=[10.0];
durations{5}=[2.0];
names{6}='Choice MetChosen';
onsets{6}=[14.0];
durations{6}=[2.0];
names{7}='Prime (Error)';
onsets{7}=[30.0, 40.0];
durations{7}=[2.0, 2.0];
names{8}='Choice (Error)';
onsets{8}=[34.0, 44.0];
durations{8}=[2.0, 2.0];
save('session1.mat', 'names', 'onsets', 'durations');
";
    assert_eq!(output.subject, "03");
    assert_eq!(text(&output, "s03_sessions.m"), expected);
}

//! Instructed task conversion tests

use super::super::inst::{InstConverter, InstOutput, InstTrial, OutlierBounds};
use super::super::phases::Event;
use super::super::Study;
use super::{convert, lines, table, text};
use crate::constants::INST_CONTRASTS;

const FILE: &str = "S07-inst-run.txt";

const HEADERS: [&str; 13] = [
    "Block",
    "Trial",
    "Fixation1.OnsetTime",
    "Fixation2.OnsetTime",
    "Complexity",
    "Practiced",
    "TaskEncoding.OnsetTime",
    "TaskEncoding.RT",
    "TaskExecution.OnsetTime",
    "TaskExecution.RT",
    "Probe.OnsetTime",
    "Probe.RT",
    "Probe.ACC",
];

fn rows() -> Vec<Vec<String>> {
    vec![
        row![1, 1, 10000, 17000, "HIGH", "T", 14000, 1500, 20000, 2000, 26000, 600, 1],
        row![1, 2, 30000, 35000, "LOW", "NIL", 32000, 2500, 38000, 1800, 44000, 700, 1],
        row![1, 3, 50000, 55000, "HIGH", "T", 52000, 1000, 58000, 1500, 64000, 0, 0],
        row![2, 1, 100000, 107000, "LOW", "NIL", 104000, 2000, 110000, 1700, 116000, 500, 1],
    ]
}

fn trial(encoding_rt: i64, execution_rt: i64) -> InstTrial {
    InstTrial {
        block: 1,
        complexity: '+',
        practiced: '+',
        encoding: Event::new(14000, encoding_rt),
        execution: Event::new(20000, execution_rt),
        probe: Event::new(26000, 600),
        accuracy: 1,
        begin: 6000,
    }
}

#[test]
fn test_session_script() {
    let output = convert(Study::Inst, FILE, &HEADERS, &rows());

    assert_eq!(output.subject, "S07");
    assert_eq!(output.blocks, 2);
    let expected_block1 = "\
names=cell(1,8);
onsets=cell(1,8);
durations=cell(1,8);
names{1}='ENC/P+';
onsets{1}=[8.0 ];
durations{1}=[1.5 ];
names{2}='ENC/P-';
onsets{2}=[26.0 ];
durations{2}=[2.5 ];
names{3}='EXE/P+';
onsets{3}=[14.0 ];
durations{3}=[2.0 ];
names{4}='EXE/P-';
onsets{4}=[32.0 ];
durations{4}=[1.8 ];
names{5}='Probes';
onsets{5}=[20.0 38.0 ];
durations{5}=[0.6 0.7 ];
names{6}='ENC/Discard';
onsets{6}=[46.0 ];
durations{6}=[1.0 ];
names{7}='EXE/Discard';
onsets{7}=[52.0 ];
durations{7}=[1.5 ];
names{8}='PROBE/Discard';
onsets{8}=[58.0 ];
durations{8}=[2.0 ];
save('session1.mat', 'names', 'onsets', 'durations')
";
    let script = text(&output, "S07sessions.m");
    assert!(script.starts_with(expected_block1));

    let block2 = &script[expected_block1.len()..];
    assert!(block2.starts_with("names=cell(1,5);\n"));
    assert!(block2.contains("names{1}='ENC/P+';\nonsets{1}=[];\ndurations{1}=[];"));
    assert!(block2.contains("names{2}='ENC/P-';\nonsets{2}=[8.0 ];\ndurations{2}=[2.0 ];"));
    assert!(block2.ends_with("save('session2.mat', 'names', 'onsets', 'durations')\n"));
}

#[test]
fn test_observation_counts() {
    let output = convert(Study::Inst, FILE, &HEADERS, &rows());

    assert_eq!(
        lines(&output, "S07.obs.txt"),
        vec![
            "SESSION 1 / ENCODING / P+ \t 1",
            "SESSION 1 / ENCODING / P- \t 1",
            "SESSION 1 / EXECUTION / PRACT : + \t 1",
            "SESSION 1 / EXECUTION / PRACT : - \t 1",
            "SESSION 2 / ENCODING / P+ \t 0",
            "SESSION 2 / ENCODING / P- \t 1",
            "SESSION 2 / EXECUTION / PRACT : + \t 0",
            "SESSION 2 / EXECUTION / PRACT : - \t 1",
        ]
    );
}

#[test]
fn test_condition_listing() {
    let output = convert(Study::Inst, FILE, &HEADERS, &rows());

    assert_eq!(
        text(&output, "S07.session1.conds.txt"),
        "ENCODING / P+ / Onsets\t8.0 \n\
         ENCODING / P+ / Durations\t1.5 \n\
         ENCODING / P- / Onsets\t26.0 \n\
         ENCODING / P- / Durations\t2.5 \n\
         EXECUTION / P+ / Onsets\t14.0 \n\
         EXECUTION / P+ / Durations\t2.0 \n\
         EXECUTION / P- / Onsets\t32.0 \n\
         EXECUTION / P- / Durations\t1.8 \n\
         PROBE / Onsets\t20.0 38.0 \n\
         PROBE / Durations\t0.6 0.7 \n"
    );
    assert!(text(&output, "S07.session2.conds.txt").starts_with("ENCODING / P+ / Onsets\t\n"));
}

#[test]
fn test_contrasts_averaged_over_blocks() {
    let output = convert(Study::Inst, FILE, &HEADERS, &rows());
    let contrasts = lines(&output, "S07.contrasts.txt");

    assert_eq!(contrasts.len(), INST_CONTRASTS.len());
    // Block 1 carries three discard columns, block 2 none
    assert_eq!(
        contrasts[0],
        "Enc P+ : [0.5 0.0 0.0 0.0 0.0 0.0 0.0 0.0 0.5 0.0 0.0 0.0 0.0]"
    );
    assert_eq!(
        contrasts[9],
        "Enc > Exe : [0.25 0.25 -0.25 -0.25 0.0 0.0 0.0 0.0 0.25 0.25 -0.25 -0.25 0.0]"
    );
    assert!(contrasts[26].starts_with("2XN > IN+XP : [0.0 -0.25 -0.25 0.5 0.0"));
}

#[test]
fn test_parametric_lists() {
    let output = convert(Study::InstParametric, FILE, &HEADERS, &rows());

    assert_eq!(output.files.len(), 1);
    assert_eq!(
        text(&output, "S07params.txt"),
        "SESSION 1\n\
         TONSETS: [8.0  14.0  26.0  32.0]\n\
         TDURATIONS: [1.5  2.0  2.5  1.8]\n\
         TPARAMS: [1  1  1  2]\n\
         PONSETS: [20.0  38.0]\n\
         PDURATIONS: [0.6  0.7]\n\
         \n\
         SESSION 2\n\
         TONSETS: [8.0  14.0]\n\
         TDURATIONS: [2.0  1.7]\n\
         TPARAMS: [1  2]\n\
         PONSETS: [20.0]\n\
         PDURATIONS: [0.5]\n\
         \n"
    );
}

#[test]
fn test_unknown_code_and_missing_fixation_drop_rows() {
    let mut rows = rows();
    rows.push(row![2, 2, 0, 0, "MEDIUM", "T", 120000, 1000, 126000, 1000, 132000, 500, 1]);
    rows.push(row![3, 2, 0, 0, "HIGH", "T", 150000, 1000, 156000, 1000, 162000, 500, 1]);
    let log = table(FILE, &HEADERS, &rows);

    let (fixations, result) = InstConverter::new(InstOutput::Sessions)
        .parse_trials(&log, 4000)
        .unwrap();
    assert_eq!(fixations, vec![10000, 100000]);
    assert_eq!(result.trials.len(), 4);
    assert_eq!(result.stats.records_skipped, 2);
    assert_eq!(result.trials[3].begin, 96000);
}

#[test]
fn test_outlier_bounds() {
    let bounds = OutlierBounds {
        encoding: Some(2000.0),
        execution: None,
    };
    assert!(bounds.admits(&trial(1999, 50000)));
    assert!(!bounds.admits(&trial(2000, 1000)));

    // A single correct trial gives no bound
    let bounds = OutlierBounds::from_trials(&[trial(1500, 2000)]);
    assert_eq!(bounds, OutlierBounds::default());
}

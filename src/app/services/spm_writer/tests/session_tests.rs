//! Session script layout tests

use super::super::session_script::{ScriptStyle, SessionScript, ValueFormat};
use super::sample_block;
use crate::app::models::{Regressor, SessionBlock};

#[test]
fn test_default_layout() {
    let script = SessionScript::default();
    let text = script.render_block(&sample_block(1));

    let expected = "\
names=cell(1,2);
onsets=cell(1,2);
durations=cell(1,2);
names{1}='Problem';
onsets{1}=[4.0, 30.0];
durations{1}=[12.5, 9.0];
names{2}='Choice';
onsets{2}=[17.0];
durations{2}=[1.25];
save('session1.mat', 'names', 'onsets', 'durations');
";
    assert_eq!(text, expected);
}

#[test]
fn test_empty_block_declares_zero_cells() {
    let script = SessionScript::default();
    let text = script.render_block(&SessionBlock::new(3));

    assert!(text.starts_with("names=cell(1,0);\n"));
    assert!(text.ends_with("save('session3.mat', 'names', 'onsets', 'durations');\n"));
}

#[test]
fn test_spaced_assignments() {
    let script = SessionScript::new(ScriptStyle::default().spaced());
    let text = script.render_block(&sample_block(1));

    assert!(text.contains("names{1} = 'Problem';\n"));
    assert!(text.contains("onsets{2} = [17.0];\n"));
    // The cell declarations are never spaced
    assert!(text.starts_with("names=cell(1,2);\n"));
}

#[test]
fn test_one_decimal_values_without_save_semicolon() {
    let style = ScriptStyle::default()
        .with_values(ValueFormat::OneDecimal)
        .without_save_semicolon();
    let script = SessionScript::new(style);

    let mut block = SessionBlock::new(2);
    block.push(Regressor::new("ENC/P+", vec![4.25, 10.0], vec![2.04, 3.0]));
    block.push(Regressor::new("ENC/P-", vec![], vec![]));
    let text = script.render_block(&block);

    assert!(text.contains("onsets{1}=[4.3 10.0 ];\n"));
    assert!(text.contains("durations{1}=[2.0 3.0 ];\n"));
    assert!(text.contains("onsets{2}=[];\n"));
    assert!(text.ends_with("save('session2.mat', 'names', 'onsets', 'durations')\n"));
}

#[test]
fn test_custom_mat_file_and_trailing_blank_line() {
    let style = ScriptStyle::default()
        .with_mat_file("redux_session{block}.mat")
        .without_value_semicolons()
        .blank_after_save();
    let script = SessionScript::new(style);
    let text = script.render_block(&sample_block(4));

    assert!(text.contains("onsets{1}=[4.0, 30.0]\n"));
    assert!(text.contains("names{1}='Problem';\n"));
    assert!(text.ends_with(
        "save('redux_session4.mat', 'names', 'onsets', 'durations');\n\n"
    ));
}

#[test]
fn test_render_concatenates_blocks() {
    let script = SessionScript::default();
    let text = script.render(&[sample_block(1), sample_block(2)]);

    assert_eq!(text.matches("names=cell(1,2);").count(), 2);
    assert!(text.contains("save('session2.mat'"));
}

#[test]
fn test_every_line_is_terminated() {
    let style = ScriptStyle::default().spaced().blank_after_save();
    let script = SessionScript::new(style);
    let text = script.render(&[sample_block(1), SessionBlock::new(2)]);

    let expected = "\
names=cell(1,2);
onsets=cell(1,2);
durations=cell(1,2);
names{1} = 'Problem';
onsets{1} = [4.0, 30.0];
durations{1} = [12.5, 9.0];
names{2} = 'Choice';
onsets{2} = [17.0];
durations{2} = [1.25];
save('session1.mat', 'names', 'onsets', 'durations');

names=cell(1,0);
onsets=cell(1,0);
durations=cell(1,0);
save('session2.mat', 'names', 'onsets', 'durations');

";
    assert_eq!(text, expected);
}

//! Language and task switching
//!
//! Trials are crossed on whether the language and the task repeat or switch.
//! Each block becomes its own script, `redux_session<b>.m`.
//!
//! Blocks are opened by their first stimulus sample rather than by a change
//! in `BlockNum`, and the language-repetition/task-repetition cell is thinned
//! to a fixed list of samples so that it matches the other three cells in size.

use crate::app::models::{Regressor, SessionBlock, StudyOutput};
use crate::app::services::eprime_table::field_parsers::{parse_int, parse_string};
use crate::app::services::eprime_table::{EprimeTable, ParseResult};
use crate::app::services::spm_writer::{ScriptStyle, SessionScript};
use crate::app::services::timing::{distinct_blocks, relative_seconds, seconds, BlockAnchors};
use crate::app::studies::{ConversionContext, StudyConverter};
use crate::constants::{SELECTED_REPETITION_TRIALS, TASK_SWITCHING_BLOCK_SAMPLES};
use crate::{Error, Result};
use tracing::{debug, info, warn};

const CONDITIONS: [&str; 2] = ["Repetition", "Switch"];

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchTrial {
    pub block: i64,
    pub language: String,
    pub task: String,
    pub onset: i64,
    pub rt: i64,
    pub accuracy: i64,
    /// Stimulus sample number, running across blocks
    pub sample: i64,
}

impl SwitchTrial {
    /// Whether this sample opens a block
    pub fn opens_block(&self) -> bool {
        self.sample % TASK_SWITCHING_BLOCK_SAMPLES == 1
    }

    fn is_selected(&self) -> bool {
        SELECTED_REPETITION_TRIALS.contains(&self.sample)
    }
}

/// Script file written for a block
pub fn session_file(block: i64) -> String {
    format!("redux_session{}.m", block)
}

fn script_style() -> ScriptStyle {
    ScriptStyle::default()
        .without_value_semicolons()
        .without_save_semicolon()
        .with_mat_file("redux_session{block}.mat")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TaskSwitchingConverter;

impl TaskSwitchingConverter {
    pub fn parse_trials(&self, table: &EprimeTable) -> Result<ParseResult<SwitchTrial>> {
        let block = table.column(&["BlockNum"])?;
        let language = table.column(&["LanguageCondition"])?;
        let task = table.column(&["TaskCondition"])?;
        let onset = table.column(&["StimPresentation.OnsetTime"])?;
        let rt = table.column(&["StimPresentation.RT"])?;
        let acc = table.column(&["StimPresentation.ACC"])?;
        let sample = table.column(&["Stimuli.Sample"])?;

        Ok(table.parse_rows(|record| {
            Ok(SwitchTrial {
                block: parse_int(record, &block)?,
                language: parse_string(record, &language)?,
                task: parse_string(record, &task)?,
                onset: parse_int(record, &onset)?,
                rt: parse_int(record, &rt)?,
                accuracy: parse_int(record, &acc)?,
                sample: parse_int(record, &sample)?,
            })
        }))
    }

    /// Regressors of one block, anchored at `begin`
    fn block_session(&self, number: i64, trials: &[&SwitchTrial], begin: i64) -> SessionBlock {
        let regressor = |name: String, group: &[&SwitchTrial]| {
            Regressor::from_trials(
                name,
                group.iter().copied(),
                |t| relative_seconds(t.onset, begin),
                |t| seconds(t.rt),
            )
        };

        // The opening trial is modelled with the errors
        let (first, rest) = match trials.split_first() {
            Some((first, rest)) => (Some(*first), rest),
            None => (None, trials),
        };
        let mut errors: Vec<&SwitchTrial> = first.into_iter().collect();
        errors.extend(rest.iter().copied().filter(|t| t.accuracy == 0));
        let correct: Vec<&SwitchTrial> = rest.iter().copied().filter(|t| t.accuracy == 1).collect();

        let mut session = SessionBlock::new(number);
        for language in CONDITIONS {
            for task in CONDITIONS {
                let mut cell: Vec<&SwitchTrial> = correct
                    .iter()
                    .copied()
                    .filter(|t| t.language == language && t.task == task)
                    .collect();
                if language == CONDITIONS[0] && task == CONDITIONS[0] {
                    let (kept, dropped): (Vec<_>, Vec<_>) =
                        cell.into_iter().partition(|t| t.is_selected());
                    debug!("Block {}: {} repetition trials moved to errors", number, dropped.len());
                    errors.extend(dropped);
                    cell = kept;
                }
                session.push(regressor(format!("Language{}/Task{}", language, task), &cell));
            }
        }
        session.push_non_empty(regressor("Errors".to_string(), &errors));
        session
    }
}

impl StudyConverter for TaskSwitchingConverter {
    fn convert(&self, table: &EprimeTable, ctx: &ConversionContext) -> Result<StudyOutput> {
        let result = self.parse_trials(table)?;
        let trials = result.trials;
        if trials.is_empty() {
            return Err(Error::no_trials(table.source()));
        }

        let anchors = BlockAnchors::from_marked(
            &trials,
            |t| t.block,
            SwitchTrial::opens_block,
            |t| t.onset,
            ctx.timing.lead_ms(),
        );

        let blocks = distinct_blocks(&trials, |t| t.block);
        info!("{}: {} trials in {} blocks", table.source(), trials.len(), blocks.len());

        let script = SessionScript::new(script_style());
        let mut output = StudyOutput::new(ctx.label(), result.stats);
        output.trials = trials.len();
        output.blocks = blocks.len();

        for number in blocks {
            let begin = anchors.begin(number).unwrap_or_else(|| {
                warn!("Block {} has no opening sample, anchoring at 0", number);
                0
            });
            let subset: Vec<&SwitchTrial> = trials.iter().filter(|t| t.block == number).collect();
            let session = self.block_session(number, &subset, begin);
            output.add_file(session_file(number), script.render_block(&session));
        }

        Ok(output)
    }
}

//! Simon task in blocks (DeSK)
//!
//! The design is blocked: each run of trials shares one instruction screen, one
//! condition and one end marker, and SPM sees the whole block as one event.
//! Next to the session script a small behavioral summary is written per block
//! and per condition.

use crate::app::models::{Regressor, SessionBlock, StudyOutput};
use crate::app::services::eprime_table::field_parsers::{parse_int, parse_string};
use crate::app::services::eprime_table::{EprimeTable, FieldError, ParseResult};
use crate::app::services::spm_writer::{fixed3, round_half_away, ScriptStyle, SessionScript};
use crate::app::services::summary::mean;
use crate::app::services::timing::{relative_seconds, seconds};
use crate::app::studies::{ConversionContext, StudyConverter};
use crate::{Error, Result};
use tracing::{debug, info};

/// All blocks form a single session
const SESSION: i64 = 1;

pub const SESSIONS_FILE: &str = "sessions.m";
pub const RESULTS_FILE: &str = "behavioral_results.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeskCondition {
    Congruent,
    Incongruent,
}

impl DeskCondition {
    pub const ALL: [DeskCondition; 2] = [DeskCondition::Congruent, DeskCondition::Incongruent];

    pub fn name(&self) -> &'static str {
        match self {
            DeskCondition::Congruent => "Congruent",
            DeskCondition::Incongruent => "Incongruent",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeskTrial {
    pub block: i64,
    pub trial: i64,
    pub stimulus_onset: i64,
    pub stimulus_rt: i64,
    pub accuracy: i64,
    pub condition: DeskCondition,
    pub done: i64,
    /// Onset of the condition's instruction screen
    pub instructions_onset: i64,
}

/// A contiguous run of trials with the same block number
#[derive(Debug, Clone, PartialEq)]
pub struct DeskBlock {
    pub number: i64,
    pub trials: Vec<DeskTrial>,
    pub onset: i64,
    pub condition: DeskCondition,
    pub done: i64,
}

impl DeskBlock {
    /// Build a block, requiring its trials to agree on onset, condition and end
    pub fn from_run(trials: Vec<DeskTrial>) -> Result<Self> {
        let Some(first) = trials.first() else {
            return Err(Error::data_validation("empty block"));
        };
        let (number, onset, condition, done) =
            (first.block, first.instructions_onset, first.condition, first.done);

        if let Some(odd) = trials.iter().find(|t| {
            t.instructions_onset != onset || t.condition != condition || t.done != done
        }) {
            return Err(Error::inconsistent_block(
                number,
                format!(
                    "trial {} disagrees on instructions onset, condition or end time",
                    odd.trial
                ),
            ));
        }

        Ok(Self {
            number,
            trials,
            onset,
            condition,
            done,
        })
    }

    /// Seconds from `begin_ms` to the instructions
    pub fn relative_onset(&self, begin_ms: i64) -> f64 {
        relative_seconds(self.onset, begin_ms)
    }

    pub fn duration(&self) -> f64 {
        seconds(self.done - self.onset)
    }

    /// Mean RT of correct trials; NaN when there are none
    pub fn mean_rt(&self) -> f64 {
        let rts: Vec<f64> = self
            .trials
            .iter()
            .filter(|t| t.accuracy == 1)
            .map(|t| t.stimulus_rt as f64)
            .collect();
        mean(&rts)
    }

    pub fn accuracy(&self) -> f64 {
        let accuracies: Vec<f64> = self.trials.iter().map(|t| t.accuracy as f64).collect();
        mean(&accuracies)
    }
}

/// Split trials into runs of equal block numbers
pub fn group_blocks(trials: Vec<DeskTrial>) -> Result<Vec<DeskBlock>> {
    let mut blocks = Vec::new();
    let mut run: Vec<DeskTrial> = Vec::new();

    for trial in trials {
        if run.last().is_some_and(|last| last.block != trial.block) {
            blocks.push(DeskBlock::from_run(std::mem::take(&mut run))?);
        }
        run.push(trial);
    }
    if !run.is_empty() {
        blocks.push(DeskBlock::from_run(run)?);
    }

    Ok(blocks)
}

/// Render the behavioral summary
pub fn render_results(blocks: &[DeskBlock]) -> String {
    let mut out = String::from("Block\tCondition\tMean_RT\tAccuracy\n");
    for (j, block) in blocks.iter().enumerate() {
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\n",
            j + 1,
            block.condition.name(),
            fixed3(block.mean_rt()),
            fixed3(block.accuracy())
        ));
    }

    for condition in DeskCondition::ALL {
        let subset: Vec<&DeskBlock> = blocks.iter().filter(|b| b.condition == condition).collect();
        let rts: Vec<f64> = subset.iter().map(|b| b.mean_rt()).collect();
        let accuracies: Vec<f64> = subset.iter().map(|b| b.accuracy()).collect();
        out.push_str(&format!(
            "Overall\t{}\t{}\t{}\n",
            condition.name(),
            fixed3(mean(&rts)),
            fixed3(mean(&accuracies))
        ));
    }
    out
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeskConverter;

impl DeskConverter {
    pub fn parse_trials(&self, table: &EprimeTable) -> Result<ParseResult<DeskTrial>> {
        let block = table.column(&["Block"])?;
        let trial = table.column(&["Trial"])?;
        let condition = table.column(&["Procedure[Block]"])?;
        let onset = table.column(&["Stimulus.OnsetTime[Trial]", "Stimulus.OnsetTime"])?;
        let rt = table.column(&["Stimulus.RT[Trial]", "Stimulus.RT"])?;
        let acc = table.column(&["Stimulus.ACC[Trial]", "Stimulus.ACC"])?;
        let congruent = table.column(&[
            "CongruentInstructions.OnsetTime[Trial]",
            "CongruentInstructions.OnsetTime",
        ])?;
        let incongruent = table.column(&[
            "IncongruentInstructions.OnsetTime[Trial]",
            "IncongruentInstructions.OnsetTime",
        ])?;
        let done = table.column(&["Done.OnsetTime[Trial]", "Done.OnsetTime"])?;

        Ok(table.parse_rows(|record| {
            let block = parse_int(record, &block)?;
            let trial = parse_int(record, &trial)?;
            let stimulus_onset = parse_int(record, &onset)?;
            let stimulus_rt = parse_int(record, &rt)?;
            let accuracy = parse_int(record, &acc)?;
            let label = parse_string(record, &condition)?;
            let done = parse_int(record, &done)?;

            let condition = DeskCondition::parse(&label)
                .ok_or_else(|| FieldError::rejected(format!("unknown condition '{}'", label)))?;
            let instructions_onset = match condition {
                DeskCondition::Congruent => parse_int(record, &congruent)?,
                DeskCondition::Incongruent => parse_int(record, &incongruent)?,
            };

            Ok(DeskTrial {
                block,
                trial,
                stimulus_onset,
                stimulus_rt,
                accuracy,
                condition,
                done,
                instructions_onset,
            })
        }))
    }
}

impl StudyConverter for DeskConverter {
    fn convert(&self, table: &EprimeTable, ctx: &ConversionContext) -> Result<StudyOutput> {
        let result = self.parse_trials(table)?;
        let trials = result.trials;
        let Some(first) = trials.first() else {
            return Err(Error::no_trials(table.source()));
        };
        let begin = first.instructions_onset - ctx.timing.lead_ms();
        let trial_count = trials.len();

        let blocks = group_blocks(trials)?;
        info!("{}: {} blocks", table.source(), blocks.len());

        let mut session = SessionBlock::new(SESSION);
        for condition in DeskCondition::ALL {
            let matching: Vec<&DeskBlock> = blocks.iter().filter(|b| b.condition == condition).collect();
            debug!("{}: {} blocks", condition.name(), matching.len());
            session.push(Regressor::from_trials(
                condition.name(),
                matching.iter().copied(),
                |b| round_half_away(b.relative_onset(begin), 0),
                DeskBlock::duration,
            ));
        }

        let script = SessionScript::new(ScriptStyle::default().spaced());
        let mut output = StudyOutput::new(ctx.label(), result.stats);
        output.trials = trial_count;
        output.blocks = blocks.len();
        output.add_file(SESSIONS_FILE, script.render(&[session]));
        output.add_file(RESULTS_FILE, render_results(&blocks));
        Ok(output)
    }
}

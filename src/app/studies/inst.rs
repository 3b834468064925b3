//! Instructed task study (INST)
//!
//! Each trial has an encoding screen, an execution screen and a probe.
//! Correct trials whose encoding or execution RT reaches `mean + 3 sd` of the
//! whole run are treated as outliers and pooled with the errors into discard
//! regressors. Blocks start a fixed lead-in before the first fixation of the
//! block.
//!
//! ## Architecture
//!
//! - [`InstOutput::Sessions`] - Session script, observation counts, per-block
//!   condition listings and block-averaged contrasts
//! - [`InstOutput::Parametric`] - Onset, duration and parameter lists for a
//!   parametric model

use crate::app::models::{Regressor, SessionBlock, StudyOutput};
use crate::app::services::eprime_table::field_parsers::{parse_int, parse_string};
use crate::app::services::eprime_table::{
    Column, EprimeTable, FieldError, FieldResult, ParseResult, SubjectRule,
};
use crate::app::services::spm_writer::{
    one_decimal, python_float, python_int_list, python_list, round_half_away, ScriptStyle,
    SessionScript, ValueFormat,
};
use crate::app::services::summary::upper_bound;
use crate::app::services::timing::{relative_seconds, seconds};
use crate::app::studies::phases::Event;
use crate::app::studies::{ConversionContext, StudyConverter};
use crate::constants::timeouts::INST_PROBE_MS;
use crate::constants::{inst_condition_code, INST_CONTRASTS};
use crate::{Error, Result};
use csv::StringRecord;
use tracing::{debug, info};

/// Practice codes in regressor order
const PRACTICE_CODES: [char; 2] = ['+', '-'];

/// Standard deviations above the mean at which an RT is an outlier
const OUTLIER_SDS: f64 = 3.0;

/// What an inst conversion writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstOutput {
    Sessions,
    Parametric,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstTrial {
    pub block: i64,
    /// `+` or `-`
    pub complexity: char,
    /// `+` or `-`
    pub practiced: char,
    pub encoding: Event,
    pub execution: Event,
    pub probe: Event,
    pub accuracy: i64,
    /// Block begin (ms): first fixation of the block minus the lead-in
    pub begin: i64,
}

impl InstTrial {
    pub fn is_correct(&self) -> bool {
        self.accuracy == 1
    }

    pub fn is_error(&self) -> bool {
        self.accuracy == 0
    }

    fn onset(&self, event: Event) -> f64 {
        relative_seconds(event.onset, self.begin)
    }
}

/// RT ceilings for encoding and execution; `None` admits everything
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OutlierBounds {
    pub encoding: Option<f64>,
    pub execution: Option<f64>,
}

impl OutlierBounds {
    /// `mean + 3 sd` over the correct trials of the run
    pub fn from_trials(trials: &[InstTrial]) -> Self {
        let correct: Vec<&InstTrial> = trials.iter().filter(|t| t.is_correct()).collect();
        let rts = |event: fn(&InstTrial) -> Event| -> Vec<f64> {
            correct.iter().map(|t| event(t).rt as f64).collect()
        };
        Self {
            encoding: upper_bound(&rts(|t| t.encoding), OUTLIER_SDS),
            execution: upper_bound(&rts(|t| t.execution), OUTLIER_SDS),
        }
    }

    /// Both RTs strictly below their ceilings
    pub fn admits(&self, trial: &InstTrial) -> bool {
        let below = |rt: i64, bound: Option<f64>| bound.map_or(true, |b| (rt as f64) < b);
        below(trial.encoding.rt, self.encoding) && below(trial.execution.rt, self.execution)
    }
}

/// Trials of one block split into modelled and discarded
struct BlockTrials<'a> {
    number: i64,
    subset: Vec<&'a InstTrial>,
    discard: Vec<&'a InstTrial>,
}

impl<'a> BlockTrials<'a> {
    fn split(number: i64, trials: &'a [InstTrial], bounds: &OutlierBounds) -> Self {
        let in_block = || trials.iter().filter(move |t| t.block == number);
        let errors: Vec<&InstTrial> = in_block().filter(|t| t.is_error()).collect();
        let (subset, outliers): (Vec<&InstTrial>, Vec<&InstTrial>) =
            in_block().filter(|t| t.is_correct()).partition(|t| bounds.admits(t));
        info!(
            "Block {}: Errors {}, Outliers {}",
            number,
            errors.len(),
            outliers.len()
        );

        let mut discard = errors;
        discard.extend(outliers);
        Self {
            number,
            subset,
            discard,
        }
    }

    fn practiced(&self, code: char) -> Vec<&'a InstTrial> {
        self.subset
            .iter()
            .copied()
            .filter(|t| t.practiced == code)
            .collect()
    }
}

fn event_regressor<'a>(
    name: impl Into<String>,
    trials: impl IntoIterator<Item = &'a InstTrial>,
    event: fn(&InstTrial) -> Event,
) -> Regressor {
    Regressor::from_trials(
        name,
        trials,
        |t| t.onset(event(t)),
        |t| seconds(event(t).rt),
    )
}

fn probe_duration(trial: &InstTrial) -> f64 {
    if trial.probe.rt == 0 {
        seconds(INST_PROBE_MS)
    } else {
        seconds(trial.probe.rt)
    }
}

/// `%1.1f ` per value
fn listing(values: &[f64]) -> String {
    values.iter().map(|&v| format!("{} ", one_decimal(v))).collect()
}

/// Python list of values rounded to one decimal, commas turned into spaces
fn spaced_list(values: &[f64]) -> String {
    let rounded: Vec<f64> = values.iter().map(|&v| round_half_away(v, 1)).collect();
    python_list(&rounded).replace(',', " ")
}

#[derive(Debug, Clone, Copy)]
pub struct InstConverter {
    output: InstOutput,
}

impl InstConverter {
    pub fn new(output: InstOutput) -> Self {
        Self { output }
    }

    /// `Fixation1.OnsetTime` of every row whose `Trial` is 1, in log order
    pub fn fixations(table: &EprimeTable) -> Result<Vec<i64>> {
        let trial = table.column(&["Trial"])?;
        let fixation = table.column(&["Fixation1.OnsetTime"])?;
        Ok(table
            .rows()
            .iter()
            .filter(|record| matches!(parse_int(record, &trial), Ok(1)))
            .filter_map(|record| parse_int(record, &fixation).ok())
            .collect())
    }

    /// Block fixations and trials; each trial carries its block begin
    pub fn parse_trials(
        &self,
        table: &EprimeTable,
        lead_ms: i64,
    ) -> Result<(Vec<i64>, ParseResult<InstTrial>)> {
        let fixations = Self::fixations(table)?;
        let columns = InstColumns::resolve(table)?;

        let result = table.parse_rows(|record| {
            let mut trial = columns.parse(record)?;
            let first = usize::try_from(trial.block - 1)
                .ok()
                .and_then(|index| fixations.get(index))
                .ok_or_else(|| FieldError::rejected(format!("block {} has no first trial", trial.block)))?;
            trial.begin = first - lead_ms;
            Ok(trial)
        });
        Ok((fixations, result))
    }

    fn block_session(&self, block: &BlockTrials<'_>) -> SessionBlock {
        let mut session = SessionBlock::new(block.number);
        for code in PRACTICE_CODES {
            session.push(event_regressor(
                format!("ENC/P{}", code),
                block.practiced(code),
                |t| t.encoding,
            ));
        }
        for code in PRACTICE_CODES {
            session.push(event_regressor(
                format!("EXE/P{}", code),
                block.practiced(code),
                |t| t.execution,
            ));
        }
        session.push(event_regressor("Probes", block.subset.iter().copied(), |t| t.probe));

        if !block.discard.is_empty() {
            let discard = || block.discard.iter().copied();
            session.push(event_regressor("ENC/Discard", discard(), |t| t.encoding));
            session.push(event_regressor("EXE/Discard", discard(), |t| t.execution));
            session.push(Regressor::from_trials(
                "PROBE/Discard",
                discard(),
                |t| t.onset(t.probe),
                probe_duration,
            ));
        }
        session
    }

    /// Correct, non-outlier counts per phase and practice
    fn render_observations(block: &BlockTrials<'_>, out: &mut String) {
        for code in PRACTICE_CODES {
            out.push_str(&format!(
                "SESSION {} / ENCODING / P{} \t {}\n",
                block.number,
                code,
                block.practiced(code).len()
            ));
        }
        for code in PRACTICE_CODES {
            out.push_str(&format!(
                "SESSION {} / EXECUTION / PRACT : {} \t {}\n",
                block.number,
                code,
                block.practiced(code).len()
            ));
        }
    }

    /// Plain-text listing of the modelled conditions of one block
    fn render_conditions(session: &SessionBlock) -> String {
        let mut out = String::new();
        let labels = [
            ("ENC/P+", "ENCODING / P+"),
            ("ENC/P-", "ENCODING / P-"),
            ("EXE/P+", "EXECUTION / P+"),
            ("EXE/P-", "EXECUTION / P-"),
            ("Probes", "PROBE"),
        ];
        for (name, label) in labels {
            if let Some(regressor) = session.regressor(name) {
                out.push_str(&format!("{} / Onsets\t{}\n", label, listing(&regressor.onsets)));
                out.push_str(&format!("{} / Durations\t{}\n", label, listing(&regressor.durations)));
            }
        }
        out
    }

    /// Block-concatenated contrast vectors, averaged over blocks
    fn render_contrasts(blocks: &[BlockTrials<'_>]) -> String {
        let mut out = String::new();
        for (name, weights) in INST_CONTRASTS {
            let mut vector: Vec<f64> = Vec::new();
            for block in blocks {
                vector.extend_from_slice(weights);
                if !block.discard.is_empty() {
                    vector.extend_from_slice(&[0.0; 3]);
                }
            }
            let averaged: Vec<f64> = vector.iter().map(|w| w / blocks.len() as f64).collect();
            out.push_str(&format!("{} : {}\n", name, python_list(&averaged).replace(',', "")));
        }
        out
    }

    /// `SESSION b` followed by task and probe lists
    fn render_parameters(block: &BlockTrials<'_>, out: &mut String) {
        let mut tonsets = Vec::new();
        let mut tdurations = Vec::new();
        let mut params = Vec::new();
        for trial in &block.subset {
            tonsets.push(trial.onset(trial.encoding));
            tonsets.push(trial.onset(trial.execution));
            tdurations.push(seconds(trial.encoding.rt));
            tdurations.push(seconds(trial.execution.rt));
            params.push(1);
            params.push(if trial.practiced == '-' { 2 } else { 1 });
        }
        let ponsets: Vec<f64> = block.subset.iter().map(|t| t.onset(t.probe)).collect();
        let pdurations: Vec<f64> = block.subset.iter().map(|t| seconds(t.probe.rt)).collect();

        out.push_str(&format!("SESSION {}\n", block.number));
        out.push_str(&format!("TONSETS: {}\n", spaced_list(&tonsets)));
        out.push_str(&format!("TDURATIONS: {}\n", spaced_list(&tdurations)));
        out.push_str(&format!("TPARAMS: {}\n", python_int_list(&params).replace(',', " ")));
        out.push_str(&format!("PONSETS: {}\n", spaced_list(&ponsets)));
        out.push_str(&format!("PDURATIONS: {}\n\n", spaced_list(&pdurations)));
    }
}

impl StudyConverter for InstConverter {
    fn convert(&self, table: &EprimeTable, ctx: &ConversionContext) -> Result<StudyOutput> {
        let prefix = ctx.subject(SubjectRule::Prefix(3))?;
        let (fixations, result) = self.parse_trials(table, ctx.timing.lead_ms())?;
        let trials = result.trials;
        if trials.is_empty() {
            return Err(Error::no_trials(table.source()));
        }

        let bounds = OutlierBounds::from_trials(&trials);
        debug!(
            "Outlier bounds: encoding {}, execution {}",
            bounds.encoding.map_or_else(|| "none".to_string(), python_float),
            bounds.execution.map_or_else(|| "none".to_string(), python_float)
        );

        let blocks: Vec<BlockTrials<'_>> = (1..=fixations.len() as i64)
            .map(|number| BlockTrials::split(number, &trials, &bounds))
            .collect();

        let mut output = StudyOutput::new(&prefix, result.stats);
        output.trials = trials.len();
        output.blocks = blocks.len();

        match self.output {
            InstOutput::Sessions => {
                let script = SessionScript::new(
                    ScriptStyle::default()
                        .with_values(ValueFormat::OneDecimal)
                        .without_save_semicolon(),
                );
                let mut sessions = Vec::with_capacity(blocks.len());
                let mut observations = String::new();
                for block in &blocks {
                    let session = self.block_session(block);
                    Self::render_observations(block, &mut observations);
                    output.add_file(
                        format!("{}.session{}.conds.txt", prefix, block.number),
                        Self::render_conditions(&session),
                    );
                    sessions.push(session);
                }
                output.add_file(format!("{}sessions.m", prefix), script.render(&sessions));
                output.add_file(format!("{}.obs.txt", prefix), observations);
                output.add_file(format!("{}.contrasts.txt", prefix), Self::render_contrasts(&blocks));
            }
            InstOutput::Parametric => {
                let mut params = String::new();
                for block in &blocks {
                    Self::render_parameters(block, &mut params);
                }
                output.add_file(format!("{}params.txt", prefix), params);
            }
        }
        Ok(output)
    }
}

/// Column positions of an inst log
struct InstColumns {
    block: Column,
    complexity: Column,
    practiced: Column,
    encoding_onset: Column,
    encoding_rt: Column,
    execution_onset: Column,
    execution_rt: Column,
    probe_onset: Column,
    probe_rt: Column,
    probe_acc: Column,
    fixation2: Column,
}

impl InstColumns {
    fn resolve(table: &EprimeTable) -> Result<Self> {
        Ok(Self {
            block: table.column(&["Block"])?,
            complexity: table.column(&["Complexity"])?,
            practiced: table.column(&["Practiced"])?,
            encoding_onset: table.column(&["TaskEncoding.OnsetTime"])?,
            encoding_rt: table.column(&["TaskEncoding.RT"])?,
            execution_onset: table.column(&["TaskExecution.OnsetTime"])?,
            execution_rt: table.column(&["TaskExecution.RT"])?,
            probe_onset: table.column(&["Probe.OnsetTime"])?,
            probe_rt: table.column(&["Probe.RT"])?,
            probe_acc: table.column(&["Probe.ACC"])?,
            fixation2: table.column(&["Fixation2.OnsetTime"])?,
        })
    }

    fn code(record: &StringRecord, column: &Column) -> FieldResult<char> {
        let value = parse_string(record, column)?;
        inst_condition_code(&value)
            .ok_or_else(|| FieldError::rejected(format!("unknown condition code '{}'", value)))
    }

    fn parse(&self, record: &StringRecord) -> FieldResult<InstTrial> {
        let event = |onset: &Column, rt: &Column| -> FieldResult<Event> {
            Ok(Event::new(parse_int(record, onset)?, parse_int(record, rt)?))
        };
        let block = parse_int(record, &self.block)?;
        let complexity = Self::code(record, &self.complexity)?;
        let practiced = Self::code(record, &self.practiced)?;
        // Not modelled, but a row without it is malformed
        parse_int(record, &self.fixation2)?;

        Ok(InstTrial {
            block,
            complexity,
            practiced,
            encoding: event(&self.encoding_onset, &self.encoding_rt)?,
            execution: event(&self.execution_onset, &self.execution_rt)?,
            probe: event(&self.probe_onset, &self.probe_rt)?,
            accuracy: parse_int(record, &self.probe_acc)?,
            begin: 0,
        })
    }
}

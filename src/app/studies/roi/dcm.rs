//! ROI blocks concatenated into a single DCM session
//!
//! Dynamic causal modelling wants one long session, so block times are
//! shifted by the scans of the blocks acquired before them. Which blocks were
//! kept, and how many scans each has, comes from a block plan:
//!
//! ```text
//! 182 True
//! 182 False
//! 180 True
//! ```
//!
//! The first scan of every kept block is discarded, dropped blocks contribute
//! no scans, and block regressor files mark which concatenated scan belongs
//! to which kept block.

use super::{block_anchors, parse_trials, subject_rule, Operator, RoiTrial};
use crate::app::models::{Regressor, SessionBlock, StudyOutput};
use crate::app::services::eprime_table::EprimeTable;
use crate::app::services::spm_writer::{ScriptStyle, SessionScript};
use crate::app::services::timing::{relative_seconds, seconds};
use crate::app::studies::phases::Phase;
use crate::app::studies::{ConversionContext, StudyConverter};
use crate::{Error, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

pub const BLOCK_REGRESSORS_FILE: &str = "block_regressors.txt";
pub const SHORTFORM_REGRESSORS_FILE: &str = "shortform_block_regressors.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedBlock {
    /// Scans acquired
    pub scans: i64,
    pub keep: bool,
}

impl PlannedBlock {
    /// Scans this block adds to the concatenated session
    pub fn contribution(&self) -> i64 {
        if self.keep {
            self.scans - 1
        } else {
            0
        }
    }
}

/// Scan counts and keep flags of blocks 1..=N
#[derive(Debug, Clone, PartialEq)]
pub struct BlockPlan {
    source: String,
    blocks: Vec<PlannedBlock>,
}

impl BlockPlan {
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::file_not_found(path.display().to_string()));
        }
        let text = fs::read_to_string(path)
            .map_err(|e| Error::io(format!("Failed to read block plan {}", path.display()), e))?;
        Self::parse(&text, path.display().to_string())
    }

    /// Parse `<scans> <True|False>` lines; blank lines are ignored
    pub fn parse(text: &str, source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let mut blocks = Vec::new();

        for (index, line) in text.lines().enumerate() {
            let mut parts = line.split_whitespace();
            let Some(scans) = parts.next() else {
                continue;
            };
            let line_no = index + 1;
            let scans = scans.parse::<i64>().map_err(|_| {
                Error::block_plan(&source, format!("line {}: invalid scan count '{}'", line_no, scans))
            })?;
            let keep = match parts.next() {
                Some("True") => true,
                Some("False") => false,
                Some(other) => {
                    return Err(Error::block_plan(
                        &source,
                        format!("line {}: expected True or False, found '{}'", line_no, other),
                    ))
                }
                None => {
                    return Err(Error::block_plan(
                        &source,
                        format!("line {}: missing keep flag", line_no),
                    ))
                }
            };
            blocks.push(PlannedBlock { scans, keep });
        }

        if blocks.is_empty() {
            return Err(Error::block_plan(&source, "no blocks listed"));
        }
        Ok(Self { source, blocks })
    }

    pub fn blocks(&self) -> &[PlannedBlock] {
        &self.blocks
    }

    fn get(&self, block: i64) -> Result<&PlannedBlock> {
        usize::try_from(block - 1)
            .ok()
            .and_then(|index| self.blocks.get(index))
            .ok_or_else(|| Error::block_plan(&self.source, format!("block {} is not in the plan", block)))
    }

    /// Whether the block was dropped from the analysis
    pub fn is_dropped(&self, block: i64) -> Result<bool> {
        Ok(!self.get(block)?.keep)
    }

    /// Scans of the concatenated session preceding `block`
    pub fn offset_scans(&self, block: i64) -> Result<i64> {
        if block <= 1 {
            return Ok(0);
        }
        self.get(block)?;
        Ok(self.blocks[..(block - 1) as usize]
            .iter()
            .map(PlannedBlock::contribution)
            .sum())
    }

    /// Scans of the concatenated session
    pub fn total_scans(&self) -> i64 {
        self.blocks.iter().map(PlannedBlock::contribution).sum()
    }

    /// One row per concatenated scan, one tab-terminated 0/1 column per kept
    /// block; `shortform` leaves out the last column
    pub fn render_regressors(&self, shortform: bool) -> String {
        let kept: Vec<&PlannedBlock> = self.blocks.iter().filter(|b| b.keep).collect();
        let mut ranges = Vec::with_capacity(kept.len());
        let mut start = 0;
        for block in &kept {
            let end = start + block.contribution();
            ranges.push(start..end);
            start = end;
        }
        if shortform {
            ranges.pop();
        }

        let mut out = String::new();
        for scan in 0..start {
            for range in &ranges {
                out.push_str(&format!("{}\t", u8::from(range.contains(&scan))));
            }
            out.push('\n');
        }
        out
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DcmConverter;

impl StudyConverter for DcmConverter {
    fn convert(&self, table: &EprimeTable, ctx: &ConversionContext) -> Result<StudyOutput> {
        let subject = ctx.subject(subject_rule())?;
        let result = parse_trials(table)?;
        let plan = BlockPlan::from_path(&ctx.block_plan_path())?;
        let trials = result.trials;

        let anchors = block_anchors(&trials, ctx);
        let tr = ctx.timing.tr();

        // Each kept trial with the begin of its block, shifted into the
        // concatenated session
        let mut kept: Vec<(&RoiTrial, i64)> = Vec::with_capacity(trials.len());
        for trial in &trials {
            let block = trial.block();
            let offset = plan.offset_scans(block)?;
            if block >= 1 && plan.is_dropped(block)? {
                continue;
            }
            let begin = anchors.begin_or_zero(block) - offset * tr;
            kept.push((trial, begin));
        }
        if kept.is_empty() {
            return Err(Error::no_trials(table.source()));
        }
        info!(
            "{}: {} of {} trials in kept blocks, {} scans",
            table.source(),
            kept.len(),
            trials.len(),
            plan.total_scans()
        );

        let event = |trial: &RoiTrial, begin: i64, phase: Phase| {
            (
                relative_seconds(trial.phases.onset(phase), begin),
                seconds(trial.phases.rt(phase)),
            )
        };

        let mut session = SessionBlock::new(1);
        let (onsets, durations) = kept
            .iter()
            .flat_map(|&(trial, begin)| {
                Phase::ALL
                    .into_iter()
                    .filter(move |&phase| trial.phases.rt(phase) > 0)
                    .map(move |phase| event(trial, begin, phase))
            })
            .unzip();
        session.push(Regressor::new("VisualStimulus", onsets, durations));

        for op in Operator::ALL {
            for phase in Phase::INSTRUCTED {
                let (onsets, durations) = kept
                    .iter()
                    .filter(|(t, _)| t.operator == op && t.phases.is_correct() && t.phases.rt(phase) > 0)
                    .map(|&(trial, begin)| event(trial, begin, phase))
                    .unzip();
                session.push(Regressor::new(
                    format!("{}_{}", phase.name(), op.label()),
                    onsets,
                    durations,
                ));
            }
        }
        debug!("DCM session regressors: {:?}", session.names());

        let script = SessionScript::new(ScriptStyle::default().with_mat_file("dcm_session.mat"));
        let mut output = StudyOutput::new(&subject, result.stats);
        output.trials = kept.len();
        output.blocks = plan.blocks().iter().filter(|b| b.keep).count();
        output.add_file(format!("s{}_dcm_sessions.m", subject), script.render_block(&session));
        output.add_file(BLOCK_REGRESSORS_FILE, plan.render_regressors(false));
        output.add_file(SHORTFORM_REGRESSORS_FILE, plan.render_regressors(true));
        Ok(output)
    }
}

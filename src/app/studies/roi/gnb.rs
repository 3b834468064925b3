//! ROI design with one regressor per encoding event
//!
//! Classifier analyses need a beta image per instruction, so every correct
//! encoding gets its own regressor, numbered per operator across the whole
//! run. The contrast table holds one indicator contrast per distinct
//! regressor name.

use super::{block_anchors, parse_trials, subject_rule, Operator, RoiTrial};
use crate::app::models::{Regressor, SessionBlock, StudyOutput};
use crate::app::services::eprime_table::EprimeTable;
use crate::app::services::spm_writer::{expand_contrast_vector, render_contrasts, ContrastStyle, SessionScript};
use crate::app::services::timing::{distinct_blocks, relative_seconds, seconds};
use crate::app::studies::phases::{error_regressors, phase_regressor, Phase, PhasedTrial, PRACTICE};
use crate::app::studies::{ConversionContext, StudyConverter};
use crate::{Error, Result};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Design columns by regressor name, numbered from 0 across all sessions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DesignColumns {
    by_name: BTreeMap<String, Vec<usize>>,
    count: usize,
}

impl DesignColumns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the next column under `name`
    pub fn register(&mut self, name: &str) {
        self.by_name.entry(name.to_string()).or_default().push(self.count);
        self.count += 1;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn indices(&self, name: &str) -> Option<&[usize]> {
        self.by_name.get(name).map(Vec::as_slice)
    }

    /// One normalized indicator contrast per name, in name order
    pub fn render(&self) -> String {
        let vectors: Vec<(&str, Vec<_>)> = self
            .by_name
            .iter()
            .map(|(name, indices)| (name.as_str(), expand_contrast_vector(indices, self.count)))
            .collect();
        render_contrasts(
            vectors.iter().map(|(name, weights)| (*name, weights.as_slice())),
            ContrastStyle::Bare,
        )
    }
}

/// Per-operator event numbering, running across blocks
#[derive(Debug, Clone, Default)]
struct EncodingCounter {
    counts: BTreeMap<Operator, usize>,
}

impl EncodingCounter {
    fn next(&mut self, op: Operator) -> usize {
        let count = self.counts.entry(op).or_insert(0);
        *count += 1;
        *count
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GnbConverter;

impl GnbConverter {
    fn block_session(
        &self,
        number: i64,
        trials: &[&RoiTrial],
        begin: i64,
        counter: &mut EncodingCounter,
        columns: &mut DesignColumns,
    ) -> SessionBlock {
        let correct: Vec<&RoiTrial> = trials.iter().copied().filter(|t| t.phases.is_correct()).collect();
        let errors: Vec<&PhasedTrial> = trials
            .iter()
            .map(|t| &t.phases)
            .filter(|t| t.is_error())
            .collect();
        info!("Block {}, errors {}", number, errors.len());

        let matching = |op: Operator, practiced: &str| {
            correct
                .iter()
                .filter(|t| t.operator == op && t.phases.practiced == practiced)
                .map(|t| &t.phases)
                .collect::<Vec<&PhasedTrial>>()
        };

        let mut session = SessionBlock::new(number);
        let mut add = |session: &mut SessionBlock, regressor: Regressor| {
            if !regressor.is_empty() {
                columns.register(&regressor.name);
                session.push(regressor);
            }
        };

        for (practiced, label) in PRACTICE {
            for op in Operator::ALL {
                for trial in matching(op, practiced) {
                    let name = format!("Encoding_{}_{}_{}", op.label(), label, counter.next(op));
                    let onset = relative_seconds(trial.encoding.onset, begin);
                    let duration = seconds(trial.encoding.rt);
                    add(&mut session, Regressor::new(name, vec![onset], vec![duration]));
                }
            }
        }

        for (practiced, label) in PRACTICE {
            for op in Operator::ALL {
                add(
                    &mut session,
                    phase_regressor(
                        format!("{}/{}/{}", op.label(), Phase::Execution.name(), label),
                        matching(op, practiced),
                        Phase::Execution,
                        begin,
                    ),
                );
            }
        }

        for op in Operator::ALL {
            add(
                &mut session,
                phase_regressor(
                    format!("{}/Probe", op.label()),
                    correct.iter().filter(|t| t.operator == op).map(|t| &t.phases),
                    Phase::Probe,
                    begin,
                ),
            );
        }

        for regressor in error_regressors(&errors, begin) {
            add(&mut session, regressor);
        }
        debug!("Block {}: {} design columns so far", number, columns.count());
        session
    }
}

impl StudyConverter for GnbConverter {
    fn convert(&self, table: &EprimeTable, ctx: &ConversionContext) -> Result<StudyOutput> {
        let subject = ctx.subject(subject_rule())?;
        let result = parse_trials(table)?;
        let trials = result.trials;
        if trials.is_empty() {
            return Err(Error::no_trials(table.source()));
        }

        let anchors = block_anchors(&trials, ctx);
        let blocks = distinct_blocks(&trials, RoiTrial::block);

        let mut counter = EncodingCounter::default();
        let mut columns = DesignColumns::new();
        let mut sessions = Vec::with_capacity(blocks.len());
        for &number in &blocks {
            let subset: Vec<&RoiTrial> = trials.iter().filter(|t| t.block() == number).collect();
            sessions.push(self.block_session(
                number,
                &subset,
                anchors.begin_or_zero(number),
                &mut counter,
                &mut columns,
            ));
        }

        let mut output = StudyOutput::new(&subject, result.stats);
        output.trials = trials.len();
        output.blocks = blocks.len();
        output.add_file(
            format!("s{}_sessions_gnb.m", subject),
            SessionScript::default().render(&sessions),
        );
        output.add_file(format!("s{}_contrasts_gnb.txt", subject), columns.render());
        Ok(output)
    }
}

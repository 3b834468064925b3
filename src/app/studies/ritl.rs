//! Rapid instructed task learning (RITL)
//!
//! Practiced and novel instructions are modelled separately for encoding and
//! execution; probes are pooled. Blocks are anchored at the fixation cross of
//! their first trial.

use crate::app::models::{SessionBlock, StudyOutput};
use crate::app::services::eprime_table::field_parsers::parse_int;
use crate::app::services::eprime_table::{EprimeTable, ParseResult, PartIndex, SubjectRule};
use crate::app::services::spm_writer::SessionScript;
use crate::app::services::timing::{distinct_blocks, BlockAnchors};
use crate::app::studies::phases::{
    error_regressors, phase_regressor, Phase, PhaseColumns, PhasedTrial, ProbeColumns, PRACTICE,
};
use crate::app::studies::{ConversionContext, StudyConverter};
use crate::{Error, Result};
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct RitlTrial {
    /// `Trials` counter
    pub number: i64,
    pub fixation_onset: i64,
    pub phases: PhasedTrial,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RitlConverter;

impl RitlConverter {
    pub fn subject_rule() -> SubjectRule {
        SubjectRule::StemSplit {
            delimiter: '-',
            index: PartIndex::Last,
        }
    }

    pub fn parse_trials(&self, table: &EprimeTable) -> Result<ParseResult<RitlTrial>> {
        let columns = PhaseColumns::resolve(table, "Delay1", "Delay2")?;
        let probe = ProbeColumns::resolve(table, "Probe")?;
        let number = table.column(&["Trials"])?;
        let fixation = table.column(&["Fixation1.OnsetTime"])?;

        Ok(table.parse_rows(|record| {
            let fields = columns.parse(record)?;
            let number = parse_int(record, &number)?;
            let fixation_onset = parse_int(record, &fixation)?;
            let (event, accuracy) = probe.parse(record)?;
            Ok(RitlTrial {
                number,
                fixation_onset,
                phases: fields.into_trial(event, accuracy),
            })
        }))
    }

    fn block_session(&self, number: i64, trials: &[&PhasedTrial], begin: i64) -> SessionBlock {
        let correct: Vec<&PhasedTrial> = trials.iter().copied().filter(|t| t.is_correct()).collect();
        let errors: Vec<&PhasedTrial> = trials.iter().copied().filter(|t| t.is_error()).collect();
        info!("Block {}, errors {}", number, errors.len());

        let mut session = SessionBlock::new(number);
        for (practiced, label) in PRACTICE {
            for phase in Phase::INSTRUCTED {
                session.push(phase_regressor(
                    format!("{}/{}", phase.name(), label),
                    correct.iter().copied().filter(|t| t.practiced == practiced),
                    phase,
                    begin,
                ));
            }
        }
        session.push(phase_regressor(
            Phase::Probe.name(),
            correct.iter().copied(),
            Phase::Probe,
            begin,
        ));
        for regressor in error_regressors(&errors, begin) {
            session.push(regressor);
        }
        session
    }
}

impl StudyConverter for RitlConverter {
    fn convert(&self, table: &EprimeTable, ctx: &ConversionContext) -> Result<StudyOutput> {
        let subject = ctx.subject(Self::subject_rule())?;
        let result = self.parse_trials(table)?;
        let trials = result.trials;
        if trials.is_empty() {
            return Err(Error::no_trials(table.source()));
        }

        let anchors = BlockAnchors::from_first_trials(
            &trials,
            |t| t.phases.block,
            |t| t.fixation_onset,
            ctx.timing.lead_ms(),
        );
        let blocks = distinct_blocks(&trials, |t| t.phases.block);

        let sessions: Vec<SessionBlock> = blocks
            .iter()
            .map(|&number| {
                let subset: Vec<&PhasedTrial> = trials
                    .iter()
                    .map(|t| &t.phases)
                    .filter(|t| t.block == number)
                    .collect();
                self.block_session(number, &subset, anchors.begin_or_zero(number))
            })
            .collect();

        let mut output = StudyOutput::new(&subject, result.stats);
        output.trials = trials.len();
        output.blocks = blocks.len();
        output.add_file(
            format!("s{}_sessions.m", subject),
            SessionScript::default().render(&sessions),
        );
        Ok(output)
    }
}

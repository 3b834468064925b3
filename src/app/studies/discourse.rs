//! Discourse comprehension task
//!
//! Only the probe is logged. The context paragraph and the critical sentence
//! that precede it run on a fixed schedule, so their onsets are derived from
//! the probe onset.

use crate::app::models::{Regressor, SessionBlock, StudyOutput};
use crate::app::services::eprime_table::field_parsers::{get_field, parse_int, parse_string};
use crate::app::services::eprime_table::{Column, EprimeTable, FieldResult, ParseResult, SubjectRule};
use crate::app::services::spm_writer::{round_half_away, ScriptStyle, SessionScript};
use crate::app::services::timing::{distinct_blocks, relative_seconds, seconds, BlockAnchors};
use crate::app::studies::{ConversionContext, StudyConverter};
use crate::constants::timeouts::{
    DISCOURSE_CONTEXT_LEAD_MS, DISCOURSE_CONTEXT_MS, DISCOURSE_CRITICAL_LEAD_MS,
    DISCOURSE_CRITICAL_MS, DISCOURSE_PROBE_MS,
};
use crate::{Error, Result};
use csv::StringRecord;
use tracing::info;

const CONDITIONS: [&str; 2] = ["supporting", "neutral"];

#[derive(Debug, Clone, PartialEq)]
pub struct DiscourseTrial {
    pub block: i64,
    pub probe_onset: i64,
    pub probe_rt: i64,
    pub accuracy: i64,
    pub condition: String,
}

impl DiscourseTrial {
    pub fn context_onset(&self) -> i64 {
        self.probe_onset - DISCOURSE_CONTEXT_LEAD_MS
    }

    pub fn critical_onset(&self) -> i64 {
        self.probe_onset - DISCOURSE_CRITICAL_LEAD_MS
    }

    pub fn is_error(&self) -> bool {
        self.accuracy == 0
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Context,
    Critical,
    Probe,
}

impl Phase {
    const ALL: [Phase; 3] = [Phase::Context, Phase::Critical, Phase::Probe];

    fn name(&self) -> &'static str {
        match self {
            Phase::Context => "Context",
            Phase::Critical => "Critical",
            Phase::Probe => "Probe",
        }
    }

    fn onset(&self, trial: &DiscourseTrial) -> i64 {
        match self {
            Phase::Context => trial.context_onset(),
            Phase::Critical => trial.critical_onset(),
            Phase::Probe => trial.probe_onset,
        }
    }

    fn duration(&self, trial: &DiscourseTrial) -> i64 {
        match self {
            Phase::Context => DISCOURSE_CONTEXT_MS,
            Phase::Critical => DISCOURSE_CRITICAL_MS,
            Phase::Probe => trial.probe_rt,
        }
    }
}

/// Probe columns of one block
struct ProbeColumns {
    onset: Column,
    rt: Column,
    acc: Column,
}

impl ProbeColumns {
    fn resolve(table: &EprimeTable, block: i64) -> Result<Self> {
        let name = |field: &str| format!("Block{}Probe.{}", block, field);
        Ok(Self {
            onset: table.column(&[&name("OnsetTime")])?,
            rt: table.column(&[&name("RT")])?,
            acc: table.column(&[&name("ACC")])?,
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DiscourseConverter;

impl DiscourseConverter {
    pub fn parse_trials(&self, table: &EprimeTable) -> Result<ParseResult<DiscourseTrial>> {
        let first = ProbeColumns::resolve(table, 1)?;
        let second = ProbeColumns::resolve(table, 2)?;
        let condition = table.column(&["Condition"])?;

        let parse = |record: &StringRecord| -> FieldResult<DiscourseTrial> {
            // Only a present but empty Block1 cell means block 2; a short row is an error
            let (block, probe) = if get_field(record, &first.onset)?.is_empty() {
                (2, &second)
            } else {
                (1, &first)
            };
            let probe_rt = match parse_int(record, &probe.rt)? {
                0 => DISCOURSE_PROBE_MS,
                value => value,
            };
            Ok(DiscourseTrial {
                block,
                probe_onset: parse_int(record, &probe.onset)?,
                probe_rt,
                accuracy: parse_int(record, &probe.acc)?,
                condition: parse_string(record, &condition)?,
            })
        };

        Ok(table.parse_rows(parse))
    }
}

impl StudyConverter for DiscourseConverter {
    fn convert(&self, table: &EprimeTable, ctx: &ConversionContext) -> Result<StudyOutput> {
        let subject = ctx.subject(SubjectRule::Split {
            delimiter: '_',
            index: 0,
        })?;
        let result = self.parse_trials(table)?;
        let trials = result.trials;
        if trials.is_empty() {
            return Err(Error::no_trials(table.source()));
        }

        let anchors = BlockAnchors::from_first_trials(
            &trials,
            |t| t.block,
            DiscourseTrial::context_onset,
            ctx.timing.lead_ms(),
        );

        let mut sessions = Vec::new();
        for block in distinct_blocks(&trials, |t| t.block) {
            let subset: Vec<&DiscourseTrial> = trials.iter().filter(|t| t.block == block).collect();
            let errors: Vec<&DiscourseTrial> = subset.iter().copied().filter(|t| t.is_error()).collect();
            info!("Block {}, {} trials, {} errors", block, subset.len(), errors.len());

            let begin = anchors.begin_or_zero(block);
            let regressor = |name: String, group: &[&DiscourseTrial], phase: Phase| {
                Regressor::from_trials(
                    name,
                    group.iter().copied(),
                    |t| round_half_away(relative_seconds(phase.onset(t), begin), 0),
                    |t| seconds(phase.duration(t)),
                )
            };

            let mut session = SessionBlock::new(block);
            for phase in Phase::ALL {
                for condition in CONDITIONS {
                    let matching: Vec<&DiscourseTrial> =
                        subset.iter().copied().filter(|t| t.condition == condition).collect();
                    session.push_non_empty(regressor(
                        format!("{} {}", phase.name(), condition),
                        &matching,
                        phase,
                    ));
                }
            }
            for phase in Phase::ALL {
                session.push_non_empty(regressor(format!("{} (Error)", phase.name()), &errors, phase));
            }
            sessions.push(session);
        }

        let script = SessionScript::new(ScriptStyle::default().blank_after_save());
        let mut output = StudyOutput::new(&subject, result.stats);
        output.trials = trials.len();
        output.blocks = sessions.len();
        output.add_file(format!("s{}_sessions.m", subject), script.render(&sessions));
        Ok(output)
    }
}

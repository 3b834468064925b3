//! Sentence comprehension task
//!
//! Each trial is a sentence (active or object-relative) followed by a
//! comprehension question. Only the question is logged; the sentence runs a
//! fixed time before it.

use crate::app::models::{Regressor, SessionBlock, StudyOutput};
use crate::app::services::eprime_table::field_parsers::{parse_int, parse_string};
use crate::app::services::eprime_table::{EprimeTable, ParseResult, SubjectRule};
use crate::app::services::spm_writer::{round_half_away, SessionScript};
use crate::app::services::timing::{relative_seconds, seconds, BlockAnchors};
use crate::app::studies::{ConversionContext, StudyConverter};
use crate::constants::timeouts::{COMPREHENSION_MS, SENTENCE_LEAD_MS, SENTENCE_MS};
use crate::{Error, Result};
use tracing::info;

const CONDITIONS: [&str; 2] = ["Active", "Object"];

/// Every trial belongs to one session
const SESSION: i64 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct SentenceTrial {
    pub comp_onset: i64,
    pub comp_rt: i64,
    pub accuracy: i64,
    pub condition: String,
}

impl SentenceTrial {
    pub fn sentence_onset(&self) -> i64 {
        self.comp_onset - SENTENCE_LEAD_MS
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Sentence,
    Comprehension,
}

impl Phase {
    const ALL: [Phase; 2] = [Phase::Sentence, Phase::Comprehension];

    fn name(&self) -> &'static str {
        match self {
            Phase::Sentence => "Sentence",
            Phase::Comprehension => "Comprehension",
        }
    }

    fn onset(&self, trial: &SentenceTrial) -> i64 {
        match self {
            Phase::Sentence => trial.sentence_onset(),
            Phase::Comprehension => trial.comp_onset,
        }
    }

    fn duration(&self, trial: &SentenceTrial) -> i64 {
        match self {
            Phase::Sentence => SENTENCE_MS,
            Phase::Comprehension => trial.comp_rt,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SentencesConverter;

impl SentencesConverter {
    pub fn parse_trials(&self, table: &EprimeTable) -> Result<ParseResult<SentenceTrial>> {
        let onset = table.column(&["Comp.OnsetTime"])?;
        let rt = table.column(&["Comp.RT"])?;
        let acc = table.column(&["Comp.ACC"])?;
        let condition = table.column(&["Condition"])?;

        Ok(table.parse_rows(|record| {
            let comp_rt = match parse_int(record, &rt)? {
                0 => COMPREHENSION_MS,
                value => value,
            };
            Ok(SentenceTrial {
                comp_onset: parse_int(record, &onset)?,
                comp_rt,
                accuracy: parse_int(record, &acc)?,
                condition: parse_string(record, &condition)?,
            })
        }))
    }
}

impl StudyConverter for SentencesConverter {
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
            |_| SESSION,
            SentenceTrial::sentence_onset,
            ctx.timing.lead_ms(),
        );

        let begin = anchors.begin_or_zero(SESSION);

        let correct: Vec<&SentenceTrial> = trials.iter().filter(|t| t.accuracy == 1).collect();
        let errors: Vec<&SentenceTrial> = trials.iter().filter(|t| t.accuracy == 0).collect();
        info!("Block {}, {} trials, {} errors", SESSION, trials.len(), errors.len());

        let regressor = |name: String, group: &[&SentenceTrial], phase: Phase| {
            Regressor::from_trials(
                name,
                group.iter().copied(),
                |t| round_half_away(relative_seconds(phase.onset(t), begin), 0),
                |t| seconds(phase.duration(t)),
            )
        };

        let mut session = SessionBlock::new(SESSION);
        for phase in Phase::ALL {
            for condition in CONDITIONS {
                let matching: Vec<&SentenceTrial> =
                    correct.iter().copied().filter(|t| t.condition == condition).collect();
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

        let mut output = StudyOutput::new(&subject, result.stats);
        output.trials = trials.len();
        output.blocks = 1;
        output.add_file(
            format!("s{}_sessions.m", subject),
            SessionScript::default().render(&[session]),
        );
        Ok(output)
    }
}

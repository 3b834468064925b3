//! Metaphor/literal word choice task
//!
//! A prime word is followed by a two-alternative choice. In the ambiguous
//! `MetLit` condition there is no correct answer; the chosen option decides
//! whether the trial counts as a metaphorical or a literal reading.

use crate::app::models::{Regressor, SessionBlock, StudyOutput};
use crate::app::services::eprime_table::field_parsers::{parse_int, parse_string};
use crate::app::services::eprime_table::{EprimeTable, FieldError, ParseResult, SubjectRule};
use crate::app::services::spm_writer::{round_half_away, SessionScript};
use crate::app::services::timing::{relative_seconds, seconds, BlockAnchors};
use crate::app::studies::{ConversionContext, StudyConverter};
use crate::constants::timeouts::{WORDS_CHOICE_MS, WORDS_PRIME_LEAD_MS, WORDS_PRIME_MS};
use crate::{Error, Result};
use tracing::{info, warn};

const CONDITIONS: [&str; 5] = ["LowLit", "HighLit", "MetOnly", "LitChosen", "MetChosen"];

/// Condition whose category comes from the participant's choice
const AMBIGUOUS_CONDITION: &str = "MetLit";

/// Every trial belongs to one session
const SESSION: i64 = 1;

/// Category of an ambiguous trial by the option type chosen
fn chosen_category(option: &str) -> Option<&'static str> {
    match option {
        "MetRel" => Some("MetChosen"),
        "LitRel" => Some("LitChosen"),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WordsTrial {
    pub choice_onset: i64,
    pub accuracy: i64,
    /// Logged condition, or the chosen category for ambiguous trials
    pub condition: String,
}

impl WordsTrial {
    pub fn prime_onset(&self) -> i64 {
        self.choice_onset - WORDS_PRIME_LEAD_MS
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Prime,
    Choice,
}

impl Phase {
    const ALL: [Phase; 2] = [Phase::Prime, Phase::Choice];

    fn name(&self) -> &'static str {
        match self {
            Phase::Prime => "Prime",
            Phase::Choice => "Choice",
        }
    }

    fn onset(&self, trial: &WordsTrial) -> i64 {
        match self {
            Phase::Prime => trial.prime_onset(),
            Phase::Choice => trial.choice_onset,
        }
    }

    /// Both screens are modelled with their fixed display time
    fn duration(&self) -> i64 {
        match self {
            Phase::Prime => WORDS_PRIME_MS,
            Phase::Choice => WORDS_CHOICE_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WordsConverter;

impl WordsConverter {
    pub fn parse_trials(&self, table: &EprimeTable) -> Result<ParseResult<WordsTrial>> {
        let onset = table.column(&["Choice1.OnsetTime"])?;
        let rt = table.column(&["Choice1.RT"])?;
        let acc = table.column(&["Choice1.ACC"])?;
        let resp = table.column(&["Choice1.RESP"])?;
        let condition = table.column(&["Condition"])?;
        let left = table.column(&["Choice1Type"])?;
        let right = table.column(&["Choice2Type"])?;

        Ok(table.parse_rows(|record| {
            let choice_onset = parse_int(record, &onset)?;
            // Logged RT is checked for readability but not modelled
            parse_int(record, &rt)?;
            let mut accuracy = parse_int(record, &acc)?;
            let mut category = parse_string(record, &condition)?;

            if category == AMBIGUOUS_CONDITION {
                let chosen = match parse_string(record, &resp)?.as_str() {
                    "g" => Some(parse_string(record, &left)?),
                    "y" => Some(parse_string(record, &right)?),
                    _ => None,
                };
                accuracy = i64::from(chosen.is_some());
                if let Some(option) = chosen {
                    category = chosen_category(&option)
                        .ok_or_else(|| {
                            FieldError::rejected(format!("unknown chosen option '{}'", option))
                        })?
                        .to_string();
                }
            }

            Ok(WordsTrial {
                choice_onset,
                accuracy,
                condition: category,
            })
        }))
    }
}

impl StudyConverter for WordsConverter {
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
            WordsTrial::prime_onset,
            ctx.timing.lead_ms(),
        );
        let begin = anchors.begin_or_zero(SESSION);

        let correct: Vec<&WordsTrial> = trials.iter().filter(|t| t.accuracy == 1).collect();
        let errors: Vec<&WordsTrial> = trials.iter().filter(|t| t.accuracy == 0).collect();
        info!("Block {}, {} trials, {} errors", SESSION, trials.len(), errors.len());

        let regressor = |name: String, group: &[&WordsTrial], phase: Phase| {
            Regressor::from_trials(
                name,
                group.iter().copied(),
                |t| round_half_away(relative_seconds(phase.onset(t), begin), 0),
                |_| seconds(phase.duration()),
            )
        };

        let mut session = SessionBlock::new(SESSION);
        for condition in CONDITIONS {
            let matching: Vec<&WordsTrial> =
                correct.iter().copied().filter(|t| t.condition == condition).collect();
            for phase in Phase::ALL {
                if matching.is_empty() {
                    warn!("No trials for condition {}, {}", phase.name(), condition);
                    continue;
                }
                session.push(regressor(format!("{} {}", phase.name(), condition), &matching, phase));
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

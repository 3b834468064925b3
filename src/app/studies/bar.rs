//! Logic reasoning task (BAR)
//!
//! Each trial shows a problem and then a choice screen. Problems vary in logic
//! (`Logic` / `Non-Logic`) and rule load (`Low` / `High`), giving eight
//! problem/choice regressors per block.
//!
//! One "special" problem per run is logged at block level, so its values sit
//! in the `[Block]` columns and the `[Trial]` cells of its row are unreadable.
//! Such rows are retried against the block-level group.

use crate::app::models::{Regressor, SessionBlock, StudyOutput};
use crate::app::services::eprime_table::field_parsers::{parse_int, parse_string};
use crate::app::services::eprime_table::{Column, EprimeTable, FieldResult, ParseStats, SubjectRule};
use crate::app::services::spm_writer::{round_half_away, SessionScript};
use crate::app::services::summary::mean;
use crate::app::services::timing::{distinct_blocks, relative_seconds, seconds, BlockAnchors};
use crate::app::studies::{ConversionContext, StudyConverter};
use crate::constants::timeouts::{BAR_CHOICE_MS, BAR_PROBLEM_MS};
use crate::{Error, Result};
use csv::StringRecord;
use tracing::{info, warn};

/// Provisional block of a special problem until the last block is known
const UNASSIGNED_BLOCK: i64 = -1;

/// Block the special problem belongs to in the fixed-block variants
const SPECIAL_PROBLEM_BLOCK: i64 = 2;

const LOGIC_LEVELS: [&str; 2] = ["Non-Logic", "Logic"];
const RULE_LEVELS: [&str; 2] = ["Low", "High"];

/// Which of the logic reasoning conversions to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarVariant {
    /// `[Trial]` columns with bare-name fallbacks; special problem joins the last block
    Standard,
    /// As `Standard`, with the special problem in block 2, mean problem
    /// durations and a behavioral table
    MeanRt,
    /// Exact `[Trial]` columns only; special problem in block 2
    Strict,
}

impl BarVariant {
    fn special_block(&self) -> i64 {
        match self {
            BarVariant::Standard => UNASSIGNED_BLOCK,
            BarVariant::MeanRt | BarVariant::Strict => SPECIAL_PROBLEM_BLOCK,
        }
    }

    fn sessions_file(&self, subject: &str) -> String {
        match self {
            BarVariant::MeanRt => format!("s{}_sessions_mean_rt.m", subject),
            BarVariant::Standard | BarVariant::Strict => format!("s{}_sessions.m", subject),
        }
    }
}

/// One problem/choice trial
#[derive(Debug, Clone, PartialEq)]
pub struct BarTrial {
    pub block: i64,
    pub problem_onset: i64,
    pub problem_rt: i64,
    pub choice_onset: i64,
    pub choice_rt: i64,
    pub accuracy: i64,
    pub logic: String,
    pub rules: String,
    pub num_rules: i64,
    /// Read from the block-level columns
    pub special: bool,
}

impl BarTrial {
    /// Replace timed-out RTs with the screen durations
    fn apply_timeouts(mut self) -> Self {
        if self.problem_rt == 0 {
            self.problem_rt = BAR_PROBLEM_MS;
        }
        if self.choice_rt == 0 {
            self.choice_rt = BAR_CHOICE_MS;
        }
        self
    }

    /// Row of the behavioral table
    pub fn behavioral_row(&self, subject: &str) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            subject,
            self.block,
            self.num_rules,
            self.rules,
            self.logic,
            self.problem_rt,
            self.choice_rt,
            self.accuracy
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Problem,
    Choice,
}

impl Phase {
    const ALL: [Phase; 2] = [Phase::Problem, Phase::Choice];

    fn name(&self) -> &'static str {
        match self {
            Phase::Problem => "Problem",
            Phase::Choice => "Choice",
        }
    }

    fn onset(&self, trial: &BarTrial) -> i64 {
        match self {
            Phase::Problem => trial.problem_onset,
            Phase::Choice => trial.choice_onset,
        }
    }

    fn rt(&self, trial: &BarTrial) -> i64 {
        match self {
            Phase::Problem => trial.problem_rt,
            Phase::Choice => trial.choice_rt,
        }
    }
}

/// Columns of one problem group (trial-level or block-level)
#[derive(Debug, Clone)]
struct ProblemColumns {
    problem_onset: Column,
    problem_rt: Column,
    choice_onset: Column,
    choice_rt: Column,
    choice_acc: Column,
    logic: Column,
    rules: Column,
    num_rules: Column,
}

const PROBLEM_FIELDS: [&str; 8] = [
    "Problem.OnsetTime",
    "Problem.RT",
    "Choice.OnsetTime",
    "Choice.RT",
    "Choice.ACC",
    "Logic",
    "Rules",
    "NumRules",
];

impl ProblemColumns {
    /// Resolve a group, each field through `candidates(field)`
    fn resolve(table: &EprimeTable, candidates: impl Fn(&str) -> Vec<String>) -> Result<Self> {
        let column = |field: &str| {
            let names = candidates(field);
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            table.column(&names)
        };
        Ok(Self {
            problem_onset: column(PROBLEM_FIELDS[0])?,
            problem_rt: column(PROBLEM_FIELDS[1])?,
            choice_onset: column(PROBLEM_FIELDS[2])?,
            choice_rt: column(PROBLEM_FIELDS[3])?,
            choice_acc: column(PROBLEM_FIELDS[4])?,
            logic: column(PROBLEM_FIELDS[5])?,
            rules: column(PROBLEM_FIELDS[6])?,
            num_rules: column(PROBLEM_FIELDS[7])?,
        })
    }

    fn parse(&self, record: &StringRecord, block: i64, special: bool) -> FieldResult<BarTrial> {
        Ok(BarTrial {
            block,
            problem_onset: parse_int(record, &self.problem_onset)?,
            problem_rt: parse_int(record, &self.problem_rt)?,
            choice_onset: parse_int(record, &self.choice_onset)?,
            choice_rt: parse_int(record, &self.choice_rt)?,
            accuracy: parse_int(record, &self.choice_acc)?,
            logic: parse_string(record, &self.logic)?,
            rules: parse_string(record, &self.rules)?,
            num_rules: parse_int(record, &self.num_rules)?,
            special,
        }
        .apply_timeouts())
    }
}

/// Converter for the three logic reasoning variants
#[derive(Debug, Clone, Copy)]
pub struct BarConverter {
    variant: BarVariant,
}

impl BarConverter {
    pub fn new(variant: BarVariant) -> Self {
        Self { variant }
    }

    pub fn subject_rule(&self) -> SubjectRule {
        match self.variant {
            BarVariant::Strict => SubjectRule::Split {
                delimiter: '_',
                index: 1,
            },
            BarVariant::Standard | BarVariant::MeanRt => SubjectRule::Split {
                delimiter: '-',
                index: 1,
            },
        }
    }

    fn trial_columns(&self, table: &EprimeTable) -> Result<ProblemColumns> {
        match self.variant {
            BarVariant::Strict => {
                ProblemColumns::resolve(table, |field| vec![format!("{}[Trial]", field)])
            }
            BarVariant::Standard | BarVariant::MeanRt => ProblemColumns::resolve(table, |field| {
                vec![format!("{}[Trial]", field), field.to_string()]
            }),
        }
    }

    fn special_columns(&self, table: &EprimeTable) -> Result<Option<ProblemColumns>> {
        let block_level = |field: &str| vec![format!("{}[Block]", field)];
        match self.variant {
            BarVariant::Strict => ProblemColumns::resolve(table, block_level).map(Some),
            BarVariant::Standard | BarVariant::MeanRt => {
                match ProblemColumns::resolve(table, block_level) {
                    Ok(columns) => Ok(Some(columns)),
                    Err(_) => {
                        warn!("{}: Cannot find Special Problem, skipping", table.source());
                        Ok(None)
                    }
                }
            }
        }
    }

    /// Parse every row into trials, special problems included
    pub fn parse_trials(&self, table: &EprimeTable) -> Result<(Vec<BarTrial>, ParseStats)> {
        let block_column = table.column(&["BlockNum"])?;
        if self.variant == BarVariant::Strict {
            table.column(&["Delay1[Trial]"])?;
            table.column(&["Delay2[Trial]"])?;
        }
        let primary = self.trial_columns(table)?;
        let special = self.special_columns(table)?;
        let special_block = self.variant.special_block();

        let parse_primary = |record: &StringRecord| -> FieldResult<BarTrial> {
            let block = parse_int(record, &block_column)?;
            primary.parse(record, block, false)
        };

        let result = table.parse_rows(|record| match parse_primary(record) {
            Err(e) if e.is_invalid() => match &special {
                Some(columns) => columns.parse(record, special_block, true),
                None => Err(e),
            },
            other => other,
        });

        let mut trials = result.trials;
        if self.variant == BarVariant::Standard {
            assign_special_to_last_block(&mut trials);
        }
        Ok((trials, result.stats))
    }

    fn sessions(&self, trials: &[BarTrial], lead_ms: i64) -> Vec<SessionBlock> {
        let anchors =
            BlockAnchors::from_first_trials(trials, |t| t.block, |t| t.problem_onset, lead_ms);
        let problem_rts: Vec<f64> = trials.iter().map(|t| t.problem_rt as f64).collect();
        let mean_problem_rt = mean(&problem_rts) / 1000.0;

        let mut sessions = Vec::new();
        for block in distinct_blocks(trials, |t| t.block) {
            let subset: Vec<&BarTrial> = trials.iter().filter(|t| t.block == block).collect();
            let errors = subset.iter().filter(|t| t.accuracy == 0).count();
            info!("Block {}, errors {}", block, errors);

            let begin = anchors.begin_or_zero(block);
            let mut session = SessionBlock::new(block);
            for phase in Phase::ALL {
                for logic in LOGIC_LEVELS {
                    for rules in RULE_LEVELS {
                        let matching: Vec<&BarTrial> = subset
                            .iter()
                            .copied()
                            .filter(|t| t.logic == logic && t.rules == rules)
                            .collect();
                        if matching.is_empty() {
                            continue;
                        }

                        let mut regressor = Regressor::from_trials(
                            format!("{}/{}/{}", phase.name(), rules, logic),
                            matching.iter().copied(),
                            |t| round_half_away(relative_seconds(phase.onset(t), begin), 0),
                            |t| seconds(phase.rt(t)),
                        );
                        if self.variant == BarVariant::MeanRt && phase == Phase::Problem {
                            regressor.durations = vec![mean_problem_rt];
                        }
                        session.push(regressor);
                    }
                }
            }
            sessions.push(session);
        }
        sessions
    }
}

/// Move provisional special problems into the highest block
fn assign_special_to_last_block(trials: &mut [BarTrial]) {
    let Some(last) = trials.iter().map(|t| t.block).max() else {
        return;
    };
    for trial in trials.iter_mut().filter(|t| t.block == UNASSIGNED_BLOCK) {
        trial.block = last;
    }
}

impl StudyConverter for BarConverter {
    fn convert(&self, table: &EprimeTable, ctx: &ConversionContext) -> Result<StudyOutput> {
        let subject = ctx.subject(self.subject_rule())?;
        let (trials, stats) = self.parse_trials(table)?;
        if trials.is_empty() {
            return Err(Error::no_trials(table.source()));
        }

        let mut output = StudyOutput::new(&subject, stats);
        output.trials = trials.len();

        if self.variant == BarVariant::MeanRt {
            let mut behavioral =
                String::from("Subject\tBlock\tNumRules\tRules\tLogic\tProblem\tChoice\tAccuracy\n");
            for trial in &trials {
                behavioral.push_str(&trial.behavioral_row(&subject));
                behavioral.push('\n');
            }
            output.add_file(format!("{}_behavioral_data.txt", subject), behavioral);
        }

        let sessions = self.sessions(&trials, ctx.timing.lead_ms());
        output.blocks = sessions.len();
        output.add_file(
            self.variant.sessions_file(&subject),
            SessionScript::default().render(&sessions),
        );
        Ok(output)
    }
}

//! Recall/rotate operator studies (ROI)
//!
//! Each trial instructs either a recall or a rotation operator and probes it
//! with its own probe screen. Three conversions share the trial parsing:
//!
//! ## Architecture
//!
//! - [`RoiConverter`] - Factorial regressors per block plus a named contrast table
//! - [`gnb::GnbConverter`] - One regressor per encoding event, for classifier input
//! - [`dcm::DcmConverter`] - All blocks concatenated into one DCM session

pub mod dcm;
pub mod gnb;

use crate::app::models::{SessionBlock, StudyOutput};
use crate::app::services::eprime_table::field_parsers::parse_string;
use crate::app::services::eprime_table::{EprimeTable, FieldError, ParseResult, PartIndex, SubjectRule};
use crate::app::services::spm_writer::{
    normalize_contrast_vector, render_contrasts, ContrastStyle, ContrastWeight, SessionScript,
};
use crate::app::services::timing::{distinct_blocks, BlockAnchors};
use crate::app::studies::phases::{
    error_regressors, phase_regressor, Phase, PhaseColumns, PhasedTrial, ProbeColumns, PRACTICE,
};
use crate::app::studies::{ConversionContext, StudyConverter};
use crate::constants::ROI_CONTRASTS;
use crate::{Error, Result};
use tracing::info;

/// Instructed operator of a trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operator {
    Recall,
    Rotate,
}

impl Operator {
    pub const ALL: [Operator; 2] = [Operator::Recall, Operator::Rotate];

    /// Value of the `Operator1[Trial]` column
    pub fn code(&self) -> &'static str {
        match self {
            Operator::Recall => "RECALL",
            Operator::Rotate => "ROTATE",
        }
    }

    /// Lower-case form used in regressor names
    pub fn label(&self) -> &'static str {
        match self {
            Operator::Recall => "recall",
            Operator::Rotate => "rotate",
        }
    }

    fn probe_prefix(&self) -> &'static str {
        match self {
            Operator::Recall => "RecallProbe",
            Operator::Rotate => "RotationProbe",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.code() == code)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoiTrial {
    pub operator: Operator,
    pub phases: PhasedTrial,
}

impl RoiTrial {
    pub fn block(&self) -> i64 {
        self.phases.block
    }
}

pub fn subject_rule() -> SubjectRule {
    SubjectRule::StemSplit {
        delimiter: '-',
        index: PartIndex::Nth(5),
    }
}

/// Parse an ROI log
///
/// Rows that cannot be read are dropped as usual, but a readable row with an
/// operator other than `RECALL` or `ROTATE` aborts the conversion.
pub fn parse_trials(table: &EprimeTable) -> Result<ParseResult<RoiTrial>> {
    let columns = PhaseColumns::resolve(table, "Delay1[Trial]", "Delay2[Trial]")?;
    let recall = ProbeColumns::resolve(table, Operator::Recall.probe_prefix())?;
    let rotate = ProbeColumns::resolve(table, Operator::Rotate.probe_prefix())?;
    let operator = table.column(&["Operator1[Trial]"])?;

    let mut invalid: Option<String> = None;
    let result = table.parse_rows(|record| {
        let fields = columns.parse(record)?;
        let code = parse_string(record, &operator)?;
        let Some(op) = Operator::from_code(&code) else {
            invalid.get_or_insert_with(|| code.clone());
            return Err(FieldError::rejected(format!("incorrect trial type '{}'", code)));
        };
        let probe = match op {
            Operator::Recall => &recall,
            Operator::Rotate => &rotate,
        };
        let (event, accuracy) = probe.parse(record)?;
        Ok(RoiTrial {
            operator: op,
            phases: fields.into_trial(event, accuracy),
        })
    });

    match invalid {
        Some(value) => Err(Error::invalid_trial_type(table.source(), value)),
        None => Ok(result),
    }
}

/// Anchor every block at its first encoding onset minus the lead-in
pub fn block_anchors(trials: &[RoiTrial], ctx: &ConversionContext) -> BlockAnchors {
    BlockAnchors::from_first_trials(
        trials,
        RoiTrial::block,
        |t| t.phases.encoding.onset,
        ctx.timing.lead_ms(),
    )
}

/// Contrast weights accumulated column by column across blocks
#[derive(Debug, Clone, PartialEq)]
pub struct ContrastColumns {
    vectors: Vec<Vec<f64>>,
}

impl ContrastColumns {
    pub fn new() -> Self {
        Self {
            vectors: vec![Vec::new(); ROI_CONTRASTS.len()],
        }
    }

    /// Append the weights of condition `condition` to every contrast
    pub fn push_condition(&mut self, condition: usize) {
        for (vector, (_, weights)) in self.vectors.iter_mut().zip(ROI_CONTRASTS) {
            vector.push(f64::from(weights[condition]));
        }
    }

    /// Append a column no contrast looks at
    pub fn push_nuisance(&mut self) {
        for vector in &mut self.vectors {
            vector.push(0.0);
        }
    }

    pub fn columns(&self) -> usize {
        self.vectors.first().map_or(0, Vec::len)
    }

    /// Normalized `name : [w ...]` table
    pub fn render(&self) -> String {
        let normalized: Vec<Vec<ContrastWeight>> = self
            .vectors
            .iter()
            .map(|v| normalize_contrast_vector(v))
            .collect();
        render_contrasts(
            ROI_CONTRASTS
                .iter()
                .zip(&normalized)
                .map(|((name, _), weights)| (*name, weights.as_slice())),
            ContrastStyle::Bracketed,
        )
    }
}

impl Default for ContrastColumns {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RoiConverter;

impl RoiConverter {
    fn block_session(
        &self,
        number: i64,
        trials: &[&RoiTrial],
        begin: i64,
        contrasts: &mut ContrastColumns,
    ) -> SessionBlock {
        let correct: Vec<&RoiTrial> = trials.iter().copied().filter(|t| t.phases.is_correct()).collect();
        let errors: Vec<&PhasedTrial> = trials
            .iter()
            .map(|t| &t.phases)
            .filter(|t| t.is_error())
            .collect();
        info!("Block {}, errors {}", number, errors.len());

        let mut session = SessionBlock::new(number);
        // Condition index advances whether or not a regressor is written
        let mut condition = 0;
        for op in Operator::ALL {
            let of_type: Vec<&PhasedTrial> = correct
                .iter()
                .filter(|t| t.operator == op)
                .map(|t| &t.phases)
                .collect();

            for (practiced, label) in PRACTICE {
                for phase in Phase::INSTRUCTED {
                    let written = session.push_non_empty(phase_regressor(
                        format!("{}/{}/{}", op.label(), phase.name(), label),
                        of_type.iter().copied().filter(|t| t.practiced == practiced),
                        phase,
                        begin,
                    ));
                    if written {
                        contrasts.push_condition(condition);
                    }
                    condition += 1;
                }
            }

            let written = session.push_non_empty(phase_regressor(
                format!("{}/Probe", op.label()),
                of_type.iter().copied(),
                Phase::Probe,
                begin,
            ));
            if written {
                contrasts.push_condition(condition);
            }
            condition += 1;
        }

        for regressor in error_regressors(&errors, begin) {
            session.push(regressor);
            contrasts.push_nuisance();
        }
        session
    }
}

impl StudyConverter for RoiConverter {
    fn convert(&self, table: &EprimeTable, ctx: &ConversionContext) -> Result<StudyOutput> {
        let subject = ctx.subject(subject_rule())?;
        let result = parse_trials(table)?;
        let trials = result.trials;
        if trials.is_empty() {
            return Err(Error::no_trials(table.source()));
        }

        let anchors = block_anchors(&trials, ctx);
        let blocks = distinct_blocks(&trials, RoiTrial::block);

        let mut contrasts = ContrastColumns::new();
        let mut sessions = Vec::with_capacity(blocks.len());
        for &number in &blocks {
            let subset: Vec<&RoiTrial> = trials.iter().filter(|t| t.block() == number).collect();
            sessions.push(self.block_session(
                number,
                &subset,
                anchors.begin_or_zero(number),
                &mut contrasts,
            ));
        }
        info!("{}: {} contrast columns", table.source(), contrasts.columns());

        let mut output = StudyOutput::new(&subject, result.stats);
        output.trials = trials.len();
        output.blocks = blocks.len();
        output.add_file(
            format!("s{}_sessions.m", subject),
            SessionScript::default().render(&sessions),
        );
        output.add_file(format!("s{}_contrasts.txt", subject), contrasts.render());
        Ok(output)
    }
}

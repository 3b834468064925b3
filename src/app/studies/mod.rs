//! Study converters
//!
//! One module per experimental paradigm. Every converter reads the same kind
//! of E-Prime table but keeps its own trial record and its own rules for
//! grouping trials into SPM regressors, so the paradigms stay independent.
//!
//! ## Architecture
//!
//! - [`Study`] - The paradigms known to the CLI, with their defaults
//! - [`StudyConverter`] - Trait implemented by every converter
//! - [`ConversionContext`] - Per-file inputs: path, subject override, timing
//!
//! Converters are pure: they take a parsed [`EprimeTable`] and return a
//! [`StudyOutput`] holding rendered files. Only `roi-dcm` reads a second file,
//! its block plan.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use eprime2spm::app::studies::{ConversionContext, Study};
//!
//! # fn example() -> eprime2spm::Result<()> {
//! let study = Study::Ritl;
//! let ctx = ConversionContext::new("RITL-fMRI-9.txt", study.default_timing());
//! let output = study.convert_file(&ctx)?;
//! for file in &output.files {
//!     println!("{} ({} bytes)", file.name, file.contents.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod bar;
pub mod desk;
pub mod discourse;
pub mod inst;
pub mod phases;
pub mod ritl;
pub mod roi;
pub mod sentences;
pub mod task_switching;
pub mod words;

#[cfg(test)]
pub mod tests;

use crate::app::models::StudyOutput;
use crate::app::services::eprime_table::{EprimeTable, PartIndex, SubjectRule};
use crate::app::services::timing::Timing;
use crate::constants::timing::{LEAD_IN_SCANS, TR_1000_MS, TR_2000_MS};
use crate::constants::DEFAULT_BLOCK_PLAN;
use crate::{Error, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Experimental paradigms with a converter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Study {
    /// Logic reasoning (BAR), per-trial durations
    Bar,
    /// Logic reasoning with mean problem durations and a behavioral table
    BarMeanRt,
    /// Logic reasoning, strict column layout
    BarStrict,
    /// Discourse comprehension
    Discourse,
    /// Sentence comprehension
    Sentences,
    /// Metaphor/literal word choice
    Words,
    /// Simon task blocks with behavioral summary
    Desk,
    /// Language/task switching, one script per block
    TaskSwitching,
    /// Rapid instructed task learning
    Ritl,
    /// Recall/rotate operators with factorial contrasts
    Roi,
    /// Recall/rotate operators, one regressor per encoding event
    RoiGnb,
    /// Recall/rotate operators as a single concatenated DCM session
    RoiDcm,
    /// Instructed tasks with outlier rejection and contrasts
    Inst,
    /// Instructed tasks as parametric onset lists
    InstParametric,
}

impl Study {
    pub const ALL: [Study; 14] = [
        Study::Bar,
        Study::BarMeanRt,
        Study::BarStrict,
        Study::Discourse,
        Study::Sentences,
        Study::Words,
        Study::Desk,
        Study::TaskSwitching,
        Study::Ritl,
        Study::Roi,
        Study::RoiGnb,
        Study::RoiDcm,
        Study::Inst,
        Study::InstParametric,
    ];

    /// Name used on the command line and in config sections
    pub fn name(&self) -> &'static str {
        match self {
            Study::Bar => "bar",
            Study::BarMeanRt => "bar-mean-rt",
            Study::BarStrict => "bar-strict",
            Study::Discourse => "discourse",
            Study::Sentences => "sentences",
            Study::Words => "words",
            Study::Desk => "desk",
            Study::TaskSwitching => "task-switching",
            Study::Ritl => "ritl",
            Study::Roi => "roi",
            Study::RoiGnb => "roi-gnb",
            Study::RoiDcm => "roi-dcm",
            Study::Inst => "inst",
            Study::InstParametric => "inst-parametric",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Study::Bar => "Logic reasoning, problem/choice regressors per block",
            Study::BarMeanRt => "Logic reasoning with mean problem RT and behavioral table",
            Study::BarStrict => "Logic reasoning, strict [Trial]/[Block] columns",
            Study::Discourse => "Discourse comprehension, context/critical/probe phases",
            Study::Sentences => "Sentence comprehension, active/object sentences",
            Study::Words => "Metaphor/literal word choice",
            Study::Desk => "Simon task blocks and behavioral summary",
            Study::TaskSwitching => "Language x task switching, one script per block",
            Study::Ritl => "Rapid instructed task learning",
            Study::Roi => "Recall/rotate operators with factorial contrasts",
            Study::RoiGnb => "Recall/rotate operators, one regressor per encoding",
            Study::RoiDcm => "Recall/rotate operators as one DCM session",
            Study::Inst => "Instructed tasks with outlier rejection and contrasts",
            Study::InstParametric => "Instructed tasks as parametric onset lists",
        }
    }

    /// Scanner timing used when the config has no override
    pub fn default_timing(&self) -> Timing {
        match self {
            Study::Discourse | Study::Sentences | Study::Words => Timing::new(TR_1000_MS, 0),
            Study::Desk => Timing::new(TR_2000_MS, 1),
            _ => Timing::new(TR_2000_MS, LEAD_IN_SCANS),
        }
    }

    /// How the subject id is cut from the file name, if the study names
    /// its outputs after the subject
    pub fn subject_rule(&self) -> Option<SubjectRule> {
        match self {
            Study::Bar | Study::BarMeanRt => Some(SubjectRule::Split {
                delimiter: '-',
                index: 1,
            }),
            Study::BarStrict => Some(SubjectRule::Split {
                delimiter: '_',
                index: 1,
            }),
            Study::Discourse | Study::Sentences | Study::Words => Some(SubjectRule::Split {
                delimiter: '_',
                index: 0,
            }),
            Study::Ritl => Some(SubjectRule::StemSplit {
                delimiter: '-',
                index: PartIndex::Last,
            }),
            Study::Roi | Study::RoiGnb | Study::RoiDcm => Some(SubjectRule::StemSplit {
                delimiter: '-',
                index: PartIndex::Nth(5),
            }),
            Study::Inst | Study::InstParametric => Some(SubjectRule::Prefix(3)),
            Study::Desk | Study::TaskSwitching => None,
        }
    }

    /// The converter implementing this study
    pub fn converter(&self) -> Box<dyn StudyConverter> {
        match self {
            Study::Bar => Box::new(bar::BarConverter::new(bar::BarVariant::Standard)),
            Study::BarMeanRt => Box::new(bar::BarConverter::new(bar::BarVariant::MeanRt)),
            Study::BarStrict => Box::new(bar::BarConverter::new(bar::BarVariant::Strict)),
            Study::Discourse => Box::new(discourse::DiscourseConverter),
            Study::Sentences => Box::new(sentences::SentencesConverter),
            Study::Words => Box::new(words::WordsConverter),
            Study::Desk => Box::new(desk::DeskConverter),
            Study::TaskSwitching => Box::new(task_switching::TaskSwitchingConverter),
            Study::Ritl => Box::new(ritl::RitlConverter),
            Study::Roi => Box::new(roi::RoiConverter),
            Study::RoiGnb => Box::new(roi::gnb::GnbConverter),
            Study::RoiDcm => Box::new(roi::dcm::DcmConverter),
            Study::Inst => Box::new(inst::InstConverter::new(inst::InstOutput::Sessions)),
            Study::InstParametric => {
                Box::new(inst::InstConverter::new(inst::InstOutput::Parametric))
            }
        }
    }

    /// Read `ctx.input` and convert it
    pub fn convert_file(&self, ctx: &ConversionContext) -> Result<StudyOutput> {
        let table = EprimeTable::from_path(&ctx.input)?;
        debug!("Converting {} as {}", table.source(), self);
        self.convert(&table, ctx)
    }

    /// Convert an already parsed table
    pub fn convert(&self, table: &EprimeTable, ctx: &ConversionContext) -> Result<StudyOutput> {
        self.converter().convert(table, ctx)
    }
}

impl fmt::Display for Study {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Study {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Study::ALL
            .iter()
            .copied()
            .find(|study| study.name() == s.trim().to_lowercase())
            .ok_or_else(|| Error::unknown_study(s))
    }
}

/// Turns one parsed log into rendered output files
pub trait StudyConverter: Send + Sync {
    fn convert(&self, table: &EprimeTable, ctx: &ConversionContext) -> Result<StudyOutput>;
}

/// Inputs of one conversion besides the table itself
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionContext {
    /// Log file path; its file name carries the subject id
    pub input: PathBuf,
    /// Subject id given on the command line
    pub subject: Option<String>,
    pub timing: Timing,
    /// Explicit block plan for `roi-dcm`
    pub block_plan: Option<PathBuf>,
}

impl ConversionContext {
    pub fn new(input: impl Into<PathBuf>, timing: Timing) -> Self {
        Self {
            input: input.into(),
            subject: None,
            timing,
            block_plan: None,
        }
    }

    pub fn with_subject(mut self, subject: Option<String>) -> Self {
        self.subject = subject;
        self
    }

    pub fn with_block_plan(mut self, block_plan: Option<PathBuf>) -> Self {
        self.block_plan = block_plan;
        self
    }

    /// Subject id under `rule`, or the override
    pub fn subject(&self, rule: SubjectRule) -> Result<String> {
        rule.resolve(&self.input, self.subject.as_deref())
    }

    /// Subject id for studies whose outputs are not named after the subject
    ///
    /// Used only for reporting: the override, else the file stem.
    pub fn label(&self) -> String {
        self.subject.clone().unwrap_or_else(|| {
            self.input
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.input.display().to_string())
        })
    }

    /// The explicit block plan, or `blocks.txt` beside the input
    pub fn block_plan_path(&self) -> PathBuf {
        self.block_plan.clone().unwrap_or_else(|| {
            self.input
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join(DEFAULT_BLOCK_PLAN)
        })
    }
}

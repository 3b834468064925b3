//! Three-phase instructed trials shared by the RITL and ROI studies
//!
//! Every trial runs an encoding screen, an execution screen and a probe, with
//! jittered delays between them. When the participant lets a screen time out
//! E-Prime logs an RT of 0, so the phase duration is estimated from the next
//! onset instead. A trial whose duration is still not positive was aborted by
//! the task and is turned into an error.

use crate::app::models::Regressor;
use crate::app::services::eprime_table::field_parsers::{parse_int, parse_string};
use crate::app::services::eprime_table::{Column, EprimeTable, FieldResult};
use crate::app::services::timing::{relative_seconds, seconds};
use crate::constants::timeouts::{ENCODING_GAP_MS, EXECUTION_GAP_MS};
use crate::Result;
use csv::StringRecord;
use tracing::warn;

/// `Practiced` column values with the label used in regressor names
pub const PRACTICE: [(&str, &str); 2] = [("Yes", "Practiced"), ("No", "Novel")];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Encoding,
    Execution,
    Probe,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Encoding, Phase::Execution, Phase::Probe];

    /// Phases modelled per practice condition
    pub const INSTRUCTED: [Phase; 2] = [Phase::Encoding, Phase::Execution];

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Encoding => "Encoding",
            Phase::Execution => "Execution",
            Phase::Probe => "Probe",
        }
    }
}

/// Onset and RT of one screen (ms)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Event {
    pub onset: i64,
    pub rt: i64,
}

impl Event {
    pub fn new(onset: i64, rt: i64) -> Self {
        Self { onset, rt }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhasedTrial {
    pub block: i64,
    /// Raw `Practiced` value, `Yes` or `No`
    pub practiced: String,
    pub encoding: Event,
    pub execution: Event,
    pub probe: Event,
    pub accuracy: i64,
}

impl PhasedTrial {
    pub fn event(&self, phase: Phase) -> Event {
        match phase {
            Phase::Encoding => self.encoding,
            Phase::Execution => self.execution,
            Phase::Probe => self.probe,
        }
    }

    pub fn onset(&self, phase: Phase) -> i64 {
        self.event(phase).onset
    }

    pub fn rt(&self, phase: Phase) -> i64 {
        self.event(phase).rt
    }

    pub fn is_correct(&self) -> bool {
        self.accuracy == 1
    }

    pub fn is_error(&self) -> bool {
        self.accuracy == 0
    }
}

/// Fields read before the probe, which some studies locate per trial type
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseFields {
    pub block: i64,
    pub practiced: String,
    pub delay1: i64,
    pub delay2: i64,
    pub encoding: Event,
    pub execution: Event,
}

impl PhaseFields {
    /// Attach the probe and apply the timeout corrections
    pub fn into_trial(self, probe: Event, accuracy: i64) -> PhasedTrial {
        let mut encoding = self.encoding;
        let mut execution = self.execution;
        let mut probe = probe;
        let mut accuracy = accuracy;

        if encoding.rt == 0 {
            encoding.rt = execution.onset - encoding.onset - self.delay1 - ENCODING_GAP_MS;
        }
        if execution.rt == 0 {
            execution.rt = probe.onset - execution.onset - self.delay2 - EXECUTION_GAP_MS;
        }

        if execution.rt <= 0 || encoding.rt <= 0 {
            warn!(
                "Block {}: trial at {} ran out of time, counted as error",
                self.block, encoding.onset
            );
            // The logged probe RT belongs to the previous trial
            execution.rt = -1;
            probe.rt = -1;
            accuracy = 0;
        }

        PhasedTrial {
            block: self.block,
            practiced: self.practiced,
            encoding,
            execution,
            probe,
            accuracy,
        }
    }
}

/// Columns common to all three-phase logs
#[derive(Debug, Clone)]
pub struct PhaseColumns {
    block: Column,
    practiced: Column,
    delay1: Column,
    delay2: Column,
    encoding_onset: Column,
    encoding_rt: Column,
    execution_onset: Column,
    execution_rt: Column,
}

impl PhaseColumns {
    /// Resolve the shared columns; delay column names differ between studies
    pub fn resolve(table: &EprimeTable, delay1: &str, delay2: &str) -> Result<Self> {
        Ok(Self {
            block: table.column(&["BlockNum"])?,
            practiced: table.column(&["Practiced"])?,
            delay1: table.column(&[delay1])?,
            delay2: table.column(&[delay2])?,
            encoding_onset: table.column(&["Encoding.OnsetTime"])?,
            encoding_rt: table.column(&["Encoding.RT"])?,
            execution_onset: table.column(&["Execution.OnsetTime"])?,
            execution_rt: table.column(&["Execution.RT"])?,
        })
    }

    pub fn parse(&self, record: &StringRecord) -> FieldResult<PhaseFields> {
        Ok(PhaseFields {
            delay1: parse_int(record, &self.delay1)?,
            delay2: parse_int(record, &self.delay2)?,
            block: parse_int(record, &self.block)?,
            practiced: parse_string(record, &self.practiced)?,
            encoding: Event::new(
                parse_int(record, &self.encoding_onset)?,
                parse_int(record, &self.encoding_rt)?,
            ),
            execution: Event::new(
                parse_int(record, &self.execution_onset)?,
                parse_int(record, &self.execution_rt)?,
            ),
        })
    }
}

/// `<prefix>.OnsetTime`, `<prefix>.RT` and `<prefix>.ACC`
#[derive(Debug, Clone)]
pub struct ProbeColumns {
    onset: Column,
    rt: Column,
    acc: Column,
}

impl ProbeColumns {
    pub fn resolve(table: &EprimeTable, prefix: &str) -> Result<Self> {
        Ok(Self {
            onset: table.column(&[format!("{}.OnsetTime", prefix).as_str()])?,
            rt: table.column(&[format!("{}.RT", prefix).as_str()])?,
            acc: table.column(&[format!("{}.ACC", prefix).as_str()])?,
        })
    }

    /// Probe event and accuracy
    pub fn parse(&self, record: &StringRecord) -> FieldResult<(Event, i64)> {
        let acc = parse_int(record, &self.acc)?;
        let rt = parse_int(record, &self.rt)?;
        let onset = parse_int(record, &self.onset)?;
        Ok((Event::new(onset, rt), acc))
    }
}

/// Regressor of one phase over `trials`, relative to `begin_ms`
pub fn phase_regressor<'a>(
    name: impl Into<String>,
    trials: impl IntoIterator<Item = &'a PhasedTrial>,
    phase: Phase,
    begin_ms: i64,
) -> Regressor {
    Regressor::from_trials(
        name,
        trials,
        |t| relative_seconds(t.onset(phase), begin_ms),
        |t| seconds(t.rt(phase)),
    )
}

/// `Phase/Error` regressors over the logged parts of error trials
///
/// Aborted trials may lack later phases, so only events with a positive onset
/// and RT are kept, and phases left empty are omitted.
pub fn error_regressors(errors: &[&PhasedTrial], begin_ms: i64) -> Vec<Regressor> {
    Phase::ALL
        .into_iter()
        .map(|phase| {
            phase_regressor(
                format!("{}/Error", phase.name()),
                errors
                    .iter()
                    .copied()
                    .filter(|t| t.onset(phase) > 0 && t.rt(phase) > 0),
                phase,
                begin_ms,
            )
        })
        .filter(|regressor| !regressor.is_empty())
        .collect()
}

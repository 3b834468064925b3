//! Block anchoring and relative timing
//!
//! E-Prime logs absolute times in ms since the experiment started, while SPM
//! wants seconds since the start of each scanning session. A session starts a
//! fixed lead before its first logged event (the scanner's dummy scans), so
//! every block is anchored at `anchor(first trial) - lead`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Scanner timing of a paradigm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    /// Repetition time (ms)
    pub tr_ms: u32,
    /// Scans acquired before the first logged event
    pub offset_scans: u32,
}

impl Timing {
    pub const fn new(tr_ms: u32, offset_scans: u32) -> Self {
        Self {
            tr_ms,
            offset_scans,
        }
    }

    /// Time between the session start and the anchor event (ms)
    pub fn lead_ms(&self) -> i64 {
        crate::constants::lead_ms(self.tr_ms, self.offset_scans)
    }

    /// TR in ms as a signed value for time arithmetic
    pub fn tr(&self) -> i64 {
        i64::from(self.tr_ms)
    }
}

/// Seconds elapsed from `begin_ms` to `value_ms`
pub fn relative_seconds(value_ms: i64, begin_ms: i64) -> f64 {
    (value_ms - begin_ms) as f64 / 1000.0
}

/// Milliseconds to seconds
pub fn seconds(ms: i64) -> f64 {
    ms as f64 / 1000.0
}

/// Indices of trials whose block differs from the previous trial's block
pub fn first_trial_indices<T>(trials: &[T], block_of: impl Fn(&T) -> i64) -> Vec<usize> {
    let mut firsts = Vec::new();
    let mut previous = None;
    for (index, trial) in trials.iter().enumerate() {
        let block = block_of(trial);
        if previous != Some(block) {
            firsts.push(index);
        }
        previous = Some(block);
    }
    firsts
}

/// Sorted distinct block numbers
pub fn distinct_blocks<T>(trials: &[T], block_of: impl Fn(&T) -> i64) -> Vec<i64> {
    let mut blocks: Vec<i64> = trials.iter().map(block_of).collect();
    blocks.sort_unstable();
    blocks.dedup();
    blocks
}

/// Begin time (ms) of every block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockAnchors {
    begins: BTreeMap<i64, i64>,
}

impl BlockAnchors {
    /// Anchor each block at its first trial minus `lead_ms`
    ///
    /// A block number that shows up again after another block is re-anchored
    /// by its latest first trial.
    pub fn from_first_trials<T>(
        trials: &[T],
        block_of: impl Fn(&T) -> i64,
        anchor_of: impl Fn(&T) -> i64,
        lead_ms: i64,
    ) -> Self {
        let mut anchors = Self::default();
        for index in first_trial_indices(trials, &block_of) {
            let trial = &trials[index];
            anchors.insert(block_of(trial), anchor_of(trial) - lead_ms);
        }
        anchors
    }

    /// Anchor blocks at trials selected by `is_first` instead of block changes
    pub fn from_marked<T>(
        trials: &[T],
        block_of: impl Fn(&T) -> i64,
        is_first: impl Fn(&T) -> bool,
        anchor_of: impl Fn(&T) -> i64,
        lead_ms: i64,
    ) -> Self {
        let mut anchors = Self::default();
        for trial in trials.iter().filter(|t| is_first(t)) {
            anchors.insert(block_of(trial), anchor_of(trial) - lead_ms);
        }
        anchors
    }

    pub fn insert(&mut self, block: i64, begin_ms: i64) {
        if let Some(previous) = self.begins.insert(block, begin_ms) {
            if previous != begin_ms {
                debug!("Block {} re-anchored from {} to {}", block, previous, begin_ms);
            }
        }
    }

    /// Begin time of a block, if it was anchored
    pub fn begin(&self, block: i64) -> Option<i64> {
        self.begins.get(&block).copied()
    }

    /// Begin time of a block, or 0 for an unanchored block
    pub fn begin_or_zero(&self, block: i64) -> i64 {
        self.begin(block).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.begins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.begins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct T {
        block: i64,
        onset: i64,
        sample: i64,
    }

    fn t(block: i64, onset: i64) -> T {
        T {
            block,
            onset,
            sample: 0,
        }
    }

    #[test]
    fn test_first_trials_are_block_changes() {
        let trials = vec![t(1, 100), t(1, 200), t(2, 300), t(1, 400), t(1, 500)];
        assert_eq!(first_trial_indices(&trials, |t| t.block), vec![0, 2, 3]);
        assert_eq!(distinct_blocks(&trials, |t| t.block), vec![1, 2]);
    }

    #[test]
    fn test_anchors_subtract_lead() {
        let trials = vec![t(1, 10000), t(1, 20000), t(2, 50000)];
        let anchors = BlockAnchors::from_first_trials(&trials, |t| t.block, |t| t.onset, 4000);

        assert_eq!(anchors.begin(1), Some(6000));
        assert_eq!(anchors.begin(2), Some(46000));
        assert_eq!(anchors.begin(3), None);
        assert_eq!(anchors.len(), 2);
    }

    #[test]
    fn test_reappearing_block_is_reanchored() {
        let trials = vec![t(1, 10000), t(2, 30000), t(1, 90000)];
        let anchors = BlockAnchors::from_first_trials(&trials, |t| t.block, |t| t.onset, 0);

        // The later run wins for every trial of block 1
        assert_eq!(anchors.begin(1), Some(90000));
        assert_eq!(relative_seconds(10000, anchors.begin_or_zero(1)), -80.0);
    }

    #[test]
    fn test_marked_anchors() {
        let trials = vec![
            T { block: 1, onset: 5000, sample: 1 },
            T { block: 1, onset: 7000, sample: 2 },
            T { block: 2, onset: 9000, sample: 50 },
        ];
        let anchors = BlockAnchors::from_marked(
            &trials,
            |t| t.block,
            |t| t.sample % 49 == 1,
            |t| t.onset,
            4000,
        );

        assert_eq!(anchors.begin(1), Some(1000));
        assert_eq!(anchors.begin(2), Some(5000));
        assert_eq!(anchors.begin_or_zero(7), 0);
    }

    #[test]
    fn test_timing_lead() {
        let timing = Timing::new(2000, 2);
        assert_eq!(timing.lead_ms(), 4000);
        assert_eq!(timing.tr(), 2000);
        assert_eq!(relative_seconds(12500, 10000), 2.5);
        assert_eq!(seconds(1500), 1.5);
    }
}

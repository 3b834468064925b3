//! Contrast table rendering and normalisation
//!
//! Contrast files hold one line per named contrast, `name : [w w w]`, with one
//! weight per regressor column of the subject's design.

use super::number_format::{python_float, round_half_away};
use std::fmt;

/// One weight of a contrast vector
///
/// Untouched zeros print as `0` while computed weights print as floats, so
/// the two are kept apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContrastWeight {
    Zero,
    Value(f64),
}

impl ContrastWeight {
    pub fn value(self) -> f64 {
        match self {
            ContrastWeight::Zero => 0.0,
            ContrastWeight::Value(v) => v,
        }
    }
}

impl From<f64> for ContrastWeight {
    fn from(value: f64) -> Self {
        ContrastWeight::Value(value)
    }
}

impl fmt::Display for ContrastWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContrastWeight::Zero => write!(f, "0"),
            ContrastWeight::Value(v) => write!(f, "{}", python_float(*v)),
        }
    }
}

/// Whether weights are wrapped in brackets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContrastStyle {
    /// `name : [1.0 0 -1.0]`
    Bracketed,
    /// `name : 1.0 0 -1.0`
    Bare,
}

/// Scale positive weights to sum to 1 and negative weights to sum to -1
///
/// Each weight is rounded to two decimals; zeros stay [`ContrastWeight::Zero`].
pub fn normalize_contrast_vector(vector: &[f64]) -> Vec<ContrastWeight> {
    let total_pos: f64 = vector.iter().filter(|&&x| x > 0.0).sum();
    let total_neg: f64 = vector.iter().filter(|&&x| x < 0.0).sum();

    vector
        .iter()
        .map(|&x| {
            if x == 0.0 {
                ContrastWeight::Zero
            } else if x > 0.0 {
                ContrastWeight::Value(round_half_away(x / total_pos, 2))
            } else {
                ContrastWeight::Value(-round_half_away(x / total_neg, 2))
            }
        })
        .collect()
}

/// Indicator vector of `length` columns with ones at `indices`, normalized
pub fn expand_contrast_vector(indices: &[usize], length: usize) -> Vec<ContrastWeight> {
    let mut vector = vec![0.0; length];
    for &index in indices {
        if let Some(slot) = vector.get_mut(index) {
            *slot = 1.0;
        }
    }
    normalize_contrast_vector(&vector)
}

/// Render one contrast line including the trailing newline
pub fn contrast_line(name: &str, weights: &[ContrastWeight], style: ContrastStyle) -> String {
    let joined = weights
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");

    match style {
        ContrastStyle::Bracketed => format!("{} : [{}]\n", name, joined),
        ContrastStyle::Bare => format!("{} : {}\n", name, joined),
    }
}

/// Render a whole contrast table
pub fn render_contrasts<'a>(
    contrasts: impl IntoIterator<Item = (&'a str, &'a [ContrastWeight])>,
    style: ContrastStyle,
) -> String {
    contrasts
        .into_iter()
        .map(|(name, weights)| contrast_line(name, weights, style))
        .collect()
}

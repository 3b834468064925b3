//! Global contrast vectors from an inclusion matrix
//!
//! Contrasts are authored for one ideal session of five conditions (four task
//! conditions plus fixation). An inclusion matrix says, per session, which of
//! those conditions a subject actually has usable data for. The global vector
//! spreads the ideal contrast over all four sessions, zeroes excluded cells
//! and rebalances the remaining weights so positives sum to 1 and negatives
//! to -1.

use crate::app::services::spm_writer::{contrast_line, ContrastStyle, ContrastWeight};
use crate::constants::{INCLUSION_COLUMNS, INCLUSION_ROWS};
use crate::{Error, Result};

/// A named contrast vector
#[derive(Debug, Clone, PartialEq)]
pub struct Contrast {
    pub name: String,
    pub vector: Vec<f64>,
}

/// Parse a `name : v v v` line
///
/// The name is everything before the first ':' and is kept as written, so
/// `A : 1` renders back as `A  : ...`.
pub fn parse_contrast(line: &str) -> Result<Contrast> {
    let (name, values) = line
        .split_once(':')
        .ok_or_else(|| Error::contrast(format!("missing ':' in line '{}'", line.trim())))?;

    let vector = values
        .split_whitespace()
        .map(|token| {
            token.parse::<f64>().map_err(|_| {
                Error::contrast(format!(
                    "invalid weight '{}' in contrast '{}'",
                    token,
                    name.trim()
                ))
            })
        })
        .collect::<Result<Vec<f64>>>()?;

    Ok(Contrast {
        name: name.to_string(),
        vector,
    })
}

/// Parse every non-blank line of a contrast file
pub fn parse_contrast_file(text: &str) -> Result<Vec<Contrast>> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_contrast)
        .collect()
}

/// Per-session inclusion weights, sessions × conditions
#[derive(Debug, Clone, PartialEq)]
pub struct InclusionMatrix {
    /// Row-major, `INCLUSION_ROWS * INCLUSION_COLUMNS` entries
    cells: Vec<f64>,
}

impl InclusionMatrix {
    /// Parse a whitespace-separated matrix
    ///
    /// The values are read row-major and reshaped to four sessions. A matrix
    /// with four columns gains a fixation column of ones.
    pub fn parse(text: &str) -> Result<Self> {
        let mut values = Vec::new();
        for line in text.lines().filter(|line| !line.trim().is_empty()) {
            for token in line.split_whitespace() {
                let value = token.parse::<f64>().map_err(|_| {
                    Error::contrast(format!("invalid inclusion value '{}'", token))
                })?;
                values.push(value);
            }
        }

        if values.is_empty() || values.len() % INCLUSION_ROWS != 0 {
            return Err(Error::contrast(format!(
                "inclusion matrix has {} values, not a multiple of {}",
                values.len(),
                INCLUSION_ROWS
            )));
        }

        let columns = values.len() / INCLUSION_ROWS;
        let cells = match columns {
            c if c == INCLUSION_COLUMNS => values,
            c if c == INCLUSION_COLUMNS - 1 => values
                .chunks(columns)
                .flat_map(|row| row.iter().copied().chain(std::iter::once(1.0)))
                .collect(),
            other => {
                return Err(Error::contrast(format!(
                    "inclusion matrix must have {} or {} columns, found {}",
                    INCLUSION_COLUMNS - 1,
                    INCLUSION_COLUMNS,
                    other
                )));
            }
        };

        Ok(Self { cells })
    }

    pub fn cells(&self) -> &[f64] {
        &self.cells
    }
}

/// Build the global vector of one contrast
pub fn global_contrast_vector(matrix: &InclusionMatrix, contrast: &Contrast) -> Result<Vec<f64>> {
    let mut vector = contrast.vector.clone();
    if vector.len() < INCLUSION_COLUMNS {
        vector.resize(INCLUSION_COLUMNS, 0.0);
    }
    if vector.len() == INCLUSION_COLUMNS {
        vector = vector.repeat(INCLUSION_ROWS);
    }

    if vector.len() != matrix.cells.len() {
        return Err(Error::contrast(format!(
            "contrast '{}' has {} weights, expected {} or {}",
            contrast.name.trim(),
            contrast.vector.len(),
            INCLUSION_COLUMNS,
            matrix.cells.len()
        )));
    }

    let positive: f64 = vector.iter().filter(|&&x| x > 0.0).sum();
    if positive == 0.0 {
        return Err(Error::contrast(format!(
            "contrast '{}' has no positive weight",
            contrast.name.trim()
        )));
    }

    let hadamard: Vec<f64> = vector
        .iter()
        .zip(&matrix.cells)
        .map(|(v, u)| (v / positive) * u)
        .collect();

    let sum_pos: f64 = hadamard.iter().filter(|&&x| x > 0.0).sum();
    let sum_neg: f64 = hadamard.iter().filter(|&&x| x < 0.0).sum();

    Ok(hadamard
        .iter()
        .map(|&x| {
            let p = if x > 0.0 { x / sum_pos } else { 0.0 };
            let m = if x < 0.0 { x / sum_neg } else { 0.0 };
            // Adding 0.0 folds -0.0 into 0.0
            (p - m) + 0.0
        })
        .collect())
}

/// Render global contrasts for every contrast in the file
pub fn render_global_contrasts(contrasts: &[Contrast], matrix: &InclusionMatrix) -> Result<String> {
    let mut out = String::new();
    for contrast in contrasts {
        let weights: Vec<ContrastWeight> = global_contrast_vector(matrix, contrast)?
            .into_iter()
            .map(ContrastWeight::from)
            .collect();
        out.push_str(&contrast_line(&contrast.name, &weights, ContrastStyle::Bare));
    }
    Ok(out)
}

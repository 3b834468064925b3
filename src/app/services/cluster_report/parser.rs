//! Line-oriented parser for xjView reports

use crate::{Error, Result};
use tracing::debug;

/// One cluster of the report
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cluster {
    pub number: i64,
    /// Peak MNI coordinate (x, y, z)
    pub mni: Option<[i64; 3]>,
    /// Labels at the peak, in report order
    pub labels: Vec<String>,
    /// Number of voxels
    pub size: Option<u64>,
    /// Peak intensity as printed, kept as text for exact decimal rounding
    pub peak: Option<String>,
    /// `<voxels> <label> ...` lines
    pub regions: Vec<String>,
}

impl Cluster {
    pub fn new(number: i64) -> Self {
        Self {
            number,
            ..Self::default()
        }
    }
}

/// Parse a report into clusters
///
/// `Cluster N` opens a cluster and a `----` rule closes it. A final cluster
/// without a closing rule is still returned.
pub fn parse_report(text: &str) -> Result<Vec<Cluster>> {
    let mut clusters: Vec<Cluster> = Vec::new();
    let mut current: Option<Cluster> = None;
    let mut closed = false;

    for (line_number, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if trimmed.starts_with("Cluster") {
            let number = trimmed
                .split_whitespace()
                .nth(1)
                .and_then(|token| token.parse::<i64>().ok())
                .ok_or_else(|| {
                    Error::report(format!(
                        "line {}: cannot read cluster number from '{}'",
                        line_number + 1,
                        trimmed
                    ))
                })?;
            current = Some(Cluster::new(number));
            closed = false;
            continue;
        }

        let Some(cluster) = current.as_mut() else {
            debug!("Ignoring line {} outside a cluster", line_number + 1);
            continue;
        };

        if line.starts_with("----") {
            if !closed {
                clusters.push(cluster.clone());
                closed = true;
            }
        } else if line.starts_with("Peak MNI coordinate:") {
            cluster.mni = Some(parse_coordinate(field_value(line), line_number)?);
        } else if line.starts_with("Peak MNI coordinate region:") {
            cluster.labels = field_value(line)
                .split("//")
                .map(|label| label.trim().to_string())
                .collect();
        } else if line.starts_with("Number of voxels:") {
            let value = field_value(line).trim();
            cluster.size = Some(value.parse::<u64>().map_err(|_| {
                Error::report(format!(
                    "line {}: invalid voxel count '{}'",
                    line_number + 1,
                    value
                ))
            })?);
        } else if line.starts_with("Peak intensity:") {
            cluster.peak = Some(field_value(line).trim().to_string());
        } else if trimmed
            .split_whitespace()
            .next()
            .is_some_and(|token| token.chars().all(|c| c.is_ascii_digit()))
        {
            cluster.regions.push(trimmed.to_string());
        }
    }

    if let Some(cluster) = current {
        if !closed {
            clusters.push(cluster);
        }
    }

    Ok(clusters)
}

/// Text between the first and second `:` of a line
fn field_value(line: &str) -> &str {
    line.split(':').nth(1).unwrap_or_default()
}

fn parse_coordinate(value: &str, line_number: usize) -> Result<[i64; 3]> {
    let numbers = value
        .split_whitespace()
        .map(|token| token.parse::<i64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| {
            Error::report(format!(
                "line {}: invalid coordinate '{}'",
                line_number + 1,
                value.trim()
            ))
        })?;

    match numbers.as_slice() {
        [x, y, z] => Ok([*x, *y, *z]),
        _ => Err(Error::report(format!(
            "line {}: expected 3 coordinates, found {}",
            line_number + 1,
            numbers.len()
        ))),
    }
}

//! Cluster table rendering

use super::parser::Cluster;
use crate::constants::aal_description;
use crate::{Error, Result};

/// Column headings of the cluster table
pub const TABLE_HEADER: &str = "Index\tMNI (Peak)\tPeak Anatomical Location\tBrodmann Areas\tAAL Locations\tSize (voxels)\tPeak intensity";

/// Placeholder for empty table cells
const EMPTY_CELL: &str = "-";

impl Cluster {
    /// Last peak label that is not `undefined`
    pub fn peak_label(&self) -> &str {
        self.labels
            .iter()
            .rev()
            .find(|label| label.as_str() != "undefined" && !label.is_empty())
            .map_or(EMPTY_CELL, String::as_str)
    }

    /// `BA<n> (<pct>%);` for each Brodmann region line
    pub fn brodmann_areas(&self) -> Result<String> {
        let size = self.voxel_count()?;
        let mut parts = Vec::new();

        for region in self.regions.iter().filter(|r| r.find("brodmann").is_some_and(|i| i > 0)) {
            let tokens: Vec<&str> = region.split_whitespace().collect();
            let (Some(count), Some(area)) = (tokens.first(), tokens.get(3)) else {
                return Err(Error::report(format!("malformed Brodmann line '{}'", region)));
            };
            parts.push(format!("BA{} ({:.2}%);", area, percent(count, size, region)?));
        }

        Ok(join_or_empty(parts))
    }

    /// Readable AAL names with hemisphere and share of the cluster
    pub fn aal_locations(&self) -> Result<String> {
        let size = self.voxel_count()?;
        let mut parts = Vec::new();

        for region in self.regions.iter().filter(|r| r.find("(aal)").is_some_and(|i| i > 0)) {
            let tokens: Vec<&str> = region.split_whitespace().collect();
            let (Some(count), Some(label)) = (tokens.first(), tokens.get(1)) else {
                return Err(Error::report(format!("malformed AAL line '{}'", region)));
            };
            parts.push(format!(
                "{} ({:.2}%);",
                aal_readable(label),
                percent(count, size, region)?
            ));
        }

        Ok(join_or_empty(parts))
    }

    fn voxel_count(&self) -> Result<u64> {
        match self.size {
            Some(size) if size > 0 => Ok(size),
            _ => Err(Error::report(format!(
                "cluster {} has no voxel count",
                self.number
            ))),
        }
    }

    /// One tab-separated table row
    pub fn table_row(&self) -> Result<String> {
        let [x, y, z] = self.mni.ok_or_else(|| {
            Error::report(format!("cluster {} has no peak coordinate", self.number))
        })?;
        let peak = self.peak.as_deref().ok_or_else(|| {
            Error::report(format!("cluster {} has no peak intensity", self.number))
        })?;

        Ok(format!(
            "{}\t{}, {}, {}\t{}\t{}\t{}\t{}\t{}",
            self.number,
            x,
            y,
            z,
            self.peak_label(),
            self.brodmann_areas()?,
            self.aal_locations()?,
            self.voxel_count()?,
            quantize_hundredths(peak)?
        ))
    }
}

/// Render the header and one row per cluster
pub fn render_table(clusters: &[Cluster]) -> Result<String> {
    let mut out = String::from(TABLE_HEADER);
    out.push('\n');
    for cluster in clusters {
        out.push_str(&cluster.table_row()?);
        out.push('\n');
    }
    Ok(out)
}

fn percent(count: &str, size: u64, region: &str) -> Result<f64> {
    let voxels = count
        .parse::<f64>()
        .map_err(|_| Error::report(format!("invalid voxel count in '{}'", region)))?;
    Ok(voxels * 100.0 / size as f64)
}

fn join_or_empty(parts: Vec<String>) -> String {
    if parts.is_empty() {
        EMPTY_CELL.to_string()
    } else {
        parts.join(" ")
    }
}

fn aal_readable(label: &str) -> String {
    let name = aal_description(label).unwrap_or(label);
    if label.ends_with("_L") {
        format!("Left {}", name)
    } else if label.ends_with("_R") {
        format!("Right {}", name)
    } else {
        name.to_string()
    }
}

/// Round a decimal string to two places, ties to even
pub fn quantize_hundredths(text: &str) -> Result<String> {
    let text = text.trim();
    let invalid = || Error::report(format!("invalid decimal '{}'", text));

    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !all_digits(int_part) || !all_digits(frac_part) {
        return Err(invalid());
    }

    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let mut digits: Vec<u8> = int_part
        .bytes()
        .chain(frac_part.bytes().chain(std::iter::repeat(b'0')).take(2))
        .map(|b| b - b'0')
        .collect();

    let rest = frac_part.get(2..).unwrap_or("");
    let round_up = match rest.bytes().next() {
        None => false,
        Some(b) if b > b'5' => true,
        Some(b) if b < b'5' => false,
        Some(_) => {
            let beyond_half = rest.bytes().skip(1).any(|b| b != b'0');
            let last_odd = digits.last().is_some_and(|d| d % 2 == 1);
            beyond_half || last_odd
        }
    };

    if round_up {
        let mut carry = true;
        for digit in digits.iter_mut().rev() {
            if !carry {
                break;
            }
            if *digit == 9 {
                *digit = 0;
            } else {
                *digit += 1;
                carry = false;
            }
        }
        if carry {
            digits.insert(0, 1);
        }
    }

    let split = digits.len() - 2;
    let render = |ds: &[u8]| ds.iter().map(|d| char::from(b'0' + d)).collect::<String>();
    Ok(format!(
        "{}{}.{}",
        if negative { "-" } else { "" },
        render(&digits[..split]),
        render(&digits[split..])
    ))
}

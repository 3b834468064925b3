//! Writers for SPM session scripts and contrast tables
//!
//! - [`number_format`] - Python-compatible float and list rendering
//! - [`session_script`] - `names/onsets/durations` MATLAB scripts
//! - [`contrast_file`] - Contrast weights, normalisation and table lines

pub mod contrast_file;
pub mod number_format;
pub mod session_script;

#[cfg(test)]
pub mod tests;

pub use contrast_file::{
    contrast_line, expand_contrast_vector, normalize_contrast_vector, render_contrasts,
    ContrastStyle, ContrastWeight,
};
pub use number_format::{fixed3, one_decimal, python_float, python_int_list, python_list, round_half_away};
pub use session_script::{ScriptStyle, SessionScript, ValueFormat};

//! xjView cluster report parsing
//!
//! xjView prints one section per suprathreshold cluster: its peak coordinate,
//! the labels at the peak, its size, the peak intensity and a list of
//! `<voxels> <label>` region lines from several atlases. This service turns
//! such a report into a tab-separated table suitable for pasting into a
//! manuscript.
//!
//! - [`parser`] - Report text to [`Cluster`] records
//! - [`table`] - Brodmann/AAL summaries and table rendering

pub mod parser;
pub mod table;

pub use parser::{parse_report, Cluster};
pub use table::{quantize_hundredths, render_table, TABLE_HEADER};

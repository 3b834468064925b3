//! SPM "multiple conditions" script rendering
//!
//! Each session is written as a block of MATLAB assignments followed by a
//! `save` call that produces the `.mat` file SPM reads:
//!
//! ```text
//! names=cell(1,2);
//! onsets=cell(1,2);
//! durations=cell(1,2);
//! names{1}='Problem';
//! onsets{1}=[4.0, 30.0];
//! durations{1}=[12.5, 9.0];
//! ...
//! save('session1.mat', 'names', 'onsets', 'durations');
//! ```
//!
//! Studies differ in small details of this layout, captured by [`ScriptStyle`].

use super::number_format::{one_decimal, python_list};
use crate::app::models::SessionBlock;

/// Placeholder for the block number in mat-file patterns
pub const BLOCK_PLACEHOLDER: &str = "{block}";

/// How onset and duration lists are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    /// `[1.0, 2.5]`
    PythonList,
    /// `[1.0 2.5 ]`, each value rounded to one decimal
    OneDecimal,
}

/// Layout options of a session script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptStyle {
    pub values: ValueFormat,
    /// `names{1} = 'X';` instead of `names{1}='X';`
    pub spaced_assignments: bool,
    /// Terminate onset/duration assignments with `;`
    pub value_semicolons: bool,
    /// Terminate the save call with `;`
    pub save_semicolon: bool,
    /// Emit an empty line after each save call
    pub blank_after_save: bool,
    /// Mat file name; `{block}` is replaced by the block number
    pub mat_file: String,
}

impl Default for ScriptStyle {
    fn default() -> Self {
        Self {
            values: ValueFormat::PythonList,
            spaced_assignments: false,
            value_semicolons: true,
            save_semicolon: true,
            blank_after_save: false,
            mat_file: "session{block}.mat".to_string(),
        }
    }
}

impl ScriptStyle {
    pub fn with_values(mut self, values: ValueFormat) -> Self {
        self.values = values;
        self
    }

    pub fn spaced(mut self) -> Self {
        self.spaced_assignments = true;
        self
    }

    pub fn without_value_semicolons(mut self) -> Self {
        self.value_semicolons = false;
        self
    }

    pub fn without_save_semicolon(mut self) -> Self {
        self.save_semicolon = false;
        self
    }

    pub fn blank_after_save(mut self) -> Self {
        self.blank_after_save = true;
        self
    }

    pub fn with_mat_file(mut self, pattern: impl Into<String>) -> Self {
        self.mat_file = pattern.into();
        self
    }
}

/// Renders session blocks as MATLAB code
#[derive(Debug, Clone, Default)]
pub struct SessionScript {
    style: ScriptStyle,
}

impl SessionScript {
    pub fn new(style: ScriptStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &ScriptStyle {
        &self.style
    }

    /// Render a list of values in the configured format
    pub fn render_values(&self, values: &[f64]) -> String {
        match self.style.values {
            ValueFormat::PythonList => python_list(values),
            ValueFormat::OneDecimal => {
                let mut out = String::from("[");
                for &value in values {
                    out.push_str(&one_decimal(value));
                    out.push(' ');
                }
                out.push(']');
                out
            }
        }
    }

    /// Mat file name for a block
    pub fn mat_file(&self, block: i64) -> String {
        self.style
            .mat_file
            .replace(BLOCK_PLACEHOLDER, &block.to_string())
    }

    /// Render one session
    pub fn render_block(&self, block: &SessionBlock) -> String {
        let n = block.regressors.len();
        let eq = if self.style.spaced_assignments { " = " } else { "=" };
        let end = if self.style.value_semicolons { ";" } else { "" };

        let mut out = String::new();
        out.push_str(&format!("names=cell(1,{});\n", n));
        out.push_str(&format!("onsets=cell(1,{});\n", n));
        out.push_str(&format!("durations=cell(1,{});\n", n));

        for (i, regressor) in block.regressors.iter().enumerate() {
            let cell = i + 1;
            out.push_str(&format!("names{{{}}}{}'{}';\n", cell, eq, regressor.name));
            out.push_str(&format!(
                "onsets{{{}}}{}{}{}\n",
                cell,
                eq,
                self.render_values(&regressor.onsets),
                end
            ));
            out.push_str(&format!(
                "durations{{{}}}{}{}{}\n",
                cell,
                eq,
                self.render_values(&regressor.durations),
                end
            ));
        }

        out.push_str(&format!(
            "save('{}', 'names', 'onsets', 'durations'){}\n",
            self.mat_file(block.number),
            if self.style.save_semicolon { ";" } else { "" }
        ));
        if self.style.blank_after_save {
            out.push('\n');
        }
        out
    }

    /// Render several sessions into one script
    pub fn render(&self, blocks: &[SessionBlock]) -> String {
        blocks.iter().map(|block| self.render_block(block)).collect()
    }
}

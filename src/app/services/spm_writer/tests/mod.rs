//! Tests for session script and contrast rendering

use crate::app::models::{Regressor, SessionBlock};

mod session_tests;

/// A two-regressor block used by several tests
pub fn sample_block(number: i64) -> SessionBlock {
    let mut block = SessionBlock::new(number);
    block.push(Regressor::new("Problem", vec![4.0, 30.0], vec![12.5, 9.0]));
    block.push(Regressor::new("Choice", vec![17.0], vec![1.25]));
    block
}

//! Error types for cash-flow computation and price search.

use ef_project::{ProjectError, ValidationError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Matrix validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Project(#[from] ProjectError),

    #[error("Target row {target_row} outside operational years 1..={operational_years}")]
    InvalidTarget {
        target_row: u32,
        operational_years: u32,
    },

    #[error("Price search did not converge within {iterations} iterations (last NPV {npv})")]
    Convergence { iterations: usize, npv: f64 },

    #[error("Invalid search configuration: {what}")]
    SearchConfig { what: &'static str },

    #[error("Numeric error: {0}")]
    Numeric(#[from] ef_core::CoreError),
}

pub type EngineResult<T> = Result<T, EngineError>;

//! Error types for solver operations.

use ta_core::CoreError;
use thiserror::Error;

/// Errors raised by the solver primitives themselves.
///
/// Non-convergence is not one of them: the Newton solver returns its last
/// iterate and callers probe convergence separately.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Problem setup error: {what}")]
    ProblemSetup { what: String },

    #[error("Singular linear system: {what}")]
    Singular { what: String },

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

pub type SolverResult<T> = Result<T, SolverError>;

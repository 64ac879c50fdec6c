//! Error types for simulation operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors encountered during transient simulation.
///
/// Newton non-convergence is handled inside the stepper and never shows up
/// here; reaching the minimum step size is reported through
/// [`RunStatus`](crate::RunStatus).
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Invalid configuration: {what}")]
    Config { what: String },

    #[error("Dimension mismatch for {what}: expected {expected}, found {found}")]
    Dimension {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Model error: {message}")]
    Model { message: String },

    #[error("Failed to access {path}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Solver error: {0}")]
    Solver(#[from] ta_solver::SolverError),

    #[error("Core error: {0}")]
    Core(#[from] ta_core::CoreError),
}

pub type SimResult<T> = Result<T, SimError>;

impl From<serde_yaml::Error> for SimError {
    fn from(e: serde_yaml::Error) -> Self {
        SimError::Config {
            what: e.to_string(),
        }
    }
}

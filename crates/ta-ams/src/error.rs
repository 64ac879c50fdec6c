//! Error types for the AMS composition layer.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while assembling or driving a transient.
///
/// Collective failures (seed broadcast, subspace import) arrive as
/// [`ta_core::CoreError::Collective`] and are not recoverable.
#[derive(Error, Debug)]
pub enum AmsError {
    #[error("Invalid configuration: {what}")]
    Config { what: String },

    #[error("Invalid subspace file {path}: {what}")]
    Subspace { path: PathBuf, what: String },

    #[error("Failed to read {path}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Simulation error: {0}")]
    Sim(#[from] ta_sim::SimError),

    #[error("Core error: {0}")]
    Core(#[from] ta_core::CoreError),
}

pub type AmsResult<T> = Result<T, AmsError>;

impl From<serde_yaml::Error> for AmsError {
    fn from(e: serde_yaml::Error) -> Self {
        AmsError::Config {
            what: e.to_string(),
        }
    }
}

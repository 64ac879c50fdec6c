//! AMS driver configuration layered on top of [`ThetaParams`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use ta_sim::ThetaParams;

use crate::error::{AmsError, AmsResult};

/// Degree-of-freedom count identifying the ocean model.
pub const OCEAN_DOF: usize = 6;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AmsParams {
    #[serde(flatten)]
    pub theta: ThetaParams,
    /// Zero draws a fresh seed on the root process.
    #[serde(rename = "ams seed")]
    pub seed: u32,
    #[serde(rename = "dof")]
    pub dof: usize,
    /// Matrix Market multivector spanning the projection subspace; empty for none.
    #[serde(rename = "space")]
    pub space: String,
    #[serde(rename = "ams time step")]
    pub time_step: f64,
    #[serde(rename = "ams end time")]
    pub end_time: f64,
}

impl Default for AmsParams {
    fn default() -> Self {
        Self {
            theta: ThetaParams::default(),
            seed: 0,
            dof: 1,
            space: String::new(),
            time_step: 1.0e-3,
            end_time: 1.0,
        }
    }
}

impl AmsParams {
    pub fn from_yaml_str(text: &str) -> AmsResult<Self> {
        let params: Self = serde_yaml::from_str(text)?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_yaml_file(path: &Path) -> AmsResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| AmsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> AmsResult<()> {
        self.theta.validate()?;
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(AmsError::Config {
                what: format!("ams time step must be positive and finite, got {}", self.time_step),
            });
        }
        if !(self.end_time.is_finite() && self.end_time >= 0.0) {
            return Err(AmsError::Config {
                what: format!("ams end time must be finite and non-negative, got {}", self.end_time),
            });
        }
        Ok(())
    }

    /// Path of the projection subspace, if one is configured.
    pub fn space_path(&self) -> Option<PathBuf> {
        let trimmed = self.space.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    }

    pub fn is_ocean(&self) -> bool {
        self.dof == OCEAN_DOF
    }
}

//! Theta stepper configuration.
//!
//! Keys are the human-readable option names used in run configuration files;
//! every option has a default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThetaParams {
    #[serde(rename = "theta")]
    pub theta: f64,
    #[serde(rename = "initial time step size")]
    pub initial_dt: f64,
    #[serde(rename = "minimum step size")]
    pub min_dt: f64,
    #[serde(rename = "maximum step size")]
    pub max_dt: f64,
    #[serde(rename = "increase step size")]
    pub increase_factor: f64,
    #[serde(rename = "decrease step size")]
    pub decrease_factor: f64,
    /// Length of one model time unit in days.
    #[serde(rename = "timescale in days")]
    pub timescale_days: f64,
    #[serde(rename = "end time (in y)")]
    pub end_time_years: f64,
    /// Negative means unbounded.
    #[serde(rename = "number of time steps")]
    pub max_steps: i64,
    /// Snapshot every N accepted steps; 0 disables.
    #[serde(rename = "HDF5 output frequency")]
    pub output_frequency: i64,
    #[serde(rename = "minimum desired Newton iterations")]
    pub min_newton_iterations: usize,
    #[serde(rename = "maximum desired Newton iterations")]
    pub max_newton_iterations: usize,
    #[serde(rename = "Newton tolerance")]
    pub newton_tolerance: f64,
    #[serde(rename = "maximum Newton iterations")]
    pub newton_iteration_limit: usize,
    #[serde(rename = "output directory")]
    pub output_dir: PathBuf,
}

impl Default for ThetaParams {
    fn default() -> Self {
        Self {
            theta: 1.0,
            initial_dt: 1.0e-3,
            min_dt: 1.0e-8,
            max_dt: 1.0,
            increase_factor: 2.0,
            decrease_factor: 2.0,
            timescale_days: 737.2685,
            end_time_years: 10.0,
            max_steps: 10,
            output_frequency: 1,
            min_newton_iterations: 3,
            max_newton_iterations: 3,
            newton_tolerance: 1e-6,
            newton_iteration_limit: 8,
            output_dir: PathBuf::from("."),
        }
    }
}

fn config(what: impl Into<String>) -> SimError {
    SimError::Config { what: what.into() }
}

impl ThetaParams {
    pub fn from_yaml_str(text: &str) -> SimResult<Self> {
        let params: Self = serde_yaml::from_str(text)?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_yaml_file(path: &Path) -> SimResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Reject combinations that leave the stepper ill-defined.
    pub fn validate(&self) -> SimResult<()> {
        if !(self.theta > 0.0 && self.theta <= 1.0) {
            return Err(config(format!("theta must lie in (0, 1], got {}", self.theta)));
        }
        for (name, v) in [
            ("initial time step size", self.initial_dt),
            ("minimum step size", self.min_dt),
            ("maximum step size", self.max_dt),
            ("timescale in days", self.timescale_days),
            ("Newton tolerance", self.newton_tolerance),
        ] {
            if !(v.is_finite() && v > 0.0) {
                return Err(config(format!("{name} must be positive and finite, got {v}")));
            }
        }
        if self.min_dt > self.max_dt {
            return Err(config(format!(
                "minimum step size {} exceeds maximum step size {}",
                self.min_dt, self.max_dt
            )));
        }
        if self.initial_dt < self.min_dt || self.initial_dt > self.max_dt {
            return Err(config(format!(
                "initial time step size {} outside [{}, {}]",
                self.initial_dt, self.min_dt, self.max_dt
            )));
        }
        if !(self.increase_factor > 1.0) || !(self.decrease_factor > 1.0) {
            return Err(config(format!(
                "step size factors must exceed 1, got increase {} and decrease {}",
                self.increase_factor, self.decrease_factor
            )));
        }
        if self.min_newton_iterations > self.max_newton_iterations {
            return Err(config(format!(
                "minimum desired Newton iterations ({}) exceeds maximum desired Newton iterations ({})",
                self.min_newton_iterations, self.max_newton_iterations
            )));
        }
        if self.newton_iteration_limit == 0 {
            return Err(config("maximum Newton iterations must be at least 1"));
        }
        if self.end_time_years.is_nan() {
            return Err(config("end time (in y) is NaN"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let p = ThetaParams::default();
        assert_eq!(p.theta, 1.0);
        assert_eq!(p.initial_dt, 1e-3);
        assert_eq!(p.min_dt, 1e-8);
        assert_eq!(p.max_dt, 1.0);
        assert_eq!(p.timescale_days, 737.2685);
        assert_eq!(p.end_time_years, 10.0);
        assert_eq!(p.max_steps, 10);
        assert_eq!(p.output_frequency, 1);
        assert_eq!(p.newton_iteration_limit, 8);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn yaml_keys_use_option_names() {
        let p = ThetaParams::from_yaml_str(
            "theta: 0.5\n\
             initial time step size: 0.01\n\
             number of time steps: -1\n\
             end time (in y): 0.25\n\
             HDF5 output frequency: 0\n",
        )
        .unwrap();
        assert_eq!(p.theta, 0.5);
        assert_eq!(p.initial_dt, 0.01);
        assert_eq!(p.max_steps, -1);
        assert_eq!(p.end_time_years, 0.25);
        assert_eq!(p.output_frequency, 0);
        // untouched keys keep their defaults
        assert_eq!(p.newton_tolerance, 1e-6);
    }

    #[test]
    fn inverted_newton_thresholds_are_rejected() {
        let p = ThetaParams {
            min_newton_iterations: 5,
            max_newton_iterations: 2,
            ..Default::default()
        };
        let err = p.validate().unwrap_err();
        assert!(err.to_string().contains("minimum desired Newton iterations"));
    }

    #[test]
    fn theta_outside_unit_interval_is_rejected() {
        for theta in [0.0, -0.5, 1.5, f64::NAN] {
            let p = ThetaParams {
                theta,
                ..Default::default()
            };
            assert!(p.validate().is_err(), "theta = {theta}");
        }
    }

    #[test]
    fn initial_step_must_respect_bounds() {
        let p = ThetaParams {
            initial_dt: 2.0,
            ..Default::default()
        };
        assert!(p.validate().is_err());
    }
}

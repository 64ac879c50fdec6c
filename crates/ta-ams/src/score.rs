//! Score functions: scalar progress of a state between two stable states.
//!
//! Scores run from 0 at the start state to 1 at the target state. The ocean
//! family also passes through 0.5 at the saddle between them.

use ta_core::{Matrix, Vector};

use crate::error::{AmsError, AmsResult};

/// Progress measure consumed by the sampler.
pub type ScoreFunction = Box<dyn Fn(&Vector) -> f64>;

/// The two stable states of a transition and the saddle separating them.
#[derive(Clone, Debug, PartialEq)]
pub struct Endpoints {
    pub start: Vector,
    pub saddle: Vector,
    pub target: Vector,
}

impl Endpoints {
    pub fn new(start: Vector, saddle: Vector, target: Vector) -> Self {
        Self {
            start,
            saddle,
            target,
        }
    }

    /// Coordinates of all three states in `basis` (`Vᵀx`).
    pub fn restrict(&self, basis: &Matrix) -> Self {
        Self {
            start: basis.tr_mul(&self.start),
            saddle: basis.tr_mul(&self.saddle),
            target: basis.tr_mul(&self.target),
        }
    }

    fn check(&self) -> AmsResult<()> {
        let n = self.start.len();
        if self.saddle.len() != n || self.target.len() != n {
            return Err(AmsError::Config {
                what: format!(
                    "endpoint lengths differ: start {}, saddle {}, target {}",
                    n,
                    self.saddle.len(),
                    self.target.len()
                ),
            });
        }
        if self.start == self.target {
            return Err(AmsError::Config {
                what: "start and target states coincide".to_string(),
            });
        }
        Ok(())
    }
}

/// Which formula maps distances to progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoreFamily {
    /// Relative distance between start and target.
    Default,
    /// Piecewise through the saddle, 0.5 at the saddle itself.
    Ocean,
}

impl ScoreFamily {
    pub fn from_dof(dof: usize) -> Self {
        if dof == crate::params::OCEAN_DOF {
            ScoreFamily::Ocean
        } else {
            ScoreFamily::Default
        }
    }
}

fn ratio(near: f64, far: f64) -> f64 {
    let total = near + far;
    if total == 0.0 { 0.0 } else { near / total }
}

fn default_score(x: &Vector, e: &Endpoints) -> f64 {
    let da = (x - &e.start).norm();
    let dc = (x - &e.target).norm();
    ratio(da, dc)
}

fn ocean_score(x: &Vector, e: &Endpoints) -> f64 {
    let da = (x - &e.start).norm();
    let db = (x - &e.saddle).norm();
    let dc = (x - &e.target).norm();
    if da < dc {
        0.5 * ratio(da, db)
    } else {
        0.5 + 0.5 * ratio(db, dc)
    }
}

/// Score function of `family` around `endpoints`.
///
/// With a `basis`, states are restricted to its coordinates before scoring
/// and `endpoints` must already be given in those coordinates.
pub fn score_function(
    family: ScoreFamily,
    endpoints: Endpoints,
    basis: Option<Matrix>,
) -> AmsResult<ScoreFunction> {
    endpoints.check()?;
    if let Some(v) = &basis {
        if v.ncols() != endpoints.start.len() {
            return Err(AmsError::Config {
                what: format!(
                    "projected endpoints have {} coordinates, basis has {} columns",
                    endpoints.start.len(),
                    v.ncols()
                ),
            });
        }
    }

    let formula: fn(&Vector, &Endpoints) -> f64 = match family {
        ScoreFamily::Default => default_score,
        ScoreFamily::Ocean => ocean_score,
    };

    let score: ScoreFunction = match basis {
        Some(v) => Box::new(move |x: &Vector| formula(&v.tr_mul(x), &endpoints)),
        None => Box::new(move |x: &Vector| formula(x, &endpoints)),
    };
    Ok(score)
}

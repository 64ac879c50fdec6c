//! Linear system `M dx/dt = A x + b` with additive noise.
//!
//! Rows with zero mass are algebraic constraints and receive no noise.

use std::path::Path;

use serde::Serialize;
use ta_core::{Matrix, Vector};
use ta_sim::{Physics, SimError, SimResult};

use crate::common::write_snapshot;

#[derive(Clone, Debug)]
pub struct LinearSystem {
    matrix: Matrix,
    forcing: Vector,
    mass: Vector,
    sigma: Vector,
    x0: Vector,
}

#[derive(Serialize)]
struct LinearSnapshot<'a> {
    state: &'a [f64],
}

fn dimension(what: &'static str, expected: usize, found: usize) -> SimResult<()> {
    if expected == found {
        Ok(())
    } else {
        Err(SimError::Dimension {
            what,
            expected,
            found,
        })
    }
}

impl LinearSystem {
    /// `dx/dt = A x + b` starting from `x0`, unit mass and no noise.
    pub fn new(matrix: Matrix, forcing: Vector, x0: Vector) -> SimResult<Self> {
        let n = matrix.nrows();
        dimension("matrix columns", n, matrix.ncols())?;
        dimension("forcing", n, forcing.len())?;
        dimension("initial state", n, x0.len())?;
        Ok(Self {
            matrix,
            forcing,
            mass: Vector::from_element(n, 1.0),
            sigma: Vector::zeros(n),
            x0,
        })
    }

    /// Diagonal decay `dx_i/dt = -rate_i x_i`.
    pub fn decay(rates: &[f64], x0: Vector) -> SimResult<Self> {
        let n = rates.len();
        let matrix = Matrix::from_diagonal(&-Vector::from_row_slice(rates));
        Self::new(matrix, Vector::zeros(n), x0)
    }

    pub fn with_mass(mut self, mass: Vector) -> SimResult<Self> {
        dimension("mass", self.x0.len(), mass.len())?;
        self.mass = mass;
        Ok(self)
    }

    pub fn with_noise(mut self, sigma: Vector) -> SimResult<Self> {
        dimension("noise forcing", self.x0.len(), sigma.len())?;
        self.sigma = sigma;
        Ok(self)
    }
}

impl Physics for LinearSystem {
    fn dim(&self) -> usize {
        self.x0.len()
    }

    fn initial_state(&self) -> Vector {
        self.x0.clone()
    }

    fn rhs(&self, x: &Vector) -> SimResult<Vector> {
        dimension("state", self.x0.len(), x.len())?;
        Ok(&self.matrix * x + &self.forcing)
    }

    fn jacobian(&self, _x: &Vector) -> SimResult<Matrix> {
        Ok(self.matrix.clone())
    }

    fn mass(&self) -> Vector {
        self.mass.clone()
    }

    fn noise_forcing(&self) -> Vector {
        self.sigma.clone()
    }

    fn save_state(&self, x: &Vector, path: &Path) -> SimResult<()> {
        write_snapshot(path, &LinearSnapshot { state: x.as_slice() })
    }
}

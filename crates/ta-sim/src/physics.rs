//! Physics seam: the component model a [`ThetaModel`](crate::ThetaModel) wraps.

use std::path::Path;

use ta_core::{Layout, Matrix, Vector};
use ta_solver::finite_difference_jacobian;

use crate::error::SimResult;

/// Relative perturbation used by the default finite-difference Jacobian.
pub const FD_EPSILON: f64 = 1e-7;

/// Trait for the spatially discretized dynamics `M dx/dt = F(x)`.
///
/// Implementors provide the right-hand side; everything else has a default.
/// All methods are deterministic functions of `x` and the implementor's own
/// parameters: the theta machinery relies on repeated evaluations at the same
/// state giving identical results.
pub trait Physics {
    /// Number of unknowns.
    fn dim(&self) -> usize;

    fn initial_state(&self) -> Vector;

    /// Right-hand side `F(x)`.
    fn rhs(&self, x: &Vector) -> SimResult<Vector>;

    /// `dF/dx` at `x`. Defaults to forward differences on [`Physics::rhs`].
    fn jacobian(&self, x: &Vector) -> SimResult<Matrix> {
        finite_difference_jacobian(x, |y: &Vector| self.rhs(y), FD_EPSILON)
    }

    /// Diagonal of the mass matrix `M`. Zero entries mark algebraic rows.
    fn mass(&self) -> Vector {
        Vector::from_element(self.dim(), 1.0)
    }

    /// Diagonal noise amplitudes for stochastic stepping.
    fn noise_forcing(&self) -> Vector {
        Vector::zeros(self.dim())
    }

    /// Global rows owned by this process.
    fn layout(&self) -> Layout {
        Layout::contiguous(self.dim())
    }

    fn set_theta(&mut self, _theta: f64) {}

    fn set_timestep(&mut self, _dt: f64) {}

    /// Bookkeeping before a time step is attempted.
    fn pre_process(&mut self, _x: &Vector) -> SimResult<()> {
        Ok(())
    }

    /// Bookkeeping after a time step is accepted.
    fn post_process(&mut self, _x: &Vector) -> SimResult<()> {
        Ok(())
    }

    /// Extra diagnostic columns; column titles when `describe` is set.
    fn write_data(&self, _x: &Vector, _describe: bool) -> String {
        String::new()
    }

    fn save_state(&self, _x: &Vector, _path: &Path) -> SimResult<()> {
        Ok(())
    }
}

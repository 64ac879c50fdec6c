//! Undamped Newton iteration with a fixed iteration cap.

use std::marker::PhantomData;

use ta_core::timing::ams_timing;
use ta_core::{Vector, norm2};

use crate::error::SolverError;

/// Iteration cap of [`newton`].
pub const MAX_NEWTON_ITERATIONS: usize = 20;

/// A nonlinear system `F(x) = 0` seen through its residual and a
/// linearized solve.
///
/// Both methods may mutate shared model state; implementations must set the
/// state explicitly from `x` before evaluating.
pub trait NewtonSystem {
    type Error: From<SolverError>;

    /// Evaluate `F(x)`.
    fn residual(&mut self, x: &Vector) -> Result<Vector, Self::Error>;

    /// Solve the system linearized at `x` for the correction implied by `r`,
    /// i.e. return `J(x)⁻¹ r`.
    fn jacobian_solve(&mut self, x: &Vector, r: &Vector) -> Result<Vector, Self::Error>;
}

/// Run Newton from `x0` until `‖F(x)‖₂ < tol`.
///
/// Each iteration takes the full step `x ← x − J(x)⁻¹F(x)`. When the cap is
/// reached the last iterate is returned anyway and a warning is logged;
/// callers that care must check with [`is_converged`]. Errors only come from
/// the evaluators.
pub fn newton<S: NewtonSystem>(system: &mut S, x0: &Vector, tol: f64) -> Result<Vector, S::Error> {
    let _t = ams_timing::NEWTON.scope();

    if !(tol > 0.0) {
        return Err(SolverError::ProblemSetup {
            what: format!("Newton tolerance must be positive, got {tol}"),
        }
        .into());
    }

    let mut x = x0.clone();
    let mut fx = system.residual(&x)?;
    let mut nrm = f64::NAN;

    for iter in 0..MAX_NEWTON_ITERATIONS {
        let dx = system.jacobian_solve(&x, &fx)?;
        x -= &dx;
        fx = system.residual(&x)?;
        nrm = norm2(&fx);

        tracing::debug!(iter, residual_norm = nrm, "newton iteration");

        if nrm < tol {
            return Ok(x);
        }
    }

    tracing::warn!("Newton unconverged with norm {nrm}");
    Ok(x)
}

/// Convergence probe: does `x` satisfy `‖F(x)‖₂ < tol`?
pub fn is_converged<S: NewtonSystem>(system: &mut S, x: &Vector, tol: f64) -> Result<bool, S::Error> {
    let fx = system.residual(x)?;
    Ok(norm2(&fx) < tol)
}

/// Adapter building a [`NewtonSystem`] from two closures.
pub struct FnSystem<F, J, E> {
    residual: F,
    jacobian_solve: J,
    _error: PhantomData<fn() -> E>,
}

impl<F, J, E> FnSystem<F, J, E>
where
    F: FnMut(&Vector) -> Result<Vector, E>,
    J: FnMut(&Vector, &Vector) -> Result<Vector, E>,
    E: From<SolverError>,
{
    pub fn new(residual: F, jacobian_solve: J) -> Self {
        Self {
            residual,
            jacobian_solve,
            _error: PhantomData,
        }
    }
}

impl<F, J, E> NewtonSystem for FnSystem<F, J, E>
where
    F: FnMut(&Vector) -> Result<Vector, E>,
    J: FnMut(&Vector, &Vector) -> Result<Vector, E>,
    E: From<SolverError>,
{
    type Error = E;

    fn residual(&mut self, x: &Vector) -> Result<Vector, E> {
        (self.residual)(x)
    }

    fn jacobian_solve(&mut self, x: &Vector, r: &Vector) -> Result<Vector, E> {
        (self.jacobian_solve)(x, r)
    }
}

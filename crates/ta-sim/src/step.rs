//! Single implicit theta step as a reusable map `(x, dt) -> x_new`.

use std::cell::RefCell;
use std::rc::Rc;

use rand::Rng;
use ta_core::Vector;
use ta_core::timing::ams_timing;
use ta_solver::{NewtonSystem, is_converged, newton};

use crate::error::{SimError, SimResult};
use crate::model::Model;
use crate::physics::Physics;
use crate::theta::ThetaModel;

/// Absolute residual tolerance of one step.
pub const STEP_TOLERANCE: f64 = 1e-8;

/// Shared handle to a theta model.
pub type SharedThetaModel<P> = Rc<RefCell<ThetaModel<P>>>;

/// One implicit theta step around a shared [`ThetaModel`].
///
/// There is no step-size control and no retry: the step returns whatever
/// Newton produced, and callers that need to know use [`ThetaStep::converged`].
/// The model's state is set explicitly before every evaluation, so nothing
/// carries over between calls except the model's own arrays.
pub struct ThetaStep<P> {
    model: SharedThetaModel<P>,
    tolerance: f64,
}

impl<P> Clone for ThetaStep<P> {
    fn clone(&self) -> Self {
        Self {
            model: Rc::clone(&self.model),
            tolerance: self.tolerance,
        }
    }
}

impl<P: Physics> ThetaStep<P> {
    pub fn new(model: SharedThetaModel<P>) -> Self {
        Self {
            model,
            tolerance: STEP_TOLERANCE,
        }
    }

    pub fn model(&self) -> &SharedThetaModel<P> {
        &self.model
    }

    /// Advance `x` by one implicit step of size `dt`.
    pub fn step(&self, x: &Vector, dt: f64) -> SimResult<Vector> {
        let _t = ams_timing::TIME_STEP.scope();
        {
            let mut model = self.model.borrow_mut();
            model.set_state(x)?;
            model.init_step(dt)?;
        }
        let mut system = self.clone();
        newton(&mut system, x, self.tolerance)
    }

    /// Theta residual at `x` for the step set up by the last [`ThetaStep::step`].
    pub fn residual(&self, x: &Vector) -> SimResult<Vector> {
        let _t = ams_timing::RESIDUAL.scope();
        let mut model = self.model.borrow_mut();
        model.set_state(x)?;
        model.compute_rhs()?;
        Ok(model.rhs().clone())
    }

    /// `J(x)⁻¹ b` for the theta Jacobian at `x`.
    pub fn jacobian_solve(&self, x: &Vector, b: &Vector) -> SimResult<Vector> {
        let _t = ams_timing::JACOBIAN_SOLVE.scope();
        let mut model = self.model.borrow_mut();
        model.set_state(x)?;
        model.compute_jacobian()?;
        model.solve(b)?;
        Ok(model.solution().clone())
    }

    /// Does `x` solve the current step to the step tolerance?
    pub fn converged(&self, x: &Vector) -> SimResult<bool> {
        is_converged(&mut self.clone(), x, self.tolerance)
    }

    /// Explicit noise of the wrapped model's variant.
    pub fn perturb<R: Rng + ?Sized>(&self, x: &Vector, dt: f64, rng: &mut R) -> Vector {
        self.model.borrow().perturb(x, dt, rng)
    }
}

impl<P: Physics> NewtonSystem for ThetaStep<P> {
    type Error = SimError;

    fn residual(&mut self, x: &Vector) -> SimResult<Vector> {
        ThetaStep::residual(self, x)
    }

    fn jacobian_solve(&mut self, x: &Vector, r: &Vector) -> SimResult<Vector> {
        ThetaStep::jacobian_solve(self, x, r)
    }
}

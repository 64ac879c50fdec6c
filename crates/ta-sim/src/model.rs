//! Model trait: what the theta stepper needs from a discretized system.

use std::path::Path;

use ta_core::Vector;

use crate::error::SimResult;

/// Stateful view of a discretized model during implicit time stepping.
///
/// The model owns its state, residual and solution vectors; callers borrow
/// them for the duration of a call. `compute_rhs` refreshes the residual at
/// the current state, `compute_jacobian` the linearization, and `solve` writes
/// `J⁻¹ b` into the solution vector.
pub trait Model {
    fn state(&self) -> &Vector;

    fn state_mut(&mut self) -> &mut Vector;

    /// Most recent result of [`Model::solve`].
    fn solution(&self) -> &Vector;

    /// Most recent result of [`Model::compute_rhs`].
    fn rhs(&self) -> &Vector;

    fn set_state(&mut self, x: &Vector) -> SimResult<()>;

    fn compute_rhs(&mut self) -> SimResult<()>;

    fn compute_jacobian(&mut self) -> SimResult<()>;

    fn solve(&mut self, b: &Vector) -> SimResult<()>;

    fn set_theta(&mut self, theta: f64) -> SimResult<()>;

    fn set_timestep(&mut self, dt: f64) -> SimResult<()>;

    /// Start a step of size `dt` from the current state.
    fn init_step(&mut self, dt: f64) -> SimResult<()>;

    /// Snapshot the current state; it becomes the "old" state of the step.
    fn store(&mut self) -> SimResult<()>;

    /// Return to the last snapshot.
    fn restore(&mut self);

    fn pre_process(&mut self) -> SimResult<()> {
        Ok(())
    }

    fn post_process(&mut self) -> SimResult<()> {
        Ok(())
    }

    /// Extra diagnostic columns; column titles when `describe` is set.
    fn write_data(&self, _describe: bool) -> String {
        String::new()
    }

    fn save_state_to_file(&self, path: &Path) -> SimResult<()>;
}

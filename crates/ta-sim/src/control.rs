//! Step-size control driven by Newton iteration counts.

use crate::params::ThetaParams;

/// Bounds and factors for adapting the time step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepControl {
    pub min_dt: f64,
    pub max_dt: f64,
    pub increase_factor: f64,
    pub decrease_factor: f64,
    pub min_newton_iterations: usize,
    pub max_newton_iterations: usize,
}

impl StepControl {
    pub fn from_params(params: &ThetaParams) -> Self {
        Self {
            min_dt: params.min_dt,
            max_dt: params.max_dt,
            increase_factor: params.increase_factor,
            decrease_factor: params.decrease_factor,
            min_newton_iterations: params.min_newton_iterations,
            max_newton_iterations: params.max_newton_iterations,
        }
    }

    /// Smaller step after a failed or expensive solve, floored at `min_dt`.
    pub fn shrink(&self, dt: f64) -> f64 {
        (dt / self.decrease_factor).max(self.min_dt)
    }

    /// Larger step after a cheap solve, capped at `max_dt`.
    pub fn grow(&self, dt: f64) -> f64 {
        (dt * self.increase_factor).min(self.max_dt)
    }

    /// Next step size after an accepted step that took `k` Newton iterations.
    pub fn adapt(&self, dt: f64, k: usize) -> f64 {
        if k < self.min_newton_iterations {
            self.grow(dt)
        } else if k > self.max_newton_iterations {
            self.shrink(dt)
        } else {
            dt
        }
    }
}

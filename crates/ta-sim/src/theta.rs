//! Theta discretization of `M dx/dt = F(x)` around a [`Physics`].
//!
//! One step from `x_old` solves
//!
//! ```text
//! M (x - x_old) / dt = theta F(x) + (1 - theta) F(x_old)
//! ```
//!
//! which [`ThetaModel`] exposes through the [`Model`] trait as the residual
//!
//! ```text
//! R(x) = -M (x - x_old) / (theta dt) + F(x) + (1 - theta) / theta F(x_old)
//! ```
//!
//! with Jacobian `dF/dx - M / (theta dt)`.

use std::path::Path;

use rand::Rng;
use rand_distr::StandardNormal;
use ta_core::{Matrix, Vector};
use ta_solver::solve_dense;

use crate::error::{SimError, SimResult};
use crate::model::Model;
use crate::params::ThetaParams;
use crate::physics::Physics;

/// Which flavour of theta step a [`ThetaModel`] performs.
#[derive(Clone, Debug, PartialEq)]
pub enum ThetaKind {
    /// Plain implicit step.
    Deterministic,
    /// Implicit step followed by explicit additive noise.
    Stochastic,
    /// As `Stochastic`, with noise confined to the span of an orthonormal basis.
    StochasticProjected { basis: Matrix },
}

pub struct ThetaModel<P> {
    physics: P,
    kind: ThetaKind,
    theta: f64,
    dt: f64,
    mass: Vector,
    noise: Vector,
    x: Vector,
    x_old: Vector,
    f_old: Vector,
    rhs: Vector,
    solution: Vector,
    jacobian: Matrix,
}

fn check_theta(theta: f64) -> SimResult<f64> {
    if theta > 0.0 && theta <= 1.0 {
        Ok(theta)
    } else {
        Err(SimError::InvalidArg {
            what: "theta must lie in (0, 1]",
        })
    }
}

fn check_timestep(dt: f64) -> SimResult<f64> {
    if dt.is_finite() && dt > 0.0 {
        Ok(dt)
    } else {
        Err(SimError::InvalidArg {
            what: "time step must be positive and finite",
        })
    }
}

fn check_len(what: &'static str, v: &Vector, expected: usize) -> SimResult<()> {
    if v.len() == expected {
        Ok(())
    } else {
        Err(SimError::Dimension {
            what,
            expected,
            found: v.len(),
        })
    }
}

impl<P: Physics> ThetaModel<P> {
    pub fn new(mut physics: P, kind: ThetaKind, theta: f64, dt: f64) -> SimResult<Self> {
        let theta = check_theta(theta)?;
        let dt = check_timestep(dt)?;
        let n = physics.dim();

        let x = physics.initial_state();
        check_len("initial state", &x, n)?;
        let mass = physics.mass();
        check_len("mass matrix diagonal", &mass, n)?;
        let noise = physics.noise_forcing();
        check_len("noise forcing", &noise, n)?;

        let kind = match kind {
            ThetaKind::StochasticProjected { basis } => ThetaKind::StochasticProjected {
                basis: orthonormalize(basis, n)?,
            },
            other => other,
        };

        physics.set_theta(theta);
        physics.set_timestep(dt);
        let f_old = physics.rhs(&x)?;
        check_len("right-hand side", &f_old, n)?;

        Ok(Self {
            physics,
            kind,
            theta,
            dt,
            mass,
            noise,
            x_old: x.clone(),
            rhs: Vector::zeros(n),
            solution: Vector::zeros(n),
            jacobian: Matrix::zeros(n, n),
            f_old,
            x,
        })
    }

    pub fn deterministic(physics: P, params: &ThetaParams) -> SimResult<Self> {
        Self::new(physics, ThetaKind::Deterministic, params.theta, params.initial_dt)
    }

    pub fn stochastic(physics: P, params: &ThetaParams) -> SimResult<Self> {
        Self::new(physics, ThetaKind::Stochastic, params.theta, params.initial_dt)
    }

    pub fn projected(physics: P, params: &ThetaParams, basis: Matrix) -> SimResult<Self> {
        Self::new(
            physics,
            ThetaKind::StochasticProjected { basis },
            params.theta,
            params.initial_dt,
        )
    }

    pub fn kind(&self) -> &ThetaKind {
        &self.kind
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    pub fn timestep(&self) -> f64 {
        self.dt
    }

    pub fn dim(&self) -> usize {
        self.x.len()
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }

    /// Projection basis of the projected variant.
    pub fn basis(&self) -> Option<&Matrix> {
        match &self.kind {
            ThetaKind::StochasticProjected { basis } => Some(basis),
            _ => None,
        }
    }

    /// Coordinates of `x` in the projection basis (`Vᵀx`).
    pub fn restrict(&self, x: &Vector) -> SimResult<Vector> {
        let basis = self.basis().ok_or(SimError::InvalidArg {
            what: "restrict requires a projected theta model",
        })?;
        check_len("restricted vector", x, basis.nrows())?;
        Ok(basis.tr_mul(x))
    }

    /// Full-space vector with coordinates `y` in the projection basis (`Vy`).
    pub fn prolong(&self, y: &Vector) -> SimResult<Vector> {
        let basis = self.basis().ok_or(SimError::InvalidArg {
            what: "prolong requires a projected theta model",
        })?;
        check_len("prolonged vector", y, basis.ncols())?;
        Ok(basis * y)
    }

    /// Apply the explicit noise of one step of size `dt` to `x`:
    /// `x + sqrt(dt) M⁻¹ (σ ∘ ξ)` with `ξ ~ N(0, I)`, projected onto the basis
    /// for the projected variant. Algebraic rows (zero mass) receive no noise.
    /// The deterministic variant returns `x` unchanged.
    pub fn perturb<R: Rng + ?Sized>(&self, x: &Vector, dt: f64, rng: &mut R) -> Vector {
        if self.kind == ThetaKind::Deterministic {
            return x.clone();
        }

        let scale = dt.sqrt();
        let noise = Vector::from_fn(self.noise.len(), |i, _| {
            let xi: f64 = rng.sample(StandardNormal);
            let m = self.mass[i];
            if m == 0.0 { 0.0 } else { scale * self.noise[i] * xi / m }
        });

        match &self.kind {
            ThetaKind::StochasticProjected { basis } => x + basis * basis.tr_mul(&noise),
            _ => x + noise,
        }
    }
}

/// Orthonormal basis of the column space of `basis`.
fn orthonormalize(basis: Matrix, n: usize) -> SimResult<Matrix> {
    if basis.nrows() != n {
        return Err(SimError::Dimension {
            what: "projection basis rows",
            expected: n,
            found: basis.nrows(),
        });
    }
    if basis.ncols() == 0 || basis.ncols() > n {
        return Err(SimError::InvalidArg {
            what: "projection basis needs between 1 and dim columns",
        });
    }
    let q = basis.qr().q();
    Ok(q)
}

impl<P: Physics> Model for ThetaModel<P> {
    fn state(&self) -> &Vector {
        &self.x
    }

    fn state_mut(&mut self) -> &mut Vector {
        &mut self.x
    }

    fn solution(&self) -> &Vector {
        &self.solution
    }

    fn rhs(&self) -> &Vector {
        &self.rhs
    }

    fn set_state(&mut self, x: &Vector) -> SimResult<()> {
        check_len("state", x, self.x.len())?;
        self.x.copy_from(x);
        Ok(())
    }

    fn compute_rhs(&mut self) -> SimResult<()> {
        let f = self.physics.rhs(&self.x)?;
        check_len("right-hand side", &f, self.x.len())?;

        let c = 1.0 / (self.theta * self.dt);
        let w = (1.0 - self.theta) / self.theta;
        self.rhs = Vector::from_fn(self.x.len(), |i, _| {
            -c * self.mass[i] * (self.x[i] - self.x_old[i]) + f[i] + w * self.f_old[i]
        });
        Ok(())
    }

    fn compute_jacobian(&mut self) -> SimResult<()> {
        let mut jac = self.physics.jacobian(&self.x)?;
        let n = self.x.len();
        if jac.nrows() != n || jac.ncols() != n {
            return Err(SimError::Dimension {
                what: "Jacobian",
                expected: n,
                found: jac.nrows(),
            });
        }
        let c = 1.0 / (self.theta * self.dt);
        for i in 0..n {
            jac[(i, i)] -= c * self.mass[i];
        }
        self.jacobian = jac;
        Ok(())
    }

    fn solve(&mut self, b: &Vector) -> SimResult<()> {
        self.solution = solve_dense(&self.jacobian, b)?;
        Ok(())
    }

    fn set_theta(&mut self, theta: f64) -> SimResult<()> {
        self.theta = check_theta(theta)?;
        self.physics.set_theta(theta);
        Ok(())
    }

    fn set_timestep(&mut self, dt: f64) -> SimResult<()> {
        self.dt = check_timestep(dt)?;
        self.physics.set_timestep(dt);
        Ok(())
    }

    fn init_step(&mut self, dt: f64) -> SimResult<()> {
        self.store()?;
        self.set_timestep(dt)
    }

    fn store(&mut self) -> SimResult<()> {
        self.f_old = self.physics.rhs(&self.x)?;
        self.x_old.copy_from(&self.x);
        Ok(())
    }

    fn restore(&mut self) {
        self.x.copy_from(&self.x_old);
    }

    fn pre_process(&mut self) -> SimResult<()> {
        self.physics.pre_process(&self.x)
    }

    fn post_process(&mut self) -> SimResult<()> {
        self.physics.post_process(&self.x)
    }

    fn write_data(&self, describe: bool) -> String {
        self.physics.write_data(&self.x, describe)
    }

    fn save_state_to_file(&self, path: &Path) -> SimResult<()> {
        self.physics.save_state(&self.x, path)
    }
}

//! Implicit theta-method time stepping for discretized climate components.
//!
//! Provides:
//! - `Physics`: the component model seam (right-hand side, Jacobian, mass)
//! - `Model`: the stateful view the stepper drives
//! - `ThetaModel`: deterministic, stochastic and projected theta discretizations
//! - `ThetaStep`: one implicit step as a reusable `(x, dt) -> x_new` map
//! - `ThetaStepper`: adaptive time loop with rollback and diagnostics

pub mod control;
pub mod error;
pub mod model;
pub mod output;
pub mod params;
pub mod physics;
pub mod step;
pub mod stepper;
pub mod theta;

// Re-exports for public API
pub use control::StepControl;
pub use error::{SimError, SimResult};
pub use model::Model;
pub use output::{SharedBuffer, TabularLog};
pub use params::ThetaParams;
pub use physics::Physics;
pub use step::{STEP_TOLERANCE, SharedThetaModel, ThetaStep};
pub use stepper::{DIVERGENCE_THRESHOLD, RunStatus, RunSummary, ThetaStepper};
pub use theta::{ThetaKind, ThetaModel};

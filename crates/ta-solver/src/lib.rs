//! Nonlinear solver primitives for implicit time stepping.
//!
//! The Newton iteration here is deliberately bare: full steps, no line search,
//! a fixed iteration cap. Globalization happens one level up by shrinking the
//! time step.

pub mod error;
pub mod jacobian;
pub mod newton;

pub use error::{SolverError, SolverResult};
pub use jacobian::{central_difference_jacobian, finite_difference_jacobian, solve_dense};
pub use newton::{FnSystem, MAX_NEWTON_ITERATIONS, NewtonSystem, is_converged, newton};

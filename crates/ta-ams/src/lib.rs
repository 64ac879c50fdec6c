//! Stochastic transients for Adaptive Multilevel Splitting.
//!
//! - `TransientFactory`: builds deterministic, stochastic and projected transients
//! - `Transient`: marches sample paths with one theta step plus noise
//! - `score`: progress measures between two stable states
//! - `seed`: one seed per process group, one stream per path
//! - `space`: Matrix Market projection subspaces

pub mod error;
pub mod factory;
pub mod params;
pub mod score;
pub mod seed;
pub mod space;
pub mod transient;

pub use error::{AmsError, AmsResult};
pub use factory::TransientFactory;
pub use params::{AmsParams, OCEAN_DOF};
pub use score::{Endpoints, ScoreFamily, ScoreFunction, score_function};
pub use seed::{SEED_ROOT, path_rng, shared_seed};
pub use space::{load_subspace, parse_multivector};
pub use transient::{TARGET_SCORE, Trajectory, Transient};

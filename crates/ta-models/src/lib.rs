//! ta-models: concrete physics for the theta stepper.
//!
//! - `Stommel`: two-box overturning model with bistable steady states
//! - `LinearSystem`: linear (optionally algebraic) test system
//!
//! Both implement `ta_sim::Physics`, so they can be marched with
//! `ThetaStepper` or sampled through `ta_ams::TransientFactory`.

pub mod common;
pub mod linear;
pub mod stommel;

pub use linear::LinearSystem;
pub use stommel::{Stommel, StommelParams};

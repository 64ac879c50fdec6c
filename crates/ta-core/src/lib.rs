//! ta-core: shared foundation for theta stepping and AMS sampling.
//!
//! Contains:
//! - numeric (Real, vector aliases, norms, finiteness check)
//! - units (uom time conversions for the model timescale)
//! - comm (collective communication: broadcast, row exchange)
//! - layout (global index ownership and redistribution)
//! - timing (accumulating timers for the hot evaluation paths)
//! - error (shared error types)

pub mod comm;
pub mod error;
pub mod layout;
pub mod numeric;
pub mod timing;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use comm::{Communicator, LocalComm, LocalGroup, SerialComm};
pub use error::{CoreError, CoreResult};
pub use layout::Layout;
pub use numeric::*;

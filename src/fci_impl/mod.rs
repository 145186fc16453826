//! CI drivers
//!
//! `Fci` runs the Davidson state machine over a full determinant space and
//! hands out energies, CI vectors and reduced density matrices. `RasCi` does
//! the same over a restricted active space. `DistFci` builds σ from a CI
//! vector whose rows are spread over ranks.

mod dist_fci;
mod driver;
mod fci;
mod ras_ci;

pub use dist_fci::DistFci;
pub use driver::{iterate, FciStatus, IterationOutcome, IterationSettings};
pub use fci::Fci;
pub use ras_ci::RasCi;

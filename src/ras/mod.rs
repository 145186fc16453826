//! Restricted active space CI
//!
//! Determinants are grouped into blocks of (alpha string space, beta string
//! space) pairs labelled by their hole and particle counts. Only blocks within
//! the hole and particle limits are stored.

pub mod ras_civec;
pub mod ras_determinants;
pub mod ras_sigma;
pub mod ras_string;
pub mod ras_task;
mod tests;

pub use self::ras_civec::{RasBlock, RasCivec, RasDvec};
pub use self::ras_determinants::{RasBlockInfo, RasDeterminants};
pub use self::ras_sigma::RasDColumnTask;
pub use self::ras_string::{RasKey, RasSpaceCache, RasStringSpace};
pub use self::ras_task::{if_contributes, RasTask};

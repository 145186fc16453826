//! Iterative eigensolver for the lowest CI roots

pub mod davidson;
mod tests;

pub use self::davidson::{sorted_symmetric_eigen, DavidsonDiag};

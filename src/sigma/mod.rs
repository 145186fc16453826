//! Hamiltonian action on CI vectors
//!
//! This module provides the σ = H c builder used by the Davidson driver,
//! the diagonal of H for preconditioning and explicit Slater-Condon matrix
//! elements for small model spaces.

pub mod sigma;
pub mod slater_condon;
mod tests;

pub use self::sigma::{excitation_column, DColumnTask, SigmaEngine};

use crate::civec::CiVector;

/// σ builder for one kind of CI vector
pub trait SigmaBuilder<V: CiVector>: Send + Sync {
    /// σ = H c without the core energy
    fn build_sigma(&self, c: &V) -> V;

    /// Diagonal of H laid out like `like`
    fn build_diagonal(&self, like: &V) -> V;

    fn core_energy(&self) -> f64;
}

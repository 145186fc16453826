//! Reduced density matrices
//!
//! `Rdm<N>` stores a spin-summed N-particle density over the active orbitals.
//! The builders cover one- through four-particle densities, transition
//! densities between states and the per-determinant derivatives used by
//! response theories.

pub mod builder;
pub mod rdm;
mod tests;

pub use self::builder::{
    compute_rdm34, normal_ordered_rdm, ras_state_rdm1s, rdm1, rdm12, rdm1deriv, rdm2deriv,
    rdm34deriv, rdm_energy, state_rdm1s, transition_rdm1, transition_rdm12, transition_rdm1s,
};
pub use self::rdm::{Rdm, Rdm1, Rdm2, Rdm3, Rdm4};

//! Determinant and string spaces
//!
//! This module enumerates alpha/beta occupation strings, assigns them lexical
//! indices and precomputes the single-excitation coupling tables (`phi`) that
//! every other part of the engine uses for its sign conventions.

mod determinants;
mod operators;
mod string_space;
mod tests;

pub use determinants::Determinants;
pub use operators::{annihilate, create};
pub use string_space::{
    bits_from_orbitals, excite, orbitals_from_bits, sign, sign_below, DetMap, StringLink,
    StringSpace,
};

/// Spin channel of an orbital or string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Spin {
    Alpha,
    Beta,
}

//! CI vectors
//!
//! `Civec` holds the coefficients of one state over a determinant space,
//! `Dvec` an ordered set of states sharing that space. Spin operators and
//! spin decontamination live in `spin.rs`; `CiVector` is the interface the
//! Davidson solver works against.

mod civec;
mod dvec;
mod spin;
mod vector;

pub use civec::Civec;
pub use dvec::Dvec;
pub use spin::{s2_terms, SPIN_THRESH};
pub use vector::CiVector;
pub(crate) use vector::precondition_slice;

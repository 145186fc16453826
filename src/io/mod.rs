//! Input/Output operations for CI calculations
//!
//! This module handles logging setup, reading the YAML input and binary
//! restart snapshots.

mod input;
mod output;
pub mod restart;
mod tests;

pub use input::{load_config, load_system, parse_config};
pub use output::{banner, print_civectors, setup_output};
pub use restart::{read_snapshot, write_snapshot, FciSnapshot};

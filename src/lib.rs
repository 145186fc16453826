// Main library file for determinant-based FCI and RAS-CI calculations

pub mod app;
pub mod civec;
pub mod config;
pub mod davidson;
pub mod determinants;
pub mod fci_impl;
pub mod gamma;
pub mod guess;
pub mod integrals;
pub mod io;
pub mod ras;
pub mod rdm;
pub mod sigma;
pub mod task_queue;

pub use civec::{Civec, Dvec};
pub use config::{Config, FciParams, RasParams};
pub use determinants::Determinants;
pub use fci_impl::{Fci, FciStatus, RasCi};
pub use integrals::{ActiveSpaceIntegrals, DenseIntegrals, MoIntegrals, Reference};
pub use rdm::{Rdm, Rdm1, Rdm2, Rdm3, Rdm4};

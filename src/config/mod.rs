//! Configuration management for CI calculations
//!
//! This module handles configuration structures, defaults, and validation
//! for FCI and RAS-CI runs.

mod args;

pub use args::Args;

use color_eyre::eyre::{bail, Result};
use serde::{Deserialize, Serialize};

/// Main configuration structure read from YAML
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub integrals: IntegralInput,
    pub fci: Option<FciParams>,
    pub ras: Option<RasParams>,
    pub output: Option<String>,
}

/// Molecular-orbital integrals supplied by an external SCF program
///
/// `eri` entries are `[i, j, k, l, value]` in chemist notation, 0-based; only one
/// of the eight permutationally equivalent entries has to be listed.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IntegralInput {
    pub norb: usize,
    pub nele: usize,
    pub nirrep: Option<usize>,
    pub nuclear_repulsion: Option<f64>,
    pub core_energy: Option<f64>,
    pub h1: Vec<Vec<f64>>,
    pub eri: Vec<[f64; 5]>,
}

/// Options record consumed by the FCI driver
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FciParams {
    pub max_iter: Option<usize>,
    pub davidson_subspace: Option<usize>,
    pub thresh: Option<f64>,
    pub print_thresh: Option<f64>,
    pub restart: Option<bool>,
    pub restart_file: Option<String>,
    pub nstate: Option<usize>,
    pub nguess: Option<usize>,
    pub charge: Option<i32>,
    pub nspin: Option<usize>,
    pub ncore: Option<usize>,
    pub norb: Option<usize>,
    pub active: Option<Vec<usize>>,
    pub nthreads: Option<usize>,
    pub verbose_iterations: Option<bool>,
}

impl Default for FciParams {
    fn default() -> Self {
        FciParams {
            max_iter: Some(100),
            davidson_subspace: Some(20),
            thresh: Some(1e-10),
            print_thresh: Some(0.05),
            restart: Some(false),
            restart_file: Some("fci.restart".to_string()),
            nstate: Some(1),
            nguess: None,
            charge: Some(0),
            nspin: Some(0),
            ncore: Some(0),
            norb: None,
            active: None,
            nthreads: None,
            verbose_iterations: Some(true),
        }
    }
}

impl FciParams {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();
        if self.max_iter.is_none() {
            self.max_iter = defaults.max_iter;
        }
        if self.davidson_subspace.is_none() {
            self.davidson_subspace = defaults.davidson_subspace;
        }
        if self.thresh.is_none() {
            self.thresh = defaults.thresh;
        }
        if self.print_thresh.is_none() {
            self.print_thresh = defaults.print_thresh;
        }
        if self.restart.is_none() {
            self.restart = defaults.restart;
        }
        if self.restart_file.is_none() {
            self.restart_file = defaults.restart_file;
        }
        if self.nstate.is_none() {
            self.nstate = defaults.nstate;
        }
        if self.nguess.is_none() {
            self.nguess = self.nstate;
        }
        if self.charge.is_none() {
            self.charge = defaults.charge;
        }
        if self.nspin.is_none() {
            self.nspin = defaults.nspin;
        }
        if self.ncore.is_none() {
            self.ncore = defaults.ncore;
        }
        if self.verbose_iterations.is_none() {
            self.verbose_iterations = defaults.verbose_iterations;
        }
        self
    }

    pub fn max_iter(&self) -> usize {
        self.max_iter.unwrap_or(100)
    }

    pub fn davidson_subspace(&self) -> usize {
        self.davidson_subspace.unwrap_or(20)
    }

    pub fn thresh(&self) -> f64 {
        self.thresh.unwrap_or(1e-10)
    }

    pub fn print_thresh(&self) -> f64 {
        self.print_thresh.unwrap_or(0.05)
    }

    pub fn restart(&self) -> bool {
        self.restart.unwrap_or(false)
    }

    pub fn restart_file(&self) -> String {
        self.restart_file
            .clone()
            .unwrap_or_else(|| "fci.restart".to_string())
    }

    pub fn nstate(&self) -> usize {
        self.nstate.unwrap_or(1)
    }

    pub fn nguess(&self) -> usize {
        self.nguess.unwrap_or_else(|| self.nstate()).max(self.nstate())
    }

    pub fn charge(&self) -> i32 {
        self.charge.unwrap_or(0)
    }

    pub fn nspin(&self) -> usize {
        self.nspin.unwrap_or(0)
    }

    pub fn ncore(&self) -> usize {
        self.ncore.unwrap_or(0)
    }

    pub fn verbose_iterations(&self) -> bool {
        self.verbose_iterations.unwrap_or(true)
    }

    /// Number of alpha and beta active electrons for a reference with `nele` electrons
    pub fn active_electrons(&self, nele: usize) -> Result<(usize, usize)> {
        let total = nele as i64 - self.charge() as i64 - 2 * self.ncore() as i64;
        let nspin = self.nspin() as i64;
        if total <= 0 {
            bail!(
                "No active electrons left (nele = {}, charge = {}, ncore = {})",
                nele,
                self.charge(),
                self.ncore()
            );
        }
        if (total + nspin) % 2 != 0 {
            bail!(
                "Number of electrons ({}) and nspin ({}) have inconsistent parity",
                total,
                nspin
            );
        }
        if nspin > total {
            bail!("nspin ({}) exceeds the number of active electrons ({})", nspin, total);
        }
        Ok((((total + nspin) / 2) as usize, ((total - nspin) / 2) as usize))
    }
}

/// Restricted-active-space partition
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RasParams {
    pub ras: [usize; 3],
    pub max_holes: Option<usize>,
    pub max_particles: Option<usize>,
}

impl RasParams {
    pub fn with_defaults(mut self) -> Self {
        if self.max_holes.is_none() {
            self.max_holes = Some(2);
        }
        if self.max_particles.is_none() {
            self.max_particles = Some(2);
        }
        self
    }

    pub fn max_holes(&self) -> usize {
        self.max_holes.unwrap_or(2)
    }

    pub fn max_particles(&self) -> usize {
        self.max_particles.unwrap_or(2)
    }

    pub fn norb(&self) -> usize {
        self.ras.iter().sum()
    }
}

impl Config {
    /// Apply defaults to all configuration sections
    pub fn with_defaults(mut self) -> Self {
        self.fci = Some(self.fci.take().unwrap_or_default().with_defaults());
        if let Some(ras) = self.ras.take() {
            self.ras = Some(ras.with_defaults());
        }
        self
    }

    /// FCI options, default-filled
    pub fn fci_params(&self) -> FciParams {
        self.fci.clone().unwrap_or_default().with_defaults()
    }

    /// Check if the RAS driver has been requested
    pub fn is_ras_enabled(&self) -> bool {
        self.ras.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_options_record() {
        let params = FciParams {
            nstate: Some(3),
            ..FciParams {
                max_iter: None,
                davidson_subspace: None,
                thresh: None,
                print_thresh: None,
                restart: None,
                restart_file: None,
                nstate: None,
                nguess: None,
                charge: None,
                nspin: None,
                ncore: None,
                norb: None,
                active: None,
                nthreads: None,
                verbose_iterations: None,
            }
        }
        .with_defaults();

        assert_eq!(params.max_iter(), 100);
        assert_eq!(params.davidson_subspace(), 20);
        assert_eq!(params.nguess(), 3);
        assert!((params.thresh() - 1e-10).abs() < 1e-20);
        assert!((params.print_thresh() - 0.05).abs() < 1e-12);
        assert!(!params.restart());
    }

    #[test]
    fn test_active_electrons() {
        let mut params = FciParams::default();
        assert_eq!(params.active_electrons(4).unwrap(), (2, 2));

        params.nspin = Some(2);
        assert_eq!(params.active_electrons(4).unwrap(), (3, 1));

        params.nspin = Some(1);
        assert!(params.active_electrons(4).is_err());

        params.nspin = Some(0);
        params.ncore = Some(2);
        assert!(params.active_electrons(4).is_err());
    }

    #[test]
    fn test_yaml_round_trip() {
        let yaml = r#"
integrals:
  norb: 2
  nele: 2
  h1: [[-1.0, -0.2], [-0.2, -0.5]]
  eri: [[0, 0, 0, 0, 0.7]]
fci:
  nstate: 2
ras:
  ras: [1, 0, 1]
"#;
        let config: Config = serde_yml::from_str::<Config>(yaml).unwrap().with_defaults();
        assert_eq!(config.integrals.norb, 2);
        assert_eq!(config.fci_params().nstate(), 2);
        assert!(config.is_ras_enabled());
        assert_eq!(config.ras.as_ref().unwrap().max_holes(), 2);
    }
}

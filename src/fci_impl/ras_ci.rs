//! Restricted-active-space CI with the same iteration scheme as FCI

use super::driver::{iterate, FciStatus, IterationSettings};
use crate::civec::CiVector;
use crate::config::{FciParams, RasParams};
use crate::guess::ras_guess;
use crate::integrals::{ActiveSpaceIntegrals, MoIntegrals, Reference};
use crate::io::{banner, read_snapshot, write_snapshot, FciSnapshot};
use crate::ras::{RasCivec, RasDeterminants, RasDvec};
use crate::rdm::{ras_state_rdm1s, Rdm1};
use crate::sigma::SigmaEngine;
use crate::task_queue::build_pool;
use color_eyre::eyre::{ensure, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

pub struct RasCi {
    params: FciParams,
    ras: RasParams,
    engine: SigmaEngine,
    det: Arc<RasDeterminants>,
    status: FciStatus,
    energies: Vec<f64>,
    errors: Vec<f64>,
    iterations: usize,
    cc: RasDvec,
    rdm1: Vec<Rdm1>,
}

impl RasCi {
    pub fn new<I: MoIntegrals + ?Sized>(
        reference: &Reference,
        integrals: &I,
        params: FciParams,
        ras: RasParams,
    ) -> Result<Self> {
        let params = params.with_defaults();
        let ras = ras.with_defaults();
        let (nelea, neleb) = params.active_electrons(reference.nele())?;
        let norb = params.norb.unwrap_or_else(|| ras.norb());
        ensure!(
            norb == ras.norb(),
            "RAS partition {:?} covers {} orbitals but the active space has {}",
            ras.ras,
            ras.norb(),
            norb
        );
        let active = ActiveSpaceIntegrals::new(
            integrals,
            params.ncore(),
            Some(norb),
            params.active.as_deref(),
        )?;
        let det = RasDeterminants::new(
            ras.ras,
            nelea as i64,
            neleb as i64,
            ras.max_holes(),
            ras.max_particles(),
        )?;

        let mut engine = SigmaEngine::new(&active);
        if let Some(nthreads) = params.nthreads {
            engine = engine.with_pool(build_pool(nthreads)?);
        }

        info!(
            "RAS space {:?}: max holes {}, max particles {}, {} blocks, {} determinants",
            ras.ras,
            ras.max_holes(),
            ras.max_particles(),
            det.nblocks(),
            det.size()
        );

        let nstate = params.nstate();
        Ok(RasCi {
            cc: RasDvec::new(det.clone(), nstate),
            energies: vec![0.0; nstate],
            errors: vec![0.0; nstate],
            params,
            ras,
            engine,
            det,
            status: FciStatus::Uninitialized,
            iterations: 0,
            rdm1: Vec::new(),
        })
    }

    pub fn det(&self) -> &Arc<RasDeterminants> {
        &self.det
    }

    pub fn nstate(&self) -> usize {
        self.params.nstate()
    }

    pub fn status(&self) -> FciStatus {
        self.status
    }

    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    pub fn errors(&self) -> &[f64] {
        &self.errors
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn civectors(&self) -> &RasDvec {
        &self.cc
    }

    fn snapshot_space(&self) -> Option<([usize; 3], usize, usize)> {
        Some((self.ras.ras, self.ras.max_holes(), self.ras.max_particles()))
    }

    pub fn compute(&mut self) -> Result<()> {
        banner("Restricted active space CI");
        self.status = FciStatus::Guess;
        let diag = self.engine.ras_diagonal(&self.det);
        let guess = match self.restart_guess()? {
            Some(guess) => guess,
            None => ras_guess(&self.det, &diag, self.det.nspin(), self.nstate())?,
        };

        self.status = FciStatus::Iterating;
        info!("{:>7} {:>3} {:>20} {:>12}", "iter", "st", "energy", "error");
        let settings = IterationSettings::from_params(&self.params);
        let restart_file = self.params.restart().then(|| self.params.restart_file());
        let space = self.snapshot_space();
        let (norb, nelea, neleb) = (self.det.norb(), self.det.nelea(), self.det.neleb());
        let outcome = iterate(&self.engine, guess, &diag, &settings, |iter, energies, davidson| {
            let Some(path) = &restart_file else { return Ok(()) };
            let snapshot = FciSnapshot {
                norb,
                nelea,
                neleb,
                ras: space,
                energies: energies.to_vec(),
                coefficients: davidson.civec().iter().map(RasCivec::coefficients).collect(),
                iteration: iter,
            };
            write_snapshot(path, &snapshot)
        })?;

        self.energies = outcome.energies;
        self.errors = outcome.errors;
        self.iterations = outcome.iterations;
        self.status = outcome.status;
        self.cc = RasDvec::from_civecs(outcome.vectors);
        self.rdm1.clear();

        if self.status.is_converged() {
            info!("RAS-CI converged in {} iterations", self.iterations);
        }
        let thresh = self.params.print_thresh();
        for (state, (civec, energy)) in self.cc.civecs().iter().zip(&self.energies).enumerate() {
            info!(
                "     * ci vector, state {:>3}, <S^2> = {:.4}, E = {:.10}",
                state,
                civec.spin_expectation(),
                energy
            );
            civec.print(thresh);
        }
        Ok(())
    }

    fn restart_guess(&self) -> Result<Option<Vec<RasCivec>>> {
        if !self.params.restart() {
            return Ok(None);
        }
        let path = self.params.restart_file();
        if !Path::new(&path).exists() {
            info!("No restart file at {}, starting from a fresh guess", path);
            return Ok(None);
        }
        let snapshot = read_snapshot(&path)?;
        let compatible = snapshot.matches(
            self.det.norb(),
            self.det.nelea(),
            self.det.neleb(),
            self.snapshot_space(),
            self.det.size(),
        );
        if !compatible || snapshot.nstate() < self.nstate() {
            warn!("Restart file {} does not match this calculation, ignoring it", path);
            return Ok(None);
        }
        info!("Restarting from {} (iteration {})", path, snapshot.iteration);
        Ok(Some(
            snapshot
                .coefficients
                .iter()
                .take(self.nstate())
                .map(|data| RasCivec::from_coefficients(self.det.clone(), data))
                .collect(),
        ))
    }

    /// One-particle densities of every state through the gamma forest
    pub fn compute_rdm1(&mut self) {
        self.rdm1 = ras_state_rdm1s(&self.cc);
    }

    pub fn rdm1(&self, state: usize) -> Rdm1 {
        assert!(
            state < self.nstate(),
            "state {} requested but only {} states were computed",
            state,
            self.nstate()
        );
        match self.rdm1.get(state) {
            Some(rdm) => rdm.clone(),
            None => ras_state_rdm1s(&self.cc).swap_remove(state),
        }
    }

    /// State-averaged one-particle density (equal weights)
    pub fn rdm1_av(&self) -> Rdm1 {
        let all = if self.rdm1.is_empty() {
            ras_state_rdm1s(&self.cc)
        } else {
            self.rdm1.clone()
        };
        let mut av = Rdm1::new(self.det.norb());
        for rdm in &all {
            av.ax_plus_y(1.0 / all.len() as f64, rdm);
        }
        av
    }
}

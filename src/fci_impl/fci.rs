//! Full configuration interaction over an active space

extern crate nalgebra as na;

use super::driver::{iterate, FciStatus, IterationSettings};
use crate::civec::{Civec, Dvec};
use crate::config::FciParams;
use crate::determinants::Determinants;
use crate::guess::{generate_guess, model_guess};
use crate::integrals::{ActiveSpaceIntegrals, MoIntegrals, Reference};
use crate::io::{banner, print_civectors, read_snapshot, write_snapshot, FciSnapshot};
use crate::rdm::{self, Rdm1, Rdm2, Rdm3, Rdm4};
use crate::sigma::SigmaEngine;
use crate::task_queue::build_pool;
use color_eyre::eyre::Result;
use na::DMatrix;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

pub struct Fci {
    params: FciParams,
    integrals: ActiveSpaceIntegrals,
    engine: SigmaEngine,
    det: Arc<Determinants>,
    status: FciStatus,
    energies: Vec<f64>,
    errors: Vec<f64>,
    iterations: usize,
    cc: Dvec,
    rdm1: Vec<Rdm1>,
    rdm2: Vec<Rdm2>,
    rdm1_av: Option<Rdm1>,
    rdm2_av: Option<Rdm2>,
}

impl Fci {
    /// Set up the active space, the determinant space and the σ engine
    ///
    /// Invalid electron counts, spin or active-space choices fail here.
    pub fn new<I: MoIntegrals + ?Sized>(
        reference: &Reference,
        integrals: &I,
        params: FciParams,
    ) -> Result<Self> {
        let params = params.with_defaults();
        let (nelea, neleb) = params.active_electrons(reference.nele())?;
        let active = ActiveSpaceIntegrals::new(
            integrals,
            params.ncore(),
            params.norb,
            params.active.as_deref(),
        )?;
        let det = Determinants::new(active.norb(), nelea as i64, neleb as i64)?;

        let mut engine = SigmaEngine::new(&active);
        if let Some(nthreads) = params.nthreads {
            engine = engine.with_pool(build_pool(nthreads)?);
        }

        info!(
            "FCI space: {} orbitals, {} alpha and {} beta electrons, {} determinants",
            det.norb(),
            det.nelea(),
            det.neleb(),
            det.size()
        );

        let nstate = params.nstate();
        Ok(Fci {
            cc: Dvec::new(det.clone(), nstate),
            energies: vec![0.0; nstate],
            errors: vec![0.0; nstate],
            params,
            integrals: active,
            engine,
            det,
            status: FciStatus::Uninitialized,
            iterations: 0,
            rdm1: Vec::new(),
            rdm2: Vec::new(),
            rdm1_av: None,
            rdm2_av: None,
        })
    }

    pub fn params(&self) -> &FciParams {
        &self.params
    }

    pub fn det(&self) -> &Arc<Determinants> {
        &self.det
    }

    pub fn engine(&self) -> &SigmaEngine {
        &self.engine
    }

    pub fn integrals(&self) -> &ActiveSpaceIntegrals {
        &self.integrals
    }

    pub fn nstate(&self) -> usize {
        self.params.nstate()
    }

    pub fn norb(&self) -> usize {
        self.det.norb()
    }

    pub fn core_energy(&self) -> f64 {
        self.engine.core_energy()
    }

    pub fn status(&self) -> FciStatus {
        self.status
    }

    /// Total energies of every state
    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    /// Residual RMS of every state at the last iteration
    pub fn errors(&self) -> &[f64] {
        &self.errors
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn civectors(&self) -> &Dvec {
        &self.cc
    }

    /// Guess, iterate and keep the best vectors
    ///
    /// Non-convergence leaves `status()` at `MaxIterExhausted` and still
    /// returns `Ok`.
    pub fn compute(&mut self) -> Result<()> {
        banner("Full configuration interaction");
        self.status = FciStatus::Guess;
        let diag = self.engine.diagonal(&self.det);
        let guess = self.guess(&diag)?;

        self.status = FciStatus::Iterating;
        info!("{:>7} {:>3} {:>20} {:>12}", "iter", "st", "energy", "error");
        let settings = IterationSettings::from_params(&self.params);
        let restart_file = self.params.restart().then(|| self.params.restart_file());
        let (norb, nelea, neleb) = (self.det.norb(), self.det.nelea(), self.det.neleb());
        let outcome = iterate(&self.engine, guess, &diag, &settings, |iter, energies, davidson| {
            let Some(path) = &restart_file else { return Ok(()) };
            let snapshot = FciSnapshot {
                norb,
                nelea,
                neleb,
                ras: None,
                energies: energies.to_vec(),
                coefficients: davidson.civec().into_iter().map(Civec::into_data).collect(),
                iteration: iter,
            };
            write_snapshot(path, &snapshot)
        })?;

        self.energies = outcome.energies;
        self.errors = outcome.errors;
        self.iterations = outcome.iterations;
        self.status = outcome.status;
        self.cc = Dvec::from_civecs(outcome.vectors);
        self.rdm1.clear();
        self.rdm2.clear();
        self.rdm1_av = None;
        self.rdm2_av = None;

        if self.status.is_converged() {
            info!("FCI converged in {} iterations", self.iterations);
        }
        print_civectors(&self.cc, &self.energies, self.params.print_thresh());
        Ok(())
    }

    fn guess(&self, diag: &Civec) -> Result<Vec<Civec>> {
        if let Some(guess) = self.restart_guess()? {
            return Ok(guess);
        }
        let nstate = self.nstate();
        let nguess = self.params.nguess();
        if nguess > nstate {
            model_guess(&self.engine, &self.det, diag, self.det.nspin(), nstate, nguess)
        } else {
            generate_guess(&self.det, diag, self.det.nspin(), nstate)
        }
    }

    /// Vectors from an earlier run when a compatible snapshot exists
    fn restart_guess(&self) -> Result<Option<Vec<Civec>>> {
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
            None,
            self.det.size(),
        );
        if !compatible || snapshot.nstate() < self.nstate() {
            warn!("Restart file {} does not match this calculation, ignoring it", path);
            return Ok(None);
        }
        info!(
            "Restarting from {} (iteration {}, {} states)",
            path,
            snapshot.iteration,
            snapshot.nstate()
        );
        Ok(Some(
            snapshot
                .coefficients
                .into_iter()
                .take(self.nstate())
                .map(|data| Civec::from_data(self.det.clone(), data))
                .collect(),
        ))
    }

    fn check_state(&self, state: usize) {
        assert!(
            state < self.nstate(),
            "state {} requested but only {} states were computed",
            state,
            self.nstate()
        );
    }

    /// One- and two-particle densities of every state and their average
    pub fn compute_rdm12(&mut self) {
        let (rdm1, rdm2): (Vec<Rdm1>, Vec<Rdm2>) = self.cc.civecs().iter().map(rdm::rdm12).unzip();
        let weight = 1.0 / self.nstate() as f64;
        let mut av1 = Rdm1::new(self.norb());
        let mut av2 = Rdm2::new(self.norb());
        for (r1, r2) in rdm1.iter().zip(&rdm2) {
            av1.ax_plus_y(weight, r1);
            av2.ax_plus_y(weight, r2);
        }
        self.rdm1 = rdm1;
        self.rdm2 = rdm2;
        self.rdm1_av = Some(av1);
        self.rdm2_av = Some(av2);
    }

    pub fn rdm1(&self, state: usize) -> Rdm1 {
        self.check_state(state);
        match self.rdm1.get(state) {
            Some(rdm) => rdm.clone(),
            None => rdm::rdm1(self.cc.data(state)),
        }
    }

    pub fn rdm2(&self, state: usize) -> Rdm2 {
        self.check_state(state);
        match self.rdm2.get(state) {
            Some(rdm) => rdm.clone(),
            None => rdm::rdm12(self.cc.data(state)).1,
        }
    }

    /// State-averaged one-particle density (equal weights)
    pub fn rdm1_av(&self) -> Rdm1 {
        match &self.rdm1_av {
            Some(rdm) => rdm.clone(),
            None => {
                let mut av = Rdm1::new(self.norb());
                for state in 0..self.nstate() {
                    av.ax_plus_y(1.0 / self.nstate() as f64, &self.rdm1(state));
                }
                av
            }
        }
    }

    /// State-averaged two-particle density (equal weights)
    pub fn rdm2_av(&self) -> Rdm2 {
        match &self.rdm2_av {
            Some(rdm) => rdm.clone(),
            None => {
                let mut av = Rdm2::new(self.norb());
                for state in 0..self.nstate() {
                    av.ax_plus_y(1.0 / self.nstate() as f64, &self.rdm2(state));
                }
                av
            }
        }
    }

    pub fn compute_rdm34(&self, state: usize) -> (Rdm3, Rdm4) {
        self.check_state(state);
        rdm::compute_rdm34(self.cc.data(state))
    }

    /// One-particle transition densities <bra|E_ij|ket> between computed states
    pub fn transition_rdm1(&self, bra: usize, ket: usize) -> Rdm1 {
        self.check_state(bra);
        self.check_state(ket);
        rdm::transition_rdm1(self.cc.data(bra), self.cc.data(ket))
    }

    pub fn rdm1deriv(&self, state: usize) -> DMatrix<f64> {
        self.check_state(state);
        rdm::rdm1deriv(self.cc.data(state))
    }

    pub fn rdm2deriv(&self, state: usize) -> DMatrix<f64> {
        self.check_state(state);
        rdm::rdm2deriv(self.cc.data(state))
    }

    pub fn rdm34deriv(&self, state: usize, fock: &DMatrix<f64>) -> (DMatrix<f64>, DMatrix<f64>) {
        self.check_state(state);
        rdm::rdm34deriv(self.cc.data(state), fock)
    }

    /// Total energy of a state recomputed from its densities
    pub fn rdm_energy(&self, state: usize) -> f64 {
        rdm::rdm_energy(
            self.engine.h1(),
            self.engine.eri(),
            &self.rdm1(state),
            &self.rdm2(state),
        ) + self.core_energy()
    }

    /// Natural orbitals of the state-averaged density
    pub fn natural_orbitals(&self) -> (Vec<f64>, DMatrix<f64>) {
        self.rdm1_av().natural_orbitals()
    }
}

//! Davidson iterations shared by the FCI and RAS drivers

use crate::civec::{CiVector, SPIN_THRESH};
use crate::config::FciParams;
use crate::davidson::DavidsonDiag;
use crate::sigma::SigmaBuilder;
use color_eyre::eyre::{ensure, Result};
use tracing::{debug, info, warn};

/// Where a CI driver is in its life cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FciStatus {
    Uninitialized,
    Guess,
    Iterating,
    Converged,
    MaxIterExhausted,
}

impl FciStatus {
    pub fn is_converged(&self) -> bool {
        matches!(self, FciStatus::Converged)
    }
}

/// Iteration controls taken from the options record
#[derive(Debug, Clone, Copy)]
pub struct IterationSettings {
    pub max_iter: usize,
    pub max_subspace: usize,
    pub thresh: f64,
    pub verbose: bool,
}

impl IterationSettings {
    pub fn from_params(params: &FciParams) -> Self {
        IterationSettings {
            max_iter: params.max_iter(),
            max_subspace: params.davidson_subspace(),
            thresh: params.thresh(),
            verbose: params.verbose_iterations(),
        }
    }
}

/// Energies, Ritz vectors and final status of one Davidson run
#[derive(Debug, Clone)]
pub struct IterationOutcome<V> {
    pub energies: Vec<f64>,
    pub vectors: Vec<V>,
    pub errors: Vec<f64>,
    pub status: FciStatus,
    pub iterations: usize,
}

/// Davidson loop with per-state convergence
///
/// Energies are total energies (core energy included). `on_iteration` sees
/// the iteration number, the current energies and the solver after every
/// subspace update, which the drivers use to write restart snapshots.
pub fn iterate<V, S, F>(
    engine: &S,
    guess: Vec<V>,
    diag: &V,
    settings: &IterationSettings,
    mut on_iteration: F,
) -> Result<IterationOutcome<V>>
where
    V: CiVector,
    S: SigmaBuilder<V>,
    F: FnMut(usize, &[f64], &DavidsonDiag<V>) -> Result<()>,
{
    let nstate = guess.len();
    ensure!(nstate > 0, "At least one state must be requested");
    let core = engine.core_energy();
    let mut davidson = DavidsonDiag::new(nstate, settings.max_subspace);

    let mut trial: Vec<V> = Vec::with_capacity(nstate);
    for mut vector in guess {
        if davidson.orthogonalize(&mut vector, &trial).is_some() {
            trial.push(vector);
        }
    }
    ensure!(
        trial.len() == nstate,
        "Only {} of {} guess vectors are linearly independent",
        trial.len(),
        nstate
    );

    let mut conv = vec![false; nstate];
    let mut energies = vec![0.0; nstate];
    let mut errors = vec![0.0; nstate];
    let mut status = FciStatus::MaxIterExhausted;
    let mut iterations = 0;

    for iter in 0..settings.max_iter {
        iterations = iter + 1;
        let sigmas: Vec<V> = trial.iter().map(|c| engine.build_sigma(c)).collect();
        let electronic = davidson.compute(trial, sigmas);
        let residuals = davidson.residual();

        for state in 0..nstate {
            energies[state] = electronic[state] + core;
            errors[state] = residuals[state].rms();
            conv[state] = errors[state] < settings.thresh;
        }
        on_iteration(iter, &energies, &davidson)?;

        if settings.verbose {
            for state in 0..nstate {
                info!(
                    "{:>7} {:>3} {:>20.10} {:>12.2e} {}",
                    iter,
                    state,
                    energies[state],
                    errors[state],
                    if conv[state] { "*" } else { "" }
                );
            }
        }

        if conv.iter().all(|&c| c) {
            status = FciStatus::Converged;
            break;
        }

        trial = Vec::with_capacity(nstate);
        for state in (0..nstate).filter(|&s| !conv[s]) {
            let mut r = residuals[state].clone();
            r.precondition(electronic[state], diag);
            r.normalize();
            r.spin_decontaminate(SPIN_THRESH)?;
            if davidson.orthogonalize(&mut r, &trial).is_some() {
                trial.push(r);
            } else {
                debug!("Residual of state {} lies inside the subspace", state);
            }
        }
        if trial.is_empty() {
            warn!("Davidson subspace cannot be extended further; stopping at iteration {}", iter);
            break;
        }
    }

    if !status.is_converged() {
        let unconverged: Vec<usize> = (0..nstate).filter(|&s| !conv[s]).collect();
        warn!(
            "CI iterations did not converge after {} iterations; unconverged states {:?}",
            iterations,
            unconverged
        );
    }

    Ok(IterationOutcome {
        energies,
        vectors: davidson.civec(),
        errors,
        status,
        iterations,
    })
}

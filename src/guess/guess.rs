//! Initial CI vectors
//!
//! Guesses are built from the determinants with the lowest diagonal energies,
//! either as spin-adapted CSFs (`generate_guess`) or as eigenvectors of a
//! small model Hamiltonian projected onto the target spin (`model_guess`).

extern crate nalgebra as na;

use crate::civec::{s2_terms, CiVector, Civec, SPIN_THRESH};
use crate::davidson::sorted_symmetric_eigen;
use crate::determinants::{orbitals_from_bits, Determinants};
use crate::ras::{RasCivec, RasDeterminants};
use crate::sigma::SigmaEngine;
use color_eyre::eyre::{bail, Result};
use itertools::Itertools;
use na::DMatrix;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

/// A determinant ordered by its diagonal energy
#[derive(Debug, Clone, Copy)]
struct Seed {
    energy: f64,
    ia: usize,
    ib: usize,
}

impl PartialEq for Seed {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Seed {}

impl PartialOrd for Seed {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Seed {
    fn cmp(&self, other: &Self) -> Ordering {
        self.energy
            .total_cmp(&other.energy)
            .then(self.ia.cmp(&other.ia))
            .then(self.ib.cmp(&other.ib))
    }
}

/// The `ndet` determinants with the lowest diagonal elements, ascending
///
/// Returns (diagonal energy, alpha index, beta index).
pub fn detseeds(diag: &Civec, ndet: usize) -> Vec<(f64, usize, usize)> {
    let mut heap: BinaryHeap<Seed> = BinaryHeap::with_capacity(ndet + 1);
    if ndet == 0 {
        return Vec::new();
    }
    for ia in 0..diag.lena() {
        for (ib, &energy) in diag.row(ia).iter().enumerate() {
            let seed = Seed { energy, ia, ib };
            if heap.len() < ndet {
                heap.push(seed);
            } else if heap.peek().is_some_and(|top| seed < *top) {
                heap.pop();
                heap.push(seed);
            }
        }
    }
    heap.into_sorted_vec()
        .into_iter()
        .map(|s| (s.energy, s.ia, s.ib))
        .collect()
}

/// One spin-adapted CSF per state from the lowest distinct configurations
///
/// The seed pool starts at 10 determinants per state and grows ×4 while too
/// few spin-compatible configurations are found; once the pool covers the
/// whole space the search fails.
pub fn generate_guess(
    det: &Arc<Determinants>,
    diag: &Civec,
    nspin: usize,
    nstate: usize,
) -> Result<Vec<Civec>> {
    let size = det.size();
    let mut ndet = nstate * 10;
    loop {
        let seeds = detseeds(diag, ndet.min(size));
        let mut done: Vec<(u64, u64)> = Vec::new();
        let mut out: Vec<Civec> = Vec::with_capacity(nstate);

        for &(energy, ia, ib) in &seeds {
            let alpha = det.string_bits_a(ia);
            let beta = det.string_bits_b(ib);
            let open = alpha ^ beta;
            let closed = alpha & beta;
            if (open.count_ones() as usize) < nspin || done.contains(&(open, closed)) {
                continue;
            }
            done.push((open, closed));

            let (terms, norm) = det.spin_adapt(nspin, alpha, beta);
            let mut civec = Civec::new(det.clone());
            for (ja, jb, coeff) in terms {
                *civec.element_mut(ja, jb) = coeff * norm;
            }
            civec.spin_decontaminate(SPIN_THRESH)?;
            debug!(
                "     guess {:>3}: {}  {:.10}",
                out.len(),
                det.print_bit(alpha, beta),
                energy
            );
            out.push(civec);
            if out.len() == nstate {
                break;
            }
        }

        if out.len() == nstate {
            return Ok(out);
        }
        if ndet >= size {
            bail!(
                "Only {} of {} requested states can be built with 2S = {} in this determinant space",
                out.len(),
                nstate,
                nspin
            );
        }
        ndet *= 4;
        info!("  Too few guess configurations, enlarging the seed pool to {}", ndet);
    }
}

/// All determinants sharing the spatial configurations of the seeds
fn spin_closure(det: &Determinants, seeds: &[(f64, usize, usize)]) -> Vec<(u64, u64)> {
    let mut configurations: Vec<(u64, u64)> = Vec::new();
    for &(_, ia, ib) in seeds {
        let alpha = det.string_bits_a(ia);
        let beta = det.string_bits_b(ib);
        let key = (alpha ^ beta, alpha & beta);
        if !configurations.contains(&key) {
            configurations.push(key);
        }
    }

    let mut dets = Vec::new();
    for (open, closed) in configurations {
        let nopen_alpha = det.nelea() - closed.count_ones() as usize;
        for chosen in orbitals_from_bits(open, det.norb())
            .into_iter()
            .combinations(nopen_alpha)
        {
            let abits = chosen.iter().fold(closed, |acc, &o| acc | (1u64 << o));
            let bbits = closed | (open & !abits);
            dets.push((abits, bbits));
        }
    }
    dets
}

/// Guess vectors from a model Hamiltonian over the lowest determinants
///
/// The model space is closed under spin flips, S² is diagonalized to select
/// the eigenvectors with S = nspin/2, and H is diagonalized in that window.
/// The pool is doubled while the window holds fewer than `nstate` vectors.
pub fn model_guess(
    engine: &SigmaEngine,
    det: &Arc<Determinants>,
    diag: &Civec,
    nspin: usize,
    nstate: usize,
    nguess: usize,
) -> Result<Vec<Civec>> {
    let size = det.size();
    let target = 0.25 * (nspin * (nspin + 2)) as f64;
    let mut nguess = nguess.max(nstate);

    loop {
        let seeds = detseeds(diag, nguess.min(size));
        let dets = spin_closure(det, &seeds);
        let index: HashMap<(u64, u64), usize> =
            dets.iter().enumerate().map(|(i, &d)| (d, i)).collect();
        let n = dets.len();

        let mut spin = DMatrix::zeros(n, n);
        for (j, &(alpha, beta)) in dets.iter().enumerate() {
            for (a, b, factor) in s2_terms(det.norb(), alpha, beta) {
                if let Some(&i) = index.get(&(a, b)) {
                    spin[(i, j)] += factor;
                }
            }
        }
        let (spin_values, spin_vectors) = sorted_symmetric_eigen(spin);
        let window: Vec<usize> = (0..n)
            .filter(|&k| (spin_values[k] - target).abs() < 1.0e-8)
            .collect();
        debug!(
            "Model space: {} determinants, {} with the target spin",
            n,
            window.len()
        );

        if window.len() >= nstate {
            let basis = spin_vectors.select_columns(&window);
            let hamiltonian = engine.hamiltonian_matrix(&dets);
            let projected = basis.transpose() * &hamiltonian * &basis;
            let (energies, vectors) = sorted_symmetric_eigen(projected);
            let coeffs = basis * vectors;

            let mut out = Vec::with_capacity(nstate);
            for state in 0..nstate {
                let mut civec = Civec::new(det.clone());
                for (k, &(alpha, beta)) in dets.iter().enumerate() {
                    *civec.element_mut(det.lexical_a(alpha), det.lexical_b(beta)) =
                        coeffs[(k, state)];
                }
                civec.normalize();
                debug!("     model state {:>3}: {:.10}", state, energies[state]);
                out.push(civec);
            }
            return Ok(out);
        }
        if nguess >= size {
            bail!(
                "The determinant space holds only {} states with 2S = {} ({} requested)",
                window.len(),
                nspin,
                nstate
            );
        }
        nguess *= 2;
        info!("  Too few model states of the target spin, enlarging the pool to {}", nguess);
    }
}

/// One spin-adapted CSF per state over a RAS space
///
/// Spin adaptation keeps the spatial occupation, so every CSF built from a
/// RAS determinant stays inside the RAS space.
pub fn ras_guess(
    det: &Arc<RasDeterminants>,
    diag: &RasCivec,
    nspin: usize,
    nstate: usize,
) -> Result<Vec<RasCivec>> {
    let mut seeds: Vec<(u64, u64, f64)> = diag.iter().collect();
    seeds.sort_by(|a, b| a.2.total_cmp(&b.2));
    let full = Determinants::with_counts(det.norb(), det.nelea(), det.neleb());

    let mut done: Vec<(u64, u64)> = Vec::new();
    let mut out: Vec<RasCivec> = Vec::with_capacity(nstate);
    for (alpha, beta, energy) in seeds {
        let open = alpha ^ beta;
        let closed = alpha & beta;
        if (open.count_ones() as usize) < nspin || done.contains(&(open, closed)) {
            continue;
        }
        done.push((open, closed));

        let (terms, norm) = full.spin_adapt(nspin, alpha, beta);
        let mut civec = RasCivec::new(det.clone());
        for (ja, jb, coeff) in terms {
            civec.add(full.string_bits_a(ja), full.string_bits_b(jb), coeff * norm);
        }
        civec.spin_decontaminate(SPIN_THRESH)?;
        debug!(
            "     guess {:>3}: {}  {:.10}",
            out.len(),
            full.print_bit(alpha, beta),
            energy
        );
        out.push(civec);
        if out.len() == nstate {
            return Ok(out);
        }
    }
    bail!(
        "Only {} of {} requested states can be built with 2S = {} in this RAS space",
        out.len(),
        nstate,
        nspin
    )
}

//! Molecular-orbital integrals consumed by the CI engine
//!
//! The integrals themselves come from an external SCF program; this module only
//! stores them, expands permutational symmetry and folds frozen-core orbitals
//! into an effective one-electron operator.

extern crate nalgebra as na;

use crate::config::IntegralInput;
use color_eyre::eyre::{bail, ensure, Result};
use na::DMatrix;
use tracing::info;

/// Accessors required from an MO integral provider
pub trait MoIntegrals: Send + Sync {
    /// Number of orbitals spanned by the integrals
    fn norb(&self) -> usize;

    /// One-electron integral h_ij
    fn mo1e(&self, i: usize, j: usize) -> f64;

    /// Two-electron integral (ij|kl) in chemist notation
    fn mo2e(&self, i: usize, j: usize, k: usize, l: usize) -> f64;

    /// Dense (ij|kl) buffer, index `((i*n + j)*n + k)*n + l`
    fn mo2e_slice(&self) -> &[f64];

    /// Constant energy (nuclear repulsion plus frozen core)
    fn core_energy(&self) -> f64;

    /// h'_il = h_il - 1/2 Σ_j (ij|jl); absorbs the δ_jk part of E_ij E_kl
    fn one_body_modified(&self) -> DMatrix<f64> {
        let n = self.norb();
        DMatrix::from_fn(n, n, |i, l| {
            let exchange: f64 = (0..n).map(|j| self.mo2e(i, j, j, l)).sum();
            self.mo1e(i, l) - 0.5 * exchange
        })
    }

    /// (ij|kl) as a norb² × norb² matrix with compound indices ij = i*norb + j
    fn eri_matrix(&self) -> DMatrix<f64> {
        let n2 = self.norb() * self.norb();
        let eri = self.mo2e_slice();
        DMatrix::from_fn(n2, n2, |ij, kl| eri[ij * n2 + kl])
    }
}

/// The parts of the SCF reference the CI engine needs
#[derive(Debug, Clone)]
pub struct Reference {
    pub nele: usize,
    pub nirrep: usize,
    pub nuclear_repulsion: f64,
}

impl Reference {
    pub fn new(nele: usize, nirrep: usize, nuclear_repulsion: f64) -> Result<Self> {
        if nirrep != 1 {
            bail!(
                "Point-group symmetry is not supported by the determinant engine (nirrep = {})",
                nirrep
            );
        }
        Ok(Reference {
            nele,
            nirrep,
            nuclear_repulsion,
        })
    }

    pub fn nele(&self) -> usize {
        self.nele
    }
}

/// Dense in-memory MO integrals
#[derive(Debug, Clone)]
pub struct DenseIntegrals {
    norb: usize,
    h1: DMatrix<f64>,
    eri: Vec<f64>,
    core_energy: f64,
}

impl DenseIntegrals {
    /// Build from an explicit one-electron matrix and a function returning (ij|kl)
    pub fn from_fn<F>(h1: DMatrix<f64>, core_energy: f64, eri: F) -> Self
    where
        F: Fn(usize, usize, usize, usize) -> f64,
    {
        let norb = h1.nrows();
        assert_eq!(h1.ncols(), norb, "one-electron integrals must be square");
        let mut buffer = vec![0.0; norb.pow(4)];
        for i in 0..norb {
            for j in 0..norb {
                for k in 0..norb {
                    for l in 0..norb {
                        buffer[((i * norb + j) * norb + k) * norb + l] = eri(i, j, k, l);
                    }
                }
            }
        }
        DenseIntegrals {
            norb,
            h1,
            eri: buffer,
            core_energy,
        }
    }

    /// Build from the YAML input, expanding the 8-fold permutational symmetry
    pub fn from_input(input: &IntegralInput) -> Result<Self> {
        let norb = input.norb;
        ensure!(norb > 0, "Number of orbitals must be positive");
        ensure!(
            input.h1.len() == norb && input.h1.iter().all(|row| row.len() == norb),
            "h1 must be a {} x {} matrix",
            norb,
            norb
        );

        let h1 = DMatrix::from_fn(norb, norb, |i, j| input.h1[i][j]);
        let mut eri = vec![0.0; norb.pow(4)];
        for entry in &input.eri {
            let idx: Vec<usize> = entry[..4].iter().map(|&x| x as usize).collect();
            if idx.iter().any(|&x| x >= norb) || entry[..4].iter().any(|&x| x < 0.0) {
                bail!("Two-electron integral index out of range: {:?}", entry);
            }
            let (i, j, k, l) = (idx[0], idx[1], idx[2], idx[3]);
            let value = entry[4];
            for (p, q, r, s) in [
                (i, j, k, l),
                (j, i, k, l),
                (i, j, l, k),
                (j, i, l, k),
                (k, l, i, j),
                (l, k, i, j),
                (k, l, j, i),
                (l, k, j, i),
            ] {
                eri[((p * norb + q) * norb + r) * norb + s] = value;
            }
        }

        let core_energy =
            input.nuclear_repulsion.unwrap_or(0.0) + input.core_energy.unwrap_or(0.0);

        Ok(DenseIntegrals {
            norb,
            h1,
            eri,
            core_energy,
        })
    }

    pub fn h1(&self) -> &DMatrix<f64> {
        &self.h1
    }
}

impl MoIntegrals for DenseIntegrals {
    fn norb(&self) -> usize {
        self.norb
    }

    fn mo1e(&self, i: usize, j: usize) -> f64 {
        self.h1[(i, j)]
    }

    fn mo2e(&self, i: usize, j: usize, k: usize, l: usize) -> f64 {
        let n = self.norb;
        self.eri[((i * n + j) * n + k) * n + l]
    }

    fn mo2e_slice(&self) -> &[f64] {
        &self.eri
    }

    fn core_energy(&self) -> f64 {
        self.core_energy
    }
}

/// Integrals restricted to an active space with frozen doubly occupied core
///
/// h_eff_ij = h_ij + Σ_c [2(ij|cc) - (ic|cj)]
/// E_core   = E_nuc + Σ_c 2h_cc + Σ_cd [2(cc|dd) - (cd|dc)]
#[derive(Debug, Clone)]
pub struct ActiveSpaceIntegrals {
    inner: DenseIntegrals,
    core: Vec<usize>,
    active: Vec<usize>,
}

impl ActiveSpaceIntegrals {
    /// `active` is a 1-based orbital list; when absent the active space is
    /// `ncore .. ncore + norb`.
    pub fn new<I: MoIntegrals + ?Sized>(
        full: &I,
        ncore: usize,
        norb: Option<usize>,
        active: Option<&[usize]>,
    ) -> Result<Self> {
        let nmo = full.norb();

        let active: Vec<usize> = match active {
            Some(list) => {
                let mut zero_based = Vec::with_capacity(list.len());
                for &orb in list {
                    if orb == 0 || orb > nmo {
                        bail!("Active orbital {} is out of range 1..={}", orb, nmo);
                    }
                    if zero_based.contains(&(orb - 1)) {
                        bail!("Active orbital {} listed twice", orb);
                    }
                    zero_based.push(orb - 1);
                }
                if let Some(n) = norb {
                    ensure!(
                        n == zero_based.len(),
                        "norb ({}) does not match the length of the active list ({})",
                        n,
                        zero_based.len()
                    );
                }
                zero_based
            }
            None => {
                let n = norb.unwrap_or(nmo.saturating_sub(ncore));
                ensure!(
                    ncore + n <= nmo,
                    "ncore ({}) + norb ({}) exceeds the number of orbitals ({})",
                    ncore,
                    n,
                    nmo
                );
                (ncore..ncore + n).collect()
            }
        };
        ensure!(!active.is_empty(), "Active space is empty");

        let core: Vec<usize> = (0..nmo).filter(|o| !active.contains(o)).take(ncore).collect();
        ensure!(
            core.len() == ncore,
            "Cannot place {} core orbitals outside the active list",
            ncore
        );

        let mut core_energy = full.core_energy();
        for &c in &core {
            core_energy += 2.0 * full.mo1e(c, c);
            for &d in &core {
                core_energy += 2.0 * full.mo2e(c, c, d, d) - full.mo2e(c, d, d, c);
            }
        }

        let n = active.len();
        let h1 = DMatrix::from_fn(n, n, |p, q| {
            let (i, j) = (active[p], active[q]);
            let mut value = full.mo1e(i, j);
            for &c in &core {
                value += 2.0 * full.mo2e(i, j, c, c) - full.mo2e(i, c, c, j);
            }
            value
        });
        let inner = DenseIntegrals::from_fn(h1, core_energy, |p, q, r, s| {
            full.mo2e(active[p], active[q], active[r], active[s])
        });

        info!(
            "Active space: {} orbitals, {} frozen core orbitals, core energy {:.10} Eh",
            n,
            core.len(),
            core_energy
        );

        Ok(ActiveSpaceIntegrals {
            inner,
            core,
            active,
        })
    }

    pub fn core_orbitals(&self) -> &[usize] {
        &self.core
    }

    pub fn active_orbitals(&self) -> &[usize] {
        &self.active
    }
}

impl MoIntegrals for ActiveSpaceIntegrals {
    fn norb(&self) -> usize {
        self.inner.norb()
    }

    fn mo1e(&self, i: usize, j: usize) -> f64 {
        self.inner.mo1e(i, j)
    }

    fn mo2e(&self, i: usize, j: usize, k: usize, l: usize) -> f64 {
        self.inner.mo2e(i, j, k, l)
    }

    fn mo2e_slice(&self) -> &[f64] {
        self.inner.mo2e_slice()
    }

    fn core_energy(&self) -> f64 {
        self.inner.core_energy()
    }
}

/// Random integrals with the full 8-fold symmetry, for tests
#[cfg(test)]
pub(crate) fn random_integrals(norb: usize, seed: u64) -> DenseIntegrals {
    use rand::{Rng, SeedableRng};

    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let pair = |i: usize, j: usize| if i > j { i * (i + 1) / 2 + j } else { j * (j + 1) / 2 + i };
    let npair = norb * (norb + 1) / 2;
    let values: Vec<f64> = (0..npair * (npair + 1) / 2)
        .map(|_| rng.gen_range(-0.1..0.1))
        .collect();

    let mut h1 = DMatrix::from_fn(norb, norb, |_, _| 0.0);
    for i in 0..norb {
        h1[(i, i)] = -2.0 + 0.6 * i as f64;
        for j in 0..i {
            let x = rng.gen_range(-0.2..0.2);
            h1[(i, j)] = x;
            h1[(j, i)] = x;
        }
    }

    DenseIntegrals::from_fn(h1, 0.7, |i, j, k, l| {
        let (ij, kl) = (pair(i, j), pair(k, l));
        let mut value = values[pair(ij, kl)];
        if i == j && k == l {
            value += 0.5;
        }
        value
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> IntegralInput {
        IntegralInput {
            norb: 3,
            nele: 4,
            nirrep: None,
            nuclear_repulsion: Some(0.5),
            core_energy: None,
            h1: vec![
                vec![-2.0, 0.1, 0.0],
                vec![0.1, -1.0, 0.2],
                vec![0.0, 0.2, -0.3],
            ],
            eri: vec![
                [0.0, 0.0, 0.0, 0.0, 0.9],
                [1.0, 1.0, 1.0, 1.0, 0.7],
                [2.0, 2.0, 2.0, 2.0, 0.6],
                [0.0, 0.0, 1.0, 1.0, 0.4],
                [0.0, 1.0, 0.0, 1.0, 0.1],
                [1.0, 2.0, 1.0, 0.0, 0.05],
            ],
        }
    }

    #[test]
    fn test_permutational_symmetry_expanded() {
        let ints = DenseIntegrals::from_input(&input()).unwrap();
        assert_eq!(ints.mo2e(1, 1, 0, 0), 0.4);
        assert_eq!(ints.mo2e(1, 0, 1, 0), 0.1);
        assert_eq!(ints.mo2e(0, 1, 2, 1), 0.05);
        assert_eq!(ints.mo2e(1, 0, 2, 1), 0.05);
        assert!((ints.core_energy() - 0.5).abs() < 1e-14);
    }

    #[test]
    fn test_modified_one_body() {
        let ints = DenseIntegrals::from_input(&input()).unwrap();
        let hp = ints.one_body_modified();
        // h'_00 = h_00 - 1/2 [(00|00) + (01|10) + (02|20)]
        assert!((hp[(0, 0)] - (-2.0 - 0.5 * (0.9 + 0.1))).abs() < 1e-14);
        assert!((hp[(0, 1)] - hp[(1, 0)]).abs() < 1e-14);
    }

    #[test]
    fn test_frozen_core_energy() {
        let ints = DenseIntegrals::from_input(&input()).unwrap();
        let active = ActiveSpaceIntegrals::new(&ints, 1, None, None).unwrap();
        assert_eq!(active.norb(), 2);
        // E = 0.5 + 2 h_00 + (2(00|00) - (00|00))
        assert!((active.core_energy() - (0.5 - 4.0 + 0.9)).abs() < 1e-12);
        // h_eff_11 = h_11 + 2 (11|00) - (10|01)
        assert!((active.mo1e(0, 0) - (-1.0 + 0.8 - 0.1)).abs() < 1e-12);
    }

    #[test]
    fn test_active_list_validation() {
        let ints = DenseIntegrals::from_input(&input()).unwrap();
        assert!(ActiveSpaceIntegrals::new(&ints, 0, None, Some(&[1, 1][..])).is_err());
        assert!(ActiveSpaceIntegrals::new(&ints, 0, None, Some(&[4][..])).is_err());
        let reordered = ActiveSpaceIntegrals::new(&ints, 1, None, Some(&[3, 2][..])).unwrap();
        assert_eq!(reordered.core_orbitals(), &[0]);
        assert_eq!(reordered.mo2e(1, 1, 1, 1), 0.7);
    }

    #[test]
    fn test_symmetry_rejected() {
        assert!(Reference::new(2, 2, 0.0).is_err());
        assert!(Reference::new(2, 1, 0.0).is_ok());
    }
}

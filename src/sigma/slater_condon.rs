//! Explicit Hamiltonian matrix elements between determinants
//!
//! Used for small model spaces (guess vectors) and as an independent check of
//! the σ builder.

extern crate nalgebra as na;

use super::SigmaEngine;
use crate::determinants::{excite, Determinants};
use na::DMatrix;
use rayon::prelude::*;

/// Positions of the set bits, ascending
fn set_bits(bits: u64) -> Vec<usize> {
    (0..64).filter(|&o| bits & (1u64 << o) != 0).collect()
}

impl SigmaEngine {
    /// <bra|H|ket> for determinants given as (alpha, beta) bit strings
    pub fn matrix_element(&self, bra: (u64, u64), ket: (u64, u64)) -> f64 {
        let (ba, bb) = bra;
        let (ka, kb) = ket;
        if ba.count_ones() != ka.count_ones() || bb.count_ones() != kb.count_ones() {
            return 0.0;
        }

        let da = (ba ^ ka).count_ones();
        let db = (bb ^ kb).count_ones();
        match (da, db) {
            (0, 0) => self.diagonal_energy(ba, bb),
            (2, 0) => self.single_element(ba, ka, kb),
            (0, 2) => self.single_element(bb, kb, ka),
            (4, 0) => self.same_spin_double(ba, ka),
            (0, 4) => self.same_spin_double(bb, kb),
            (2, 2) => self.opposite_spin_double((ba, bb), (ka, kb)),
            _ => 0.0,
        }
    }

    /// Single excitation in one spin channel; `other` is the spectator string
    fn single_element(&self, bra: u64, ket: u64, other: u64) -> f64 {
        let p = (bra & !ket).trailing_zeros() as usize;
        let q = (ket & !bra).trailing_zeros() as usize;
        let Some((_, phase)) = excite(ket, p, q) else {
            return 0.0;
        };

        let mut value = self.h1()[(p, q)];
        for k in set_bits(ket & bra) {
            value += self.mo2e(p, q, k, k) - self.mo2e(p, k, k, q);
        }
        for k in set_bits(other) {
            value += self.mo2e(p, q, k, k);
        }
        phase * value
    }

    fn same_spin_double(&self, bra: u64, ket: u64) -> f64 {
        let particles = set_bits(bra & !ket);
        let holes = set_bits(ket & !bra);
        let (p1, p2) = (particles[0], particles[1]);
        let (q1, q2) = (holes[0], holes[1]);

        // E_p1q1 E_p2q2 = a†p1 a†p2 aq2 aq1 when all four orbitals differ
        let Some((mid, s1)) = excite(ket, p2, q2) else {
            return 0.0;
        };
        let Some((_, s2)) = excite(mid, p1, q1) else {
            return 0.0;
        };
        s1 * s2 * (self.mo2e(p1, q1, p2, q2) - self.mo2e(p1, q2, p2, q1))
    }

    fn opposite_spin_double(&self, bra: (u64, u64), ket: (u64, u64)) -> f64 {
        let pa = (bra.0 & !ket.0).trailing_zeros() as usize;
        let qa = (ket.0 & !bra.0).trailing_zeros() as usize;
        let pb = (bra.1 & !ket.1).trailing_zeros() as usize;
        let qb = (ket.1 & !bra.1).trailing_zeros() as usize;
        let (Some((_, sa)), Some((_, sb))) = (excite(ket.0, pa, qa), excite(ket.1, pb, qb)) else {
            return 0.0;
        };
        sa * sb * self.mo2e(pa, qa, pb, qb)
    }

    /// Dense H over an explicit list of determinants
    pub fn hamiltonian_matrix(&self, dets: &[(u64, u64)]) -> DMatrix<f64> {
        let n = dets.len();
        let rows: Vec<Vec<f64>> = dets
            .par_iter()
            .map(|&bra| dets.iter().map(|&ket| self.matrix_element(bra, ket)).collect())
            .collect();
        DMatrix::from_fn(n, n, |i, j| rows[i][j])
    }

    /// Dense H over a whole determinant space, indexed like a CI vector
    pub fn full_hamiltonian(&self, det: &Determinants) -> DMatrix<f64> {
        let dets: Vec<(u64, u64)> = (0..det.lena())
            .flat_map(|ia| (0..det.lenb()).map(move |ib| (ia, ib)))
            .map(|(ia, ib)| (det.string_bits_a(ia), det.string_bits_b(ib)))
            .collect();
        self.hamiltonian_matrix(&dets)
    }
}

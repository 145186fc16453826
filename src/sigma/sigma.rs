//! σ = H c in the determinant basis
//!
//! The Hamiltonian is written with spin-summed excitation operators,
//!
//!   H = Σ_ij h'_ij E_ij + 1/2 Σ_ijkl (ij|kl) E_ij E_kl,
//!
//! where h' absorbs the δ_jk term of E_ij E_kl. The two-electron part is
//! evaluated through the intermediate D(I, kl) = <I|E_kl|c>, a dense GEMM
//! against the (ij|kl) matrix and a scatter through the same coupling tables.

extern crate nalgebra as na;

use super::SigmaBuilder;
use crate::civec::Civec;
use crate::determinants::Determinants;
use crate::integrals::MoIntegrals;
use crate::task_queue::{Task, TaskQueue};
use na::DMatrix;
use rayon::prelude::*;
use std::sync::Arc;

/// Integrals prepared for repeated σ builds
#[derive(Debug, Clone)]
pub struct SigmaEngine {
    norb: usize,
    h1: DMatrix<f64>,
    jop: DMatrix<f64>,
    eri: DMatrix<f64>,
    core_energy: f64,
    pool: Option<Arc<rayon::ThreadPool>>,
}

/// One column of the D intermediate: E_kl c
pub struct DColumnTask<'a> {
    c: &'a Civec,
    kl: usize,
}

impl<'a> DColumnTask<'a> {
    pub fn new(c: &'a Civec, kl: usize) -> Self {
        DColumnTask { c, kl }
    }
}

impl Task for DColumnTask<'_> {
    type Output = Vec<f64>;

    fn compute(&self) -> Vec<f64> {
        excitation_column(self.c, self.kl)
    }
}

/// E_kl c for both spin channels, laid out like the CI vector
pub fn excitation_column(c: &Civec, kl: usize) -> Vec<f64> {
    let det = c.det();
    let lenb = det.lenb();
    let mut out = vec![0.0; det.size()];

    for map in det.phi_a(kl) {
        let source = c.row(map.source);
        let target = &mut out[map.target * lenb..(map.target + 1) * lenb];
        for (t, s) in target.iter_mut().zip(source) {
            *t += map.sign * s;
        }
    }

    // a beta E_kl carries an even number of operators past the alpha block
    for ia in 0..det.lena() {
        let source = c.row(ia);
        let target = &mut out[ia * lenb..(ia + 1) * lenb];
        for map in det.phi_b(kl) {
            target[map.target] += map.sign * source[map.source];
        }
    }
    out
}

impl SigmaEngine {
    pub fn new<I: MoIntegrals + ?Sized>(ints: &I) -> Self {
        let norb = ints.norb();
        SigmaEngine {
            norb,
            h1: DMatrix::from_fn(norb, norb, |i, j| ints.mo1e(i, j)),
            jop: ints.one_body_modified(),
            eri: ints.eri_matrix(),
            core_energy: ints.core_energy(),
            pool: None,
        }
    }

    /// Run σ builds on a dedicated thread pool
    pub fn with_pool(mut self, pool: Arc<rayon::ThreadPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn norb(&self) -> usize {
        self.norb
    }

    pub fn core_energy(&self) -> f64 {
        self.core_energy
    }

    pub fn h1(&self) -> &DMatrix<f64> {
        &self.h1
    }

    /// h'_ij = h_ij - 1/2 Σ_k (ik|kj)
    pub fn jop(&self) -> &DMatrix<f64> {
        &self.jop
    }

    /// (ij|kl) as a norb² × norb² matrix
    pub fn eri(&self) -> &DMatrix<f64> {
        &self.eri
    }

    #[inline]
    pub fn mo2e(&self, i: usize, j: usize, k: usize, l: usize) -> f64 {
        self.eri[(i * self.norb + j, k * self.norb + l)]
    }

    pub(crate) fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    /// σ = H c (electronic part, without the core energy)
    pub fn sigma(&self, c: &Civec) -> Civec {
        let mut sigma = Civec::new(c.det().clone());
        self.compute(c, &mut sigma);
        sigma
    }

    /// Accumulate H c into `sigma`
    pub fn compute(&self, c: &Civec, sigma: &mut Civec) {
        assert_eq!(
            c.det().norb(),
            self.norb,
            "CI vector and integrals have different numbers of orbitals"
        );
        assert!(
            c.det().is_same(sigma.det()),
            "c and sigma live in different determinant spaces"
        );

        self.install(|| {
            self.task1(c, sigma);
            let d = self.task2a(c);
            let g = self.task2b(&d);
            self.task2c(&g, sigma);
            self.task3(c, sigma);
        });
    }

    /// Alpha one-electron part
    fn task1(&self, c: &Civec, sigma: &mut Civec) {
        let det = c.det().clone();
        let lenb = det.lenb();
        let n = self.norb;
        sigma
            .data_mut()
            .par_chunks_mut(lenb.max(1))
            .enumerate()
            .for_each(|(ia, target)| {
                for link in det.links_a(ia) {
                    // <ia|E_qp|t> = <t|E_pq|ia>
                    let (p, q) = (link.ij / n, link.ij % n);
                    let factor = link.sign * self.jop[(q, p)];
                    for (s, x) in target.iter_mut().zip(c.row(link.target)) {
                        *s += factor * x;
                    }
                }
            });
    }

    /// D(I, kl) = <I|E_kl|c>, one task per orbital pair
    pub fn task2a(&self, c: &Civec) -> DMatrix<f64> {
        let n2 = self.norb * self.norb;
        let mut queue = TaskQueue::with_capacity(n2);
        queue.extend((0..n2).map(|kl| DColumnTask::new(c, kl)));
        let columns = queue.compute();
        DMatrix::from_vec(c.size(), n2, columns.concat())
    }

    /// G(I, ij) = 1/2 Σ_kl D(I, kl) (kl|ij)
    fn task2b(&self, d: &DMatrix<f64>) -> DMatrix<f64> {
        let mut g = d * &self.eri;
        g *= 0.5;
        g
    }

    /// σ(I) += Σ_ij <I|E_ij|J> G(J, ij)
    fn task2c(&self, g: &DMatrix<f64>, sigma: &mut Civec) {
        let det = sigma.det().clone();
        let lenb = det.lenb();
        let size = det.size();
        let n = self.norb;
        let g = g.as_slice();
        sigma
            .data_mut()
            .par_chunks_mut(lenb.max(1))
            .enumerate()
            .for_each(|(ia, target)| {
                for link in det.links_a(ia) {
                    let qp = (link.ij % n) * n + link.ij / n;
                    let offset = qp * size + link.target * lenb;
                    for (s, x) in target.iter_mut().zip(&g[offset..offset + lenb]) {
                        *s += link.sign * x;
                    }
                }
                for (ib, s) in target.iter_mut().enumerate() {
                    for link in det.links_b(ib) {
                        let qp = (link.ij % n) * n + link.ij / n;
                        *s += link.sign * g[qp * size + ia * lenb + link.target];
                    }
                }
            });
    }

    /// Beta one-electron part
    fn task3(&self, c: &Civec, sigma: &mut Civec) {
        let det = c.det().clone();
        let lenb = det.lenb();
        let n = self.norb;
        sigma
            .data_mut()
            .par_chunks_mut(lenb.max(1))
            .enumerate()
            .for_each(|(ia, target)| {
                let source = c.row(ia);
                for (ib, s) in target.iter_mut().enumerate() {
                    for link in det.links_b(ib) {
                        let (p, q) = (link.ij / n, link.ij % n);
                        *s += link.sign * self.jop[(q, p)] * source[link.target];
                    }
                }
            });
    }

    /// <I|H|I> from the Slater-Condon rules
    pub fn diagonal_energy(&self, alpha: u64, beta: u64) -> f64 {
        let n = self.norb;
        let occ = |bits: u64, i: usize| if bits & (1u64 << i) != 0 { 1.0 } else { 0.0 };
        let mut energy = 0.0;
        for i in 0..n {
            let (nai, nbi) = (occ(alpha, i), occ(beta, i));
            let ni = nai + nbi;
            if ni == 0.0 {
                continue;
            }
            energy += self.h1[(i, i)] * ni;
            for j in 0..n {
                let (naj, nbj) = (occ(alpha, j), occ(beta, j));
                let nj = naj + nbj;
                if nj == 0.0 {
                    continue;
                }
                energy += 0.5 * self.mo2e(i, i, j, j) * ni * nj;
                energy -= 0.5 * self.mo2e(i, j, j, i) * (nai * naj + nbi * nbj);
            }
        }
        energy
    }

    /// Diagonal of H over a determinant space, laid out like a CI vector
    pub fn diagonal(&self, det: &Arc<Determinants>) -> Civec {
        let mut diag = Civec::new(det.clone());
        let lenb = det.lenb();
        self.install(|| {
            diag.data_mut()
                .par_chunks_mut(lenb.max(1))
                .enumerate()
                .for_each(|(ia, row)| {
                    let alpha = det.string_bits_a(ia);
                    for (ib, value) in row.iter_mut().enumerate() {
                        *value = self.diagonal_energy(alpha, det.string_bits_b(ib));
                    }
                });
        });
        diag
    }
}

impl SigmaBuilder<Civec> for SigmaEngine {
    fn build_sigma(&self, c: &Civec) -> Civec {
        self.sigma(c)
    }

    fn build_diagonal(&self, like: &Civec) -> Civec {
        self.diagonal(like.det())
    }

    fn core_energy(&self) -> f64 {
        self.core_energy
    }
}

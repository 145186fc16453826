//! σ = H c for RAS vectors
//!
//! E_ij E_kl c is resolved through the space with one more hole and one more
//! particle than the target space, which holds every determinant reachable by
//! a single excitation. D(K, kl) = <K|E_kl|c> is built there, contracted with
//! the (ij|kl) matrix and gathered back onto the restricted determinants.

extern crate nalgebra as na;

use super::ras_civec::RasCivec;
use super::ras_determinants::RasDeterminants;
use crate::determinants::excite;
use crate::sigma::{SigmaBuilder, SigmaEngine};
use crate::task_queue::{Task, TaskQueue};
use na::DMatrix;
use rayon::prelude::*;
use std::sync::Arc;

/// (created, annihilated, new string, sign) for every E_ij acting on a string
fn excitations(bits: u64, norb: usize) -> impl Iterator<Item = (usize, usize, u64, f64)> {
    (0..norb)
        .filter(move |&j| bits & (1u64 << j) != 0)
        .flat_map(move |j| {
            (0..norb).filter_map(move |i| excite(bits, i, j).map(|(target, sign)| (i, j, target, sign)))
        })
}

/// One column of D in the expanded space
pub struct RasDColumnTask<'a> {
    c: &'a RasCivec,
    expanded: &'a RasDeterminants,
    k: usize,
    l: usize,
}

impl Task for RasDColumnTask<'_> {
    type Output = Vec<f64>;

    fn compute(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.expanded.size()];
        for (alpha, beta, value) in self.c.iter() {
            if value == 0.0 {
                continue;
            }
            if let Some((target, sign)) = excite(alpha, self.k, self.l) {
                if let Some(index) = self.expanded.global_index(target, beta) {
                    out[index] += sign * value;
                }
            }
            if let Some((target, sign)) = excite(beta, self.k, self.l) {
                if let Some(index) = self.expanded.global_index(alpha, target) {
                    out[index] += sign * value;
                }
            }
        }
        out
    }
}

impl SigmaEngine {
    /// σ = H c over a RAS space (electronic part)
    pub fn ras_sigma(&self, c: &RasCivec) -> RasCivec {
        self.install(|| self.ras_sigma_impl(c))
    }

    fn ras_sigma_impl(&self, c: &RasCivec) -> RasCivec {
        let det = c.det().clone();
        assert_eq!(
            det.norb(),
            self.norb(),
            "CI vector and integrals have different numbers of orbitals"
        );
        let n = self.norb();
        let expanded = det.expanded(1, 1);

        let mut queue = TaskQueue::with_capacity(n * n);
        for k in 0..n {
            for l in 0..n {
                queue.push(RasDColumnTask {
                    c,
                    expanded: &expanded,
                    k,
                    l,
                });
            }
        }
        let columns = queue.compute();
        let d = DMatrix::from_vec(expanded.size(), n * n, columns.concat());
        let mut g = &d * self.eri();
        g *= 0.5;
        let g = g.as_slice();
        let xsize = expanded.size();

        let mut sigma = RasCivec::new(det.clone());
        let blocks: Vec<usize> = (0..det.nblocks()).collect();
        let filled: Vec<(usize, Vec<f64>)> = blocks
            .par_iter()
            .map(|&index| {
                let info = &det.blocks()[index];
                let mut data = vec![0.0; info.size()];
                for (ia, &alpha) in info.alpha.strings().iter().enumerate() {
                    for (ib, &beta) in info.beta.strings().iter().enumerate() {
                        let mut value = 0.0;
                        // <I|E_ij|K> = <K|E_ji|I>
                        for (j, i, target, sign) in excitations(alpha, n) {
                            let ij = i * n + j;
                            value += sign * self.jop()[(i, j)] * c.element(target, beta);
                            if let Some(k) = expanded.global_index(target, beta) {
                                value += sign * g[ij * xsize + k];
                            }
                        }
                        for (j, i, target, sign) in excitations(beta, n) {
                            let ij = i * n + j;
                            value += sign * self.jop()[(i, j)] * c.element(alpha, target);
                            if let Some(k) = expanded.global_index(alpha, target) {
                                value += sign * g[ij * xsize + k];
                            }
                        }
                        data[ia * info.lenb() + ib] = value;
                    }
                }
                (index, data)
            })
            .collect();
        for (index, data) in filled {
            sigma.block_mut(index).data_mut().copy_from_slice(&data);
        }
        sigma
    }

    /// Diagonal of H over a RAS space
    pub fn ras_diagonal(&self, det: &Arc<RasDeterminants>) -> RasCivec {
        let mut diag = RasCivec::new(det.clone());
        for (index, info) in det.blocks().iter().enumerate() {
            let block = diag.block_mut(index);
            for (ia, &alpha) in info.alpha.strings().iter().enumerate() {
                for (ib, &beta) in info.beta.strings().iter().enumerate() {
                    *block.element_mut(ia, ib) = self.diagonal_energy(alpha, beta);
                }
            }
        }
        diag
    }
}

impl SigmaBuilder<RasCivec> for SigmaEngine {
    fn build_sigma(&self, c: &RasCivec) -> RasCivec {
        self.ras_sigma(c)
    }

    fn build_diagonal(&self, like: &RasCivec) -> RasCivec {
        self.ras_diagonal(like.det())
    }

    fn core_energy(&self) -> f64 {
        SigmaEngine::core_energy(self)
    }
}

//! Strategies for applying one second-quantized operator to a set of states

use super::gamma_tree::{BranchView, GammaSQ};
use crate::civec::{Civec, Dvec};
use crate::determinants::{annihilate, create, Determinants};
use crate::ras::{RasCivec, RasDvec, RasTask};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Operator application and overlaps for one kind of multi-state vector
pub trait OperatorApplier: Send + Sync {
    type Vector: Send + Sync;

    fn norb(&self) -> usize;

    fn nstates(&self, v: &Self::Vector) -> usize;

    /// (nelea, neleb) of the space `v` lives in
    fn electrons(&self, v: &Self::Vector) -> (usize, usize);

    /// `op(orbital)` applied to every state, or `None` if nothing survives
    ///
    /// `branch` is the trie node of the operator, for look-ahead.
    fn apply(
        &self,
        ket: &Self::Vector,
        orbital: usize,
        op: GammaSQ,
        branch: BranchView<'_, Self::Vector>,
    ) -> Option<Self::Vector>;

    /// <bra_i|ket_j> stored at `i + nbra * j`
    fn overlaps(&self, bra: &Self::Vector, ket: &Self::Vector) -> Vec<f64>;
}

fn apply_to_bits(alpha: u64, beta: u64, orbital: usize, op: GammaSQ) -> Option<(u64, u64, f64)> {
    if op.is_creation() {
        create(alpha, beta, orbital, op.spin())
    } else {
        annihilate(alpha, beta, orbital, op.spin())
    }
}

fn shifted_counts(nelea: usize, neleb: usize, norb: usize, op: GammaSQ) -> Option<(usize, usize)> {
    let (da, db) = op.electron_change();
    let na = nelea as i64 + da;
    let nb = neleb as i64 + db;
    if na < 0 || nb < 0 || na as usize > norb || nb as usize > norb {
        return None;
    }
    Some((na as usize, nb as usize))
}

/// Full determinant spaces
#[derive(Debug)]
pub struct DenseApplier {
    norb: usize,
    spaces: Mutex<HashMap<(usize, usize), Arc<Determinants>>>,
}

impl DenseApplier {
    pub fn new(norb: usize) -> Self {
        DenseApplier {
            norb,
            spaces: Mutex::new(HashMap::new()),
        }
    }

    fn space(&self, nelea: usize, neleb: usize) -> Arc<Determinants> {
        let mut spaces = self.spaces.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        spaces
            .entry((nelea, neleb))
            .or_insert_with(|| Determinants::with_counts(self.norb, nelea, neleb))
            .clone()
    }

    fn apply_state(c: &Civec, target: &Arc<Determinants>, orbital: usize, op: GammaSQ) -> Civec {
        let det = c.det();
        let mut out = Civec::new(target.clone());
        for ia in 0..det.lena() {
            let alpha = det.string_bits_a(ia);
            for (ib, &value) in c.row(ia).iter().enumerate() {
                if value == 0.0 {
                    continue;
                }
                let beta = det.string_bits_b(ib);
                if let Some((a, b, sign)) = apply_to_bits(alpha, beta, orbital, op) {
                    *out.element_mut(target.lexical_a(a), target.lexical_b(b)) += sign * value;
                }
            }
        }
        out
    }
}

impl OperatorApplier for DenseApplier {
    type Vector = Dvec;

    fn norb(&self) -> usize {
        self.norb
    }

    fn nstates(&self, v: &Dvec) -> usize {
        v.ij()
    }

    fn electrons(&self, v: &Dvec) -> (usize, usize) {
        (v.det().nelea(), v.det().neleb())
    }

    fn apply(&self, ket: &Dvec, orbital: usize, op: GammaSQ, _branch: BranchView<'_, Dvec>) -> Option<Dvec> {
        let (na, nb) = shifted_counts(ket.det().nelea(), ket.det().neleb(), self.norb, op)?;
        let target = self.space(na, nb);
        let civecs = ket
            .civecs()
            .par_iter()
            .map(|c| Self::apply_state(c, &target, orbital, op))
            .collect();
        Some(Dvec::from_civecs(civecs))
    }

    fn overlaps(&self, bra: &Dvec, ket: &Dvec) -> Vec<f64> {
        assert!(
            bra.det().is_same(ket.det()),
            "bra and intermediate ket live in different determinant spaces"
        );
        let nbra = bra.ij();
        let mut out = vec![0.0; nbra * ket.ij()];
        for (j, k) in ket.civecs().iter().enumerate() {
            for (i, b) in bra.civecs().iter().enumerate() {
                out[i + nbra * j] = b.dot(k);
            }
        }
        out
    }
}

/// RAS spaces; intermediate blocks are kept only when they can reach the bra space
#[derive(Debug, Clone, Copy)]
pub struct RasApplier {
    norb: usize,
    task: RasTask,
}

impl RasApplier {
    pub fn new(norb: usize, max_holes: usize, max_particles: usize) -> Self {
        RasApplier {
            norb,
            task: RasTask::new(max_holes, max_particles),
        }
    }
}

impl OperatorApplier for RasApplier {
    type Vector = RasDvec;

    fn norb(&self) -> usize {
        self.norb
    }

    fn nstates(&self, v: &RasDvec) -> usize {
        v.ij()
    }

    fn electrons(&self, v: &RasDvec) -> (usize, usize) {
        (v.det().nelea(), v.det().neleb())
    }

    fn apply(
        &self,
        ket: &RasDvec,
        orbital: usize,
        op: GammaSQ,
        branch: BranchView<'_, RasDvec>,
    ) -> Option<RasDvec> {
        let det = ket.det();
        let (na, nb) = shifted_counts(det.nelea(), det.neleb(), self.norb, op)?;
        let slack = branch.depth_below();
        let target = det.neighbour(
            na,
            nb,
            self.task.max_holes() + slack,
            self.task.max_particles() + slack,
        );
        let mut out: Vec<RasCivec> = (0..ket.ij()).map(|_| RasCivec::empty(target.clone())).collect();

        let mut touched = false;
        for (index, info) in det.blocks().iter().enumerate() {
            if ket.civecs().iter().all(|c| c.block(index).is_none()) {
                continue;
            }
            let Some((akey, bkey)) = self.task.next_block(branch, info, orbital, op.is_creation(), op.spin())
            else {
                continue;
            };
            let Some(tindex) = target.block_index(akey, bkey) else {
                continue;
            };
            let tinfo = &target.blocks()[tindex];
            for (state, c) in ket.civecs().iter().enumerate() {
                let Some(source) = c.block(index) else { continue };
                let block = out[state].block_mut(tindex);
                for (ia, &alpha) in info.alpha.strings().iter().enumerate() {
                    for (ib, &beta) in info.beta.strings().iter().enumerate() {
                        let value = source.element(ia, ib);
                        if value == 0.0 {
                            continue;
                        }
                        if let Some((a, b, sign)) = apply_to_bits(alpha, beta, orbital, op) {
                            *block.element_mut(tinfo.alpha.lexical(a), tinfo.beta.lexical(b)) +=
                                sign * value;
                        }
                    }
                }
                touched = true;
            }
        }
        touched.then(|| RasDvec::from_civecs(out))
    }

    fn overlaps(&self, bra: &RasDvec, ket: &RasDvec) -> Vec<f64> {
        let nbra = bra.ij();
        let mut out = vec![0.0; nbra * ket.ij()];
        for (j, k) in ket.civecs().iter().enumerate() {
            for (i, b) in bra.civecs().iter().enumerate() {
                out[i + nbra * j] = b.overlap(k);
            }
        }
        out
    }
}

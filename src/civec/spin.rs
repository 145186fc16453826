//! Spin operators on CI vectors
//!
//! S² = S-S+ + Sz(Sz + 1) with S+ = Σ_i a†_iα a_iβ and S- = Σ_i a†_iβ a_iα.

use super::Civec;
use crate::determinants::{annihilate, create, Determinants, Spin};
use rayon::prelude::*;
use std::sync::Arc;

/// Tolerance on <S²> used when purifying guess and update vectors
pub const SPIN_THRESH: f64 = 1.0e-8;

/// <J|S²|alpha beta> for every determinant J reached from (alpha, beta)
pub fn s2_terms(norb: usize, alpha: u64, beta: u64) -> Vec<(u64, u64, f64)> {
    let nelea = alpha.count_ones() as f64;
    let neleb = beta.count_ones() as f64;
    let sz = 0.5 * (nelea - neleb);

    let mut terms = vec![(alpha, beta, sz * (sz + 1.0))];
    for i in 0..norb {
        let Some((a1, b1, s1)) = annihilate(alpha, beta, i, Spin::Beta) else {
            continue;
        };
        let Some((a2, b2, s2)) = create(a1, b1, i, Spin::Alpha) else {
            continue;
        };
        for j in 0..norb {
            let Some((a3, b3, s3)) = annihilate(a2, b2, j, Spin::Alpha) else {
                continue;
            };
            let Some((a4, b4, s4)) = create(a3, b3, j, Spin::Beta) else {
                continue;
            };
            let factor = s1 * s2 * s3 * s4;
            match terms.iter_mut().find(|t| t.0 == a4 && t.1 == b4) {
                Some(term) => term.2 += factor,
                None => terms.push((a4, b4, factor)),
            }
        }
    }
    terms
}

fn apply_shift(source: &Civec, target_det: Arc<Determinants>, from: Spin, to: Spin) -> Civec {
    let sdet = source.det().clone();
    let mut out = Civec::new(target_det.clone());
    let lenb = target_det.lenb();
    for ia in 0..sdet.lena() {
        let alpha = sdet.string_bits_a(ia);
        for ib in 0..sdet.lenb() {
            let coeff = source.element(ia, ib);
            if coeff == 0.0 {
                continue;
            }
            let beta = sdet.string_bits_b(ib);
            for i in 0..sdet.norb() {
                let Some((a1, b1, s1)) = annihilate(alpha, beta, i, from) else {
                    continue;
                };
                let Some((a2, b2, s2)) = create(a1, b1, i, to) else {
                    continue;
                };
                let index = target_det.lexical_a(a2) * lenb + target_det.lexical_b(b2);
                out.data_mut()[index] += s1 * s2 * coeff;
            }
        }
    }
    out
}

impl Civec {
    /// S² |c>
    pub fn spin(&self) -> Civec {
        let det = self.det().clone();
        let lenb = det.lenb();
        let norb = det.norb();
        let mut out = Civec::new(det.clone());
        // S² is real symmetric: gather each output row from the terms of its own determinants
        out.data_mut()
            .par_chunks_mut(lenb.max(1))
            .enumerate()
            .for_each(|(ia, row)| {
                let alpha = det.string_bits_a(ia);
                for (ib, value) in row.iter_mut().enumerate() {
                    let beta = det.string_bits_b(ib);
                    *value = s2_terms(norb, alpha, beta)
                        .into_iter()
                        .map(|(a, b, f)| f * self.element(det.lexical_a(a), det.lexical_b(b)))
                        .sum();
                }
            });
        out
    }

    /// S- |c>, living in the space with one alpha electron turned beta
    pub fn spin_lower(&self) -> Option<Civec> {
        let det = self.det();
        if det.nelea() == 0 || det.neleb() == det.norb() {
            return None;
        }
        let target = Determinants::with_counts(det.norb(), det.nelea() - 1, det.neleb() + 1);
        Some(apply_shift(self, target, Spin::Alpha, Spin::Beta))
    }

    /// S+ |c>, living in the space with one beta electron turned alpha
    pub fn spin_raise(&self) -> Option<Civec> {
        let det = self.det();
        if det.neleb() == 0 || det.nelea() == det.norb() {
            return None;
        }
        let target = Determinants::with_counts(det.norb(), det.nelea() + 1, det.neleb() - 1);
        Some(apply_shift(self, target, Spin::Beta, Spin::Alpha))
    }
}

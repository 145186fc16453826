//! Reduced density matrices and their determinant derivatives
//!
//! One-particle densities come from the gamma forest. The two-particle
//! density is assembled from the excitation intermediate D(I, kl) = <I|E_kl|c>
//! used by the σ builder. Three- and four-particle densities are overlaps of
//! vectors with N electrons removed.

extern crate nalgebra as na;

use super::rdm::{Rdm, Rdm1, Rdm2, Rdm3, Rdm4};
use crate::civec::{Civec, Dvec};
use crate::determinants::{annihilate, Determinants, Spin};
use crate::gamma::{DenseApplier, GammaForest, GammaSQ, OperatorApplier, RasApplier};
use crate::ras::RasDvec;
use crate::sigma::DColumnTask;
use crate::task_queue::TaskQueue;
use na::DMatrix;
use rayon::prelude::*;
use std::sync::Arc;

const ALPHA_STRING: [GammaSQ; 2] = [GammaSQ::CreateAlpha, GammaSQ::AnnihilateAlpha];
const BETA_STRING: [GammaSQ; 2] = [GammaSQ::CreateBeta, GammaSQ::AnnihilateBeta];

/// <bra_i|E_pq|ket_j> for every state pair, stored at `i + nbra * j`
fn one_body_from_forest<A: OperatorApplier>(applier: A, bra: A::Vector, ket: Option<A::Vector>) -> Vec<Rdm1> {
    let norb = applier.norb();
    let bra = Arc::new(bra);
    let ket = match ket {
        Some(ket) => Arc::new(ket),
        None => bra.clone(),
    };
    let npair = applier.nstates(&bra) * applier.nstates(&ket);

    let mut forest = GammaForest::new(applier, 1);
    forest.insert(0, &bra, 0, &ket, 1, &ALPHA_STRING);
    forest.insert(0, &bra, 0, &ket, 1, &BETA_STRING);
    forest.allocate_and_count();
    forest.compute();

    let alpha = forest.search(0, 0, 1, &ALPHA_STRING);
    let beta = forest.search(0, 0, 1, &BETA_STRING);
    (0..npair)
        .map(|pair| {
            let data = (0..norb * norb)
                .map(|pq| alpha[(pair, pq)] + beta[(pair, pq)])
                .collect();
            Rdm::from_data(norb, data)
        })
        .collect()
}

/// Transition one-particle densities between two sets of states
pub fn transition_rdm1s(bra: &Dvec, ket: &Dvec) -> Vec<Rdm1> {
    let norb = ket.det().norb();
    one_body_from_forest(DenseApplier::new(norb), bra.clone(), Some(ket.clone()))
}

/// One-particle density of every state in `states`
pub fn state_rdm1s(states: &Dvec) -> Vec<Rdm1> {
    let nstate = states.ij();
    let all = one_body_from_forest(DenseApplier::new(states.det().norb()), states.clone(), None);
    (0..nstate).map(|i| all[i + nstate * i].clone()).collect()
}

/// One-particle density of every RAS state
pub fn ras_state_rdm1s(states: &RasDvec) -> Vec<Rdm1> {
    let det = states.det();
    let applier = RasApplier::new(det.norb(), det.max_holes(), det.max_particles());
    let nstate = states.ij();
    let all = one_body_from_forest(applier, states.clone(), None);
    (0..nstate).map(|i| all[i + nstate * i].clone()).collect()
}

pub fn rdm1(c: &Civec) -> Rdm1 {
    transition_rdm1(c, c)
}

pub fn transition_rdm1(bra: &Civec, ket: &Civec) -> Rdm1 {
    let bra = Dvec::from_civecs(vec![bra.clone()]);
    let ket = Dvec::from_civecs(vec![ket.clone()]);
    transition_rdm1s(&bra, &ket).swap_remove(0)
}

/// Columns E_kl c for every kl
fn excitation_columns(c: &Civec) -> Vec<Vec<f64>> {
    let norb = c.det().norb();
    let mut queue = TaskQueue::with_capacity(norb * norb);
    for kl in 0..norb * norb {
        queue.push(DColumnTask::new(c, kl));
    }
    queue.compute()
}

/// D(I, kl) = <I|E_kl|c>, one row per determinant
pub fn rdm1deriv(c: &Civec) -> DMatrix<f64> {
    let norb = c.det().norb();
    DMatrix::from_vec(c.size(), norb * norb, excitation_columns(c).concat())
}

/// Transition one- and two-particle densities
///
/// rdm2(i, j, k, l) = <bra|E_ij E_kl|ket> - δ_jk <bra|E_il|ket>.
pub fn transition_rdm12(bra: &Civec, ket: &Civec) -> (Rdm1, Rdm2) {
    assert!(
        bra.det().is_same(ket.det()),
        "bra and ket live in different determinant spaces"
    );
    let n = ket.det().norb();
    let dket = rdm1deriv(ket);
    let dbra = if std::ptr::eq(bra, ket) { dket.clone() } else { rdm1deriv(bra) };

    let cbra = na::DVector::from_column_slice(bra.data());
    let one = dket.tr_mul(&cbra);
    let rdm1 = Rdm::from_data(n, one.iter().copied().collect());

    // M(ji, kl) = <bra|E_ij E_kl|ket>
    let m = dbra.tr_mul(&dket);
    let mut rdm2 = Rdm2::new(n);
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                for l in 0..n {
                    let mut value = m[(j * n + i, k * n + l)];
                    if j == k {
                        value -= rdm1.element(&[i, l]);
                    }
                    *rdm2.element_mut(&[i, j, k, l]) = value;
                }
            }
        }
    }
    (rdm1, rdm2)
}

pub fn rdm12(c: &Civec) -> (Rdm1, Rdm2) {
    transition_rdm12(c, c)
}

/// <I|E_ij E_kl|c>, column `ij * norb² + kl`
pub fn rdm2deriv(c: &Civec) -> DMatrix<f64> {
    let n = c.det().norb();
    let n2 = n * n;
    let mut out = DMatrix::zeros(c.size(), n2 * n2);
    for (kl, column) in excitation_columns(c).into_iter().enumerate() {
        let d = Civec::from_data(c.det().clone(), column);
        for (ij, e) in excitation_columns(&d).into_iter().enumerate() {
            out.column_mut(ij * n2 + kl).copy_from_slice(&e);
        }
    }
    out
}

/// <I|E_ij E_kl E_mn|v>, column `(ij * norb² + kl) * norb² + mn`
fn three_excitations(v: &Civec) -> DMatrix<f64> {
    let n2 = v.det().norb().pow(2);
    let mut out = DMatrix::zeros(v.size(), n2 * n2 * n2);
    for (mn, first) in excitation_columns(v).into_iter().enumerate() {
        let first = Civec::from_data(v.det().clone(), first);
        for (kl, second) in excitation_columns(&first).into_iter().enumerate() {
            let second = Civec::from_data(v.det().clone(), second);
            for (ij, third) in excitation_columns(&second).into_iter().enumerate() {
                out.column_mut((ij * n2 + kl) * n2 + mn).copy_from_slice(&third);
            }
        }
    }
    out
}

/// Derivatives of the three- and Fock-contracted four-particle densities
///
/// The first matrix holds <I|E_ij E_kl E_mn|c>; the second holds
/// Σ_op f_op <I|E_ij E_kl E_mn E_op|c>. Both use column `(ij * norb² + kl) * norb² + mn`.
pub fn rdm34deriv(c: &Civec, fock: &DMatrix<f64>) -> (DMatrix<f64>, DMatrix<f64>) {
    let n = c.det().norb();
    assert!(
        fock.nrows() == n && fock.ncols() == n,
        "Fock matrix must be {} x {}",
        n,
        n
    );
    let mut fc = Civec::new(c.det().clone());
    for (op, column) in excitation_columns(c).into_iter().enumerate() {
        let f = fock[(op / n, op % n)];
        if f != 0.0 {
            for (y, x) in fc.data_mut().iter_mut().zip(&column) {
                *y += f * x;
            }
        }
    }
    (three_excitations(c), three_excitations(&fc))
}

/// Every vector a_{xN} ... a_{x1} |c> as a column `x1 * norb^(N-1) + ... + xN`
fn annihilated(c: &Civec, spins: &[Spin], target: &Arc<Determinants>) -> DMatrix<f64> {
    let det = c.det();
    let n = det.norb();
    let rank = spins.len();
    let ncol = n.pow(rank as u32);
    let columns: Vec<Vec<f64>> = (0..ncol)
        .into_par_iter()
        .map(|x| {
            let orbitals: Vec<usize> = (0..rank)
                .rev()
                .map(|level| (x / n.pow(level as u32)) % n)
                .collect();
            let mut out = vec![0.0; target.size()];
            for ia in 0..det.lena() {
                let alpha = det.string_bits_a(ia);
                for (ib, &value) in c.row(ia).iter().enumerate() {
                    if value == 0.0 {
                        continue;
                    }
                    let mut state = Some((alpha, det.string_bits_b(ib), value));
                    for (&orbital, &spin) in orbitals.iter().zip(spins) {
                        state = state.and_then(|(a, b, v)| {
                            annihilate(a, b, orbital, spin).map(|(a, b, s)| (a, b, s * v))
                        });
                    }
                    if let Some((a, b, v)) = state {
                        out[target.lexical_a(a) * target.lenb() + target.lexical_b(b)] += v;
                    }
                }
            }
            out
        })
        .collect();
    DMatrix::from_vec(target.size(), ncol, columns.concat())
}

/// Normal-ordered spin-summed density <bra|a†_i a†_k ... a_l a_j|ket>
///
/// Index order is (i, j, k, l, ...) with (i, j), (k, l), ... sharing a spin.
pub fn normal_ordered_rdm<const N: usize>(bra: &Civec, ket: &Civec) -> Rdm<N> {
    let det = ket.det();
    assert!(
        bra.det().is_same(det),
        "bra and ket live in different determinant spaces"
    );
    let n = det.norb();
    let ncol = n.pow(N as u32);
    let mut out = Rdm::<N>::new(n);
    for mask in 0..(1usize << N) {
        let spins: Vec<Spin> = (0..N)
            .map(|k| if mask >> k & 1 == 0 { Spin::Alpha } else { Spin::Beta })
            .collect();
        let nalpha = spins.iter().filter(|&&s| s == Spin::Alpha).count();
        let nbeta = N - nalpha;
        if nalpha > det.nelea() || nbeta > det.neleb() {
            continue;
        }
        let target = Determinants::with_counts(n, det.nelea() - nalpha, det.neleb() - nbeta);
        let aket = annihilated(ket, &spins, &target);
        let abra = if std::ptr::eq(bra, ket) { aket.clone() } else { annihilated(bra, &spins, &target) };
        let overlap = abra.tr_mul(&aket);

        let mut index = vec![0; 2 * N];
        for x in 0..ncol {
            for y in 0..ncol {
                let value = overlap[(x, y)];
                if value == 0.0 {
                    continue;
                }
                for level in 0..N {
                    let p = n.pow((N - 1 - level) as u32);
                    index[2 * level] = (x / p) % n;
                    index[2 * level + 1] = (y / p) % n;
                }
                *out.element_mut(&index) += value;
            }
        }
    }
    out
}

/// Three- and four-particle densities of one state
pub fn compute_rdm34(c: &Civec) -> (Rdm3, Rdm4) {
    (normal_ordered_rdm::<3>(c, c), normal_ordered_rdm::<4>(c, c))
}

/// E = Σ h_ij γ_ij + 1/2 Σ (ij|kl) Γ_ijkl, without the core energy
pub fn rdm_energy(h1: &DMatrix<f64>, eri: &DMatrix<f64>, rdm1: &Rdm1, rdm2: &Rdm2) -> f64 {
    let n = rdm1.norb();
    let one: f64 = (0..n * n).map(|ij| h1[(ij / n, ij % n)] * rdm1.data()[ij]).sum();
    let two: f64 = (0..n * n)
        .flat_map(|ij| (0..n * n).map(move |kl| (ij, kl)))
        .map(|(ij, kl)| eri[(ij, kl)] * rdm2.data()[ij * n * n + kl])
        .sum();
    one + 0.5 * two
}

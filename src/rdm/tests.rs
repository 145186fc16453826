//! Tests for RDM assembly

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::civec::{Civec, Dvec};
    use crate::determinants::Determinants;
    use crate::integrals::random_integrals;
    use crate::ras::{RasCivec, RasDeterminants, RasDvec};
    use crate::sigma::SigmaEngine;
    use approx::assert_abs_diff_eq;
    use nalgebra::DMatrix;
    use rand::{Rng, SeedableRng};
    use std::sync::Arc;

    fn random_civec(det: &Arc<Determinants>, seed: u64) -> Civec {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let data = (0..det.size()).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let mut c = Civec::from_data(det.clone(), data);
        c.normalize();
        c
    }

    fn rotation(n: usize, angle: f64) -> DMatrix<f64> {
        let mut r = DMatrix::identity(n, n);
        r[(0, 0)] = angle.cos();
        r[(0, 1)] = -angle.sin();
        r[(1, 0)] = angle.sin();
        r[(1, 1)] = angle.cos();
        r
    }

    #[test]
    fn test_rdm1_trace_and_symmetry() {
        let det = Determinants::new(4, 2, 1).unwrap();
        let c = random_civec(&det, 3);
        let gamma = rdm1(&c);
        let trace: f64 = (0..4).map(|i| gamma.element(&[i, i])).sum();
        assert_abs_diff_eq!(trace, 3.0, epsilon = 1e-10);
        for i in 0..4 {
            for j in 0..4 {
                assert_abs_diff_eq!(gamma.element(&[i, j]), gamma.element(&[j, i]), epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_rdm1_paths_agree() {
        let det = Determinants::new(4, 2, 2).unwrap();
        let c = random_civec(&det, 5);
        let from_forest = rdm1(&c);
        let (from_d, _) = rdm12(&c);
        let from_annihilation = normal_ordered_rdm::<1>(&c, &c);
        assert!(from_forest.max_difference(&from_d) < 1e-10);
        assert!(from_forest.max_difference(&from_annihilation) < 1e-10);
    }

    #[test]
    fn test_rdm2_matches_normal_ordered() {
        let det = Determinants::new(4, 2, 1).unwrap();
        let c = random_civec(&det, 6);
        let (_, gamma2) = rdm12(&c);
        let reference = normal_ordered_rdm::<2>(&c, &c);
        assert!(gamma2.max_difference(&reference) < 1e-10);

        // Σ_k Γ(i, j, k, k) = (N - 1) γ(i, j)
        let gamma1 = rdm1(&c);
        for i in 0..4 {
            for j in 0..4 {
                let partial: f64 = (0..4).map(|k| gamma2.element(&[i, j, k, k])).sum();
                assert_abs_diff_eq!(partial, 2.0 * gamma1.element(&[i, j]), epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_rdm_energy_matches_sigma() {
        let ints = random_integrals(4, 17);
        let engine = SigmaEngine::new(&ints);
        let det = Determinants::new(4, 2, 2).unwrap();
        let c = random_civec(&det, 2);
        let (gamma1, gamma2) = rdm12(&c);
        let energy = rdm_energy(engine.h1(), engine.eri(), &gamma1, &gamma2);
        assert_abs_diff_eq!(energy, c.dot(&engine.sigma(&c)), epsilon = 1e-10);
    }

    #[test]
    fn test_transition_rdm1_matches_one_body_coupling() {
        let ints = random_integrals(4, 23);
        let det = Determinants::new(4, 2, 1).unwrap();
        let a = random_civec(&det, 1);
        let b = random_civec(&det, 2);
        let transition = transition_rdm1(&a, &b);
        let (from_d, _) = transition_rdm12(&a, &b);
        assert!(transition.max_difference(&from_d) < 1e-10);

        // only the one-body part of H: zero two-electron integrals
        let h1 = DMatrix::from_fn(4, 4, |i, j| ints.h1()[(i, j)]);
        let zero = DMatrix::zeros(16, 16);
        let direct: f64 = (0..4)
            .flat_map(|i| (0..4).map(move |j| (i, j)))
            .map(|(i, j)| h1[(i, j)] * transition.element(&[i, j]))
            .sum();
        assert_abs_diff_eq!(
            direct,
            rdm_energy(&h1, &zero, &transition, &Rdm2::new(4)),
            epsilon = 1e-12
        );

        let swapped = transition_rdm1(&b, &a);
        for i in 0..4 {
            for j in 0..4 {
                assert_abs_diff_eq!(
                    transition.element(&[i, j]),
                    swapped.element(&[j, i]),
                    epsilon = 1e-10
                );
            }
        }
    }

    #[test]
    fn test_state_rdm1s_match_single_state() {
        let det = Determinants::new(4, 2, 2).unwrap();
        let states = Dvec::from_civecs(vec![random_civec(&det, 1), random_civec(&det, 2)]);
        let all = state_rdm1s(&states);
        assert_eq!(all.len(), 2);
        for (i, gamma) in all.iter().enumerate() {
            assert!(gamma.max_difference(&rdm1(states.data(i))) < 1e-10);
        }
    }

    #[test]
    fn test_ras_rdm1_matches_embedded_vector() {
        let ras = RasDeterminants::new([1, 2, 1], 2, 2, 1, 1).unwrap();
        let full = Determinants::new(4, 2, 2).unwrap();
        let mut c = RasCivec::new(ras.clone());
        let mut rng = rand::rngs::StdRng::seed_from_u64(31);
        for index in 0..ras.nblocks() {
            for x in c.block_mut(index).data_mut() {
                *x = rng.gen_range(-1.0..1.0);
            }
        }
        let gamma = ras_state_rdm1s(&RasDvec::from_civecs(vec![c.clone()]));
        let reference = rdm1(&c.to_civec(&full));
        assert!(gamma[0].max_difference(&reference) < 1e-10);
    }

    #[test]
    fn test_rdm34_partial_traces() {
        let det = Determinants::new(4, 2, 2).unwrap();
        let c = random_civec(&det, 9);
        let (_, gamma2) = rdm12(&c);
        let (gamma3, gamma4) = compute_rdm34(&c);
        for flat in 0..4usize.pow(4) {
            let index: Vec<usize> = (0..4).rev().map(|p| flat / 4usize.pow(p) % 4).collect();
            let partial: f64 = (0..4)
                .map(|m| {
                    let mut full = index.clone();
                    full.extend([m, m]);
                    gamma3.element(&full)
                })
                .sum();
            assert_abs_diff_eq!(partial, 2.0 * gamma2.element(&index), epsilon = 1e-10);
        }
        for flat in 0..4usize.pow(6) {
            let index: Vec<usize> = (0..6).rev().map(|p| flat / 4usize.pow(p) % 4).collect();
            let partial: f64 = (0..4)
                .map(|m| {
                    let mut full = index.clone();
                    full.extend([m, m]);
                    gamma4.element(&full)
                })
                .sum();
            assert_abs_diff_eq!(partial, 1.0 * gamma3.element(&index), epsilon = 1e-10);
        }
    }

    #[test]
    fn test_rdm3_matches_excitation_products() {
        let det = Determinants::new(3, 2, 1).unwrap();
        let c = random_civec(&det, 4);
        let gamma1 = rdm1(&c);
        let (_, gamma2) = rdm12(&c);
        let gamma3 = normal_ordered_rdm::<3>(&c, &c);
        let (deriv3, _) = rdm34deriv(&c, &DMatrix::zeros(3, 3));
        let raw = deriv3.tr_mul(&nalgebra::DVector::from_column_slice(c.data()));
        let n = 3;
        let d = |a: usize, b: usize| if a == b { 1.0 } else { 0.0 };
        for i in 0..n {
            for j in 0..n {
                for k in 0..n {
                    for l in 0..n {
                        for m in 0..n {
                            for o in 0..n {
                                let column = ((i * n + j) * n * n + k * n + l) * n * n + m * n + o;
                                // <E_ij E_kl E_mo> expanded into normal-ordered densities
                                let expected = gamma3.element(&[i, j, k, l, m, o])
                                    + d(j, k) * gamma2.element(&[i, l, m, o])
                                    + d(j, m) * gamma2.element(&[i, o, k, l])
                                    + d(l, m) * gamma2.element(&[i, j, k, o])
                                    + d(l, m) * d(j, k) * gamma1.element(&[i, o]);
                                assert_abs_diff_eq!(raw[column], expected, epsilon = 1e-10);
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_derivatives_contract_to_densities() {
        let det = Determinants::new(4, 2, 1).unwrap();
        let c = random_civec(&det, 13);
        let cvec = nalgebra::DVector::from_column_slice(c.data());
        let (gamma1, gamma2) = rdm12(&c);

        let d1 = rdm1deriv(&c).tr_mul(&cvec);
        for (ij, value) in d1.iter().enumerate() {
            assert_abs_diff_eq!(*value, gamma1.data()[ij], epsilon = 1e-10);
        }

        let d2 = rdm2deriv(&c).tr_mul(&cvec);
        for i in 0..4 {
            for j in 0..4 {
                for k in 0..4 {
                    for l in 0..4 {
                        let mut expected = gamma2.element(&[i, j, k, l]);
                        if j == k {
                            expected += gamma1.element(&[i, l]);
                        }
                        assert_abs_diff_eq!(
                            d2[(i * 4 + j) * 16 + k * 4 + l],
                            expected,
                            epsilon = 1e-10
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_rdm4deriv_contracts_fock() {
        let det = Determinants::new(3, 1, 1).unwrap();
        let c = random_civec(&det, 6);
        let mut fock = DMatrix::zeros(3, 3);
        fock[(0, 0)] = 1.0;
        fock[(1, 1)] = 1.0;
        fock[(2, 2)] = 1.0;
        // Σ_o E_oo = N on every determinant
        let (deriv3, deriv4) = rdm34deriv(&c, &fock);
        for (x, y) in deriv4.iter().zip(deriv3.iter()) {
            assert_abs_diff_eq!(*x, 2.0 * *y, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_transform_and_natural_orbitals() {
        let det = Determinants::new(4, 2, 2).unwrap();
        let c = random_civec(&det, 10);
        let gamma1 = rdm1(&c);
        let (_, gamma2) = rdm12(&c);

        let mut rotated = gamma1.clone();
        rotated.transform(&DMatrix::identity(4, 4));
        assert!(rotated.max_difference(&gamma1) < 1e-12);

        let r = rotation(4, 0.3);
        let mut rotated = gamma1.clone();
        rotated.transform(&r);
        let expected = r.transpose() * gamma1.to_matrix() * &r;
        assert!(rotated.max_difference(&Rdm1::from_matrix(&expected)) < 1e-10);

        let mut rotated2 = gamma2.clone();
        rotated2.transform(&r);
        let trace = |g: &Rdm2| -> f64 {
            (0..4)
                .flat_map(|i| (0..4).map(move |k| (i, k)))
                .map(|(i, k)| g.element(&[i, i, k, k]))
                .sum()
        };
        assert_abs_diff_eq!(trace(&rotated2), trace(&gamma2), epsilon = 1e-10);

        let (occupations, orbitals) = gamma1.natural_orbitals();
        assert_abs_diff_eq!(occupations.iter().sum::<f64>(), 4.0, epsilon = 1e-10);
        assert!(occupations.windows(2).all(|w| w[0] >= w[1] - 1e-12));
        let diagonal = orbitals.transpose() * gamma1.to_matrix() * &orbitals;
        for (i, occ) in occupations.iter().enumerate() {
            assert_abs_diff_eq!(diagonal[(i, i)], *occ, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_rdm_algebra() {
        let mut a = Rdm2::new(3);
        *a.element_mut(&[0, 1, 2, 0]) = 2.0;
        let mut b = a.clone();
        b.scale(0.5);
        a.ax_plus_y(-2.0, &b);
        assert_abs_diff_eq!(a.element(&[0, 1, 2, 0]), 0.0);
        b.zero();
        assert!(b.data().iter().all(|&x| x == 0.0));
        assert_eq!(b.rank(), 2);
    }
}

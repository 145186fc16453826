//! Tests for RAS spaces, vectors and σ

#[cfg(test)]
mod tests {
    use super::super::{RasCivec, RasDeterminants, RasTask};
    use crate::civec::{CiVector, Civec};
    use crate::determinants::{Determinants, Spin};
    use crate::gamma::{GammaSQ, GammaTree};
    use crate::integrals::random_integrals;
    use crate::sigma::SigmaEngine;
    use approx::assert_abs_diff_eq;
    use rand::{Rng, SeedableRng};
    use std::sync::Arc;

    fn random_ras(det: &Arc<RasDeterminants>, seed: u64) -> RasCivec {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let mut c = RasCivec::new(det.clone());
        for index in 0..det.nblocks() {
            for x in c.block_mut(index).data_mut() {
                *x = rng.gen_range(-1.0..1.0);
            }
        }
        c
    }

    fn flatten(c: &RasCivec) -> Vec<f64> {
        c.iter().map(|(_, _, v)| v).collect()
    }

    #[test]
    fn test_block_enumeration() {
        let tight = RasDeterminants::new([1, 2, 1], 2, 2, 0, 0).unwrap();
        assert_eq!(tight.nblocks(), 1);
        assert_eq!(tight.size(), 4);

        let full = RasDeterminants::new([1, 2, 1], 2, 2, 2, 2).unwrap();
        assert_eq!(full.nblocks(), 16);
        assert_eq!(full.size(), 36);
        assert_eq!(full.determinants().len(), 36);

        let loose = full.expanded(1, 1);
        assert!(Arc::ptr_eq(full.cache(), loose.cache()));
        assert_eq!(loose.size(), 36);
    }

    #[test]
    fn test_invalid_space() {
        assert!(RasDeterminants::new([1, 2, 1], 0, 2, 1, 1).is_err());
        assert!(RasDeterminants::new([1, 2, 1], 5, 2, 1, 1).is_err());
    }

    #[test]
    fn test_element_and_embedding() {
        let ras = RasDeterminants::new([1, 2, 1], 2, 1, 1, 1).unwrap();
        let full = Determinants::new(4, 2, 1).unwrap();
        let c = random_ras(&ras, 4);
        let embedded = c.to_civec(&full);
        for (alpha, beta, value) in c.iter() {
            let ia = full.lexical_a(alpha);
            let ib = full.lexical_b(beta);
            assert_abs_diff_eq!(embedded.element(ia, ib), value);
            assert_abs_diff_eq!(c.element(alpha, beta), value);
        }
        let back = RasCivec::from_civec(ras.clone(), &embedded);
        assert_abs_diff_eq!(back.dot(&c), c.dot(&c), epsilon = 1e-12);
        assert_abs_diff_eq!(embedded.dot(&embedded), c.dot(&c), epsilon = 1e-12);
    }

    #[test]
    fn test_overlap_across_restrictions() {
        let ras = RasDeterminants::new([1, 2, 1], 2, 2, 1, 1).unwrap();
        let loose = ras.expanded(1, 1);
        let full = Determinants::new(4, 2, 2).unwrap();
        let c = random_ras(&ras, 8);
        let wide = RasCivec::from_civec(loose, &c.to_civec(&full));
        assert_abs_diff_eq!(c.overlap(&wide), c.dot(&c), epsilon = 1e-12);
        assert_abs_diff_eq!(wide.overlap(&c), c.dot(&c), epsilon = 1e-12);
    }

    #[test]
    fn test_ras_sigma_matches_fci_sigma() {
        let ints = random_integrals(4, 7);
        let engine = SigmaEngine::new(&ints);
        let ras = RasDeterminants::new([1, 2, 1], 2, 2, 2, 2).unwrap();
        let full = Determinants::new(4, 2, 2).unwrap();
        let c = random_ras(&ras, 3);

        let sigma = engine.ras_sigma(&c).to_civec(&full);
        let reference = engine.sigma(&c.to_civec(&full));
        for (x, y) in sigma.data().iter().zip(reference.data()) {
            assert_abs_diff_eq!(*x, *y, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_ras_sigma_matches_projected_hamiltonian() {
        let ints = random_integrals(5, 21);
        let engine = SigmaEngine::new(&ints);
        let ras = RasDeterminants::new([2, 2, 1], 2, 2, 1, 1).unwrap();
        let hamiltonian = engine.hamiltonian_matrix(&ras.determinants());
        let c = random_ras(&ras, 5);
        let sigma = engine.ras_sigma(&c);
        let reference = &hamiltonian * nalgebra::DVector::from_vec(flatten(&c));
        for (x, y) in flatten(&sigma).iter().zip(reference.iter()) {
            assert_abs_diff_eq!(*x, *y, epsilon = 1e-10);
        }

        let diag = engine.ras_diagonal(&ras);
        for (i, d) in flatten(&diag).iter().enumerate() {
            assert_abs_diff_eq!(*d, hamiltonian[(i, i)], epsilon = 1e-10);
        }
    }

    #[test]
    fn test_ras_sigma_is_symmetric() {
        let ints = random_integrals(5, 2);
        let engine = SigmaEngine::new(&ints);
        let ras = RasDeterminants::new([2, 1, 2], 2, 1, 1, 1).unwrap();
        let a = random_ras(&ras, 1);
        let b = random_ras(&ras, 2);
        assert_abs_diff_eq!(
            a.dot(&engine.ras_sigma(&b)),
            b.dot(&engine.ras_sigma(&a)),
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_ras_spin_matches_full_space() {
        let ras = RasDeterminants::new([1, 2, 1], 2, 2, 2, 2).unwrap();
        let full = Determinants::new(4, 2, 2).unwrap();
        let c = random_ras(&ras, 12);
        let reference: Civec = c.to_civec(&full).spin();
        let spin = c.spin().to_civec(&full);
        for (x, y) in spin.data().iter().zip(reference.data()) {
            assert_abs_diff_eq!(*x, *y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_next_block_lookahead() {
        let det = RasDeterminants::new([1, 2, 1], 2, 2, 2, 2).unwrap();
        let (block, _, _) = det.locate(0b0011, 0b0011).unwrap();
        let base = &det.blocks()[block];
        let task = RasTask::new(0, 0);

        // a†_α a_α: the hole made by the annihilation can be refilled
        let mut refill = GammaTree::new(Arc::new(()));
        refill.insert(Arc::new(()), 0, &[GammaSQ::CreateAlpha, GammaSQ::AnnihilateAlpha]);
        let node = refill.search(&[GammaSQ::AnnihilateAlpha]).unwrap();
        assert!(task
            .next_block(refill.view(node), base, 0, false, Spin::Alpha)
            .is_some());
        // RAS2 annihilation never makes a hole
        let (akey, _) = task
            .next_block(refill.view(node), base, 1, false, Spin::Alpha)
            .unwrap();
        assert_eq!(akey.holes, 0);
        assert_eq!(akey.nele2, 0);

        // a_α a_α: nothing below can fill the hole
        let mut drain = GammaTree::new(Arc::new(()));
        drain.insert(Arc::new(()), 0, &[GammaSQ::AnnihilateAlpha, GammaSQ::AnnihilateAlpha]);
        let node = drain.search(&[GammaSQ::AnnihilateAlpha]).unwrap();
        assert!(task
            .next_block(drain.view(node), base, 0, false, Spin::Alpha)
            .is_none());

        // RAS1 is already full
        assert!(task
            .next_block(drain.view(node), base, 0, true, Spin::Alpha)
            .is_none());
    }

    #[test]
    fn test_next_block_monotone_in_limits() {
        let det = RasDeterminants::new([1, 2, 1], 2, 2, 2, 2).unwrap();
        let mut tree = GammaTree::new(Arc::new(()));
        tree.insert(
            Arc::new(()),
            0,
            &[GammaSQ::CreateBeta, GammaSQ::AnnihilateAlpha, GammaSQ::CreateAlpha],
        );
        tree.insert(Arc::new(()), 0, &[GammaSQ::AnnihilateBeta, GammaSQ::CreateAlpha]);
        let nodes: Vec<usize> = (1..tree.nodes().len()).collect();

        for base in det.blocks() {
            for &node in &nodes {
                let op = tree.branch(node).op().unwrap();
                for orbital in 0..4 {
                    for h in 0..3 {
                        for p in 0..3 {
                            let tight = RasTask::new(h, p).next_block(
                                tree.view(node),
                                base,
                                orbital,
                                op.is_creation(),
                                op.spin(),
                            );
                            if tight.is_none() {
                                continue;
                            }
                            for (h2, p2) in [(h + 1, p), (h, p + 1)] {
                                let loose = RasTask::new(h2, p2).next_block(
                                    tree.view(node),
                                    base,
                                    orbital,
                                    op.is_creation(),
                                    op.spin(),
                                );
                                assert_eq!(loose, tight);
                            }
                        }
                    }
                }
            }
        }
    }
}

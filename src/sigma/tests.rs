//! Tests for the σ builder

#[cfg(test)]
mod tests {
    use super::super::SigmaEngine;
    use crate::civec::Civec;
    use crate::determinants::Determinants;
    use crate::integrals::random_integrals;
    use approx::assert_abs_diff_eq;
    use rand::{Rng, SeedableRng};
    use std::sync::Arc;

    fn random_civec(det: &Arc<Determinants>, seed: u64) -> Civec {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let data = (0..det.size()).map(|_| rng.gen_range(-1.0..1.0)).collect();
        Civec::from_data(det.clone(), data)
    }

    #[test]
    fn test_sigma_is_symmetric() {
        let ints = random_integrals(5, 11);
        let engine = SigmaEngine::new(&ints);
        let det = Determinants::new(5, 3, 2).unwrap();
        let a = random_civec(&det, 1);
        let b = random_civec(&det, 2);
        let ab = a.dot(&engine.sigma(&b));
        let ba = b.dot(&engine.sigma(&a));
        assert_abs_diff_eq!(ab, ba, epsilon = 1e-10);
    }

    #[test]
    fn test_diagonal_consistency() {
        let ints = random_integrals(4, 5);
        let engine = SigmaEngine::new(&ints);
        let det = Determinants::new(4, 2, 2).unwrap();
        let diag = engine.diagonal(&det);
        for ia in 0..det.lena() {
            for ib in 0..det.lenb() {
                let unit = Civec::unit(det.clone(), ia, ib);
                let sigma = engine.sigma(&unit);
                assert_abs_diff_eq!(sigma.element(ia, ib), diag.element(ia, ib), epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_sigma_matches_explicit_hamiltonian() {
        let ints = random_integrals(4, 3);
        let engine = SigmaEngine::new(&ints);
        for (nelea, neleb) in [(2, 2), (3, 1), (2, 0), (1, 1)] {
            let det = Determinants::new(4, nelea, neleb).unwrap();
            let hamiltonian = engine.full_hamiltonian(&det);
            let c = random_civec(&det, 9);
            let sigma = engine.sigma(&c);
            let reference = &hamiltonian * nalgebra::DVector::from_column_slice(c.data());
            for (x, y) in sigma.data().iter().zip(reference.iter()) {
                assert_abs_diff_eq!(*x, *y, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_sigma_accumulates() {
        let ints = random_integrals(3, 8);
        let engine = SigmaEngine::new(&ints);
        let det = Determinants::new(3, 2, 1).unwrap();
        let c = random_civec(&det, 4);
        let once = engine.sigma(&c);
        let mut twice = once.clone();
        engine.compute(&c, &mut twice);
        for (x, y) in twice.data().iter().zip(once.data()) {
            assert_abs_diff_eq!(*x, 2.0 * y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_dedicated_pool_gives_same_sigma() {
        let ints = random_integrals(4, 21);
        let det = Determinants::new(4, 2, 1).unwrap();
        let c = random_civec(&det, 6);
        let shared = SigmaEngine::new(&ints).sigma(&c);
        let pool = crate::task_queue::build_pool(2).unwrap();
        let dedicated = SigmaEngine::new(&ints).with_pool(pool).sigma(&c);
        for (x, y) in shared.data().iter().zip(dedicated.data()) {
            assert_abs_diff_eq!(*x, *y, epsilon = 1e-12);
        }
    }

    #[test]
    #[should_panic(expected = "different numbers of orbitals")]
    fn test_mismatched_orbitals_panic() {
        let engine = SigmaEngine::new(&random_integrals(3, 1));
        let det = Determinants::new(4, 1, 1).unwrap();
        engine.sigma(&Civec::new(det));
    }
}

//! Tests for the Davidson diagonalizer

#[cfg(test)]
mod tests {
    use super::super::{sorted_symmetric_eigen, DavidsonDiag};
    use crate::civec::Civec;
    use crate::determinants::Determinants;
    use crate::integrals::random_integrals;
    use crate::sigma::SigmaEngine;
    use approx::assert_abs_diff_eq;
    use nalgebra::DMatrix;

    #[test]
    fn test_sorted_eigen() {
        let m = DMatrix::from_row_slice(3, 3, &[3.0, 0.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, 2.0]);
        let (values, vectors) = sorted_symmetric_eigen(m);
        assert_eq!(values.as_slice(), &[-1.0, 2.0, 3.0]);
        assert_abs_diff_eq!(vectors[(1, 0)].abs(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_converges_to_lowest_roots() {
        let ints = random_integrals(4, 17);
        let engine = SigmaEngine::new(&ints);
        let det = Determinants::new(4, 2, 2).unwrap();
        let (exact, _) = sorted_symmetric_eigen(engine.full_hamiltonian(&det));
        let diag = engine.diagonal(&det);

        let nstate = 2;
        let mut davidson = DavidsonDiag::new(nstate, 6);
        let mut order: Vec<usize> = (0..det.size()).collect();
        order.sort_by(|&a, &b| diag.data()[a].total_cmp(&diag.data()[b]));
        let mut trial: Vec<Civec> = order[..nstate]
            .iter()
            .map(|&i| Civec::unit(det.clone(), i / det.lenb(), i % det.lenb()))
            .collect();

        let mut energies = Vec::new();
        for _ in 0..60 {
            let sigma: Vec<Civec> = trial.iter().map(|c| engine.sigma(c)).collect();
            energies = davidson.compute(trial, sigma);

            let residuals = davidson.residual();
            if residuals.iter().all(|r| r.rms() < 1e-10) {
                break;
            }
            trial = Vec::new();
            for (state, r) in residuals.into_iter().enumerate() {
                if r.rms() < 1e-10 {
                    continue;
                }
                let mut update = r.clone();
                for (u, d) in update.data_mut().iter_mut().zip(diag.data()) {
                    *u /= (energies[state] - d).min(-0.1);
                }
                if davidson.orthogonalize(&mut update, &trial).is_some() {
                    trial.push(update);
                }
            }
            if trial.is_empty() {
                break;
            }
        }

        for state in 0..nstate {
            assert_abs_diff_eq!(energies[state], exact[state], epsilon = 1e-8);
        }
        let vectors = davidson.civec();
        assert_abs_diff_eq!(vectors[0].dot(&vectors[1]), 0.0, epsilon = 1e-10);
    }
}

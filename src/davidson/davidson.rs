//! Davidson subspace diagonalization over CI vectors
//!
//! The caller supplies orthonormal trial vectors together with their σ
//! vectors; the subspace Hamiltonian is diagonalized and Ritz vectors and
//! residuals are formed on request.

extern crate nalgebra as na;

use crate::civec::CiVector;
use na::{DMatrix, DVector};
use std::cmp::Ordering;
use tracing::debug;

/// Eigen-decomposition with eigenvalues in ascending order
pub fn sorted_symmetric_eigen(matrix: DMatrix<f64>) -> (DVector<f64>, DMatrix<f64>) {
    let eig = matrix.symmetric_eigen();
    let mut indices: Vec<usize> = (0..eig.eigenvalues.len()).collect();
    indices.sort_by(|&a, &b| {
        eig.eigenvalues[a]
            .partial_cmp(&eig.eigenvalues[b])
            .unwrap_or(Ordering::Equal)
    });
    let eigenvalues = DVector::from_fn(indices.len(), |i, _| eig.eigenvalues[indices[i]]);
    let eigenvectors = eig.eigenvectors.select_columns(&indices);
    (eigenvalues, eigenvectors)
}

pub struct DavidsonDiag<V: CiVector> {
    nstate: usize,
    max_subspace: usize,
    basis: Vec<V>,
    sigmas: Vec<V>,
    eigenvalues: DVector<f64>,
    eigenvectors: DMatrix<f64>,
}

impl<V: CiVector> DavidsonDiag<V> {
    /// The subspace holds at least two vectors per state so a collapse always
    /// leaves room for one new vector per state.
    pub fn new(nstate: usize, max_subspace: usize) -> Self {
        DavidsonDiag {
            nstate,
            max_subspace: max_subspace.max(2 * nstate),
            basis: Vec::new(),
            sigmas: Vec::new(),
            eigenvalues: DVector::zeros(0),
            eigenvectors: DMatrix::zeros(0, 0),
        }
    }

    pub fn nstate(&self) -> usize {
        self.nstate
    }

    /// Current subspace dimension
    pub fn size(&self) -> usize {
        self.basis.len()
    }

    /// Add orthonormal trial vectors and their σ; returns the lowest `nstate`
    /// subspace eigenvalues
    pub fn compute(&mut self, cc: Vec<V>, sigma: Vec<V>) -> Vec<f64> {
        assert_eq!(cc.len(), sigma.len(), "every trial vector needs its sigma vector");
        if !self.basis.is_empty() && self.basis.len() + cc.len() > self.max_subspace {
            self.collapse();
        }
        self.basis.extend(cc);
        self.sigmas.extend(sigma);
        assert!(
            self.basis.len() >= self.nstate,
            "subspace of dimension {} cannot hold {} states",
            self.basis.len(),
            self.nstate
        );

        let n = self.basis.len();
        let mut hsub = DMatrix::from_fn(n, n, |i, j| self.basis[i].dot(&self.sigmas[j]));
        hsub = 0.5 * (&hsub + hsub.transpose());
        let (eigenvalues, eigenvectors) = sorted_symmetric_eigen(hsub);
        self.eigenvalues = eigenvalues;
        self.eigenvectors = eigenvectors;
        debug!("Davidson subspace dimension {}", n);

        self.eigenvalues.iter().take(self.nstate).copied().collect()
    }

    fn combine(&self, vectors: &[V], state: usize) -> V {
        let mut out = vectors[0].zeros_like();
        for (i, v) in vectors.iter().enumerate() {
            out.ax_plus_y(self.eigenvectors[(i, state)], v);
        }
        out
    }

    /// Replace the subspace by the current Ritz vectors
    fn collapse(&mut self) {
        let basis: Vec<V> = (0..self.nstate).map(|s| self.combine(&self.basis, s)).collect();
        let sigmas: Vec<V> = (0..self.nstate).map(|s| self.combine(&self.sigmas, s)).collect();
        debug!("Collapsing Davidson subspace from {} to {}", self.basis.len(), self.nstate);
        self.basis = basis;
        self.sigmas = sigmas;
    }

    /// Ritz vectors of the lowest `nstate` roots
    pub fn civec(&self) -> Vec<V> {
        (0..self.nstate).map(|s| self.combine(&self.basis, s)).collect()
    }

    /// r_k = (H - E_k) x_k for the lowest `nstate` roots
    pub fn residual(&self) -> Vec<V> {
        (0..self.nstate)
            .map(|s| {
                let mut r = self.combine(&self.sigmas, s);
                r.ax_plus_y(-self.eigenvalues[s], &self.combine(&self.basis, s));
                r
            })
            .collect()
    }

    /// Orthonormalise `vector` against the subspace and `extra`
    ///
    /// Returns the norm left after projection relative to the input norm,
    /// or `None` when the vector is (numerically) inside the span.
    pub fn orthogonalize(&self, vector: &mut V, extra: &[V]) -> Option<f64> {
        vector.normalize();
        for _ in 0..2 {
            for b in self.basis.iter().chain(extra) {
                vector.project_out(b);
            }
        }
        let norm = vector.normalize();
        if norm < 1.0e-8 {
            None
        } else {
            Some(norm)
        }
    }
}

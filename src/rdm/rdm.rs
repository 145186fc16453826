//! Dense N-particle density tensors over active orbitals

extern crate nalgebra as na;

use crate::davidson::sorted_symmetric_eigen;
use na::DMatrix;

/// Spin-summed N-particle reduced density matrix
///
/// Indices come in (creation, annihilation) pairs, `(i, j, k, l, ...)`, and
/// are stored with the first index varying slowest.
#[derive(Debug, Clone, PartialEq)]
pub struct Rdm<const N: usize> {
    norb: usize,
    data: Vec<f64>,
}

pub type Rdm1 = Rdm<1>;
pub type Rdm2 = Rdm<2>;
pub type Rdm3 = Rdm<3>;
pub type Rdm4 = Rdm<4>;

impl<const N: usize> Rdm<N> {
    pub fn new(norb: usize) -> Self {
        Rdm {
            norb,
            data: vec![0.0; norb.pow(2 * N as u32)],
        }
    }

    pub fn from_data(norb: usize, data: Vec<f64>) -> Self {
        assert_eq!(
            data.len(),
            norb.pow(2 * N as u32),
            "wrong buffer length for a {}-particle RDM over {} orbitals",
            N,
            norb
        );
        Rdm { norb, data }
    }

    pub fn norb(&self) -> usize {
        self.norb
    }

    pub fn rank(&self) -> usize {
        N
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    fn offset(&self, index: &[usize]) -> usize {
        assert_eq!(index.len(), 2 * N, "a {}-particle RDM takes {} indices", N, 2 * N);
        index.iter().fold(0, |acc, &i| acc * self.norb + i)
    }

    pub fn element(&self, index: &[usize]) -> f64 {
        self.data[self.offset(index)]
    }

    pub fn element_mut(&mut self, index: &[usize]) -> &mut f64 {
        let offset = self.offset(index);
        &mut self.data[offset]
    }

    pub fn zero(&mut self) {
        self.data.iter_mut().for_each(|x| *x = 0.0);
    }

    pub fn scale(&mut self, factor: f64) {
        self.data.iter_mut().for_each(|x| *x *= factor);
    }

    pub fn ax_plus_y(&mut self, a: f64, other: &Rdm<N>) {
        assert_eq!(self.norb, other.norb, "RDMs over different numbers of orbitals");
        for (y, x) in self.data.iter_mut().zip(&other.data) {
            *y += a * x;
        }
    }

    /// Largest absolute difference to another RDM
    pub fn max_difference(&self, other: &Rdm<N>) -> f64 {
        self.data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }

    /// Rotate every index: Γ'(p, q, ...) = Σ C(i, p) C(j, q) ... Γ(i, j, ...)
    pub fn transform(&mut self, coeff: &DMatrix<f64>) {
        let n = self.norb;
        assert!(
            coeff.nrows() == n && coeff.ncols() == n,
            "orbital rotation must be {} x {}",
            n,
            n
        );
        for axis in 0..2 * N {
            let stride = n.pow((2 * N - 1 - axis) as u32);
            let mut rotated = vec![0.0; self.data.len()];
            for (flat, &value) in self.data.iter().enumerate() {
                if value == 0.0 {
                    continue;
                }
                let p = (flat / stride) % n;
                let base = flat - p * stride;
                for q in 0..n {
                    rotated[base + q * stride] += coeff[(p, q)] * value;
                }
            }
            self.data = rotated;
        }
    }
}

impl Rdm<1> {
    pub fn to_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_row_slice(self.norb, self.norb, &self.data)
    }

    pub fn from_matrix(matrix: &DMatrix<f64>) -> Self {
        let n = matrix.nrows();
        Rdm {
            norb: n,
            data: (0..n * n).map(|ij| matrix[(ij / n, ij % n)]).collect(),
        }
    }

    /// Occupation numbers in descending order and the orbitals as columns
    pub fn natural_orbitals(&self) -> (Vec<f64>, DMatrix<f64>) {
        let matrix = self.to_matrix();
        let symmetric = (&matrix + matrix.transpose()) * 0.5;
        let (values, vectors) = sorted_symmetric_eigen(symmetric);
        let n = self.norb;
        let occupations = values.iter().rev().copied().collect();
        let orbitals = DMatrix::from_fn(n, n, |i, j| vectors[(i, n - 1 - j)]);
        (occupations, orbitals)
    }
}

//! Dense CI coefficient vector over a determinant space

use super::vector::{precondition_slice, CiVector};
use crate::determinants::Determinants;
use std::sync::Arc;
use tracing::info;

/// CI coefficients indexed by (alpha string, beta string)
///
/// The coefficient of determinant (ia, ib) is stored at `ia * lenb + ib`.
#[derive(Debug, Clone)]
pub struct Civec {
    det: Arc<Determinants>,
    data: Vec<f64>,
}

impl Civec {
    /// Zero vector
    pub fn new(det: Arc<Determinants>) -> Self {
        let size = det.size();
        Civec {
            det,
            data: vec![0.0; size],
        }
    }

    pub fn from_data(det: Arc<Determinants>, data: Vec<f64>) -> Self {
        assert_eq!(
            det.size(),
            data.len(),
            "buffer length does not match the determinant space"
        );
        Civec { det, data }
    }

    /// Unit vector on determinant (ia, ib)
    pub fn unit(det: Arc<Determinants>, ia: usize, ib: usize) -> Self {
        let mut out = Self::new(det);
        *out.element_mut(ia, ib) = 1.0;
        out
    }

    pub fn det(&self) -> &Arc<Determinants> {
        &self.det
    }

    /// Re-point to another space with identical electron counts
    pub fn set_det(&mut self, det: Arc<Determinants>) {
        assert!(
            self.det.is_same(&det),
            "a CI vector can only be re-pointed to an equivalent determinant space"
        );
        self.det = det;
    }

    pub fn lena(&self) -> usize {
        self.det.lena()
    }

    pub fn lenb(&self) -> usize {
        self.det.lenb()
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    pub fn element(&self, ia: usize, ib: usize) -> f64 {
        self.data[ia * self.lenb() + ib]
    }

    pub fn element_mut(&mut self, ia: usize, ib: usize) -> &mut f64 {
        let lenb = self.lenb();
        &mut self.data[ia * lenb + ib]
    }

    /// Row of beta coefficients for one alpha string
    pub fn row(&self, ia: usize) -> &[f64] {
        let lenb = self.lenb();
        &self.data[ia * lenb..(ia + 1) * lenb]
    }

    pub fn zero(&mut self) {
        self.data.iter_mut().for_each(|x| *x = 0.0);
    }

    fn check_space(&self, other: &Civec) {
        assert!(
            self.det.is_same(&other.det),
            "CI vectors live in different determinant spaces"
        );
    }

    pub fn dot(&self, other: &Civec) -> f64 {
        self.check_space(other);
        self.data.iter().zip(&other.data).map(|(a, b)| a * b).sum()
    }

    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Root-mean-square of the coefficients
    pub fn rms(&self) -> f64 {
        if self.data.is_empty() {
            0.0
        } else {
            self.norm() / (self.data.len() as f64).sqrt()
        }
    }

    pub fn scale(&mut self, factor: f64) {
        self.data.iter_mut().for_each(|x| *x *= factor);
    }

    /// self += a * other
    pub fn ax_plus_y(&mut self, a: f64, other: &Civec) {
        self.check_space(other);
        self.data
            .iter_mut()
            .zip(&other.data)
            .for_each(|(y, x)| *y += a * x);
    }

    /// Normalise in place; returns the norm before scaling
    pub fn normalize(&mut self) -> f64 {
        let norm = self.norm();
        let rescale = if norm * norm > 1.0e-60 { 1.0 / norm } else { 0.0 };
        self.scale(rescale);
        norm
    }

    /// Remove the component along a normalised vector
    pub fn project_out(&mut self, other: &Civec) {
        let overlap = self.dot(other);
        self.ax_plus_y(-overlap, other);
    }

    /// Log determinants whose coefficient exceeds `thresh` in magnitude
    pub fn print(&self, thresh: f64) {
        let mut entries: Vec<(f64, usize, usize)> = Vec::new();
        for ia in 0..self.lena() {
            for ib in 0..self.lenb() {
                let value = self.element(ia, ib);
                if value.abs() > thresh {
                    entries.push((value, ia, ib));
                }
            }
        }
        entries.sort_by(|a, b| b.0.abs().total_cmp(&a.0.abs()));
        for (value, ia, ib) in entries {
            info!(
                "       {}  {:>14.8}",
                self.det
                    .print_bit(self.det.string_bits_a(ia), self.det.string_bits_b(ib)),
                value
            );
        }
    }
}

impl CiVector for Civec {
    fn zeros_like(&self) -> Self {
        Civec::new(self.det.clone())
    }

    fn dot(&self, other: &Self) -> f64 {
        Civec::dot(self, other)
    }

    fn ax_plus_y(&mut self, a: f64, other: &Self) {
        Civec::ax_plus_y(self, a, other)
    }

    fn scale(&mut self, factor: f64) {
        Civec::scale(self, factor)
    }

    fn ndet(&self) -> usize {
        self.data.len()
    }

    fn precondition(&mut self, energy: f64, diag: &Self) {
        self.check_space(diag);
        precondition_slice(&mut self.data, energy, &diag.data);
    }

    fn spin(&self) -> Self {
        Civec::spin(self)
    }

    fn spin_range(&self) -> (usize, usize) {
        (self.det.nspin(), self.det.nelea() + self.det.neleb())
    }
}

//! A set of CI vectors sharing one determinant space

use super::Civec;
use crate::determinants::Determinants;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Dvec {
    det: Arc<Determinants>,
    dvec: Vec<Civec>,
}

impl Dvec {
    pub fn new(det: Arc<Determinants>, nstate: usize) -> Self {
        let dvec = (0..nstate).map(|_| Civec::new(det.clone())).collect();
        Dvec { det, dvec }
    }

    pub fn from_civecs(civecs: Vec<Civec>) -> Self {
        assert!(!civecs.is_empty(), "a Dvec needs at least one state");
        let det = civecs[0].det().clone();
        assert!(
            civecs.iter().all(|c| c.det().is_same(&det)),
            "all states of a Dvec must share a determinant space"
        );
        Dvec { det, dvec: civecs }
    }

    pub fn det(&self) -> &Arc<Determinants> {
        &self.det
    }

    /// Re-point every state to an equivalent determinant space
    pub fn set_det(&mut self, det: Arc<Determinants>) {
        for civec in &mut self.dvec {
            civec.set_det(det.clone());
        }
        self.det = det;
    }

    pub fn ij(&self) -> usize {
        self.dvec.len()
    }

    pub fn data(&self, i: usize) -> &Civec {
        &self.dvec[i]
    }

    pub fn data_mut(&mut self, i: usize) -> &mut Civec {
        &mut self.dvec[i]
    }

    pub fn civecs(&self) -> &[Civec] {
        &self.dvec
    }

    pub fn civecs_mut(&mut self) -> &mut [Civec] {
        &mut self.dvec
    }

    pub fn into_civecs(self) -> Vec<Civec> {
        self.dvec
    }

    pub fn zero(&mut self) {
        self.dvec.iter_mut().for_each(Civec::zero);
    }

    pub fn scale(&mut self, factor: f64) {
        self.dvec.iter_mut().for_each(|c| c.scale(factor));
    }

    pub fn ax_plus_y(&mut self, a: f64, other: &Dvec) {
        assert_eq!(self.ij(), other.ij(), "Dvecs hold different numbers of states");
        for (y, x) in self.dvec.iter_mut().zip(&other.dvec) {
            y.ax_plus_y(a, x);
        }
    }

    /// Sum of the state-wise dot products
    pub fn dot(&self, other: &Dvec) -> f64 {
        assert_eq!(self.ij(), other.ij(), "Dvecs hold different numbers of states");
        self.dvec.iter().zip(&other.dvec).map(|(a, b)| a.dot(b)).sum()
    }

    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }
}

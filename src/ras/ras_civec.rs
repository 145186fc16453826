//! Block-sparse CI vectors over RAS determinant spaces

use super::ras_determinants::RasDeterminants;
use crate::civec::{precondition_slice, s2_terms, CiVector, Civec};
use crate::determinants::Determinants;
use rayon::prelude::*;
use std::sync::Arc;

/// Coefficients of one (alpha space, beta space) block, `ia * lenb + ib`
#[derive(Debug, Clone)]
pub struct RasBlock {
    lena: usize,
    lenb: usize,
    data: Vec<f64>,
}

impl RasBlock {
    pub fn zeros(lena: usize, lenb: usize) -> Self {
        RasBlock {
            lena,
            lenb,
            data: vec![0.0; lena * lenb],
        }
    }

    pub fn lena(&self) -> usize {
        self.lena
    }

    pub fn lenb(&self) -> usize {
        self.lenb
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn element(&self, ia: usize, ib: usize) -> f64 {
        self.data[ia * self.lenb + ib]
    }

    pub fn element_mut(&mut self, ia: usize, ib: usize) -> &mut f64 {
        &mut self.data[ia * self.lenb + ib]
    }
}

/// A CI vector whose blocks may be absent (treated as zero)
#[derive(Debug, Clone)]
pub struct RasCivec {
    det: Arc<RasDeterminants>,
    blocks: Vec<Option<RasBlock>>,
}

impl RasCivec {
    /// Zero vector with every block allocated
    pub fn new(det: Arc<RasDeterminants>) -> Self {
        let blocks = det
            .blocks()
            .iter()
            .map(|b| Some(RasBlock::zeros(b.lena(), b.lenb())))
            .collect();
        RasCivec { det, blocks }
    }

    /// Vector with every block null
    pub fn empty(det: Arc<RasDeterminants>) -> Self {
        let blocks = vec![None; det.nblocks()];
        RasCivec { det, blocks }
    }

    /// Vector from coefficients in storage order
    pub fn from_coefficients(det: Arc<RasDeterminants>, data: &[f64]) -> Self {
        assert_eq!(data.len(), det.size(), "coefficient list does not match the RAS space");
        let mut out = RasCivec::new(det);
        for (info, block) in out.det.blocks().iter().zip(out.blocks.iter_mut()) {
            if let Some(block) = block {
                block.data.copy_from_slice(&data[info.offset..info.offset + info.size()]);
            }
        }
        out
    }

    /// Coefficients in storage order, zero for null blocks
    pub fn coefficients(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.det.size()];
        for (info, block) in self.det.blocks().iter().zip(&self.blocks) {
            if let Some(block) = block {
                out[info.offset..info.offset + info.size()].copy_from_slice(&block.data);
            }
        }
        out
    }

    pub fn det(&self) -> &Arc<RasDeterminants> {
        &self.det
    }

    pub fn blocks(&self) -> &[Option<RasBlock>] {
        &self.blocks
    }

    pub fn block(&self, index: usize) -> Option<&RasBlock> {
        self.blocks[index].as_ref()
    }

    /// Mutable access to a block, allocating it if it was null
    pub fn block_mut(&mut self, index: usize) -> &mut RasBlock {
        let info = &self.det.blocks()[index];
        let (lena, lenb) = (info.lena(), info.lenb());
        self.blocks[index].get_or_insert_with(|| RasBlock::zeros(lena, lenb))
    }

    /// Number of allocated blocks
    pub fn nallocated(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_some()).count()
    }

    /// Coefficient of a determinant; zero outside the space or in null blocks
    pub fn element(&self, alpha: u64, beta: u64) -> f64 {
        match self.det.locate(alpha, beta) {
            Some((block, ia, ib)) => self.blocks[block].as_ref().map_or(0.0, |b| b.element(ia, ib)),
            None => 0.0,
        }
    }

    /// Add to a coefficient; returns false if the determinant is not in the space
    pub fn add(&mut self, alpha: u64, beta: u64, value: f64) -> bool {
        match self.det.locate(alpha, beta) {
            Some((block, ia, ib)) => {
                *self.block_mut(block).element_mut(ia, ib) += value;
                true
            }
            None => false,
        }
    }

    /// (alpha, beta, coefficient) over the allocated blocks
    pub fn iter(&self) -> impl Iterator<Item = (u64, u64, f64)> + '_ {
        self.det
            .blocks()
            .iter()
            .zip(&self.blocks)
            .filter_map(|(info, block)| block.as_ref().map(|b| (info, b)))
            .flat_map(|(info, block)| {
                info.alpha.strings().iter().enumerate().flat_map(move |(ia, &alpha)| {
                    info.beta
                        .strings()
                        .iter()
                        .enumerate()
                        .map(move |(ib, &beta)| (alpha, beta, block.element(ia, ib)))
                })
            })
    }

    fn check_space(&self, other: &RasCivec) {
        assert!(
            self.det.is_same(&other.det),
            "RAS vectors live in different determinant spaces"
        );
    }

    /// Overlap with a vector over the same electrons whose restrictions may differ
    pub fn overlap(&self, other: &RasCivec) -> f64 {
        assert!(
            self.det.nelea() == other.det.nelea() && self.det.neleb() == other.det.neleb(),
            "overlap between RAS vectors with different electron counts"
        );
        self.det
            .blocks()
            .iter()
            .zip(&self.blocks)
            .filter_map(|(info, block)| {
                let block = block.as_ref()?;
                let index = other.det.block_index(info.alpha.key(), info.beta.key())?;
                let partner = other.block(index)?;
                Some(block.data.iter().zip(&partner.data).map(|(x, y)| x * y).sum::<f64>())
            })
            .sum()
    }

    /// Embed into the full determinant space
    pub fn to_civec(&self, det: &Arc<Determinants>) -> Civec {
        let mut out = Civec::new(det.clone());
        for (alpha, beta, value) in self.iter() {
            *out.element_mut(det.lexical_a(alpha), det.lexical_b(beta)) = value;
        }
        out
    }

    /// Project a full-space vector onto this RAS space
    pub fn from_civec(det: Arc<RasDeterminants>, civec: &Civec) -> Self {
        let fdet = civec.det().clone();
        let mut out = RasCivec::new(det);
        for ia in 0..fdet.lena() {
            for ib in 0..fdet.lenb() {
                let value = civec.element(ia, ib);
                if value != 0.0 {
                    out.add(fdet.string_bits_a(ia), fdet.string_bits_b(ib), value);
                }
            }
        }
        out
    }

    /// Log determinants whose coefficient exceeds `thresh` in magnitude
    pub fn print(&self, thresh: f64) {
        let printer = Determinants::with_counts(self.det.norb(), 0, 0);
        let mut entries: Vec<(u64, u64, f64)> =
            self.iter().filter(|e| e.2.abs() > thresh).collect();
        entries.sort_by(|a, b| b.2.abs().total_cmp(&a.2.abs()));
        for (alpha, beta, value) in entries {
            tracing::info!("       {}  {:>14.8}", printer.print_bit(alpha, beta), value);
        }
    }
}

impl CiVector for RasCivec {
    fn zeros_like(&self) -> Self {
        RasCivec::new(self.det.clone())
    }

    fn dot(&self, other: &Self) -> f64 {
        self.check_space(other);
        self.blocks
            .iter()
            .zip(&other.blocks)
            .map(|(a, b)| match (a, b) {
                (Some(a), Some(b)) => a.data.iter().zip(&b.data).map(|(x, y)| x * y).sum(),
                _ => 0.0,
            })
            .sum()
    }

    fn ax_plus_y(&mut self, a: f64, other: &Self) {
        self.check_space(other);
        for (index, source) in other.blocks.iter().enumerate() {
            if let Some(source) = source {
                let target = self.block_mut(index);
                for (y, x) in target.data.iter_mut().zip(&source.data) {
                    *y += a * x;
                }
            }
        }
    }

    fn scale(&mut self, factor: f64) {
        for block in self.blocks.iter_mut().flatten() {
            block.data.iter_mut().for_each(|x| *x *= factor);
        }
    }

    fn ndet(&self) -> usize {
        self.det.size()
    }

    fn precondition(&mut self, energy: f64, diag: &Self) {
        self.check_space(diag);
        for (block, d) in self.blocks.iter_mut().zip(&diag.blocks) {
            if let (Some(block), Some(d)) = (block, d) {
                precondition_slice(&mut block.data, energy, &d.data);
            }
        }
    }

    fn spin(&self) -> Self {
        let norb = self.det.norb();
        let mut out = RasCivec::new(self.det.clone());
        out.blocks
            .par_iter_mut()
            .zip(self.det.blocks().par_iter())
            .for_each(|(block, info)| {
                let Some(block) = block else { return };
                for (ia, &alpha) in info.alpha.strings().iter().enumerate() {
                    for (ib, &beta) in info.beta.strings().iter().enumerate() {
                        // S² conserves spatial occupations, so every term stays in the space
                        *block.element_mut(ia, ib) = s2_terms(norb, alpha, beta)
                            .into_iter()
                            .map(|(a, b, f)| f * self.element(a, b))
                            .sum();
                    }
                }
            });
        out
    }

    fn spin_range(&self) -> (usize, usize) {
        (self.det.nspin(), self.det.nelea() + self.det.neleb())
    }
}

/// A set of RAS CI vectors sharing one space
#[derive(Debug, Clone)]
pub struct RasDvec {
    det: Arc<RasDeterminants>,
    dvec: Vec<RasCivec>,
}

impl RasDvec {
    pub fn new(det: Arc<RasDeterminants>, nstate: usize) -> Self {
        let dvec = (0..nstate).map(|_| RasCivec::new(det.clone())).collect();
        RasDvec { det, dvec }
    }

    pub fn from_civecs(civecs: Vec<RasCivec>) -> Self {
        assert!(!civecs.is_empty(), "a RasDvec needs at least one state");
        let det = civecs[0].det().clone();
        assert!(
            civecs.iter().all(|c| c.det().is_same(&det)),
            "all states of a RasDvec must share a determinant space"
        );
        RasDvec { det, dvec: civecs }
    }

    pub fn det(&self) -> &Arc<RasDeterminants> {
        &self.det
    }

    pub fn ij(&self) -> usize {
        self.dvec.len()
    }

    pub fn data(&self, i: usize) -> &RasCivec {
        &self.dvec[i]
    }

    pub fn data_mut(&mut self, i: usize) -> &mut RasCivec {
        &mut self.dvec[i]
    }

    pub fn civecs(&self) -> &[RasCivec] {
        &self.dvec
    }

    pub fn into_civecs(self) -> Vec<RasCivec> {
        self.dvec
    }
}

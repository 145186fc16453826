//! Full determinant space for a fixed (norb, nelea, neleb)

use super::string_space::{sign as string_sign, DetMap, StringLink, StringSpace};
use super::Spin;
use color_eyre::eyre::{bail, Result};
use std::sync::Arc;

/// Determinant space: every pair of an alpha string and a beta string
///
/// A determinant is a†(α1)…a†(αn) a†(β1)…a†(βm)|0> with ascending orbitals in
/// each spin block. The CI coefficient of (ia, ib) lives at `ia * lenb + ib`.
#[derive(Debug, Clone)]
pub struct Determinants {
    norb: usize,
    nelea: usize,
    neleb: usize,
    alpha: Arc<StringSpace>,
    beta: Arc<StringSpace>,
}

impl Determinants {
    /// Determinant space for a CI calculation
    ///
    /// Fails for non-positive alpha counts, negative beta counts or more
    /// electrons of either spin than orbitals.
    pub fn new(norb: usize, nelea: i64, neleb: i64) -> Result<Arc<Self>> {
        if nelea <= 0 || neleb < 0 {
            bail!(
                "Invalid electron count for a determinant space: nelea = {}, neleb = {}",
                nelea,
                neleb
            );
        }
        if nelea as usize > norb || neleb as usize > norb {
            bail!(
                "More electrons than orbitals: nelea = {}, neleb = {}, norb = {}",
                nelea,
                neleb,
                norb
            );
        }
        if norb > 64 {
            bail!("At most 64 active orbitals are supported (norb = {})", norb);
        }
        Ok(Self::with_counts(norb, nelea as usize, neleb as usize))
    }

    /// Space with arbitrary in-range counts, including empty spin channels
    ///
    /// Used for intermediates of creation/annihilation strings.
    pub fn with_counts(norb: usize, nelea: usize, neleb: usize) -> Arc<Self> {
        let alpha = Arc::new(StringSpace::new(norb, nelea));
        let beta = if nelea == neleb {
            alpha.clone()
        } else {
            Arc::new(StringSpace::new(norb, neleb))
        };
        Arc::new(Determinants {
            norb,
            nelea,
            neleb,
            alpha,
            beta,
        })
    }

    pub fn norb(&self) -> usize {
        self.norb
    }

    pub fn nelea(&self) -> usize {
        self.nelea
    }

    pub fn neleb(&self) -> usize {
        self.neleb
    }

    /// 2S of the high-spin component (nelea - neleb)
    pub fn nspin(&self) -> usize {
        self.nelea - self.neleb
    }

    pub fn lena(&self) -> usize {
        self.alpha.len()
    }

    pub fn lenb(&self) -> usize {
        self.beta.len()
    }

    pub fn size(&self) -> usize {
        self.lena() * self.lenb()
    }

    pub fn space(&self, spin: Spin) -> &Arc<StringSpace> {
        match spin {
            Spin::Alpha => &self.alpha,
            Spin::Beta => &self.beta,
        }
    }

    pub fn string_bits_a(&self, index: usize) -> u64 {
        self.alpha.string(index)
    }

    pub fn string_bits_b(&self, index: usize) -> u64 {
        self.beta.string(index)
    }

    pub fn lexical(&self, spin: Spin, bits: u64) -> usize {
        self.space(spin).lexical(bits)
    }

    pub fn lexical_a(&self, bits: u64) -> usize {
        self.alpha.lexical(bits)
    }

    pub fn lexical_b(&self, bits: u64) -> usize {
        self.beta.lexical(bits)
    }

    /// Parity of the occupied orbitals strictly between i and j
    pub fn sign(bits: u64, i: usize, j: usize) -> f64 {
        string_sign(bits, i, j)
    }

    pub fn phi_a(&self, ij: usize) -> &[DetMap] {
        self.alpha.phi(ij)
    }

    pub fn phi_b(&self, ij: usize) -> &[DetMap] {
        self.beta.phi(ij)
    }

    pub fn links_a(&self, source: usize) -> &[StringLink] {
        self.alpha.links(source)
    }

    pub fn links_b(&self, source: usize) -> &[StringLink] {
        self.beta.links(source)
    }

    /// Two spaces describe the same determinants
    pub fn is_same(&self, other: &Determinants) -> bool {
        self.norb == other.norb && self.nelea == other.nelea && self.neleb == other.neleb
    }

    /// Space after changing the electron count of one spin by `delta`
    pub fn neighbour(&self, spin: Spin, delta: i64) -> Option<Arc<Determinants>> {
        let (na, nb) = match spin {
            Spin::Alpha => (self.nelea as i64 + delta, self.neleb as i64),
            Spin::Beta => (self.nelea as i64, self.neleb as i64 + delta),
        };
        if na < 0 || nb < 0 || na as usize > self.norb || nb as usize > self.norb {
            return None;
        }
        Some(Self::with_counts(self.norb, na as usize, nb as usize))
    }

    /// Render a determinant in `2ab.` occupation notation
    pub fn print_bit(&self, alpha: u64, beta: u64) -> String {
        (0..self.norb)
            .map(|o| {
                let a = alpha & (1u64 << o) != 0;
                let b = beta & (1u64 << o) != 0;
                match (a, b) {
                    (true, true) => '2',
                    (true, false) => 'a',
                    (false, true) => 'b',
                    (false, false) => '.',
                }
            })
            .collect()
    }

    /// Spin-adapt a determinant into a CSF with S = Ms = nspin/2
    ///
    /// The first `nspin` open-shell orbitals are coupled high-spin, the remaining
    /// open shells are coupled pairwise to singlets. Returns the determinants
    /// (alpha index, beta index, unnormalised coefficient) and the norm factor.
    pub fn spin_adapt(&self, nspin: usize, alpha: u64, beta: u64) -> (Vec<(usize, usize, f64)>, f64) {
        assert_eq!(
            self.nelea - self.neleb,
            nspin,
            "spin adaptation requested for a different Ms"
        );
        let open = alpha ^ beta;
        let closed = alpha & beta;
        let open_orbitals: Vec<usize> = (0..self.norb).filter(|&o| open & (1u64 << o) != 0).collect();
        let closed_orbitals: Vec<usize> =
            (0..self.norb).filter(|&o| closed & (1u64 << o) != 0).collect();
        assert!(
            open_orbitals.len() >= nspin,
            "not enough open shells ({}) for nspin = {}",
            open_orbitals.len(),
            nspin
        );
        let npairs = (open_orbitals.len() - nspin) / 2;

        let mut out = Vec::with_capacity(1 << npairs);
        for mask in 0u64..(1u64 << npairs) {
            // (orbital, spin) creation operators in product order, 0 = alpha
            let mut ops: Vec<(usize, usize)> = Vec::with_capacity(self.nelea + self.neleb);
            for &c in &closed_orbitals {
                ops.push((c, 0));
                ops.push((c, 1));
            }
            for &h in &open_orbitals[..nspin] {
                ops.push((h, 0));
            }
            let mut coeff = 1.0;
            for k in 0..npairs {
                let first = open_orbitals[nspin + 2 * k];
                let second = open_orbitals[nspin + 2 * k + 1];
                if mask & (1u64 << k) == 0 {
                    ops.push((first, 0));
                    ops.push((second, 1));
                } else {
                    ops.push((first, 1));
                    ops.push((second, 0));
                    coeff = -coeff;
                }
            }

            let key = |op: &(usize, usize)| op.1 * self.norb + op.0;
            let mut inversions = 0usize;
            for x in 0..ops.len() {
                for y in (x + 1)..ops.len() {
                    if key(&ops[x]) > key(&ops[y]) {
                        inversions += 1;
                    }
                }
            }
            if inversions % 2 == 1 {
                coeff = -coeff;
            }

            let abits = ops.iter().filter(|op| op.1 == 0).fold(0u64, |acc, op| acc | (1u64 << op.0));
            let bbits = ops.iter().filter(|op| op.1 == 1).fold(0u64, |acc, op| acc | (1u64 << op.0));
            out.push((self.lexical_a(abits), self.lexical_b(bbits), coeff));
        }

        let norm = 1.0 / ((1u64 << npairs) as f64).sqrt();
        (out, norm)
    }
}

//! Occupation strings for one spin channel
//!
//! A string is a bit pattern over `norb` orbitals (bit i set = orbital i occupied).
//! Strings are enumerated once, given a dense lexical index, and linked by the
//! single excitations E_ij = a†_i a_j.

use itertools::Itertools;
use std::collections::HashMap;

/// One entry of an excitation table: `<target| E_ij |source> = sign`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetMap {
    pub source: usize,
    pub target: usize,
    pub sign: f64,
}

/// One excitation leaving a given source string: `<target| E_ij |source> = sign`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StringLink {
    pub ij: usize,
    pub target: usize,
    pub sign: f64,
}

/// Parity of the number of occupied orbitals strictly between i and j
#[inline]
pub fn sign(bits: u64, i: usize, j: usize) -> f64 {
    let (lo, hi) = if i < j { (i, j) } else { (j, i) };
    if hi <= lo + 1 {
        return 1.0;
    }
    let mask = ((1u64 << hi) - 1) & !((1u64 << (lo + 1)) - 1);
    if (bits & mask).count_ones() % 2 == 0 {
        1.0
    } else {
        -1.0
    }
}

/// Parity of the number of occupied orbitals below `orbital`
#[inline]
pub fn sign_below(bits: u64, orbital: usize) -> f64 {
    if (bits & ((1u64 << orbital) - 1)).count_ones() % 2 == 0 {
        1.0
    } else {
        -1.0
    }
}

/// Apply E_ij to a string; `None` when the result vanishes
#[inline]
pub fn excite(bits: u64, i: usize, j: usize) -> Option<(u64, f64)> {
    if bits & (1u64 << j) == 0 {
        return None;
    }
    if i == j {
        return Some((bits, 1.0));
    }
    if bits & (1u64 << i) != 0 {
        return None;
    }
    Some(((bits ^ (1u64 << j)) | (1u64 << i), sign(bits, i, j)))
}

/// Bit pattern for a list of occupied orbitals
pub fn bits_from_orbitals(orbitals: &[usize]) -> u64 {
    orbitals.iter().fold(0u64, |acc, &o| acc | (1u64 << o))
}

/// Occupied orbitals of a bit pattern, ascending
pub fn orbitals_from_bits(bits: u64, norb: usize) -> Vec<usize> {
    (0..norb).filter(|&o| bits & (1u64 << o) != 0).collect()
}

/// All strings of one spin with a fixed electron count
#[derive(Debug, Clone)]
pub struct StringSpace {
    norb: usize,
    nele: usize,
    strings: Vec<u64>,
    lexical: HashMap<u64, usize>,
    phi: Vec<Vec<DetMap>>,
    links: Vec<Vec<StringLink>>,
}

impl StringSpace {
    /// Enumerate all C(norb, nele) strings
    pub fn new(norb: usize, nele: usize) -> Self {
        assert!(norb <= 64, "at most 64 orbitals fit in a string");
        assert!(nele <= norb, "more electrons ({}) than orbitals ({})", nele, norb);
        let strings: Vec<u64> = (0..norb)
            .combinations(nele)
            .map(|occ| bits_from_orbitals(&occ))
            .collect();
        Self::from_strings(norb, nele, strings)
    }

    /// Build from an explicit list of strings (used by restricted spaces)
    pub fn from_strings(norb: usize, nele: usize, strings: Vec<u64>) -> Self {
        let lexical: HashMap<u64, usize> =
            strings.iter().enumerate().map(|(i, &s)| (s, i)).collect();

        let mut phi = vec![Vec::new(); norb * norb];
        let mut links = Vec::with_capacity(strings.len());
        for (source, &bits) in strings.iter().enumerate() {
            let mut from_source = Vec::new();
            for j in (0..norb).filter(|&j| bits & (1u64 << j) != 0) {
                for i in 0..norb {
                    if let Some((target_bits, sign)) = excite(bits, i, j) {
                        // targets outside a restricted list are not linked
                        if let Some(&target) = lexical.get(&target_bits) {
                            let ij = i * norb + j;
                            phi[ij].push(DetMap {
                                source,
                                target,
                                sign,
                            });
                            from_source.push(StringLink { ij, target, sign });
                        }
                    }
                }
            }
            links.push(from_source);
        }

        StringSpace {
            norb,
            nele,
            strings,
            lexical,
            phi,
            links,
        }
    }

    pub fn norb(&self) -> usize {
        self.norb
    }

    pub fn nele(&self) -> usize {
        self.nele
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn strings(&self) -> &[u64] {
        &self.strings
    }

    pub fn string(&self, index: usize) -> u64 {
        self.strings[index]
    }

    /// Lexical index of a member string
    pub fn lexical(&self, bits: u64) -> usize {
        match self.lexical.get(&bits) {
            Some(&index) => index,
            None => panic!("string {:#b} is not a member of this space", bits),
        }
    }

    pub fn try_lexical(&self, bits: u64) -> Option<usize> {
        self.lexical.get(&bits).copied()
    }

    /// All (source, target, sign) triples of E_ij
    pub fn phi(&self, ij: usize) -> &[DetMap] {
        &self.phi[ij]
    }

    /// All excitations leaving one source string
    pub fn links(&self, source: usize) -> &[StringLink] {
        &self.links[source]
    }
}

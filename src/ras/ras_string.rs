//! Restricted-active-space strings
//!
//! Orbitals are split into three contiguous ranges. A RAS string space holds
//! every string with a fixed number of holes in RAS1, electrons in RAS2 and
//! particles in RAS3.

use crate::determinants::{bits_from_orbitals, StringSpace};
use itertools::Itertools;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// (holes, RAS1 size, RAS2 electrons, RAS2 size, particles, RAS3 size)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RasKey {
    pub holes: usize,
    pub norb1: usize,
    pub nele2: usize,
    pub norb2: usize,
    pub particles: usize,
    pub norb3: usize,
}

impl RasKey {
    /// Key of the space a given string belongs to
    pub fn of(bits: u64, ras: [usize; 3]) -> RasKey {
        let mask = |start: usize, len: usize| -> u64 {
            if len == 0 {
                0
            } else {
                (u64::MAX >> (64 - len)) << start
            }
        };
        let occ1 = (bits & mask(0, ras[0])).count_ones() as usize;
        let occ2 = (bits & mask(ras[0], ras[1])).count_ones() as usize;
        let occ3 = (bits & mask(ras[0] + ras[1], ras[2])).count_ones() as usize;
        RasKey {
            holes: ras[0] - occ1,
            norb1: ras[0],
            nele2: occ2,
            norb2: ras[1],
            particles: occ3,
            norb3: ras[2],
        }
    }

    /// Key for `nele` electrons with the given holes and particles, if valid
    pub fn with_counts(ras: [usize; 3], nele: usize, holes: usize, particles: usize) -> Option<RasKey> {
        if holes > ras[0] || particles > ras[2] {
            return None;
        }
        let nele2 = nele as i64 - (ras[0] - holes) as i64 - particles as i64;
        if nele2 < 0 || nele2 as usize > ras[1] {
            return None;
        }
        Some(RasKey {
            holes,
            norb1: ras[0],
            nele2: nele2 as usize,
            norb2: ras[1],
            particles,
            norb3: ras[2],
        })
    }

    pub fn ras(&self) -> [usize; 3] {
        [self.norb1, self.norb2, self.norb3]
    }

    pub fn norb(&self) -> usize {
        self.norb1 + self.norb2 + self.norb3
    }

    pub fn nele(&self) -> usize {
        self.norb1 - self.holes + self.nele2 + self.particles
    }
}

/// All strings sharing one `RasKey`
#[derive(Debug)]
pub struct RasStringSpace {
    key: RasKey,
    strings: StringSpace,
}

impl RasStringSpace {
    pub fn new(key: RasKey) -> Self {
        let ras1: Vec<usize> = (0..key.norb1).collect();
        let ras2: Vec<usize> = (key.norb1..key.norb1 + key.norb2).collect();
        let ras3: Vec<usize> = (key.norb1 + key.norb2..key.norb()).collect();

        let mut strings = Vec::new();
        for occ1 in ras1.iter().copied().combinations(key.norb1 - key.holes) {
            for occ2 in ras2.iter().copied().combinations(key.nele2) {
                for occ3 in ras3.iter().copied().combinations(key.particles) {
                    strings.push(
                        bits_from_orbitals(&occ1) | bits_from_orbitals(&occ2) | bits_from_orbitals(&occ3),
                    );
                }
            }
        }
        strings.sort_unstable();

        RasStringSpace {
            key,
            strings: StringSpace::from_strings(key.norb(), key.nele(), strings),
        }
    }

    pub fn key(&self) -> RasKey {
        self.key
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn strings(&self) -> &[u64] {
        self.strings.strings()
    }

    pub fn string(&self, index: usize) -> u64 {
        self.strings.string(index)
    }

    pub fn lexical(&self, bits: u64) -> usize {
        self.strings.lexical(bits)
    }
}

/// Memoized RAS string spaces, shared by every determinant space of a run
#[derive(Debug, Default)]
pub struct RasSpaceCache {
    spaces: Mutex<HashMap<RasKey, Arc<RasStringSpace>>>,
}

impl RasSpaceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: RasKey) -> Arc<RasStringSpace> {
        let mut spaces = self.spaces.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        spaces
            .entry(key)
            .or_insert_with(|| Arc::new(RasStringSpace::new(key)))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.spaces
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
